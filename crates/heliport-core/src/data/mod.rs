//! Client module for the hosted data service.
//!
//! This module provides the `DataClient` for reading the fleet and route
//! catalog and the signed-in customer's profile, order history and bookings,
//! and for submitting booking requests.
//!
//! Requests carry the public API key, plus the session's bearer token when a
//! session snapshot is attached with `DataClient::with_session`.

pub mod client;
pub mod error;
pub mod models;
pub mod query;

pub use client::DataClient;
pub use error::DataError;
pub use models::{
    Booking, BookingRequest, BookingStatus, Dashboard, Helicopter, OrderHistory, Profile, Route,
    MAX_PASSENGERS,
};
pub use query::{Order, Query};
