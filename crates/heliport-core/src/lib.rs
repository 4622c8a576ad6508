//! Core library for heliport.
//!
//! Heliport is a booking portal for a helicopter-taxi service. This crate holds
//! everything that is not presentation:
//!
//! - `auth`: the session model (`SessionStore`), the per-view guard
//!   (`AccessGate`) and the adapter to the hosted authentication service
//! - `data`: the adapter to the hosted data service (fleet, routes, bookings,
//!   order history, profiles)
//! - `config`: configuration file and connection settings
//! - `utils`: display formatting helpers

pub mod auth;
pub mod config;
pub mod data;
pub mod utils;

pub use auth::{AccessGate, AuthError, Session, SessionState, SessionStore};
pub use config::{Config, Connection};
pub use data::{DataClient, DataError};
