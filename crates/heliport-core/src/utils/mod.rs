//! Utility functions for display formatting.

pub mod format;

pub use format::{
    format_duration, format_flight_when, format_passengers, format_price, truncate_body,
    truncate_string,
};
