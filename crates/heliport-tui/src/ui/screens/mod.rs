pub mod auth;
pub mod booking;
pub mod dashboard;
pub mod home;
pub mod routes;
