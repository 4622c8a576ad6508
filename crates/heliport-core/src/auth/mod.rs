//! Authentication module for managing the client-side session.
//!
//! This module provides:
//! - `Session` / `SessionState`: the authenticated principal and the
//!   three-way state exposed to the rest of the application
//! - `SessionStore`: single source of truth for the session, fed by the auth
//!   service's change notifications
//! - `AccessGate`: per-view guard that renders, waits, or redirects to login
//! - `AuthProvider`: the contract of the external authentication service, with
//!   `HostedAuth` as the REST implementation
//!
//! State is written only by the store's notification path; sign-in, sign-up and
//! sign-out report whether the request succeeded and nothing else.

pub mod error;
pub mod feed;
pub mod gate;
pub mod hosted;
pub mod provider;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AuthError;
pub use feed::{ChangeFeed, Subscription};
pub use gate::{decide, AccessGate, Decision, Gated, LoginRedirect};
pub use hosted::HostedAuth;
pub use provider::{AuthChange, AuthEvent, AuthProvider, SignUpMetadata};
pub use session::{Session, SessionFile, SessionState};
pub use store::{ListenerId, SessionStore};
