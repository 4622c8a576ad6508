//! Contract of the external authentication service.

use async_trait::async_trait;
use serde::Serialize;

use super::{AuthError, Session, Subscription};

/// Why the auth service emitted a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A change notification: the event and the session that is now current.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            event: AuthEvent::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            event: AuthEvent::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            event: AuthEvent::TokenRefreshed,
            session: Some(session),
        }
    }
}

/// Profile data attached to a new account.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignUpMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl SignUpMetadata {
    pub fn with_full_name(name: &str) -> Self {
        let trimmed = name.trim();
        Self {
            full_name: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }
}

/// The hosted authentication service as seen by the session store.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The session the service currently considers active, if any.
    async fn get_current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Register for change notifications. Dropping the subscription
    /// unsubscribes.
    fn subscribe(&self) -> Subscription;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}
