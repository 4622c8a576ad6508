//! Scripted `AuthProvider` for store and gate tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{AuthChange, AuthError, AuthProvider, ChangeFeed, Session, SignUpMetadata, Subscription};

pub(crate) fn session_for(user_id: &str, email: &str) -> Session {
    Session {
        user_id: user_id.to_string(),
        email: email.to_string(),
        display_name: None,
        expires_at: Utc::now() + Duration::hours(1),
        credential_token: format!("token-{}", user_id),
        refresh_token: Some(format!("refresh-{}", user_id)),
    }
}

/// In-memory accounts plus a change feed the test can drive by hand.
pub(crate) struct ScriptedAuth {
    pub feed: ChangeFeed,
    existing: Mutex<Result<Option<Session>, AuthError>>,
    accounts: Mutex<HashMap<String, (String, Session)>>,
    sign_out_error: Mutex<Option<AuthError>>,
    subscribe_calls: Mutex<usize>,
}

impl ScriptedAuth {
    pub fn new() -> Self {
        Self {
            feed: ChangeFeed::new(),
            existing: Mutex::new(Ok(None)),
            accounts: Mutex::new(HashMap::new()),
            sign_out_error: Mutex::new(None),
            subscribe_calls: Mutex::new(0),
        }
    }

    pub fn with_existing(self, session: Session) -> Self {
        *self.existing.lock().unwrap() = Ok(Some(session));
        self
    }

    pub fn with_boot_error(self, err: AuthError) -> Self {
        *self.existing.lock().unwrap() = Err(err);
        self
    }

    pub fn with_account(self, email: &str, password: &str, user_id: &str) -> Self {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            (password.to_string(), session_for(user_id, email)),
        );
        self
    }

    pub fn fail_sign_out_with(&self, err: AuthError) {
        *self.sign_out_error.lock().unwrap() = Some(err);
    }

    pub fn subscribe_calls(&self) -> usize {
        *self.subscribe_calls.lock().unwrap()
    }
}

#[async_trait]
impl AuthProvider for ScriptedAuth {
    async fn get_current_session(&self) -> Result<Option<Session>, AuthError> {
        self.existing.lock().unwrap().clone()
    }

    fn subscribe(&self) -> Subscription {
        *self.subscribe_calls.lock().unwrap() += 1;
        self.feed.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some((stored, session)) if stored == password => {
                let session = session.clone();
                self.feed.emit(AuthChange::signed_in(session.clone()));
                Ok(session)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<Session, AuthError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AuthError::AlreadyRegistered);
        }
        let mut session = session_for(&format!("user-{}", accounts.len() + 1), email);
        session.display_name = metadata.full_name.clone();
        accounts.insert(email.to_string(), (password.to_string(), session.clone()));
        self.feed.emit(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(err) = self.sign_out_error.lock().unwrap().take() {
            return Err(err);
        }
        self.feed.emit(AuthChange::signed_out());
        Ok(())
    }
}
