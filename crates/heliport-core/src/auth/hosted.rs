//! REST adapter for the hosted authentication service.
//!
//! Speaks the GoTrue-style API (`/auth/v1/...`) used by the hosted backend.
//! The active session is kept in memory, mirrored to `session.json` when a
//! `SessionFile` is attached, and every change is announced on the
//! `ChangeFeed` that `SessionStore` subscribes to.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Connection;

use super::{
    AuthChange, AuthError, AuthProvider, ChangeFeed, Session, SessionFile, SignUpMetadata,
    Subscription,
};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Lifetime assumed when the service omits both `expires_at` and `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a SignUpMetadata,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
}

/// Sign-up answers with a full session, or with just the user when the
/// account still needs email confirmation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    PendingConfirmation(UserResponse),
}

impl TokenResponse {
    fn into_session(self, fallback_email: &str) -> Session {
        let now = Utc::now();
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| {
                now + chrono::Duration::seconds(
                    self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
                )
            });

        Session {
            user_id: self.user.id,
            email: self
                .user
                .email
                .unwrap_or_else(|| fallback_email.to_string()),
            display_name: self.user.user_metadata.full_name,
            expires_at,
            credential_token: self.access_token,
            refresh_token: self.refresh_token,
        }
    }
}

/// Client for the hosted authentication service.
pub struct HostedAuth {
    client: Client,
    base_url: String,
    anon_key: String,
    session_file: Option<SessionFile>,
    current: Mutex<Option<Session>>,
    /// Set once the persisted session has been read
    loaded: Mutex<bool>,
    /// Held for the duration of a refresh; refresh tokens are single use
    refreshing: tokio::sync::Mutex<()>,
    feed: ChangeFeed,
}

impl HostedAuth {
    pub fn new(connection: &Connection) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: connection.service_url.clone(),
            anon_key: connection.anon_key.clone(),
            session_file: None,
            current: Mutex::new(None),
            loaded: Mutex::new(false),
            refreshing: tokio::sync::Mutex::new(()),
            feed: ChangeFeed::new(),
        })
    }

    /// Persist the session across runs in `file`.
    pub fn with_session_file(mut self, file: SessionFile) -> Self {
        self.session_file = Some(file);
        self
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> Option<Session> {
        Self::lock(&self.current).clone()
    }

    /// Mirror the session to disk. Failures are logged; memory is authoritative.
    fn persist(&self, session: Option<&Session>) {
        let Some(ref file) = self.session_file else {
            return;
        };
        let result = match session {
            Some(s) => file.save(s),
            None => file.clear(),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }

    /// Replace the active session and announce the change.
    ///
    /// The lock is held across the emit so notifications leave in the same
    /// order the session was written.
    fn publish(&self, session: Option<Session>, change: AuthChange) {
        let mut current = Self::lock(&self.current);
        self.persist(session.as_ref());
        *current = session;
        self.feed.emit(change);
    }

    /// Like `publish`, but only while the active session is still the one
    /// holding `credential_token`. Returns whether the change was applied.
    fn publish_if_current(
        &self,
        credential_token: &str,
        session: Option<Session>,
        change: AuthChange,
    ) -> bool {
        let mut current = Self::lock(&self.current);
        let unchanged = current
            .as_ref()
            .is_some_and(|s| s.credential_token == credential_token);
        if !unchanged {
            return false;
        }
        self.persist(session.as_ref());
        *current = session;
        self.feed.emit(change);
        true
    }

    /// Read the persisted session into memory the first time it is needed.
    fn load_persisted(&self) {
        let mut loaded = Self::lock(&self.loaded);
        if *loaded {
            return;
        }
        *loaded = true;

        let Some(ref file) = self.session_file else {
            return;
        };
        match file.load() {
            Ok(Some(session)) => {
                debug!(user_id = %session.user_id, "Restored persisted session");
                *Self::lock(&self.current) = Some(session);
            }
            Ok(None) => debug!("No persisted session"),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session file");
                if let Err(e) = file.clear() {
                    warn!(error = %e, "Failed to remove session file");
                }
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, AuthError> {
        let url = self.url(path);
        let mut request = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header(header::ACCEPT, "application/json")
            .json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        Self::check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::from_status(status, &body))
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let response = self
            .post(
                "token?grant_type=refresh_token",
                &RefreshGrant { refresh_token },
                None,
            )
            .await?;
        let token: TokenResponse = response.json().await?;
        let fallback = self.current().map(|s| s.email).unwrap_or_default();
        Ok(token.into_session(&fallback))
    }

    /// Renew the active session if it is close to expiry.
    ///
    /// Returns `Ok(true)` when the session changed (refreshed or dropped).
    /// A rejected refresh drops the session and announces `SignedOut`, as does
    /// any failed refresh once the token has expired. A result that arrives
    /// after the session was replaced or signed out is discarded.
    pub async fn refresh_if_needed(&self) -> Result<bool, AuthError> {
        self.load_persisted();
        let _refreshing = self.refreshing.lock().await;

        let Some(session) = self.current() else {
            return Ok(false);
        };
        if !session.needs_refresh() {
            return Ok(false);
        }
        let token = session.credential_token.as_str();

        let Some(refresh_token) = session.refresh_token.clone() else {
            if session.is_expired() {
                info!(user_id = %session.user_id, "Session expired without refresh token");
                return Ok(self.publish_if_current(token, None, AuthChange::signed_out()));
            }
            return Ok(false);
        };

        match self.refresh(&refresh_token).await {
            Ok(renewed) => {
                let change = AuthChange::token_refreshed(renewed.clone());
                let expires_at = renewed.expires_at;
                if !self.publish_if_current(token, Some(renewed), change) {
                    debug!(user_id = %session.user_id, "Session changed during refresh, discarding result");
                    return Ok(false);
                }
                debug!(user_id = %session.user_id, expires_at = %expires_at, "Session refreshed");
                Ok(true)
            }
            Err(AuthError::SessionExpired) | Err(AuthError::InvalidCredentials) => {
                info!(user_id = %session.user_id, "Refresh rejected, signing out");
                Ok(self.publish_if_current(token, None, AuthChange::signed_out()))
            }
            Err(e) if session.is_expired() => {
                warn!(error = %e, user_id = %session.user_id, "Session expired and could not be refreshed, signing out");
                self.publish_if_current(token, None, AuthChange::signed_out());
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, token still valid");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl AuthProvider for HostedAuth {
    async fn get_current_session(&self) -> Result<Option<Session>, AuthError> {
        self.refresh_if_needed().await?;
        Ok(self.current())
    }

    fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .post(
                "token?grant_type=password",
                &PasswordGrant { email, password },
                None,
            )
            .await?;
        let token: TokenResponse = response.json().await?;
        let session = token.into_session(email);

        self.publish(Some(session.clone()), AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<Session, AuthError> {
        let response = self
            .post(
                "signup",
                &SignUpRequest {
                    email,
                    password,
                    data: metadata,
                },
                None,
            )
            .await?;

        match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(token) => {
                let session = token.into_session(email);
                self.publish(Some(session.clone()), AuthChange::signed_in(session.clone()));
                Ok(session)
            }
            SignUpResponse::PendingConfirmation(user) => {
                info!(user_id = %user.id, "Account created, awaiting email confirmation");
                Err(AuthError::Unknown(
                    "Account created - confirm your email address, then sign in".to_string(),
                ))
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.load_persisted();
        let Some(session) = self.current() else {
            return Ok(());
        };

        let url = self.url("logout");
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.credential_token)
            .send()
            .await?;

        let status = response.status();
        // The server no longer knows the session; locally it is gone too
        let already_gone = matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        );
        if !status.is_success() && !already_gone {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::from_status(status, &body));
        }

        info!(user_id = %session.user_id, "Signed out");
        self.publish(None, AuthChange::signed_out());
        Ok(())
    }
}
