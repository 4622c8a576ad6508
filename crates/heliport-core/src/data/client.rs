//! REST client for the hosted data service.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::config::Connection;

use super::models::{
    Booking, BookingRequest, BookingStatus, Dashboard, Helicopter, OrderHistory, Profile, Route,
};
use super::{DataError, Order, Query};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Orders shown on the dashboard.
const ORDER_HISTORY_LIMIT: usize = 10;

/// Bookings shown on the dashboard.
const RECENT_BOOKINGS_LIMIT: usize = 5;

/// Asks for a single object instead of an array; zero rows answers 406.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Serialize)]
struct BookingInsert<'a> {
    #[serde(flatten)]
    request: &'a BookingRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    status: BookingStatus,
}

/// Client for the hosted data service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct DataClient {
    client: Client,
    base_url: String,
    anon_key: String,
    token: Option<String>,
    user_id: Option<String>,
}

impl DataClient {
    pub fn new(connection: &Connection) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: connection.service_url.clone(),
            anon_key: connection.anon_key.clone(),
            token: None,
            user_id: None,
        })
    }

    /// Client acting as the session's user, sharing the connection pool.
    pub fn with_session(&self, session: &Session) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            anon_key: self.anon_key.clone(),
            token: Some(session.credential_token.clone()),
            user_id: Some(session.user_id.clone()),
        }
    }

    /// Client without a user, as used for public catalog reads.
    pub fn anonymous(&self) -> Self {
        Self {
            token: None,
            user_id: None,
            ..self.clone()
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, DataError> {
        let bearer = self.token.as_deref().unwrap_or(&self.anon_key);
        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", header::HeaderValue::from_str(&self.anon_key)?);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", bearer))?,
        );
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should
    /// retry), or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, DataError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DataError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, query: &Query, accept: &str) -> Result<T, DataError> {
        let url = self.url(query.table_name());
        let params = query.params();
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .header(header::ACCEPT, accept)
                .query(&params)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .map_err(|e| DataError::InvalidResponse(format!("{}: {}", url, e)));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(DataError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    /// All rows matching `query`.
    pub async fn fetch<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, DataError> {
        self.get(query, "application/json").await
    }

    /// Exactly one row; no match is `NotFound`.
    pub async fn fetch_single<T: DeserializeOwned>(&self, query: &Query) -> Result<T, DataError> {
        self.get(query, SINGLE_OBJECT).await
    }

    /// Insert `rows` and return them as stored.
    /// Not retried: a rate-limited insert is reported rather than repeated.
    pub async fn insert<T: DeserializeOwned, B: Serialize>(
        &self,
        table: &str,
        rows: &B,
    ) -> Result<Vec<T>, DataError> {
        let url = self.url(table);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;

        match Self::check_response_for_retry(response).await? {
            Some(response) => response
                .json()
                .await
                .map_err(|e| DataError::InvalidResponse(format!("{}: {}", url, e))),
            None => Err(DataError::RateLimited),
        }
    }

    fn require_user(&self) -> Result<&str, DataError> {
        self.user_id.as_deref().ok_or(DataError::Unauthorized)
    }

    // ===== Catalog =====

    pub async fn available_helicopters(&self) -> Result<Vec<Helicopter>, DataError> {
        let query = Query::table("helicopters").eq("status", "available");
        let fleet: Vec<Helicopter> = self.fetch(&query).await?;
        debug!(count = fleet.len(), "Fetched available helicopters");
        Ok(fleet)
    }

    pub async fn routes(&self) -> Result<Vec<Route>, DataError> {
        let routes: Vec<Route> = self.fetch(&Query::table("routes")).await?;
        debug!(count = routes.len(), "Fetched routes");
        Ok(routes)
    }

    // ===== Bookings =====

    /// Validate and submit a booking request. It is stored as pending.
    pub async fn submit_booking(&self, request: &BookingRequest) -> Result<Booking, DataError> {
        request.validate()?;

        let row = BookingInsert {
            request,
            user_id: self.user_id.as_deref(),
            status: BookingStatus::Pending,
        };
        let mut stored: Vec<Booking> = self.insert("bookings", &[row]).await?;
        if stored.is_empty() {
            return Err(DataError::InvalidResponse(
                "Booking insert returned no rows".to_string(),
            ));
        }
        let booking = stored.remove(0);
        info!(booking_id = %booking.id, "Booking submitted");
        Ok(booking)
    }

    // ===== Customer =====

    /// The signed-in user's profile; `None` when no row exists.
    pub async fn profile(&self) -> Result<Option<Profile>, DataError> {
        let user_id = self.require_user()?;
        let query = Query::table("profiles").eq("id", user_id);
        match self.fetch_single(&query).await {
            Ok(profile) => Ok(Some(profile)),
            Err(DataError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn order_history(&self) -> Result<Vec<OrderHistory>, DataError> {
        let user_id = self.require_user()?;
        let query = Query::table("order_history")
            .eq("user_id", user_id)
            .order("created_at", Order::Desc)
            .limit(ORDER_HISTORY_LIMIT);
        self.fetch(&query).await
    }

    pub async fn recent_bookings(&self) -> Result<Vec<Booking>, DataError> {
        let user_id = self.require_user()?;
        let query = Query::table("bookings")
            .eq("user_id", user_id)
            .order("created_at", Order::Desc)
            .limit(RECENT_BOOKINGS_LIMIT);
        self.fetch(&query).await
    }

    /// Profile, order history and recent bookings, fetched concurrently.
    /// A profile that cannot be read is left out rather than failing the rest.
    pub async fn dashboard(&self) -> Result<Dashboard, DataError> {
        self.require_user()?;
        let (profile, order_history, recent_bookings) = futures::join!(
            self.profile(),
            self.order_history(),
            self.recent_bookings()
        );

        let profile = profile.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load profile");
            None
        });

        Ok(Dashboard {
            profile,
            order_history: order_history?,
            recent_bookings: recent_bookings?,
        })
    }
}
