use thiserror::Error;

use crate::utils::truncate_body;

/// Failures reported by the authentication service.
///
/// These are returned to the caller unchanged; the store never retries or
/// reinterprets them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    AlreadyRegistered,

    #[error("Session expired - please sign in again")]
    SessionExpired,

    #[error("Unable to reach the authentication service: {0}")]
    ServiceUnreachable(String),

    #[error("Authentication failed: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Map an error response from the auth service.
    ///
    /// The service reports the reason in the body (`error`, `error_code` or
    /// `msg`), so the body is checked before the status code.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let lower = body.to_lowercase();

        if lower.contains("refresh token")
            || lower.contains("refresh_token_not_found")
            || lower.contains("session_not_found")
            || lower.contains("token is expired")
        {
            return AuthError::SessionExpired;
        }
        if lower.contains("already registered")
            || lower.contains("user_already_exists")
            || lower.contains("email_exists")
        {
            return AuthError::AlreadyRegistered;
        }
        if lower.contains("invalid login credentials")
            || lower.contains("invalid_credentials")
            || lower.contains("invalid_grant")
        {
            return AuthError::InvalidCredentials;
        }

        let truncated = truncate_body(body);
        match status.as_u16() {
            401 | 403 => AuthError::SessionExpired,
            502..=504 => AuthError::ServiceUnreachable(format!("Status {}", status)),
            _ => AuthError::Unknown(format!("Status {}: {}", status, truncated)),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthError::Unknown(format!("Invalid response: {}", err))
        } else {
            AuthError::ServiceUnreachable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_invalid_credentials_from_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            AuthError::from_status(StatusCode::BAD_REQUEST, body),
            AuthError::InvalidCredentials
        );
        let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert_eq!(
            AuthError::from_status(StatusCode::BAD_REQUEST, body),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn test_already_registered_from_body() {
        let body = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert_eq!(
            AuthError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body),
            AuthError::AlreadyRegistered
        );
    }

    #[test]
    fn test_refresh_failure_is_session_expired() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token: Refresh Token Not Found"}"#;
        assert_eq!(
            AuthError::from_status(StatusCode::BAD_REQUEST, body),
            AuthError::SessionExpired
        );
        assert_eq!(
            AuthError::from_status(StatusCode::UNAUTHORIZED, ""),
            AuthError::SessionExpired
        );
    }

    #[test]
    fn test_gateway_errors_are_unreachable() {
        assert!(matches!(
            AuthError::from_status(StatusCode::SERVICE_UNAVAILABLE, "down"),
            AuthError::ServiceUnreachable(_)
        ));
    }

    #[test]
    fn test_other_statuses_are_unknown_with_detail() {
        match AuthError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            AuthError::Unknown(detail) => {
                assert!(detail.contains("500"));
                assert!(detail.contains("boom"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
