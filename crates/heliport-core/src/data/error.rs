use thiserror::Error;

use crate::utils::truncate_body;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - session may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Validation(String),
}

impl DataError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = truncate_body(body);
        match status.as_u16() {
            401 => DataError::Unauthorized,
            403 => DataError::AccessDenied(truncated),
            // 406: a single-row request matched no rows
            404 | 406 => DataError::NotFound(truncated),
            429 => DataError::RateLimited,
            500..=599 => DataError::ServerError(truncated),
            _ => DataError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status() {
        assert!(matches!(DataError::from_status(StatusCode::UNAUTHORIZED, ""), DataError::Unauthorized));
        assert!(matches!(DataError::from_status(StatusCode::FORBIDDEN, "rls"), DataError::AccessDenied(_)));
        assert!(matches!(DataError::from_status(StatusCode::NOT_ACCEPTABLE, ""), DataError::NotFound(_)));
        assert!(matches!(DataError::from_status(StatusCode::TOO_MANY_REQUESTS, ""), DataError::RateLimited));
        assert!(matches!(DataError::from_status(StatusCode::BAD_GATEWAY, ""), DataError::ServerError(_)));
        match DataError::from_status(StatusCode::BAD_REQUEST, "bad column") {
            DataError::InvalidResponse(msg) => assert!(msg.contains("bad column")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
