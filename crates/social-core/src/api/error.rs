use thiserror::Error;

use crate::models::ErrorBody;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Login rejected; carries the server's message for display
    #[error("{0}")]
    Authentication(String),

    #[error("No valid credential stored")]
    NoValidCredential,

    #[error("Credential rejected by server: {0}")]
    InvalidCredential(String),

    /// Local expiry check failed; the request never left the client
    #[error("Session expired - please log in again")]
    ExpiredSession,

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull a human-readable message out of an error body.
    /// Prefers the `detail` field; falls back to the (truncated) raw body.
    pub fn message_from_body(body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            return match parsed.detail {
                serde_json::Value::String(s) => s,
                // Validation errors come back as a list of objects with a `msg`
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect::<Vec<_>>()
                    .join("; "),
                other => other.to_string(),
            };
        }
        Self::truncate_body(body)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::message_from_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            400 | 422 => ApiError::Validation(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// True for errors that mean the stored credential is no longer usable
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            ApiError::NoValidCredential
                | ApiError::InvalidCredential(_)
                | ApiError::ExpiredSession
                | ApiError::Unauthorized
        )
    }

    /// Message suitable for an inline notice in a login form
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Authentication(msg) => msg.clone(),
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "oops"),
            ApiError::ServerError(ref m) if m == "oops"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, "x"),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_detail_string_is_extracted() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Email already registered"}"#,
        );
        assert!(matches!(err, ApiError::Validation(ref m) if m == "Email already registered"));
    }

    #[test]
    fn test_detail_list_is_joined() {
        let body = r#"{"detail": [
            {"msg": "field required"},
            {"msg": "value is not a valid email address"}
        ]}"#;
        assert_eq!(
            ApiError::message_from_body(body),
            "field required; value is not a valid email address"
        );
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let msg = ApiError::message_from_body(&body);
        assert!(msg.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(msg.contains("truncated, 510 total bytes"));
    }

    #[test]
    fn test_session_errors() {
        assert!(ApiError::ExpiredSession.is_session_error());
        assert!(ApiError::NoValidCredential.is_session_error());
        assert!(!ApiError::Authentication("bad".into()).is_session_error());
    }
}
