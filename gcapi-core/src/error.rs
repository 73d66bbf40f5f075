//! Errors surfaced to callers of the API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body the server sends with most non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmappedError {
    pub status_code: Option<u16>,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl UnmappedError {
    /// Placeholder used when the body is not the expected error document.
    pub fn unknown(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            status_message: Some("Unknown error".to_string()),
            error_message: None,
        }
    }
}

impl std::fmt::Display for UnmappedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.status_code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()),
            self.status_message.as_deref().unwrap_or("")
        )?;
        if let Some(message) = &self.error_message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request could not be sent or the connection failed.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The call was cancelled through [`HttpGateway::cancel_all`](crate::HttpGateway::cancel_all).
    #[error("request cancelled")]
    Cancelled,
}

/// Every way an API call can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request target is not a valid URL: {0}")]
    BadUrl(String),

    /// No usable access token, or the server rejected it (401).
    #[error("missing or rejected access token")]
    MissingToken,

    #[error("resource not found")]
    NotFound,

    /// The user has not granted this client access to the data (403).
    #[error("user opted out")]
    UserOptedOut,

    /// Rate limited; retry after the given number of seconds.
    #[error("too many requests, retry in {retry_after} s")]
    TooManyRequests { retry_after: u64 },

    #[error("no response body")]
    NoResponse,

    /// Client credentials or an authorization presenter are missing.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("unexpected HTTP status: {0}")]
    UnmappedHttp(UnmappedError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("failed to parse response: {0}")]
    Parsing(#[source] serde_json::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<crate::query::QueryError> for ApiError {
    fn from(err: crate::query::QueryError) -> Self {
        ApiError::BadUrl(err.to_string())
    }
}

impl From<crate::config::ConfigError> for ApiError {
    fn from(err: crate::config::ConfigError) -> Self {
        ApiError::ConfigurationMissing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_error_decodes_server_body() {
        let body = r#"{"statusCode":400,"statusMessage":"Bad Request","errorMessage":"Box value is not valid"}"#;
        let err: UnmappedError = serde_json::from_str(body).unwrap();

        assert_eq!(err.status_code, Some(400));
        assert_eq!(err.to_string(), "400 Bad Request: Box value is not valid");
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = UnmappedError::unknown(502);
        assert_eq!(err.status_code, Some(502));
        assert_eq!(err.status_message.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn test_fields_not_set_is_bad_url() {
        let err: ApiError = crate::query::QueryError::FieldsNotSet {
            attribute: "attributes".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::BadUrl(_)));
    }
}
