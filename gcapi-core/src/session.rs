//! The authorization session and its persisted form.
//!
//! This module provides:
//! - [`AuthSession`] - Tokens, expiry and endpoints for the signed-in user
//! - [`PersistedSession`] - The versioned document written to the session slot
//! - [`TokenError`] - Failures of the session lifecycle
//! - [`TokenState`] - Observable lifecycle state of a [`TokenStore`](crate::TokenStore)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::{ApiEndpointConfig, ApiEnvironment};
use crate::store::{Secret, StoreError};

/// Current version of the persisted session document.
pub const SESSION_FORMAT_VERSION: u32 = 1;

/// Error type for session lifecycle operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No session is available.
    #[error("not authorized")]
    NotAuthorized,

    /// The access token has expired and there is no way to refresh it.
    #[error("token expired: {message}")]
    Expired { message: String },

    /// Token refresh failed.
    #[error("token refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The authorization-code flow failed.
    #[error("authorization failed: {message}")]
    OAuthError { message: String },

    /// Another authorization flow is already pending.
    #[error("an authorization flow is already in progress")]
    AuthorizationInProgress,

    /// Storage error while loading or persisting the session.
    #[error("storage error: {0}")]
    StorageError(#[from] StoreError),

    /// The persisted session could not be read.
    #[error("invalid persisted session: {0}")]
    InvalidSession(#[from] serde_json::Error),

    /// The persisted session was written in a format this build cannot read.
    #[error("unsupported session format version {version}")]
    UnsupportedFormat { version: u32 },
}

/// Lifecycle state of the session held by a token store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// The persisted slot has not been read yet.
    Unloaded,
    /// Loaded; `true` when the session is usable.
    Loaded { authorized: bool },
    /// A refresh-token grant is in flight.
    Refreshing,
    /// The last refresh failed; reauthorization is required.
    Unauthorized { error: String },
}

/// Tokens and endpoints of an authorized user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token sent with every API call.
    pub access_token: Secret,

    /// Refresh token, when the provider issued one.
    pub refresh_token: Option<Secret>,

    /// When the access token expires (None if unknown).
    pub expires_at: Option<DateTime<Utc>>,

    /// Scopes granted by the provider.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Environment the tokens were issued for.
    pub environment: ApiEnvironment,

    /// Authorization endpoint used to obtain the session.
    pub authorize_url: Url,

    /// Token endpoint used for refreshes.
    pub token_url: Url,

    /// Set when a refresh failed. Not persisted.
    #[serde(skip)]
    pub authorization_error: Option<String>,
}

impl AuthSession {
    /// Create a session for the given endpoints.
    pub fn new(access_token: impl Into<String>, config: &ApiEndpointConfig) -> Self {
        Self {
            access_token: Secret::new(access_token),
            refresh_token: None,
            expires_at: None,
            scopes: Vec::new(),
            environment: config.environment,
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            authorization_error: None,
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(Secret::new(refresh_token));
        self
    }

    /// Set the expiration time.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the granted scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Check if the access token has expired.
    ///
    /// Returns `false` if no expiration is set.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp < Utc::now()).unwrap_or(false)
    }

    /// Check if the access token will expire within the given duration.
    pub fn expires_within(&self, duration: Duration) -> bool {
        self.expires_at
            .map(|exp| exp < Utc::now() + duration)
            .unwrap_or(false)
    }

    /// Whether this session can be used to make calls without user interaction.
    pub fn is_usable(&self) -> bool {
        self.authorization_error.is_none()
            && (self.refresh_token.is_some() || !self.is_expired())
    }

    /// Whether this session was issued by the endpoints in `config`.
    pub fn matches(&self, config: &ApiEndpointConfig) -> bool {
        self.environment == config.environment && self.token_url == config.token_url
    }
}

/// Versioned document stored in the session slot.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedSession {
    pub version: u32,
    pub session: AuthSession,
}

impl PersistedSession {
    /// Serialize a session for storage.
    pub fn encode(session: &AuthSession) -> Result<Secret, TokenError> {
        let doc = PersistedSessionRef {
            version: SESSION_FORMAT_VERSION,
            session,
        };
        Ok(Secret::new(serde_json::to_string(&doc)?))
    }

    /// Parse a stored document. Unknown versions are rejected.
    pub fn decode(raw: &Secret) -> Result<AuthSession, TokenError> {
        let doc: PersistedSession = serde_json::from_str(raw.expose())?;
        if doc.version != SESSION_FORMAT_VERSION {
            return Err(TokenError::UnsupportedFormat {
                version: doc.version,
            });
        }
        Ok(doc.session)
    }
}

#[derive(Serialize)]
struct PersistedSessionRef<'a> {
    version: u32,
    session: &'a AuthSession,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OAuthCredentials;

    fn config() -> ApiEndpointConfig {
        let creds = OAuthCredentials {
            client_id: Some("id".to_string()),
            client_secret: Some(Secret::new("secret")),
            redirect_uri: Some("http://localhost:8765/callback".to_string()),
            ..Default::default()
        };
        ApiEndpointConfig::for_environment(ApiEnvironment::Production, &creds).unwrap()
    }

    #[test]
    fn test_session_is_expired() {
        let expired = AuthSession::new("t", &config()).with_expiry(Utc::now() - Duration::hours(1));
        assert!(expired.is_expired());

        let valid = AuthSession::new("t", &config()).with_expiry(Utc::now() + Duration::hours(1));
        assert!(!valid.is_expired());

        assert!(!AuthSession::new("t", &config()).is_expired());
    }

    #[test]
    fn test_session_expires_within() {
        let session =
            AuthSession::new("t", &config()).with_expiry(Utc::now() + Duration::minutes(5));

        assert!(session.expires_within(Duration::minutes(10)));
        assert!(!session.expires_within(Duration::minutes(2)));
    }

    #[test]
    fn test_usable_with_refresh_token_even_when_expired() {
        let session = AuthSession::new("t", &config())
            .with_expiry(Utc::now() - Duration::hours(1))
            .with_refresh_token("r");
        assert!(session.is_usable());

        let mut failed = session.clone();
        failed.authorization_error = Some("invalid_grant".to_string());
        assert!(!failed.is_usable());
    }

    #[test]
    fn test_expired_without_refresh_is_not_usable() {
        let session =
            AuthSession::new("t", &config()).with_expiry(Utc::now() - Duration::hours(1));
        assert!(!session.is_usable());
    }

    #[test]
    fn test_persisted_document_shape() {
        let session = AuthSession::new("access", &config()).with_refresh_token("refresh");
        let raw = PersistedSession::encode(&session).unwrap();

        let value: serde_json::Value = serde_json::from_str(raw.expose()).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["session"]["access_token"], "access");
        assert_eq!(value["session"]["environment"], "production");
        assert!(value["session"].get("authorization_error").is_none());

        let decoded = PersistedSession::decode(&raw).unwrap();
        assert_eq!(decoded.refresh_token.as_ref().unwrap().expose(), "refresh");
        assert!(decoded.matches(&config()));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let raw = PersistedSession::encode(&AuthSession::new("a", &config())).unwrap();
        let bumped = raw.expose().replacen("\"version\":1", "\"version\":7", 1);

        let err = PersistedSession::decode(&Secret::new(bumped)).unwrap_err();
        assert!(matches!(err, TokenError::UnsupportedFormat { version: 7 }));
    }
}
