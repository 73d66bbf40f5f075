//! OAuth 2.0 flows against the Geocaching identity provider.
//!
//! This module provides:
//! - [`authorization_code`] - Authorization Code flow with PKCE, plus refresh
//! - [`loopback`] - A presenter that receives the redirect on a local port
//! - [`AuthorizationPresenter`] - The seam between the flow and whatever shows
//!   the authorization page to the user

pub mod authorization_code;
pub mod loopback;

use async_trait::async_trait;
use chrono::Utc;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenResponse},
};
use url::Url;

use crate::config::ApiEndpointConfig;
use crate::session::{AuthSession, TokenError};
use crate::store::Secret;

pub use authorization_code::AuthorizationCodeFlow;
pub use loopback::LoopbackPresenter;

/// Scope requested from the provider. The API only knows the wildcard.
pub const DEFAULT_SCOPE: &str = "*";

/// What the provider handed back on the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCallback {
    /// Authorization code to exchange.
    pub code: String,
    /// The `state` parameter echoed by the provider.
    pub state: Option<String>,
}

/// Shows the authorization page to the user and waits for the redirect.
///
/// Implementations decide how the page is shown (system browser, embedded
/// web view, printed URL) and how the redirect is captured.
#[async_trait]
pub trait AuthorizationPresenter: Send + Sync {
    /// Present `authorize_url` and resolve once the provider redirects to
    /// `redirect_url`.
    async fn present(
        &self,
        authorize_url: &Url,
        redirect_url: &Url,
    ) -> Result<AuthorizationCallback, TokenError>;
}

/// Create an OAuth2 client for the configured endpoints.
pub fn create_oauth_client(config: &ApiEndpointConfig) -> Result<BasicClient, TokenError> {
    let auth_url = AuthUrl::new(config.authorize_url.to_string()).map_err(|e| {
        TokenError::OAuthError {
            message: format!("invalid auth URL: {}", e),
        }
    })?;

    let token_url = TokenUrl::new(config.token_url.to_string()).map_err(|e| {
        TokenError::OAuthError {
            message: format!("invalid token URL: {}", e),
        }
    })?;

    let redirect_url = RedirectUrl::new(config.redirect_url.to_string()).map_err(|e| {
        TokenError::OAuthError {
            message: format!("invalid redirect URL: {}", e),
        }
    })?;

    Ok(BasicClient::new(
        ClientId::new(config.client_id.clone()),
        Some(ClientSecret::new(config.client_secret.expose().to_string())),
        auth_url,
        Some(token_url),
    )
    .set_redirect_uri(redirect_url))
}

/// Generate a random alphanumeric string of the specified length.
///
/// Used for the `state` parameter of the authorization request.
pub fn generate_random_string(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Turn a token endpoint response into a session.
///
/// `previous_refresh` is kept when the provider does not rotate the refresh
/// token.
pub(crate) fn session_from_response(
    response: &BasicTokenResponse,
    config: &ApiEndpointConfig,
    previous_refresh: Option<&Secret>,
) -> Result<AuthSession, TokenError> {
    let scopes = response
        .scopes()
        .map(|s| s.iter().map(|scope| scope.to_string()).collect())
        .unwrap_or_default();

    let mut session =
        AuthSession::new(response.access_token().secret().as_str(), config).with_scopes(scopes);

    if let Some(duration) = response.expires_in() {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(duration).map_err(|e| TokenError::OAuthError {
                message: format!("invalid expiration duration: {}", e),
            })?;
        session = session.with_expiry(expires_at);
    }

    session.refresh_token = match response.refresh_token() {
        Some(token) => Some(Secret::new(token.secret().as_str())),
        None => previous_refresh.cloned(),
    };

    Ok(session)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ApiEnvironment, OAuthCredentials};

    pub(crate) fn test_config() -> ApiEndpointConfig {
        let creds = OAuthCredentials {
            client_id_staging: Some("client-id".to_string()),
            client_secret_staging: Some(Secret::new("client-secret")),
            redirect_uri: Some("http://localhost:8765/callback".to_string()),
            ..Default::default()
        };
        ApiEndpointConfig::for_environment(ApiEnvironment::Staging, &creds).unwrap()
    }

    #[test]
    fn test_create_oauth_client() {
        assert!(create_oauth_client(&test_config()).is_ok());
    }

    #[test]
    fn test_generate_random_string() {
        let s1 = generate_random_string(32);
        let s2 = generate_random_string(32);

        assert_eq!(s1.len(), 32);
        assert_ne!(s1, s2);
        assert!(s1.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
