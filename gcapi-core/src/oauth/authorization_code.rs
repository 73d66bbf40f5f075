//! Authorization Code flow with PKCE, and the refresh-token grant.
//!
//! # Flow Overview
//!
//! 1. Generate PKCE code verifier and challenge
//! 2. Build the authorization URL with state, scope `*` and the challenge
//! 3. Hand the URL to an [`AuthorizationPresenter`]
//! 4. Verify the echoed state
//! 5. Exchange the code for tokens using the verifier

use oauth2::{
    AuthorizationCode, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, RefreshToken, Scope,
    reqwest::async_http_client,
};
use parking_lot::Mutex;
use url::Url;

use super::{
    AuthorizationPresenter, DEFAULT_SCOPE, create_oauth_client, generate_random_string,
    session_from_response,
};
use crate::config::ApiEndpointConfig;
use crate::session::{AuthSession, TokenError};

/// One authorization attempt.
///
/// Holds the PKCE verifier between building the URL and exchanging the code,
/// so a flow value must not be shared between attempts.
pub struct AuthorizationCodeFlow {
    config: ApiEndpointConfig,
    verifier: Mutex<Option<PkceCodeVerifier>>,
}

impl AuthorizationCodeFlow {
    pub fn new(config: ApiEndpointConfig) -> Self {
        Self {
            config,
            verifier: Mutex::new(None),
        }
    }

    /// Build the URL the user has to visit.
    ///
    /// Returns the URL and the state value the redirect must echo.
    pub fn build_authorization_url(&self) -> Result<(Url, String), TokenError> {
        let client = create_oauth_client(&self.config)?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        *self.verifier.lock() = Some(pkce_verifier);

        let (url, csrf_state) = client
            .authorize_url(|| CsrfToken::new(generate_random_string(32)))
            .add_scope(Scope::new(DEFAULT_SCOPE.to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        Ok((url, csrf_state.secret().to_string()))
    }

    /// Exchange an authorization code for a session.
    pub async fn exchange_code(&self, code: impl Into<String>) -> Result<AuthSession, TokenError> {
        let verifier = self
            .verifier
            .lock()
            .take()
            .ok_or_else(|| TokenError::OAuthError {
                message: "PKCE verifier not found, authorization URL was never built".to_string(),
            })?;

        let client = create_oauth_client(&self.config)?;

        let response = client
            .exchange_code(AuthorizationCode::new(code.into()))
            .set_pkce_verifier(verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| TokenError::OAuthError {
                message: format!("token exchange failed: {}", e),
            })?;

        session_from_response(&response, &self.config, None)
    }

    /// Run the whole flow through `presenter`.
    pub async fn run(
        &self,
        presenter: &dyn AuthorizationPresenter,
    ) -> Result<AuthSession, TokenError> {
        let (auth_url, expected_state) = self.build_authorization_url()?;
        tracing::debug!("Presenting authorization page at {}", self.config.authorize_url);

        let callback = presenter.present(&auth_url, &self.config.redirect_url).await?;

        if callback.state.as_deref() != Some(expected_state.as_str()) {
            return Err(TokenError::OAuthError {
                message: "state parameter mismatch".to_string(),
            });
        }

        self.exchange_code(callback.code).await
    }
}

/// Exchange the refresh token of `session` for a new session.
pub async fn refresh_session(
    config: &ApiEndpointConfig,
    session: &AuthSession,
) -> Result<AuthSession, TokenError> {
    let refresh_token = session
        .refresh_token
        .as_ref()
        .ok_or_else(|| TokenError::Expired {
            message: "token expired and no refresh token available".to_string(),
        })?;

    let client = create_oauth_client(config)?;

    let response = client
        .exchange_refresh_token(&RefreshToken::new(refresh_token.expose().to_string()))
        .request_async(async_http_client)
        .await
        .map_err(|e| TokenError::RefreshFailed {
            message: format!("token refresh failed: {}", e),
        })?;

    session_from_response(&response, config, Some(refresh_token))
}
