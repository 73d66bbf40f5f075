//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use gcapi_core::oauth::{AuthorizationCallback, AuthorizationPresenter};
use gcapi_core::{
    ApiEndpointConfig, ApiEnvironment, AuthSession, GeocachingClient, MemoryStore,
    OAuthCredentials, Secret, SecretStore, TokenError, TokenStore,
};
use url::Url;
use wiremock::MockServer;

/// Staging credentials with every endpoint pointed at `server`.
pub fn test_config(server: &MockServer) -> ApiEndpointConfig {
    let credentials = OAuthCredentials {
        client_id_staging: Some("client-id".to_string()),
        client_secret_staging: Some(Secret::new("client-secret")),
        redirect_uri: Some("http://localhost:8765/callback".to_string()),
        ..Default::default()
    };

    ApiEndpointConfig::for_environment(ApiEnvironment::Staging, &credentials)
        .unwrap()
        .with_api_origin("http", server.address().to_string())
        .with_oauth_endpoints(
            &format!("{}/oauth/authorize", server.uri()),
            &format!("{}/oauth/token", server.uri()),
        )
        .unwrap()
}

/// A session that stays valid for the duration of a test.
pub fn valid_session(config: &ApiEndpointConfig) -> AuthSession {
    AuthSession::new("access-token", config)
        .with_refresh_token("refresh-token")
        .with_expiry(Utc::now() + Duration::hours(1))
}

/// A session whose access token has already expired.
pub fn expired_session(config: &ApiEndpointConfig) -> AuthSession {
    AuthSession::new("stale-token", config)
        .with_refresh_token("refresh-token")
        .with_expiry(Utc::now() - Duration::hours(1))
}

/// Token store over an in-memory slot, plus the slot for inspection.
pub fn token_store(config: ApiEndpointConfig) -> (Arc<TokenStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let tokens = Arc::new(TokenStore::new(
        store.clone() as Arc<dyn SecretStore>,
        config,
    ));
    (tokens, store)
}

/// Client with an already authorized session and no presenter.
pub async fn authorized_client(server: &MockServer) -> GeocachingClient {
    let config = test_config(server);
    let (tokens, _) = token_store(config.clone());
    tokens.install(valid_session(&config)).await.unwrap();
    GeocachingClient::with_token_store(tokens, None).unwrap()
}

/// Presenter that approves immediately, echoing the `state` it was given.
pub struct ApprovingPresenter {
    pub code: String,
}

impl ApprovingPresenter {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
        }
    }
}

#[async_trait]
impl AuthorizationPresenter for ApprovingPresenter {
    async fn present(
        &self,
        authorize_url: &Url,
        _redirect_url: &Url,
    ) -> Result<AuthorizationCallback, TokenError> {
        let state = authorize_url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned());

        Ok(AuthorizationCallback {
            code: self.code.clone(),
            state,
        })
    }
}

/// Presenter that answers with a forged `state`.
pub struct ForgedStatePresenter;

#[async_trait]
impl AuthorizationPresenter for ForgedStatePresenter {
    async fn present(
        &self,
        _authorize_url: &Url,
        _redirect_url: &Url,
    ) -> Result<AuthorizationCallback, TokenError> {
        Ok(AuthorizationCallback {
            code: "auth-code".to_string(),
            state: Some("not-the-state".to_string()),
        })
    }
}
