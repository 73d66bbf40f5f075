//! Integration tests for the session lifecycle.
//!
//! These tests verify that the TokenStore correctly:
//! - Runs the authorization-code flow and persists the result
//! - Refreshes expiring tokens through the token endpoint
//! - Marks the session unauthorized when a refresh fails
//! - Restores, ignores and clears persisted sessions

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use gcapi_core::fields::UserField;
use gcapi_core::resources::CURRENT_USER;
use gcapi_core::session::PersistedSession;
use gcapi_core::token_store::AUTH_STATE_KEY;
use gcapi_core::{
    ApiEndpointConfig, ApiEnvironment, AuthSession, FileStore, GeocachingClient, OAuthCredentials,
    MemoryStore, Secret, SecretStore, StoreError, TokenError, TokenState, TokenStore,
};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

use common::{
    ApprovingPresenter, ForgedStatePresenter, expired_session, test_config, token_store,
    valid_session,
};

async fn mount_token_endpoint(server: &MockServer, grant: &str, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains(format!("grant_type={}", grant)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "new-refresh-token"
        })))
        .mount(server)
        .await;
}

async fn persisted(store: &dyn SecretStore) -> Option<AuthSession> {
    let raw = store.get(AUTH_STATE_KEY).await.unwrap()?;
    Some(PersistedSession::decode(&raw).unwrap())
}

#[tokio::test]
async fn test_authorize_exchanges_code_and_persists() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "authorization_code", "fresh-token").await;

    let (tokens, store) = token_store(test_config(&server));
    assert!(!tokens.is_authorized().await);

    tokens
        .authorize(&ApprovingPresenter::new("auth-code"))
        .await
        .unwrap();

    assert!(tokens.is_authorized().await);
    assert_eq!(tokens.state().await, TokenState::Loaded { authorized: true });
    assert_eq!(tokens.fresh_access_token().await.unwrap().expose(), "fresh-token");

    let saved = persisted(store.as_ref()).await.unwrap();
    assert_eq!(saved.access_token.expose(), "fresh-token");
    assert_eq!(
        saved.refresh_token.as_ref().map(Secret::expose),
        Some("new-refresh-token")
    );
}

#[tokio::test]
async fn test_forged_state_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (tokens, store) = token_store(test_config(&server));

    let result = tokens.authorize(&ForgedStatePresenter).await;

    assert!(matches!(result, Err(TokenError::OAuthError { .. })));
    assert!(!tokens.is_authorized().await);
    assert!(persisted(store.as_ref()).await.is_none());
}

#[tokio::test]
async fn test_first_call_authorizes_through_presenter() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "authorization_code", "fresh-token").await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users/me"))
        .and(header("authorization", "bearer fresh-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"username": "cacher"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (tokens, _) = token_store(test_config(&server));
    let client = GeocachingClient::with_token_store(
        tokens,
        Some(Arc::new(ApprovingPresenter::new("auth-code"))),
    )
    .unwrap();

    let me = client
        .users()
        .get(CURRENT_USER, &[UserField::Username])
        .await
        .unwrap();

    assert_eq!(me.username.as_deref(), Some("cacher"));
    assert!(client.is_authorized().await);
}

#[tokio::test]
async fn test_expired_token_refreshed_before_call() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "refresh_token", "refreshed-token").await;

    Mock::given(method("GET"))
        .and(path("/v1.0/attributes"))
        .and(header("authorization", "bearer refreshed-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let (tokens, store) = token_store(config.clone());
    tokens.install(expired_session(&config)).await.unwrap();

    let client = GeocachingClient::with_token_store(tokens, None).unwrap();
    let attributes = client.geocaches().attribute_types().await.unwrap();
    assert!(attributes.is_empty());

    let saved = persisted(store.as_ref()).await.unwrap();
    assert_eq!(saved.access_token.expose(), "refreshed-token");
    assert!(!saved.is_expired());
}

#[tokio::test]
async fn test_concurrent_calls_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "access_token": "refreshed-token",
                    "token_type": "bearer",
                    "expires_in": 3600,
                    "refresh_token": "new-refresh-token"
                }))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/attributes"))
        .and(header("authorization", "bearer refreshed-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(5)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let (tokens, store) = token_store(config.clone());
    tokens.install(expired_session(&config)).await.unwrap();
    let client = GeocachingClient::with_token_store(tokens, None).unwrap();

    let geocaches = client.geocaches();
    let results = tokio::join!(
        geocaches.attribute_types(),
        geocaches.attribute_types(),
        geocaches.attribute_types(),
        geocaches.attribute_types(),
        geocaches.attribute_types(),
    );
    assert!(results.0.is_ok());
    assert!(results.1.is_ok());
    assert!(results.2.is_ok());
    assert!(results.3.is_ok());
    assert!(results.4.is_ok());

    let saved = persisted(store.as_ref()).await.unwrap();
    assert_eq!(saved.access_token.expose(), "refreshed-token");
    assert_eq!(
        saved.refresh_token.as_ref().map(Secret::expose),
        Some("new-refresh-token")
    );
}

#[tokio::test]
async fn test_token_inside_buffer_is_refreshed() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "refresh_token", "refreshed-token").await;

    let config = test_config(&server);
    let (tokens, _) = token_store(config.clone());
    let session = AuthSession::new("soon-stale", &config)
        .with_refresh_token("refresh-token")
        .with_expiry(Utc::now() + Duration::minutes(2));
    tokens.install(session).await.unwrap();

    assert_eq!(
        tokens.fresh_access_token().await.unwrap().expose(),
        "refreshed-token"
    );
}

#[tokio::test]
async fn test_refresh_failure_marks_session_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "The refresh token is invalid or expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let (tokens, _) = token_store(config.clone());
    tokens.install(expired_session(&config)).await.unwrap();

    assert!(matches!(
        tokens.fresh_access_token().await,
        Err(TokenError::RefreshFailed { .. })
    ));
    assert!(matches!(tokens.state().await, TokenState::Unauthorized { .. }));
    assert!(!tokens.is_authorized().await);

    // The failure sticks; the token endpoint is not hit again
    assert!(matches!(
        tokens.fresh_access_token().await,
        Err(TokenError::Expired { .. })
    ));
}

#[tokio::test]
async fn test_gateway_maps_refresh_failure_to_missing_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let (tokens, _) = token_store(config.clone());
    // Expired but refreshable counts as authorized, so no presenter is needed
    tokens.install(expired_session(&config)).await.unwrap();
    let client = GeocachingClient::with_token_store(tokens, None).unwrap();

    assert!(matches!(
        client.geocaches().geocache_types().await,
        Err(gcapi_core::ApiError::MissingToken)
    ));
}

#[tokio::test]
async fn test_session_survives_restart_in_file_store() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("session.json");
    let config = test_config(&server);

    {
        let tokens = TokenStore::new(Arc::new(FileStore::new(&path)), config.clone());
        tokens.install(valid_session(&config)).await.unwrap();
    }

    let tokens = TokenStore::new(Arc::new(FileStore::new(&path)), config);
    assert_eq!(tokens.state().await, TokenState::Unloaded);
    assert!(tokens.load_persisted().await.unwrap());
    assert_eq!(
        tokens.fresh_access_token().await.unwrap().expose(),
        "access-token"
    );
}

#[tokio::test]
async fn test_session_from_other_environment_ignored() {
    let server = MockServer::start().await;
    let staging = test_config(&server);

    let credentials = OAuthCredentials {
        client_id: Some("prod-id".to_string()),
        client_secret: Some(Secret::new("prod-secret")),
        redirect_uri: Some("http://localhost:8765/callback".to_string()),
        ..Default::default()
    };
    let production =
        ApiEndpointConfig::for_environment(ApiEnvironment::Production, &credentials).unwrap();

    let (tokens, store) = token_store(staging.clone());
    tokens.install(valid_session(&staging)).await.unwrap();

    let other = TokenStore::new(store.clone(), production);
    assert!(!other.is_authorized().await);
    assert!(matches!(
        other.fresh_access_token().await,
        Err(TokenError::NotAuthorized)
    ));
}

#[tokio::test]
async fn test_logout_clears_memory_and_storage() {
    let server = MockServer::start().await;
    let config = test_config(&server);
    let (tokens, store) = token_store(config.clone());
    tokens.install(valid_session(&config)).await.unwrap();

    tokens.logout().await.unwrap();

    assert!(persisted(store.as_ref()).await.is_none());
    assert!(!tokens.is_authorized().await);
    // Repeated logout is harmless
    tokens.logout().await.unwrap();
}

#[tokio::test]
async fn test_authorize_and_logout_recover_from_corrupt_session_file() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "authorization_code", "fresh-token").await;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("session.json");
    std::fs::write(&path, r#"{"version":1,"entr"#).unwrap();

    let tokens = TokenStore::new(Arc::new(FileStore::new(&path)), test_config(&server));
    assert!(!tokens.is_authorized().await);

    tokens
        .authorize(&ApprovingPresenter::new("auth-code"))
        .await
        .unwrap();
    assert!(tokens.is_authorized().await);

    let saved = persisted(&FileStore::new(&path)).await.unwrap();
    assert_eq!(saved.access_token.expose(), "fresh-token");

    tokens.logout().await.unwrap();
    tokens.logout().await.unwrap();
    assert!(persisted(&FileStore::new(&path)).await.is_none());
}

/// Slot that can be read but refuses every write.
struct ReadOnlyStore(MemoryStore);

#[async_trait]
impl SecretStore for ReadOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        self.0.get(key).await
    }

    async fn set(&self, _key: &str, _secret: &Secret) -> Result<(), StoreError> {
        Err(StoreError::BackendError {
            message: "read-only".to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.0.delete(key).await
    }
}

#[tokio::test]
async fn test_authorize_not_applied_when_session_cannot_be_saved() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "authorization_code", "fresh-token").await;

    let tokens = TokenStore::new(
        Arc::new(ReadOnlyStore(MemoryStore::new())),
        test_config(&server),
    );

    let result = tokens.authorize(&ApprovingPresenter::new("auth-code")).await;

    assert!(matches!(result, Err(TokenError::StorageError(_))));
    assert!(!tokens.is_authorized().await);
    assert_eq!(tokens.state().await, TokenState::Loaded { authorized: false });
    assert!(matches!(
        tokens.fresh_access_token().await,
        Err(TokenError::NotAuthorized)
    ));
}
