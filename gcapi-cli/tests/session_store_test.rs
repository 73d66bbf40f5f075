//! Integration tests for the session storage the CLI logs out of.
//!
//! These tests verify that logout removes the `authState` slot from both
//! backends the CLI can use, and that a missing keyring is skipped rather
//! than failed.

use std::sync::Arc;

use gcapi_core::token_store::AUTH_STATE_KEY;
use gcapi_core::{
    ApiEndpointConfig, ApiEnvironment, AuthSession, FileStore, KeyringStore, OAuthCredentials,
    Secret, SecretStore, TokenStore,
};
use tempfile::TempDir;

fn staging_config() -> ApiEndpointConfig {
    let credentials = OAuthCredentials {
        client_id_staging: Some("client-id".to_string()),
        client_secret_staging: Some(Secret::new("client-secret")),
        redirect_uri: Some("http://localhost:8765/callback".to_string()),
        ..Default::default()
    };
    ApiEndpointConfig::for_environment(ApiEnvironment::Staging, &credentials).unwrap()
}

#[tokio::test]
async fn test_logout_removes_session_file_entry() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path().join("session.json")));
    let config = staging_config();

    let tokens = TokenStore::new(store.clone(), config.clone());
    tokens
        .install(AuthSession::new("access-token", &config).with_refresh_token("refresh-token"))
        .await
        .unwrap();
    assert!(store.exists(AUTH_STATE_KEY).await.unwrap());

    tokens.logout().await.unwrap();

    assert!(!store.exists(AUTH_STATE_KEY).await.unwrap());
    assert!(!tokens.is_authorized().await);
}

#[tokio::test]
async fn test_logout_removes_keyring_entry() {
    // Skip this test if keyring is not available
    let keyring = match KeyringStore::try_new("gcapi-test-logout") {
        Ok(s) => Arc::new(s),
        Err(_) => {
            eprintln!("Skipping test: keyring unavailable");
            return;
        }
    };

    // Try to write the slot - if this fails, keyring isn't functional
    if keyring
        .set(AUTH_STATE_KEY, &Secret::new("probe"))
        .await
        .is_err()
    {
        eprintln!("Skipping test: keyring set failed");
        return;
    }

    // If get returns None, the keyring daemon isn't running
    if keyring.get(AUTH_STATE_KEY).await.unwrap().is_none() {
        eprintln!("Skipping test: keyring get returned None - daemon not running");
        let _ = keyring.delete(AUTH_STATE_KEY).await;
        return;
    }

    let config = staging_config();
    let tokens = TokenStore::new(keyring.clone(), config.clone());
    tokens
        .install(AuthSession::new("access-token", &config).with_refresh_token("refresh-token"))
        .await
        .unwrap();

    tokens.logout().await.unwrap();

    assert!(
        keyring.get(AUTH_STATE_KEY).await.unwrap().is_none(),
        "Session should be deleted from keyring"
    );
}
