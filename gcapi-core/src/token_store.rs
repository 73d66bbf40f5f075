//! Owner of the authorization session.
//!
//! [`TokenStore`] loads the session from the persisted slot, runs the
//! authorization-code flow, refreshes access tokens on demand and writes every
//! change back.
//!
//! # Features
//!
//! - Lazy load of the single `authState` slot
//! - At most one authorization flow and one refresh in flight
//! - Configurable expiry buffer to refresh tokens before they expire
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use gcapi_core::{
//!     ApiEndpointConfig, ApiEnvironment, MemoryStore, OAuthCredentials, TokenStore,
//!     oauth::LoopbackPresenter,
//! };
//!
//! let creds = OAuthCredentials::load(None)?;
//! let config = ApiEndpointConfig::for_environment(ApiEnvironment::Staging, &creds)?;
//! let tokens = TokenStore::new(Arc::new(MemoryStore::new()), config);
//!
//! if !tokens.is_authorized().await {
//!     tokens.authorize(&LoopbackPresenter::new()).await?;
//! }
//! let token = tokens.fresh_access_token().await?;
//! # Ok(())
//! # }
//! ```

use chrono::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::config::ApiEndpointConfig;
use crate::oauth::{AuthorizationCodeFlow, AuthorizationPresenter, authorization_code};
use crate::session::{AuthSession, PersistedSession, TokenError, TokenState};
use crate::store::{Secret, SecretStore};

/// Key of the persisted session slot.
pub const AUTH_STATE_KEY: &str = "authState";

/// Default expiry buffer in minutes.
///
/// Tokens are refreshed if they expire within this many minutes.
const DEFAULT_EXPIRY_BUFFER_MINUTES: i64 = 5;

enum SessionSlot {
    Unloaded,
    Loaded(Option<AuthSession>),
}

/// Resets a flag when dropped.
struct FlagGuard<'a>(&'a AtomicBool);

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Session owner for one client.
///
/// All reads and writes of the session go through one async mutex, which is
/// also held across a refresh. Callers that arrive during a refresh wait and
/// then see the refreshed token.
pub struct TokenStore {
    store: Arc<dyn SecretStore>,
    config: ApiEndpointConfig,
    slot: Mutex<SessionSlot>,
    authorizing: AtomicBool,
    refreshing: AtomicBool,
    expiry_buffer: Duration,
}

impl TokenStore {
    /// Create a token store persisting to `store`.
    ///
    /// Uses the default expiry buffer of 5 minutes.
    pub fn new(store: Arc<dyn SecretStore>, config: ApiEndpointConfig) -> Self {
        Self {
            store,
            config,
            slot: Mutex::new(SessionSlot::Unloaded),
            authorizing: AtomicBool::new(false),
            refreshing: AtomicBool::new(false),
            expiry_buffer: Duration::minutes(DEFAULT_EXPIRY_BUFFER_MINUTES),
        }
    }

    /// Refresh tokens this long before they expire.
    pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    /// Endpoint configuration the store was built with.
    pub fn config(&self) -> &ApiEndpointConfig {
        &self.config
    }

    /// Read the persisted slot into memory.
    ///
    /// Returns whether a usable session was found. A blob that cannot be
    /// parsed, or that belongs to another environment, is ignored.
    pub async fn load_persisted(&self) -> Result<bool, TokenError> {
        let mut slot = self.slot.lock().await;
        let session = self.read_persisted().await?;
        let usable = session.as_ref().is_some_and(AuthSession::is_usable);
        *slot = SessionSlot::Loaded(session);
        Ok(usable)
    }

    /// Whether calls can be made without showing the authorization page.
    pub async fn is_authorized(&self) -> bool {
        let mut slot = self.slot.lock().await;
        if let Err(e) = self.ensure_loaded(&mut slot).await {
            tracing::warn!("Failed to load persisted session: {}", e);
            return false;
        }

        match &*slot {
            SessionSlot::Loaded(Some(session)) => session.is_usable(),
            _ => false,
        }
    }

    /// Run the authorization-code flow through `presenter`.
    ///
    /// On success the session replaces any previous one and is persisted. On
    /// failure the in-memory session is cleared.
    pub async fn authorize(&self, presenter: &dyn AuthorizationPresenter) -> Result<(), TokenError> {
        if self
            .authorizing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(TokenError::AuthorizationInProgress);
        }
        let _guard = FlagGuard(&self.authorizing);

        tracing::info!("Starting authorization against {}", self.config.environment);

        let flow = AuthorizationCodeFlow::new(self.config.clone());
        match flow.run(presenter).await {
            Ok(session) => {
                let mut slot = self.slot.lock().await;
                if let Err(e) = self.write_session(&session).await {
                    tracing::error!("Failed to persist authorized session: {}", e);
                    *slot = SessionSlot::Loaded(None);
                    return Err(e);
                }
                *slot = SessionSlot::Loaded(Some(session));
                tracing::info!("Authorization succeeded");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Authorization failed: {}", e);
                *self.slot.lock().await = SessionSlot::Loaded(None);
                Err(e)
            }
        }
    }

    /// Replace the session with one obtained elsewhere and persist it.
    pub async fn install(&self, session: AuthSession) -> Result<(), TokenError> {
        let mut slot = self.slot.lock().await;
        *slot = SessionSlot::Loaded(Some(session));
        self.persist_locked(&slot).await
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn fresh_access_token(&self) -> Result<Secret, TokenError> {
        let mut slot = self.slot.lock().await;
        self.ensure_loaded(&mut slot).await?;

        let session = match &mut *slot {
            SessionSlot::Loaded(Some(session)) => session,
            _ => return Err(TokenError::NotAuthorized),
        };

        if let Some(error) = &session.authorization_error {
            return Err(TokenError::Expired {
                message: error.clone(),
            });
        }

        if !session.expires_within(self.expiry_buffer) {
            tracing::debug!("Using cached access token");
            return Ok(session.access_token.clone());
        }

        if session.refresh_token.is_none() {
            if session.is_expired() {
                return Err(TokenError::Expired {
                    message: "token expired and no refresh token available".to_string(),
                });
            }
            return Ok(session.access_token.clone());
        }

        tracing::info!("Access token expires soon, attempting refresh");
        self.refreshing.store(true, Ordering::SeqCst);
        let refreshed = {
            let _guard = FlagGuard(&self.refreshing);
            authorization_code::refresh_session(&self.config, session).await
        };

        match refreshed {
            Ok(new_session) => {
                let token = new_session.access_token.clone();
                *session = new_session;
                tracing::info!("Successfully refreshed access token");

                if let Err(e) = self.persist_locked(&slot).await {
                    tracing::error!("Failed to persist refreshed session: {}", e);
                }
                Ok(token)
            }
            Err(e) => {
                tracing::error!("Failed to refresh token: {}", e);
                session.authorization_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Hand a fresh access token (or the reason there is none) to `callback`.
    ///
    /// The callback runs exactly once.
    pub async fn with_fresh_access_token<F, R>(&self, callback: F) -> R
    where
        F: FnOnce(Result<Secret, TokenError>) -> R,
    {
        callback(self.fresh_access_token().await)
    }

    /// Write the in-memory session to the slot, or clear the slot if there is
    /// no session.
    pub async fn persist(&self) -> Result<(), TokenError> {
        let slot = self.slot.lock().await;
        self.persist_locked(&slot).await
    }

    /// Forget the session in memory and in storage. Safe to call repeatedly.
    pub async fn logout(&self) -> Result<(), TokenError> {
        let mut slot = self.slot.lock().await;
        *slot = SessionSlot::Unloaded;
        self.store.delete(AUTH_STATE_KEY).await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> TokenState {
        if self.refreshing.load(Ordering::SeqCst) {
            return TokenState::Refreshing;
        }

        match &*self.slot.lock().await {
            SessionSlot::Unloaded => TokenState::Unloaded,
            SessionSlot::Loaded(Some(session)) => match &session.authorization_error {
                Some(error) => TokenState::Unauthorized {
                    error: error.clone(),
                },
                None => TokenState::Loaded {
                    authorized: session.is_usable(),
                },
            },
            SessionSlot::Loaded(None) => TokenState::Loaded { authorized: false },
        }
    }

    async fn ensure_loaded(&self, slot: &mut SessionSlot) -> Result<(), TokenError> {
        if matches!(slot, SessionSlot::Unloaded) {
            *slot = SessionSlot::Loaded(self.read_persisted().await?);
        }
        Ok(())
    }

    async fn read_persisted(&self) -> Result<Option<AuthSession>, TokenError> {
        let Some(raw) = self.store.get(AUTH_STATE_KEY).await? else {
            tracing::debug!("No persisted session");
            return Ok(None);
        };

        match PersistedSession::decode(&raw) {
            Ok(session) if session.matches(&self.config) => Ok(Some(session)),
            Ok(session) => {
                tracing::warn!(
                    "Ignoring persisted session for {} environment",
                    session.environment
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable persisted session: {}", e);
                Ok(None)
            }
        }
    }

    async fn write_session(&self, session: &AuthSession) -> Result<(), TokenError> {
        let raw = PersistedSession::encode(session)?;
        self.store.set(AUTH_STATE_KEY, &raw).await?;
        tracing::debug!("Persisted session");
        Ok(())
    }

    async fn persist_locked(&self, slot: &SessionSlot) -> Result<(), TokenError> {
        match slot {
            SessionSlot::Loaded(Some(session)) => self.write_session(session).await?,
            _ => {
                self.store.delete(AUTH_STATE_KEY).await?;
                tracing::debug!("Cleared persisted session");
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("environment", &self.config.environment)
            .field("expiry_buffer", &self.expiry_buffer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::AuthorizationCallback;
    use crate::oauth::tests::test_config;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use url::Url;

    fn token_store() -> (TokenStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (TokenStore::new(store.clone(), test_config()), store)
    }

    #[tokio::test]
    async fn test_empty_store_is_unauthorized() {
        let (tokens, _) = token_store();
        assert_eq!(tokens.state().await, TokenState::Unloaded);
        assert!(!tokens.is_authorized().await);
        assert_eq!(tokens.state().await, TokenState::Loaded { authorized: false });

        let err = tokens.fresh_access_token().await.unwrap_err();
        assert!(matches!(err, TokenError::NotAuthorized));
    }

    #[tokio::test]
    async fn test_install_persists_and_loads() {
        let (tokens, store) = token_store();
        let session = AuthSession::new("access", &test_config())
            .with_expiry(Utc::now() + Duration::hours(1));
        tokens.install(session).await.unwrap();

        assert!(store.exists(AUTH_STATE_KEY).await.unwrap());

        let reloaded = TokenStore::new(store.clone(), test_config());
        assert!(reloaded.load_persisted().await.unwrap());
        assert_eq!(reloaded.fresh_access_token().await.unwrap().expose(), "access");
    }

    #[tokio::test]
    async fn test_session_for_other_environment_ignored() {
        let (tokens, store) = token_store();
        let mut session = AuthSession::new("access", &test_config());
        session.environment = crate::config::ApiEnvironment::Production;
        tokens.install(session).await.unwrap();

        let reloaded = TokenStore::new(store, test_config());
        assert!(!reloaded.load_persisted().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_blob_ignored() {
        let (tokens, store) = token_store();
        store.set(AUTH_STATE_KEY, &Secret::new("{not json")).await.unwrap();

        assert!(!tokens.load_persisted().await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token() {
        let (tokens, _) = token_store();
        let session = AuthSession::new("access", &test_config())
            .with_expiry(Utc::now() - Duration::minutes(1));
        tokens.install(session).await.unwrap();

        assert!(!tokens.is_authorized().await);
        let result = tokens
            .with_fresh_access_token(|result| result.map(|t| t.expose().to_string()))
            .await;
        assert!(matches!(result, Err(TokenError::Expired { .. })));
    }

    #[tokio::test]
    async fn test_expiring_soon_without_refresh_token_still_usable() {
        let (tokens, _) = token_store();
        let session = AuthSession::new("access", &test_config())
            .with_expiry(Utc::now() + Duration::minutes(2));
        tokens.install(session).await.unwrap();

        assert_eq!(tokens.fresh_access_token().await.unwrap().expose(), "access");
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (tokens, store) = token_store();
        tokens
            .install(AuthSession::new("access", &test_config()))
            .await
            .unwrap();

        tokens.logout().await.unwrap();
        tokens.logout().await.unwrap();

        assert!(!store.exists(AUTH_STATE_KEY).await.unwrap());
        assert!(!tokens.is_authorized().await);
    }

    #[tokio::test]
    async fn test_persist_without_session_clears_slot() {
        let (tokens, store) = token_store();
        store.set(AUTH_STATE_KEY, &Secret::new("stale")).await.unwrap();

        // force the slot to Loaded(None) without reading the stale blob as usable
        assert!(!tokens.load_persisted().await.unwrap());
        tokens.persist().await.unwrap();

        assert!(!store.exists(AUTH_STATE_KEY).await.unwrap());
    }

    struct FailingPresenter;

    #[async_trait]
    impl AuthorizationPresenter for FailingPresenter {
        async fn present(&self, _: &Url, _: &Url) -> Result<AuthorizationCallback, TokenError> {
            Err(TokenError::OAuthError {
                message: "user cancelled".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_failed_authorization_clears_memory() {
        let (tokens, _) = token_store();
        tokens
            .install(AuthSession::new("access", &test_config()))
            .await
            .unwrap();

        assert!(tokens.authorize(&FailingPresenter).await.is_err());
        assert!(!tokens.is_authorized().await);
    }

    struct PendingPresenter(tokio::sync::Notify);

    #[async_trait]
    impl AuthorizationPresenter for PendingPresenter {
        async fn present(&self, _: &Url, _: &Url) -> Result<AuthorizationCallback, TokenError> {
            self.0.notified().await;
            Err(TokenError::OAuthError {
                message: "released".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_second_authorization_rejected_while_pending() {
        let (tokens, _) = token_store();
        let tokens = Arc::new(tokens);
        let presenter = Arc::new(PendingPresenter(tokio::sync::Notify::new()));

        let first = {
            let tokens = tokens.clone();
            let presenter = presenter.clone();
            tokio::spawn(async move { tokens.authorize(presenter.as_ref()).await })
        };

        while !tokens.authorizing.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        let second = tokens.authorize(presenter.as_ref()).await;
        assert!(matches!(second, Err(TokenError::AuthorizationInProgress)));

        presenter.0.notify_one();
        assert!(first.await.unwrap().is_err());
        assert!(!tokens.authorizing.load(Ordering::SeqCst));
    }
}
