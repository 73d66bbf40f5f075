//! The entry point tying configuration, session and transport together.

use std::sync::Arc;

use crate::config::ApiEndpointConfig;
use crate::error::ApiError;
use crate::gateway::HttpGateway;
use crate::oauth::AuthorizationPresenter;
use crate::resources::{Geocaches, Lists, Logs, Trackables, Users, Waypoints};
use crate::session::{TokenError, TokenState};
use crate::store::SecretStore;
use crate::token_store::TokenStore;

/// A configured API client.
///
/// Nothing is global: build one per environment and account and share it by
/// reference. Resource families borrow the client.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use std::sync::Arc;
/// use gcapi_core::{
///     ApiEndpointConfig, ApiEnvironment, GeocachingClient, MemoryStore, OAuthCredentials,
///     fields::GeocacheField, oauth::LoopbackPresenter, resources::Expansion,
/// };
///
/// let creds = OAuthCredentials::load(None)?;
/// let config = ApiEndpointConfig::for_environment(ApiEnvironment::Staging, &creds)?;
/// let client = GeocachingClient::new(
///     config,
///     Arc::new(MemoryStore::new()),
///     Some(Arc::new(LoopbackPresenter::new())),
/// )?;
///
/// let cache = client
///     .geocaches()
///     .get("GC12345", GeocacheField::ALL, &Expansion::default())
///     .await?;
/// println!("{:?}", cache.name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GeocachingClient {
    gateway: HttpGateway,
}

impl GeocachingClient {
    /// Build a client persisting its session in `store`.
    ///
    /// `presenter` is used when a call is made while unauthorized. Without
    /// one such calls fail with [`ApiError::ConfigurationMissing`].
    pub fn new(
        config: ApiEndpointConfig,
        store: Arc<dyn SecretStore>,
        presenter: Option<Arc<dyn AuthorizationPresenter>>,
    ) -> Result<Self, ApiError> {
        let tokens = Arc::new(TokenStore::new(store, config));
        Self::with_token_store(tokens, presenter)
    }

    /// Build a client around an existing token store.
    pub fn with_token_store(
        tokens: Arc<TokenStore>,
        presenter: Option<Arc<dyn AuthorizationPresenter>>,
    ) -> Result<Self, ApiError> {
        tracing::debug!(
            "Creating client for {} at {}",
            tokens.config().environment,
            tokens.config().api_host
        );
        Ok(Self {
            gateway: HttpGateway::new(tokens, presenter)?,
        })
    }

    pub fn config(&self) -> &ApiEndpointConfig {
        self.gateway.tokens().config()
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        self.gateway.tokens()
    }

    pub fn gateway(&self) -> &HttpGateway {
        &self.gateway
    }

    pub fn geocaches(&self) -> Geocaches<'_> {
        Geocaches::new(&self.gateway)
    }

    pub fn logs(&self) -> Logs<'_> {
        Logs::new(&self.gateway)
    }

    pub fn lists(&self) -> Lists<'_> {
        Lists::new(&self.gateway)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(&self.gateway)
    }

    pub fn trackables(&self) -> Trackables<'_> {
        Trackables::new(&self.gateway)
    }

    pub fn waypoints(&self) -> Waypoints<'_> {
        Waypoints::new(&self.gateway)
    }

    pub async fn is_authorized(&self) -> bool {
        self.tokens().is_authorized().await
    }

    pub async fn state(&self) -> TokenState {
        self.tokens().state().await
    }

    /// Run the authorization flow now instead of on the first call.
    pub async fn authorize(&self, presenter: &dyn AuthorizationPresenter) -> Result<(), TokenError> {
        self.tokens().authorize(presenter).await
    }

    /// Forget the session, in memory and in the store.
    pub async fn logout(&self) -> Result<(), TokenError> {
        self.tokens().logout().await
    }

    /// Cancel every call in flight. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        self.gateway.cancel_all()
    }
}
