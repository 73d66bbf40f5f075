//! Client construction from command-line options.

use anyhow::{Context, Result};
use gcapi_core::oauth::LoopbackPresenter;
use gcapi_core::{
    ApiEndpointConfig, ApiEnvironment, GeocachingClient, OAuthCredentials, SecretStore,
    StoreBackend, create_store,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub environment: ApiEnvironment,
    pub keys: Option<PathBuf>,
    pub session_file: Option<PathBuf>,
}

impl ClientOptions {
    pub fn store_backend(&self) -> StoreBackend {
        match &self.session_file {
            Some(path) => StoreBackend::File(path.clone()),
            None => StoreBackend::Keyring,
        }
    }
}

/// Load the key file and build a client.
///
/// Calls made while logged out open the authorization page through a
/// loopback presenter that prints the URL.
pub fn connect(options: &ClientOptions) -> Result<GeocachingClient> {
    let config = load_config(options.environment, options.keys.as_deref())?;
    let store: Arc<dyn SecretStore> = Arc::from(create_store(&options.store_backend()));

    GeocachingClient::new(config, store, Some(Arc::new(browser_presenter())))
        .context("Failed to create API client")
}

/// Presenter that prints the authorization URL and waits on the redirect port.
pub fn browser_presenter() -> LoopbackPresenter {
    LoopbackPresenter::with_url_handler(|url| {
        println!("Open this URL in your browser to authorize gcapi:");
        println!();
        println!("  {}", url);
        println!();
    })
}

fn load_config(environment: ApiEnvironment, keys: Option<&Path>) -> Result<ApiEndpointConfig> {
    let credentials = OAuthCredentials::load(keys).context("Failed to load API keys")?;
    ApiEndpointConfig::for_environment(environment, &credentials)
        .with_context(|| format!("Incomplete API keys for {}", environment))
}
