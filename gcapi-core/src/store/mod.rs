//! Persistence backends for the authorization session.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`SecretStore`] - Trait for key-value storage backends
//! - [`MemoryStore`] - In-memory implementation for testing
//! - [`FileStore`] - JSON document in the platform data directory
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_store`] - Helper to select a backend
//!
//! The client only ever writes one slot (see
//! [`AUTH_STATE_KEY`](crate::token_store::AUTH_STATE_KEY)); the key-value shape
//! mirrors the host settings storage the session blob lives in.
//!
//! # Example
//!
//! ```rust,ignore
//! use gcapi_core::store::{Secret, SecretStore, StoreBackend, create_store};
//!
//! let store = create_store(&StoreBackend::Keyring);
//! store.set("authState", &Secret::new("{...}")).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod file;
mod memory;
#[cfg(feature = "keyring-store")]
mod keyring;

pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the buffer is wiped when the secret is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for secret store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },

    /// No platform data directory could be determined.
    #[error("data directory not available")]
    DataDirUnavailable,
}

/// Abstraction over key-value storage backends.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Retrieve a secret by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError>;

    /// Store a secret at the given key.
    ///
    /// Overwrites any existing value.
    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError>;

    /// Delete a secret by key.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists without retrieving the value.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Which backend [`create_store`] should build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local storage; nothing survives a restart.
    Memory,
    /// OS keyring, falling back to the default file store when unavailable.
    Keyring,
    /// JSON file at the given path.
    File(PathBuf),
}

/// Create a secret store for the requested backend.
///
/// A keyring request degrades to the default [`FileStore`] (and then to
/// [`MemoryStore`]) with a warning rather than failing, so the client keeps
/// working on headless hosts.
pub fn create_store(backend: &StoreBackend) -> Box<dyn SecretStore> {
    match backend {
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory session storage");
            Box::new(MemoryStore::new())
        }
        StoreBackend::File(path) => {
            tracing::debug!("Using file session storage at {:?}", path);
            Box::new(FileStore::new(path.clone()))
        }
        StoreBackend::Keyring => {
            #[cfg(feature = "keyring-store")]
            match KeyringStore::try_new("gcapi") {
                Ok(store) => {
                    tracing::info!("Using OS keyring for session storage");
                    return Box::new(store);
                }
                Err(e) => {
                    tracing::warn!("Keyring unavailable ({}), falling back to file store", e);
                }
            }

            #[cfg(not(feature = "keyring-store"))]
            tracing::warn!("Keyring storage requested but keyring-store feature not enabled");

            match FileStore::default_location() {
                Ok(store) => Box::new(store),
                Err(e) => {
                    tracing::warn!(
                        "No data directory ({}), session will not persist across restarts",
                        e
                    );
                    Box::new(MemoryStore::new())
                }
            }
        }
    }
}
