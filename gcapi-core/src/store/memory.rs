//! In-memory storage implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{Secret, SecretStore, StoreError};

/// In-memory store for tests and ephemeral sessions.
///
/// Data is lost when the process exits, so a client built on this store asks
/// the user to authorize again on every start.
pub struct MemoryStore {
    data: RwLock<HashMap<String, Secret>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Create a memory store with initial data.
    pub fn with_data(data: HashMap<String, Secret>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    fn poisoned(e: impl std::fmt::Display) -> StoreError {
        StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.data.read().map(|d| d.len()).unwrap_or(0);
        f.debug_struct("MemoryStore")
            .field("keys_count", &count)
            .finish()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        let data = self.data.read().map_err(Self::poisoned)?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(Self::poisoned)?;
        data.insert(key.to_string(), secret.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(Self::poisoned)?;
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_overwrites_slot() {
        let store = MemoryStore::new();

        store.set("authState", &Secret::new("first")).await.unwrap();
        store.set("authState", &Secret::new("second")).await.unwrap();

        let retrieved = store.get("authState").await.unwrap();
        assert_eq!(retrieved.unwrap().expose(), "second");
    }

    #[tokio::test]
    async fn test_memory_store_get_nonexistent() {
        let store = MemoryStore::new();
        let result = store.get("nonexistent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_memory_store_delete_is_idempotent() {
        let store = MemoryStore::new();

        store.set("authState", &Secret::new("blob")).await.unwrap();
        store.delete("authState").await.unwrap();
        store.delete("authState").await.unwrap();

        assert!(!store.exists("authState").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_with_data() {
        let mut seed = HashMap::new();
        seed.insert("authState".to_string(), Secret::new("seeded"));
        let store = MemoryStore::with_data(seed);

        assert!(store.exists("authState").await.unwrap());
    }
}
