//! JSON file-backed storage implementation.
//!
//! The file lives at `~/.local/share/gcapi/session.json` on Linux (platform
//! equivalents elsewhere) and holds a small versioned map of key to value.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{Secret, SecretStore, StoreError};

/// On-disk document layout.
#[derive(Debug, Serialize, Deserialize)]
struct FileStoreData {
    /// Version of the file format (for future migrations).
    version: u32,

    entries: BTreeMap<String, Secret>,
}

const FILE_FORMAT_VERSION: u32 = 1;

impl FileStoreData {
    fn empty() -> Self {
        Self {
            version: FILE_FORMAT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Store that keeps every key in a single JSON document.
///
/// Writes replace the whole file. Access is serialized through an async
/// mutex so concurrent `set` calls cannot interleave their read-modify-write.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by the given file. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at the platform data directory.
    pub fn default_location() -> Result<Self, StoreError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Platform-specific default path of the session file.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs = directories::ProjectDirs::from("com", "mustcode", "gcapi")
            .ok_or(StoreError::DataDirUnavailable)?;
        Ok(dirs.data_dir().join("session.json"))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. A missing or unparseable file reads as empty; the
    /// next write replaces it.
    async fn read(&self) -> Result<FileStoreData, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(data) => Ok(data),
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable store file {}: {}",
                        self.path.display(),
                        e
                    );
                    Ok(FileStoreData::empty())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileStoreData::empty()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the document to a sibling temp file, then rename it over the
    /// target.
    async fn write(&self, data: &FileStoreData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(data)?;
        let tmp_path = self.tmp_path();

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish()
    }
}

#[async_trait]
impl SecretStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        let _guard = self.lock.lock().await;
        let data = self.read().await?;
        Ok(data.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.read().await?;
        data.version = FILE_FORMAT_VERSION;
        data.entries.insert(key.to_string(), secret.clone());
        self.write(&data).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.read().await?;
        if data.entries.remove(key).is_none() {
            return Ok(());
        }
        self.write(&data).await
    }
}
