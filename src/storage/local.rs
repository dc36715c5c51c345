//! Local filesystem cursor storage.
//!
//! Each field lives in its own JSON file and is replaced atomically
//! (write to temp, fsync, rename, fsync directory), so an interrupted write
//! never leaves a torn value behind.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Cursor;
use crate::storage::CursorStore;

const AFTER_KEY: &str = "after.json";
const INDEX_KEY: &str = "index.json";

/// Local filesystem cursor backend.
#[derive(Debug, Clone)]
pub struct LocalCursorStore {
    root_dir: PathBuf,
}

impl LocalCursorStore {
    /// Create a new store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        self.sync_dir().await
    }

    /// Flush the directory entry so a completed rename survives power loss.
    #[cfg(unix)]
    async fn sync_dir(&self) -> Result<()> {
        tokio::fs::File::open(&self.root_dir).await?.sync_all().await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn sync_dir(&self) -> Result<()> {
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CursorStore for LocalCursorStore {
    async fn load(&self) -> Result<Cursor> {
        let after: Option<i64> = self.read_json(AFTER_KEY).await?;
        let index: Option<usize> = self.read_json(INDEX_KEY).await?;

        match (after, index) {
            (Some(after), Some(index)) => Ok(Cursor::new(after, index)),
            _ => Err(AppError::store_not_initialized(self.location())),
        }
    }

    async fn set_after(&self, after: i64) -> Result<()> {
        self.write_json(AFTER_KEY, &after).await
    }

    async fn set_index(&self, index: usize) -> Result<()> {
        self.write_json(INDEX_KEY, &index).await
    }

    async fn is_initialized(&self) -> Result<bool> {
        let after = self.read_bytes(AFTER_KEY).await?;
        let index = self.read_bytes(INDEX_KEY).await?;
        Ok(after.is_some() && index.is_some())
    }

    fn location(&self) -> String {
        self.root_dir.display().to_string()
    }
}
