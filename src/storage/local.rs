//! Local filesystem checkpoint store.
//!
//! One pretty-printed JSON document, written atomically (temp file then
//! rename) so an interrupted run never leaves a torn checkpoint behind.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Checkpoint;
use crate::storage::CheckpointStore;
use crate::utils::log;

/// Filesystem-backed checkpoint store.
#[derive(Debug, Clone)]
pub struct LocalCheckpointStore {
    path: PathBuf,
}

impl LocalCheckpointStore {
    /// Create a store persisting to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the raw document, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl CheckpointStore for LocalCheckpointStore {
    async fn load_or_default(&self) -> Checkpoint {
        match self.read_bytes().await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(checkpoint) => checkpoint,
                Err(e) => {
                    log::warn(&format!(
                        "Checkpoint at {:?} is unreadable: {}. Starting fresh.",
                        self.path, e
                    ));
                    Checkpoint::starting()
                }
            },
            Ok(None) => {
                log::info(&format!(
                    "No checkpoint at {:?}; starting a new crawl",
                    self.path
                ));
                Checkpoint::starting()
            }
            Err(e) => {
                log::warn(&format!(
                    "Checkpoint read failed from {:?}: {}. Starting fresh.",
                    self.path, e
                ));
                Checkpoint::starting()
            }
        }
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        self.write_bytes(&bytes).await
    }
}
