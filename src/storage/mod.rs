//! Storage abstraction for crawl-progress persistence.
//!
//! The checkpoint is one flat JSON document, loaded once at startup and
//! rewritten wholesale after every state-changing step. The trait is the
//! seam where a different representation (or a test double) slots in.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Checkpoint;

// Re-export for convenience
pub use local::LocalCheckpointStore;

/// Trait for checkpoint storage backends.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the persisted checkpoint, or a fresh one (page 1, today,
    /// empty) if no usable document exists.
    async fn load_or_default(&self) -> Checkpoint;

    /// Persist the checkpoint, replacing the previous document.
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
}
