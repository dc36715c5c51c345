//! Storage abstractions for the harvest cursor.
//!
//! The cursor is two independent fields, `after` and `index`. Each field
//! write is atomic and durable on its own, but there is no transaction
//! spanning both: a crash between two writes leaves one field updated and
//! the other not. The harvest loop orders its writes so that such a state
//! replays work instead of skipping it.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml
//! └── cursor/
//!     ├── after.json        # window lower bound, epoch seconds
//!     └── index.json        # position reached in the window's batch
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Cursor;

// Re-export for convenience
pub use local::LocalCursorStore;
pub use memory::MemoryCursorStore;

/// Trait for cursor storage backends.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the persisted cursor.
    ///
    /// Fails with `StoreNotInitialized` if either field was never written.
    async fn load(&self) -> Result<Cursor>;

    /// Durably persist the window lower bound.
    async fn set_after(&self, after: i64) -> Result<()>;

    /// Durably persist the position within the current window.
    async fn set_index(&self, index: usize) -> Result<()>;

    /// Whether both fields have been written.
    async fn is_initialized(&self) -> Result<bool>;

    /// Out-of-band initialization of both fields.
    async fn initialize(&self, cursor: Cursor) -> Result<()> {
        self.set_index(cursor.index).await?;
        self.set_after(cursor.after).await
    }

    /// Human-readable location for logs and errors.
    fn location(&self) -> String;
}
