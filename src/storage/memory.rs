//! In-process cursor storage.
//!
//! Each field write is a single atomic store. Nothing survives the process;
//! used for previews and tests.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::Cursor;
use crate::storage::CursorStore;

#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    after: AtomicI64,
    index: AtomicUsize,
    has_after: AtomicBool,
    has_index: AtomicBool,
}

impl MemoryCursorStore {
    /// An uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `cursor`.
    pub fn with_cursor(cursor: Cursor) -> Self {
        Self {
            after: AtomicI64::new(cursor.after),
            index: AtomicUsize::new(cursor.index),
            has_after: AtomicBool::new(true),
            has_index: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self) -> Result<Cursor> {
        if !self.has_after.load(Ordering::SeqCst) || !self.has_index.load(Ordering::SeqCst) {
            return Err(AppError::store_not_initialized(self.location()));
        }
        Ok(Cursor::new(
            self.after.load(Ordering::SeqCst),
            self.index.load(Ordering::SeqCst),
        ))
    }

    async fn set_after(&self, after: i64) -> Result<()> {
        self.after.store(after, Ordering::SeqCst);
        self.has_after.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn set_index(&self, index: usize) -> Result<()> {
        self.index.store(index, Ordering::SeqCst);
        self.has_index.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn is_initialized(&self) -> Result<bool> {
        Ok(self.has_after.load(Ordering::SeqCst) && self.has_index.load(Ordering::SeqCst))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
