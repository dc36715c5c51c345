// src/pipeline/init.rs

//! Out-of-band cursor initialization.

use crate::error::{AppError, Result};
use crate::models::Cursor;
use crate::storage::CursorStore;

/// Write the starting cursor.
///
/// Refuses to overwrite an existing cursor unless `force` is set.
pub async fn run_init(store: &dyn CursorStore, cursor: Cursor, force: bool) -> Result<Cursor> {
    if store.is_initialized().await? {
        if !force {
            return Err(AppError::AlreadyInitialized {
                location: store.location(),
            });
        }
        match store.load().await {
            Ok(previous) => log::warn!(
                "Overwriting cursor at {} (was after={}, index={})",
                store.location(),
                previous.after,
                previous.index
            ),
            Err(e) => log::warn!(
                "Overwriting unreadable cursor at {}: {}",
                store.location(),
                e
            ),
        }
    }

    store.initialize(cursor).await?;
    log::info!(
        "Cursor initialized at {}: after={}, index={}",
        store.location(),
        cursor.after,
        cursor.index
    );
    Ok(cursor)
}
