//! Sync error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by dashboard mutation operations.
///
/// Store failures propagate unchanged; there is no retry and nothing to
/// roll back, since no local state is touched before the store
/// acknowledges a write.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}
