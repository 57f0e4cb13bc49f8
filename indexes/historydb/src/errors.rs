use thiserror::Error;

use crate::IDENT;
use visor_database::prelude::{StoreError, StoreErrorPredicates};

/// Errors originating from the [`HistoryIndex`](crate::HistoryIndex).
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The derived indices contradict the block being applied or reverted.
    /// Forward progress must stop until the index is rebuilt.
    #[error("[{IDENT}]: index corruption: {0}")]
    IndexCorruption(String),

    #[error("[{IDENT}]: expected block at height {expected}, got block at height {got}")]
    UnexpectedHeight { expected: i64, got: u64 },

    #[error("[{IDENT}]: cannot roll back to height {0}")]
    InvalidRollbackHeight(i64),

    #[error("[{IDENT}]: block at height {0} is not available from the chain")]
    MissingBlock(u64),

    #[error("[{IDENT}]: {0}")]
    StoreAccessError(#[from] StoreError),

    #[error("[{IDENT}]: blocking task failed: {0}")]
    TaskError(String),
}

impl HistoryError {
    /// Errors after which the index must not accept further blocks
    pub fn is_fatal(&self) -> bool {
        match self {
            HistoryError::IndexCorruption(_) | HistoryError::MissingBlock(_) => true,
            HistoryError::StoreAccessError(err) => !err.is_storage_fault(),
            _ => false,
        }
    }

    /// Storage faults, which are worth retrying with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, HistoryError::StoreAccessError(err) if err.is_storage_fault())
    }
}

/// Results originating from the [`HistoryIndex`](crate::HistoryIndex).
pub type HistoryResult<T> = Result<T, HistoryError>;
