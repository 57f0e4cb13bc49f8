use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("data inconsistency: {0}")]
    DataInconsistency(String),

    #[error("invalid bucket name {0:?}: names must be 1 to 254 bytes long")]
    InvalidBucketName(String),

    #[error("rocksdb error {0}")]
    DbError(#[from] rocksdb::Error),

    #[error("bincode error {0}")]
    DeserializationError(#[from] Box<bincode::ErrorKind>),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait StoreErrorPredicates {
    /// Returns `true` for device or encoding failures, which may go away when retried.
    fn is_storage_fault(&self) -> bool;
}

impl StoreErrorPredicates for StoreError {
    fn is_storage_fault(&self) -> bool {
        matches!(self, StoreError::DbError(_) | StoreError::DeserializationError(_))
    }
}
