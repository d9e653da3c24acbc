use valya_types::BlockId;

/// Errors from block store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested block was not found.
    #[error("block not found: {0}")]
    NotFound(BlockId),

    /// The block is already stored. Content addressing makes this harmless.
    #[error("block already exists: {0}")]
    AlreadyExists(BlockId),

    /// The backend could not complete the operation.
    #[error("unable to complete operation: {0}")]
    Unable(String),

    /// Stored data does not hash to its identifier.
    #[error("corrupt block {id}: {reason}")]
    Corrupt { id: BlockId, reason: String },

    /// The operation is not offered by this store.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
