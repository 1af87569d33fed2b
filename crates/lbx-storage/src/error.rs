use lbx_types::RawError;

/// Errors from storage operations.
///
/// None of these are recovered inside the storage layer; callers branch on
/// them. [`NotFound`](StorageError::NotFound) means the data is absent,
/// [`NotImplemented`](StorageError::NotImplemented) means the backend lacks
/// the capability.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No record exists for `(kind, id)`.
    #[error("cannot find object: {kind}_{id}")]
    NotFound { kind: String, id: String },

    /// The backend does not support this operation.
    #[error("{operation} is not implemented by the {backend} backend")]
    NotImplemented {
        backend: &'static str,
        operation: &'static str,
    },

    /// The backend is unreachable or rejected the credentials.
    #[error("connection error: {0}")]
    Connection(String),

    /// An operation was issued before `init()` completed.
    #[error("{backend} storage used before init()")]
    NotInitialized { backend: &'static str },

    /// A record could not be converted to or from its raw form.
    #[error("raw conversion error: {0}")]
    Raw(#[from] RawError),

    /// I/O error from the underlying storage medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record could not be decoded.
    #[error("corrupt record at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// Backend-specific failure (lock poisoning, driver errors).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

pub(crate) fn lock_poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Backend(format!("lock poisoned: {e}"))
}
