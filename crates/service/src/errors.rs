use thiserror::Error;

/// Failures of record store operations.
///
/// Every variant is scoped to a single request; none of them leaves the store
/// unusable for other players.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("invalid credential")]
    InvalidCredential,
    /// I/O failure, a present but unreadable record, or a serialization error.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn invalid(msg: impl Into<String>) -> Self { Self::InvalidInput(msg.into()) }

    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{context}: {err}"))
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            StoreError::InvalidInput(_) => 1001,
            StoreError::AlreadyExists(_) => 1002,
            StoreError::NotFound(_) => 1003,
            StoreError::InvalidCredential => 1004,
            StoreError::Storage(_) => 1200,
        }
    }

    /// Stable kind name, used as the `error` field of HTTP failure bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::InvalidInput(_) => "InvalidInput",
            StoreError::AlreadyExists(_) => "AlreadyExists",
            StoreError::NotFound(_) => "NotFound",
            StoreError::InvalidCredential => "InvalidCredential",
            StoreError::Storage(_) => "StorageFailure",
        }
    }

    /// Whether the caller is at fault (as opposed to the storage medium).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, StoreError::Storage(_))
    }
}
