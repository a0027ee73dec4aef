use prep_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("{0} must not be empty")]
    InvalidArgument(&'static str),

    /// Someone else holds the lock.
    #[error("resource '{resource_id}' is locked by '{owner}'")]
    Contention { resource_id: String, owner: String },

    #[error("lock store failure")]
    Store(#[from] StoreError),
}

impl LockError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidArgument(_) => false,
            Self::Contention { .. } => true,
            Self::Store(error) => error.is_retryable(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LockError>;
