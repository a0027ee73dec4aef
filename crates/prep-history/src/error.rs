use prep_lock::LockError;
use prep_model::ModelError;
use prep_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("preparation '{0}' does not exist")]
    PreparationNotFound(String),

    #[error("step '{0}' does not exist in this history")]
    StepNotFound(String),

    #[error("the root step cannot be deleted")]
    RootStepCannotBeDeleted,

    #[error("the root step cannot be updated")]
    RootStepCannotBeUpdated,

    #[error("step '{step_id}' looks up data set '{data_set_id}', which no longer exists")]
    DeletedLookupDataSet { step_id: String, data_set_id: String },

    #[error("preparation '{preparation_id}' is locked by '{owner}'")]
    Locked { preparation_id: String, owner: String },

    #[error("invalid step to append: {0}")]
    InvalidAppendStep(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lock(LockError),
}

impl HistoryError {
    /// Not-found and invalid-operation errors are final; store failures and
    /// lock contention may go away.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Locked { .. } => true,
            Self::Store(error) => error.is_retryable(),
            Self::Lock(error) => error.is_retryable(),
            Self::PreparationNotFound(_)
            | Self::StepNotFound(_)
            | Self::RootStepCannotBeDeleted
            | Self::RootStepCannotBeUpdated
            | Self::DeletedLookupDataSet { .. }
            | Self::InvalidAppendStep(_)
            | Self::Model(_) => false,
        }
    }
}

impl From<LockError> for HistoryError {
    fn from(error: LockError) -> Self {
        match error {
            LockError::Contention { resource_id, owner } => Self::Locked {
                preparation_id: resource_id,
                owner,
            },
            other => Self::Lock(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
