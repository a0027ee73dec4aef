use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid column id '{0}': expected a decimal number")]
    InvalidColumnId(String),
    #[error("column id {0} is out of range")]
    ColumnIdOutOfRange(i64),
    #[error("column '{0}' does not exist")]
    UnknownColumn(String),
    #[error("failed to serialize {kind} content: {message}")]
    Serialization { kind: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
