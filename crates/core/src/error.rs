use thiserror::Error;

pub type MdmResult<T> = Result<T, MdmError>;

#[derive(Error, Debug)]
pub enum MdmError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Records belong to different golden records: {0}")]
    ConflictingGoldens(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Matching run cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
