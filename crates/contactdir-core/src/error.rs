use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate entry id: {0}")]
    DuplicateId(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
