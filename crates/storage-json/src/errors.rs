//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document lock poisoned: {}", .0.display())]
    LockPoisoned(PathBuf),
}

pub type Result<T> = std::result::Result<T, StorageError>;
