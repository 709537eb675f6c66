use std::path::PathBuf;

use thiserror::Error;

use crate::signature::Architecture;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid signature token '{token}' at index {index}: {reason}")]
    Compile {
        token: String,
        index: usize,
        reason: String,
    },

    #[error("No signatures registered for {0} architecture")]
    NoSignatures(Architecture),

    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid executable image: {0}")]
    InvalidImage(String),

    #[error("No backup file found at {}", .0.display())]
    BackupNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn compile(token: &str, index: usize, reason: impl Into<String>) -> Self {
        Error::Compile {
            token: token.to_string(),
            index,
            reason: reason.into(),
        }
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
