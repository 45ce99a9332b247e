//! Audit errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl AuditError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the run must stop regardless of skip-and-continue policy
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuditError::Authentication(_) | AuditError::Io { .. })
    }
}
