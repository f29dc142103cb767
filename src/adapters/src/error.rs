//! Storage adapter errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use warden_authz::AuthzError;

/// Errors raised while reading or writing stored policies
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Reading or writing the policy file failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file type is neither JSON nor YAML
    #[error("Unsupported policy file type: {0}")]
    UnsupportedFileType(String),
}

impl AdapterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<AdapterError> for AuthzError {
    fn from(err: AdapterError) -> Self {
        AuthzError::storage(err)
    }
}

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;
