/// Error types for mesh building, transforms and configuration
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning model text into a [`Mesh`](crate::Mesh).
///
/// Any of these aborts the whole build; no partial mesh is returned.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: vertex index {index} is out of range (model has {count} vertices)")]
    Index { line: usize, index: i64, count: usize },

    #[error("model is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MeshError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        MeshError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Source line the error points at, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            MeshError::Parse { line, .. } | MeshError::Index { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Invalid parameters handed to a matrix constructor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("invalid projection parameters: {0}")]
    Domain(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
