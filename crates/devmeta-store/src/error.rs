//! Error types for catalog loading

use thiserror::Error;

/// Errors that can occur while loading a catalog
#[derive(Debug, Error)]
pub enum StoreError {
    /// File extension is neither YAML nor JSON
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),

    /// Two entries share an id
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for catalog loading
pub type StoreResult<T> = Result<T, StoreError>;
