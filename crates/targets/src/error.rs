//! Error types for `agentgate-targets`.

use thiserror::Error;

/// Main error type for gateway target provisioning.
#[derive(Error, Debug)]
pub enum TargetError {
    /// Configuration errors (missing file, invalid JSON, empty fields).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gateway control-plane errors (lookup, target creation, readiness).
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Credential provider errors.
    #[error("Credential provider error: {0}")]
    Credential(String),

    /// IAM errors (role creation, policy attachment).
    #[error("IAM error: {0}")]
    Iam(String),

    /// Lambda errors (function creation, permissions, tool schema).
    #[error("Lambda error: {0}")]
    Lambda(String),

    /// `OpenAPI` document errors (not a mapping, cannot be serialized).
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    #[error("OpenAPI error: failed to read document '{path}': {source}")]
    DocumentReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenAPI error: failed to parse document from '{location}': {source}")]
    DocumentParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip packaging errors.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, TargetError>;
