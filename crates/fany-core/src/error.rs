use thiserror::Error;

/// Top-level error type for Fany IA.
///
/// Subsystem crates define their own error types and convert into this one
/// where they cross crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FanyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for FanyError {
    fn from(err: toml::de::Error) -> Self {
        FanyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FanyError {
    fn from(err: toml::ser::Error) -> Self {
        FanyError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for FanyError {
    fn from(err: serde_json::Error) -> Self {
        FanyError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Fany operations.
pub type Result<T> = std::result::Result<T, FanyError>;
