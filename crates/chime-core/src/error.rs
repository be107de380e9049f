use thiserror::Error;

/// Top-level error type for the Chime system.
///
/// Covers configuration, startup, and serialization failures. Engine and
/// API errors have their own types and never need to pass through here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChimeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ChimeError {
    fn from(err: toml::de::Error) -> Self {
        ChimeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ChimeError {
    fn from(err: toml::ser::Error) -> Self {
        ChimeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ChimeError {
    fn from(err: serde_json::Error) -> Self {
        ChimeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Chime operations.
pub type Result<T> = std::result::Result<T, ChimeError>;
