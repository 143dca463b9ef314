//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Docx template errors
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Not a zip archive: {0}")]
    Container(String),

    #[error("Missing document part: {0}")]
    MissingPart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
