use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported video format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload init failed: {0}")]
    InitFailed(String),

    #[error("Chunk send failed: {0}")]
    ChunkSendFailed(String),

    #[error("Chunk {chunk_index} upload failed after retries")]
    ChunkUploadFailed { chunk_index: u64 },

    #[error("Upload paused")]
    UploadPaused,

    #[error("Upload complete failed: {0}")]
    CompleteFailed(String),

    #[error("Status query failed: {0}")]
    StatusFailed(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("A transfer is already in progress on this uploader")]
    TransferInProgress,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialization(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

impl UploadError {
    /// A pause is a cooperative stop, not a failure.
    pub fn is_paused(&self) -> bool {
        matches!(self, UploadError::UploadPaused)
    }
}
