use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Session negotiated by `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitResponse {
    pub session_id: String,
    /// Chunk indices the server already holds for this file, possibly from
    /// an earlier interrupted attempt.
    pub acknowledged: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkAck {
    /// Server-side view of progress, if reported.
    pub progress: Option<f64>,
}

/// Result of a finished upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteResult {
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "videoInfo")]
    pub video_info: Option<serde_json::Value>,
}

/// Upload session state as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferStatus {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub chunk_size: u64,
    #[serde(default)]
    pub uploaded_chunks: Vec<u64>,
    #[serde(default)]
    pub total_chunks: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl TransferStatus {
    pub fn percent(&self) -> f64 {
        if self.total_chunks == 0 {
            return 0.0;
        }
        self.uploaded_chunks.len() as f64 / self.total_chunks as f64 * 100.0
    }
}

/// Network boundary of the uploader.
///
/// Implementations report a rejected request with the operation's own
/// error (`InitFailed`, `ChunkSendFailed`, `CompleteFailed`,
/// `StatusFailed`) and a network fault with `Transport`.
#[async_trait]
pub trait TransferClient: Send + Sync {
    async fn init(
        &self,
        filename: &str,
        file_size: u64,
        chunk_size: u64,
    ) -> Result<InitResponse, UploadError>;

    async fn send_chunk(
        &self,
        session_id: &str,
        chunk_index: u64,
        payload: Bytes,
    ) -> Result<ChunkAck, UploadError>;

    async fn complete(
        &self,
        session_id: &str,
        filename: &str,
    ) -> Result<CompleteResult, UploadError>;

    async fn status(&self, session_id: &str) -> Result<TransferStatus, UploadError>;
}

#[async_trait]
impl<T: TransferClient + ?Sized> TransferClient for std::sync::Arc<T> {
    async fn init(
        &self,
        filename: &str,
        file_size: u64,
        chunk_size: u64,
    ) -> Result<InitResponse, UploadError> {
        (**self).init(filename, file_size, chunk_size).await
    }

    async fn send_chunk(
        &self,
        session_id: &str,
        chunk_index: u64,
        payload: Bytes,
    ) -> Result<ChunkAck, UploadError> {
        (**self).send_chunk(session_id, chunk_index, payload).await
    }

    async fn complete(
        &self,
        session_id: &str,
        filename: &str,
    ) -> Result<CompleteResult, UploadError> {
        (**self).complete(session_id, filename).await
    }

    async fn status(&self, session_id: &str) -> Result<TransferStatus, UploadError> {
        (**self).status(session_id).await
    }
}
