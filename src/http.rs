use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::UploadError;
use crate::transfer::{
    ChunkAck, CompleteResult, InitResponse, TransferClient, TransferStatus,
};

#[derive(Debug, Serialize)]
struct InitRequest<'a> {
    filename: &'a str,
    #[serde(rename = "fileSize")]
    file_size: u64,
    #[serde(rename = "chunkSize")]
    chunk_size: u64,
}

#[derive(Debug, Deserialize)]
struct InitBody {
    #[serde(rename = "fileId")]
    file_id: String,
    #[serde(default)]
    status: Option<TransferStatus>,
}

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    #[serde(rename = "fileId")]
    file_id: &'a str,
    filename: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChunkBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    progress: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// `TransferClient` over the media server's `/api/upload/*` endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransferClient {
    client: Client,
    base_url: String,
}

impl HttpTransferClient {
    pub fn new(config: &ServerConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()?;

        info!("HTTP transfer client for {} (timeout {}s)", config.base_url, config.timeout_seconds);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/upload/{}", self.base_url, path)
    }
}

/// Pulls the server's `{"error": ...}` message out of a rejected response.
async fn rejection_message(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) => serde_json::from_str::<ErrorBody>(&text)
            .map(|body| format!("{} ({})", body.error, status))
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, text)),
        Err(_) => format!("HTTP {}", status),
    }
}

#[async_trait]
impl TransferClient for HttpTransferClient {
    async fn init(
        &self,
        filename: &str,
        file_size: u64,
        chunk_size: u64,
    ) -> Result<InitResponse, UploadError> {
        let response = self
            .client
            .post(self.endpoint("init"))
            .json(&InitRequest {
                filename,
                file_size,
                chunk_size,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::InitFailed(rejection_message(response).await));
        }

        let body: InitBody = response.json().await?;
        let acknowledged = body
            .status
            .map(|status| status.uploaded_chunks)
            .unwrap_or_default();

        debug!("init: fileId={}, acknowledged={:?}", body.file_id, acknowledged);

        Ok(InitResponse {
            session_id: body.file_id,
            acknowledged,
        })
    }

    async fn send_chunk(
        &self,
        session_id: &str,
        chunk_index: u64,
        payload: Bytes,
    ) -> Result<ChunkAck, UploadError> {
        let length = payload.len() as u64;
        let part = multipart::Part::stream_with_length(payload, length)
            .file_name("blob")
            .mime_str("application/octet-stream")?;

        let form = multipart::Form::new()
            .text("fileId", session_id.to_string())
            .text("chunkIndex", chunk_index.to_string())
            .part("chunk", part);

        let response = self
            .client
            .post(self.endpoint("chunk"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::ChunkSendFailed(format!(
                "chunk {}: {}",
                chunk_index,
                rejection_message(response).await
            )));
        }

        let body: ChunkBody = response.json().await?;
        if !body.success {
            return Err(UploadError::ChunkSendFailed(format!(
                "chunk {}: server reported failure",
                chunk_index
            )));
        }

        Ok(ChunkAck {
            progress: body.progress,
        })
    }

    async fn complete(
        &self,
        session_id: &str,
        filename: &str,
    ) -> Result<CompleteResult, UploadError> {
        let response = self
            .client
            .post(self.endpoint("complete"))
            .json(&CompleteRequest {
                file_id: session_id,
                filename,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::CompleteFailed(rejection_message(response).await));
        }

        Ok(response.json().await?)
    }

    async fn status(&self, session_id: &str) -> Result<TransferStatus, UploadError> {
        let response = self
            .client
            .get(self.endpoint(&format!("status/{}", session_id)))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(UploadError::StatusFailed(format!(
                "unknown upload session {}",
                session_id
            ))),
            _ => Err(UploadError::StatusFailed(rejection_message(response).await)),
        }
    }
}
