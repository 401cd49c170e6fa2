pub mod chunk;
pub mod config;
pub mod error;
pub mod http;
pub mod progress;
pub mod retry;
pub mod session;
pub mod source;
pub mod transfer;
pub mod uploader;

pub use chunk::ChunkPlan;
pub use config::Config;
pub use error::UploadError;
pub use http::HttpTransferClient;
pub use progress::{LogObserver, ProgressBarObserver};
pub use retry::RetryPolicy;
pub use session::{FileIdentity, UploadSession};
pub use source::SourceFile;
pub use transfer::{ChunkAck, CompleteResult, InitResponse, TransferClient, TransferStatus};
pub use uploader::{
    validate_format, NoopObserver, PauseHandle, ResumableUploader, UploadObserver, UploadProgress,
    UploadState,
};

// Re-export commonly used types
pub use tokio;
pub use bytes;
