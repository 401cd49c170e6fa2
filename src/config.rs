use std::path::Path;
use std::fs;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::error::UploadError;
use crate::retry::RetryPolicy;

// Chunking constants
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024; // 1MB
pub const CLI_CHUNK_SIZE: u64 = 2 * 1024 * 1024; // 2MB, what the upload page uses

// Network constants
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const MAX_RETRY_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY_MS: u64 = 1000;

// Monitoring constants
pub const PROGRESS_BAR_ENABLED: bool = true;

/// Extensions accepted by the upload endpoint, compared case-insensitively.
pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] =
    &["mp4", "webm", "mov", "avi", "mkv", "flv", "wmv", "m4v"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub chunk_size: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub progress_bar_enabled: bool,
}

impl Config {
    pub fn load_or_create(path: &Path) -> Result<Self, UploadError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.upload.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            info!("Created default config file at {:?}", path);
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), UploadError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upload: UploadConfig {
                chunk_size: CLI_CHUNK_SIZE,
                ..UploadConfig::default()
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: MAX_RETRY_ATTEMPTS,
            retry_base_delay_ms: RETRY_DELAY_MS,
            progress_bar_enabled: PROGRESS_BAR_ENABLED,
        }
    }
}

impl UploadConfig {
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.chunk_size == 0 {
            return Err(UploadError::ConfigError(
                "upload.chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}
