use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::error::UploadError;
use crate::transfer::CompleteResult;
use crate::uploader::{UploadObserver, UploadProgress};

/// Terminal progress bar over chunk indices.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new(filename: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} chunks ({percent}%) - {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(format!("Sending: {}", filename));
        Self { bar }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl UploadObserver for ProgressBarObserver {
    fn on_progress(&self, progress: &UploadProgress) {
        self.bar.set_length(progress.chunk_count);
        self.bar.set_position(progress.chunk_index + 1);
    }

    fn on_complete(&self, result: &CompleteResult) {
        self.bar.finish_with_message(format!("✅ {}", result.filename));
    }

    fn on_error(&self, error: &UploadError) {
        if error.is_paused() {
            self.bar.abandon_with_message("⏸ Paused".to_string());
        } else {
            self.bar.abandon_with_message(format!("❌ {}", error));
        }
    }
}

/// Reports through `tracing` when no progress bar is wanted.
#[derive(Debug, Default)]
pub struct LogObserver;

impl UploadObserver for LogObserver {
    fn on_progress(&self, progress: &UploadProgress) {
        info!(
            "chunk {}/{} ({:.1}%)",
            progress.chunk_index + 1,
            progress.chunk_count,
            progress.percent
        );
    }

    fn on_complete(&self, result: &CompleteResult) {
        info!("Upload complete: {}", result.filename);
    }

    fn on_error(&self, error: &UploadError) {
        if error.is_paused() {
            info!("Upload paused");
        } else {
            error!("Upload failed: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_tracks_chunks() {
        let observer = ProgressBarObserver::new("movie.mp4");
        observer.bar().set_draw_target(indicatif::ProgressDrawTarget::hidden());

        observer.on_progress(&UploadProgress {
            percent: 20.0,
            chunk_index: 0,
            chunk_count: 5,
        });
        assert_eq!(observer.bar().position(), 1);

        observer.on_progress(&UploadProgress {
            percent: 100.0,
            chunk_index: 4,
            chunk_count: 5,
        });
        assert_eq!(observer.bar().position(), 5);

        observer.on_complete(&CompleteResult {
            filename: "movie.mp4".to_string(),
            url: None,
            video_info: None,
        });
        assert!(observer.bar().is_finished());
    }

    #[test]
    fn test_progress_bar_abandoned_on_pause() {
        let observer = ProgressBarObserver::new("movie.mp4");
        observer.bar().set_draw_target(indicatif::ProgressDrawTarget::hidden());

        observer.on_error(&UploadError::UploadPaused);
        assert!(observer.bar().is_finished());
    }
}
