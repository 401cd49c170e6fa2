use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use reel_upload::{
    Config, HttpTransferClient, LogObserver, ProgressBarObserver, ResumableUploader, SourceFile,
    UploadError, UploadObserver,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML format)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a video file, resuming whatever the server already has
    Upload {
        /// Path to the video file
        #[arg(short, long)]
        file: PathBuf,

        /// Override the configured chunk size (bytes)
        #[arg(long)]
        chunk_size: Option<u64>,
    },
    /// Show the server's view of an upload session
    Status {
        /// Session id returned by the server at init
        #[arg(short, long)]
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = Config::load_or_create(&cli.config)?;

    match cli.command {
        Commands::Upload { file, chunk_size } => {
            if let Some(chunk_size) = chunk_size {
                config.upload.chunk_size = chunk_size;
            }
            run_upload(config, file).await?
        }
        Commands::Status { session } => run_status(config, &session).await?,
    }

    Ok(())
}

async fn run_upload(config: Config, file_path: PathBuf) -> Result<(), UploadError> {
    let source = SourceFile::open(&file_path)?;
    info!("Starting upload of {} ({} bytes)", file_path.display(), source.size());

    let observer: Arc<dyn UploadObserver> = if config.upload.progress_bar_enabled {
        Arc::new(ProgressBarObserver::new(source.name()))
    } else {
        Arc::new(LogObserver)
    };

    let client = HttpTransferClient::new(&config.server)?;
    let uploader = ResumableUploader::new(client, &config.upload)?.with_observer(observer);

    // Ctrl-C pauses at the next chunk boundary instead of killing an in-flight send.
    let pause = uploader.pause_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, pausing after the current chunk");
            pause.pause();
        }
    });

    let result = uploader.upload(&source).await;
    ctrl_c.abort();

    match result {
        Ok(complete) => {
            info!("Uploaded as {}", complete.filename);
            if let Some(url) = complete.url {
                info!("Available at {}", url);
            }
            Ok(())
        }
        Err(e) if e.is_paused() => {
            let session = uploader.session_id().await.unwrap_or_default();
            // The server issues a fresh session on every init, so nothing
            // acknowledged here carries over to another run.
            warn!(
                "Upload paused with {} chunks acknowledged in session {}. \
                 A new run starts a fresh session and sends every chunk again.",
                uploader.acknowledged_chunks().await.len(),
                session
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn run_status(config: Config, session_id: &str) -> Result<(), UploadError> {
    use reel_upload::TransferClient;

    let client = HttpTransferClient::new(&config.server)?;
    let status = client.status(session_id).await?;

    println!("{}", serde_json::to_string_pretty(&status)?);
    info!(
        "{}: {}/{} chunks ({:.1}%), {}",
        status.filename,
        status.uploaded_chunks.len(),
        status.total_chunks,
        status.percent(),
        status.status
    );
    Ok(())
}
