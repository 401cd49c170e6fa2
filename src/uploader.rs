use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::chunk::ChunkPlan;
use crate::config::{UploadConfig, SUPPORTED_VIDEO_EXTENSIONS};
use crate::error::UploadError;
use crate::retry::RetryPolicy;
use crate::session::{FileIdentity, UploadSession};
use crate::source::SourceFile;
use crate::transfer::{CompleteResult, TransferClient, TransferStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UploadState {
    Idle,
    Validating,
    Initializing,
    Transmitting,
    Paused,
    Completing,
    Done,
    Failed,
}

impl UploadState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => UploadState::Validating,
            2 => UploadState::Initializing,
            3 => UploadState::Transmitting,
            4 => UploadState::Paused,
            5 => UploadState::Completing,
            6 => UploadState::Done,
            7 => UploadState::Failed,
            _ => UploadState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    pub percent: f64,
    pub chunk_index: u64,
    pub chunk_count: u64,
}

/// Receives progress, completion and failure notifications. Called
/// synchronously from the upload loop, so implementations must be quick
/// and must not panic.
pub trait UploadObserver: Send + Sync {
    fn on_progress(&self, _progress: &UploadProgress) {}
    fn on_complete(&self, _result: &CompleteResult) {}
    fn on_error(&self, _error: &UploadError) {}
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

/// Lets another task pause or resume a running upload.
#[derive(Debug, Clone)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn pause(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Fresh,
    Continue,
}

/// Checks the extension after the final `.` against the supported video
/// formats, ignoring case.
pub fn validate_format(filename: &str) -> Result<(), UploadError> {
    let supported = filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            SUPPORTED_VIDEO_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false);

    if supported {
        Ok(())
    } else {
        Err(UploadError::UnsupportedFormat(filename.to_string()))
    }
}

/// Drives one file through init, sequential chunk sends and complete.
///
/// Chunks go out strictly in ascending order, one at a time. Chunks the
/// server already acknowledged are skipped, so a second call after a pause
/// or failure only sends what is missing.
pub struct ResumableUploader<C> {
    client: C,
    chunk_size: u64,
    retry: RetryPolicy,
    observer: Arc<dyn UploadObserver>,
    paused: Arc<AtomicBool>,
    in_flight: AtomicBool,
    state: AtomicU8,
    session: Mutex<Option<UploadSession>>,
}

impl<C: TransferClient> ResumableUploader<C> {
    pub fn new(client: C, config: &UploadConfig) -> Result<Self, UploadError> {
        config.validate()?;
        Ok(Self::with_policy(client, config.chunk_size, config.retry_policy()))
    }

    /// `chunk_size` must be non-zero; `upload` rejects a zero size with
    /// `InvalidInput` before any network call.
    pub fn with_policy(client: C, chunk_size: u64, retry: RetryPolicy) -> Self {
        Self {
            client,
            chunk_size,
            retry,
            observer: Arc::new(NoopObserver),
            paused: Arc::new(AtomicBool::new(false)),
            in_flight: AtomicBool::new(false),
            state: AtomicU8::new(UploadState::Idle as u8),
            session: Mutex::new(None),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> UploadState {
        UploadState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Clears the pause flag. Transmission restarts only when the caller
    /// invokes `upload` or `continue_upload` again.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn pause_handle(&self) -> PauseHandle {
        PauseHandle(Arc::clone(&self.paused))
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.session_id().to_string())
    }

    pub async fn acknowledged_chunks(&self) -> Vec<u64> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.acknowledged().collect())
            .unwrap_or_default()
    }

    /// `None` until a session has been negotiated.
    pub async fn status(&self) -> Result<Option<TransferStatus>, UploadError> {
        match self.session_id().await {
            Some(session_id) => self.client.status(&session_id).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn upload(&self, file: &SourceFile) -> Result<CompleteResult, UploadError> {
        let _guard = self.begin()?;
        let result = self.run(file, Entry::Fresh).await;
        self.finish(file, result)
    }

    /// Re-enters transmission with the held session when it belongs to the
    /// same file, without a new init round trip. Falls back to `upload`
    /// otherwise.
    pub async fn continue_upload(
        &self,
        file: &SourceFile,
    ) -> Result<CompleteResult, UploadError> {
        let _guard = self.begin()?;
        let result = self.run(file, Entry::Continue).await;
        self.finish(file, result)
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, UploadError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("upload rejected: another transfer is running on this uploader");
            return Err(UploadError::TransferInProgress);
        }
        Ok(InFlightGuard(&self.in_flight))
    }

    fn set_state(&self, state: UploadState) {
        let previous = self.state.swap(state as u8, Ordering::SeqCst);
        debug!("upload state {:?} -> {:?}", UploadState::from_u8(previous), state);
    }

    fn identity_of(&self, file: &SourceFile) -> FileIdentity {
        FileIdentity {
            filename: file.name().to_string(),
            file_size: file.size(),
            chunk_size: self.chunk_size,
        }
    }

    async fn run(&self, file: &SourceFile, entry: Entry) -> Result<CompleteResult, UploadError> {
        let identity = self.identity_of(file);

        let resumable = entry == Entry::Continue
            && self
                .session
                .lock()
                .await
                .as_ref()
                .is_some_and(|session| session.identity() == &identity);

        if resumable {
            info!("Continuing upload of {} with held session", file.name());
        } else {
            self.set_state(UploadState::Validating);
            validate_format(file.name())?;
            let plan = ChunkPlan::new(file.size(), self.chunk_size)?;

            self.set_state(UploadState::Initializing);
            self.initialize(identity, plan).await?;
        }

        self.set_state(UploadState::Transmitting);
        self.transmit(file).await?;

        self.set_state(UploadState::Completing);
        let session_id = {
            let held = self.session.lock().await;
            let session = held
                .as_ref()
                .ok_or_else(|| UploadError::InvalidInput("no upload session".to_string()))?;
            if !session.is_complete() {
                return Err(UploadError::InvalidInput(format!(
                    "{}/{} chunks acknowledged, refusing to complete",
                    session.acknowledged_count(),
                    session.plan().chunk_count()
                )));
            }
            session.session_id().to_string()
        };
        let result = self.client.complete(&session_id, file.name()).await?;

        *self.session.lock().await = None;
        Ok(result)
    }

    async fn initialize(&self, identity: FileIdentity, plan: ChunkPlan) -> Result<(), UploadError> {
        info!(
            "Initializing upload of {} ({} bytes, {} chunks of {} bytes)",
            identity.filename,
            identity.file_size,
            plan.chunk_count(),
            plan.chunk_size()
        );

        let response = self
            .client
            .init(&identity.filename, identity.file_size, identity.chunk_size)
            .await?;

        let mut session =
            UploadSession::new(response.session_id, identity, plan, response.acknowledged);

        let mut held = self.session.lock().await;
        if let Some(previous) = held.take() {
            if previous.session_id() == session.session_id()
                && previous.identity() == session.identity()
            {
                session.merge_acknowledged(previous.acknowledged());
            }
        }

        info!(
            "Upload session {}: {}/{} chunks already acknowledged",
            session.session_id(),
            session.acknowledged_count(),
            plan.chunk_count()
        );
        *held = Some(session);
        Ok(())
    }

    async fn transmit(&self, file: &SourceFile) -> Result<(), UploadError> {
        let (session_id, plan) = {
            let held = self.session.lock().await;
            let session = held
                .as_ref()
                .ok_or_else(|| UploadError::InvalidInput("no upload session".to_string()))?;
            (session.session_id().to_string(), *session.plan())
        };
        let chunk_count = plan.chunk_count();
        if plan.is_empty() {
            debug!("{} is empty, nothing to transmit", file.name());
        }

        for (index, range) in plan.ranges() {
            if self.is_paused() {
                self.set_state(UploadState::Paused);
                info!("Upload paused before chunk {}/{}", index, chunk_count);
                return Err(UploadError::UploadPaused);
            }

            let already_acknowledged = self
                .session
                .lock()
                .await
                .as_ref()
                .is_some_and(|session| session.is_acknowledged(index));

            if already_acknowledged {
                debug!("chunk {} already acknowledged, skipping", index);
            } else {
                self.send_with_retry(file, &session_id, index, range).await?;
            }

            if let Some(session) = self.session.lock().await.as_mut() {
                session.acknowledge(index);
            }

            // Every index up to and including this one is now acknowledged.
            let completed = index + 1;
            self.observer.on_progress(&UploadProgress {
                percent: completed as f64 * 100.0 / chunk_count as f64,
                chunk_index: index,
                chunk_count,
            });
        }

        Ok(())
    }

    async fn send_with_retry(
        &self,
        file: &SourceFile,
        session_id: &str,
        index: u64,
        range: Range<u64>,
    ) -> Result<(), UploadError> {
        let mut attempt = 0;
        loop {
            // Re-slice on every attempt; failed payloads are not kept around.
            let payload = file.read_range(range.clone())?;
            let size = payload.len();

            match self.client.send_chunk(session_id, index, payload).await {
                Ok(ack) => {
                    debug!(
                        "chunk {} sent ({} bytes, attempt {}, server progress {:?})",
                        index, size, attempt, ack.progress
                    );
                    return Ok(());
                }
                Err(e) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.backoff_duration(attempt);
                    warn!(
                        "chunk {} failed: {}, retrying in {:?} ({}/{})",
                        index,
                        e,
                        delay,
                        attempt + 1,
                        self.retry.max_retries()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        "chunk {} failed after {} attempts: {}",
                        index,
                        attempt + 1,
                        e
                    );
                    return Err(UploadError::ChunkUploadFailed { chunk_index: index });
                }
            }
        }
    }

    fn finish(
        &self,
        file: &SourceFile,
        result: Result<CompleteResult, UploadError>,
    ) -> Result<CompleteResult, UploadError> {
        match &result {
            Ok(complete) => {
                self.set_state(UploadState::Done);
                info!("Upload of {} complete as {}", file.name(), complete.filename);
                self.observer.on_complete(complete);
            }
            Err(e) => {
                if e.is_paused() {
                    info!("Upload of {} paused", file.name());
                } else {
                    self.set_state(UploadState::Failed);
                    error!("Upload of {} failed: {}", file.name(), e);
                }
                self.observer.on_error(e);
            }
        }
        result
    }
}
