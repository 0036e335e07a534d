//! Lifecycle of one user-initiated extraction.
//!
//! `Idle -> [Uploading ->] Analyzing -> Success | Error`. Each attempt gets a
//! fresh request id; results from an attempt that is no longer current are
//! dropped instead of overwriting newer state.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use crate::error::{ExtractionError, SessionError};
use crate::extractor::Extractor;
use crate::payload::{ImageFile, ImagePayload};
use crate::record::ExtractionRecord;

pub const URL_FAILURE_MESSAGE: &str =
    "Failed to fetch data. The model could not retrieve accurate details from this specific URL.";
pub const IMAGE_FAILURE_MESSAGE: &str =
    "Analysis failed. The model encountered an error analyzing the screenshot.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Success,
    Error,
}

impl ExtractionStatus {
    /// An attempt is in flight and new submissions are refused.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Uploading | Self::Analyzing)
    }
}

/// Which input path an attempt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Url,
    Image,
}

impl ExtractionSource {
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Url => URL_FAILURE_MESSAGE,
            Self::Image => IMAGE_FAILURE_MESSAGE,
        }
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => write!(f, "url"),
            Self::Image => write!(f, "image"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: ExtractionStatus,
    pub request_id: u64,
    pub record: Option<ExtractionRecord>,
    pub error: Option<String>,
    /// Data URI of the uploaded image
    pub preview: Option<String>,
}

pub struct ExtractionSession {
    extractor: Arc<dyn Extractor>,
    state: watch::Sender<SessionSnapshot>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl ExtractionSession {
    pub fn new(extractor: Arc<dyn Extractor>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::default());

        Arc::new(Self {
            extractor,
            state,
            in_flight: Mutex::new(None),
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Start researching a profile URL. The session is `Analyzing` when this
    /// returns; the handle resolves once the attempt has settled.
    pub fn submit_url(self: &Arc<Self>, url: &str) -> Result<JoinHandle<()>, SessionError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SessionError::EmptyUrl);
        }

        let request_id = self.begin(ExtractionStatus::Analyzing)?;
        tracing::info!(request_id, url, "Starting URL extraction");

        let session = Arc::clone(self);
        let url = url.to_string();
        let handle = tokio::spawn(async move {
            let outcome = session.extractor.extract_from_url(&url).await;
            session.settle(request_id, ExtractionSource::Url, outcome);
        });

        self.track(&handle);
        Ok(handle)
    }

    /// Start analyzing an uploaded image. The session is `Uploading` until the
    /// file has been encoded into a preview.
    pub fn choose_file(self: &Arc<Self>, file: ImageFile) -> Result<JoinHandle<()>, SessionError> {
        let request_id = self.begin(ExtractionStatus::Uploading)?;
        tracing::info!(request_id, mime_type = %file.mime_type, size = file.bytes.len(), "Starting image extraction");

        let session = Arc::clone(self);
        let handle = tokio::spawn(async move {
            session.run_image(request_id, file).await;
        });

        self.track(&handle);
        Ok(handle)
    }

    /// Clear the preview only. Record, error and status are left alone.
    pub fn remove_preview(&self) {
        self.state.send_if_modified(|s| s.preview.take().is_some());
    }

    /// Drop the current result and cancel any in-flight attempt.
    pub fn dismiss(&self) {
        if let Some(handle) = self.lock_in_flight().take() {
            handle.abort();
        }

        self.state.send_modify(|s| {
            s.request_id += 1;
            s.status = ExtractionStatus::Idle;
            s.record = None;
            s.error = None;
            s.preview = None;
        });
    }

    async fn run_image(&self, request_id: u64, file: ImageFile) {
        let encoded = tokio::task::spawn_blocking(move || ImagePayload::encode(&file))
            .await
            .unwrap_or_else(|e| Err(ExtractionError::Input(format!("failed to read image: {e}"))));

        let payload = match encoded {
            Ok(payload) => payload,
            Err(e) => {
                self.settle(request_id, ExtractionSource::Image, Err(e));
                return;
            }
        };

        let preview = payload.to_data_uri();
        let current = self.apply(request_id, |s| {
            s.preview = Some(preview);
            s.status = ExtractionStatus::Analyzing;
        });
        if !current {
            return;
        }

        let outcome = self.extractor.extract_from_image(&payload).await;
        self.settle(request_id, ExtractionSource::Image, outcome);
    }

    /// Reset for a new attempt and return its id, unless one is in flight.
    fn begin(&self, status: ExtractionStatus) -> Result<u64, SessionError> {
        let mut started = None;

        self.state.send_if_modified(|s| {
            if s.status.is_busy() {
                return false;
            }
            s.request_id += 1;
            s.status = status;
            s.record = None;
            s.error = None;
            s.preview = None;
            started = Some(s.request_id);
            true
        });

        started.ok_or(SessionError::Busy)
    }

    fn settle(
        &self,
        request_id: u64,
        source: ExtractionSource,
        outcome: Result<ExtractionRecord, ExtractionError>,
    ) {
        match outcome {
            Ok(record) => {
                if self.apply(request_id, |s| {
                    s.record = Some(record);
                    s.status = ExtractionStatus::Success;
                }) {
                    tracing::info!(request_id, %source, "Extraction succeeded");
                }
            }
            Err(e) => {
                tracing::warn!(request_id, %source, error = %e, "Extraction failed");
                self.apply(request_id, |s| {
                    s.error = Some(source.failure_message().to_string());
                    s.status = ExtractionStatus::Error;
                });
            }
        }
    }

    /// Mutate state only if `request_id` is still the current attempt.
    fn apply<F>(&self, request_id: u64, update: F) -> bool
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let applied = self.state.send_if_modified(|s| {
            if s.request_id != request_id {
                return false;
            }
            update(s);
            true
        });

        if !applied {
            tracing::debug!(request_id, "Discarding result of superseded extraction");
        }
        applied
    }

    fn track(&self, handle: &JoinHandle<()>) {
        *self.lock_in_flight() = Some(handle.abort_handle());
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<AbortHandle>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Extractor with a scripted outcome, optionally held until released.
    struct FakeExtractor {
        succeed: bool,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
    }

    impl FakeExtractor {
        fn succeeding() -> Arc<Self> {
            Arc::new(Self { succeed: true, gate: None, calls: AtomicUsize::new(0) })
        }

        fn rejecting() -> Arc<Self> {
            Arc::new(Self { succeed: false, gate: None, calls: AtomicUsize::new(0) })
        }

        fn gated(gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self { succeed: true, gate: Some(gate), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn outcome(&self, name: &str) -> Result<ExtractionRecord, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.succeed {
                Ok(ExtractionRecord {
                    full_name: Some(name.to_string()),
                    confidence_score: 0.9,
                    ..Default::default()
                })
            } else {
                Err(ExtractionError::Transport("backend unavailable".to_string()))
            }
        }
    }

    #[async_trait]
    impl Extractor for FakeExtractor {
        async fn extract_from_image(&self, _image: &ImagePayload) -> Result<ExtractionRecord, ExtractionError> {
            self.outcome("From Image").await
        }

        async fn extract_from_url(&self, url: &str) -> Result<ExtractionRecord, ExtractionError> {
            self.outcome(url).await
        }
    }

    fn png_file() -> ImageFile {
        ImageFile::new("image/png", vec![0x89, b'P', b'N', b'G'])
    }

    #[tokio::test]
    async fn test_submit_url_is_analyzing_immediately() {
        let session = ExtractionSession::new(FakeExtractor::succeeding());

        let handle = session.submit_url("https://www.linkedin.com/in/jdoe").unwrap();
        assert_eq!(session.snapshot().status, ExtractionStatus::Analyzing);

        handle.await.unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ExtractionStatus::Success);
        assert_eq!(snapshot.record.unwrap().full_name.as_deref(), Some("https://www.linkedin.com/in/jdoe"));
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn test_blank_url_is_inert() {
        let extractor = FakeExtractor::succeeding();
        let session = ExtractionSession::new(extractor.clone());

        assert_eq!(session.submit_url("").unwrap_err(), SessionError::EmptyUrl);
        assert_eq!(session.submit_url("   ").unwrap_err(), SessionError::EmptyUrl);

        assert_eq!(session.snapshot(), SessionSnapshot::default());
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_choose_file_passes_through_uploading() {
        let session = ExtractionSession::new(FakeExtractor::succeeding());
        let mut updates = session.subscribe();

        let handle = session.choose_file(png_file()).unwrap();
        assert_eq!(session.snapshot().status, ExtractionStatus::Uploading);

        let mut seen = Vec::new();
        handle.await.unwrap();
        // Drain what the receiver can still observe, then check the end state
        while updates.has_changed().unwrap() {
            seen.push(updates.borrow_and_update().status);
        }
        assert!(seen.contains(&ExtractionStatus::Success));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ExtractionStatus::Success);
        assert_eq!(snapshot.preview.as_deref(), Some("data:image/png;base64,iVBORw=="));
        assert_eq!(snapshot.record.unwrap().full_name.as_deref(), Some("From Image"));
    }

    #[tokio::test]
    async fn test_preview_is_set_before_analysis_finishes() {
        let gate = Arc::new(Notify::new());
        let session = ExtractionSession::new(FakeExtractor::gated(gate.clone()));
        let mut updates = session.subscribe();

        let handle = session.choose_file(png_file()).unwrap();

        let analyzing = updates
            .wait_for(|s| s.status == ExtractionStatus::Analyzing)
            .await
            .unwrap()
            .clone();
        assert!(analyzing.preview.is_some());
        assert!(analyzing.record.is_none());

        gate.notify_one();
        handle.await.unwrap();
        assert_eq!(session.snapshot().status, ExtractionStatus::Success);
    }

    #[tokio::test]
    async fn test_failures_carry_path_specific_messages() {
        let session = ExtractionSession::new(FakeExtractor::rejecting());

        session.submit_url("https://x").unwrap().await.unwrap();
        let url_failure = session.snapshot();
        assert_eq!(url_failure.status, ExtractionStatus::Error);
        assert_eq!(url_failure.error.as_deref(), Some(URL_FAILURE_MESSAGE));
        assert!(url_failure.record.is_none());

        session.choose_file(png_file()).unwrap().await.unwrap();
        let image_failure = session.snapshot();
        assert_eq!(image_failure.status, ExtractionStatus::Error);
        assert_eq!(image_failure.error.as_deref(), Some(IMAGE_FAILURE_MESSAGE));
        assert!(image_failure.preview.is_some());

        assert_ne!(URL_FAILURE_MESSAGE, IMAGE_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_unreadable_file_ends_in_error_not_uploading() {
        let extractor = FakeExtractor::succeeding();
        let session = ExtractionSession::new(extractor.clone());

        session
            .choose_file(ImageFile::new("text/plain", b"hello".to_vec()))
            .unwrap()
            .await
            .unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ExtractionStatus::Error);
        assert_eq!(snapshot.error.as_deref(), Some(IMAGE_FAILURE_MESSAGE));
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_new_attempt_clears_previous_result() {
        let session = ExtractionSession::new(FakeExtractor::succeeding());
        session.choose_file(png_file()).unwrap().await.unwrap();
        assert!(session.snapshot().preview.is_some());

        session.submit_url("https://x").unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ExtractionStatus::Analyzing);
        assert!(snapshot.record.is_none());
        assert!(snapshot.preview.is_none());
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_busy_session_refuses_both_paths() {
        let gate = Arc::new(Notify::new());
        let extractor = FakeExtractor::gated(gate.clone());
        let session = ExtractionSession::new(extractor.clone());

        let handle = session.submit_url("https://x").unwrap();

        assert_eq!(session.submit_url("https://y").unwrap_err(), SessionError::Busy);
        assert_eq!(session.choose_file(png_file()).unwrap_err(), SessionError::Busy);

        gate.notify_one();
        handle.await.unwrap();
        assert_eq!(extractor.calls(), 1);
        assert_eq!(session.snapshot().status, ExtractionStatus::Success);
    }

    #[tokio::test]
    async fn test_remove_preview() {
        let session = ExtractionSession::new(FakeExtractor::succeeding());
        let mut updates = session.subscribe();

        session.remove_preview();
        assert!(!updates.has_changed().unwrap());
        assert_eq!(session.snapshot(), SessionSnapshot::default());

        session.choose_file(png_file()).unwrap().await.unwrap();
        session.remove_preview();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.preview, None);
        assert_eq!(snapshot.status, ExtractionStatus::Success);
        assert!(snapshot.record.is_some());
    }

    #[tokio::test]
    async fn test_dismiss_cancels_in_flight_attempt() {
        let gate = Arc::new(Notify::new());
        let session = ExtractionSession::new(FakeExtractor::gated(gate.clone()));

        let handle = session.submit_url("https://x").unwrap();
        tokio::task::yield_now().await;
        session.dismiss();

        assert!(handle.await.unwrap_err().is_cancelled());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ExtractionStatus::Idle);
        assert!(snapshot.record.is_none());
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let session = ExtractionSession::new(FakeExtractor::succeeding());
        session.submit_url("https://x").unwrap().await.unwrap();
        let stale_id = session.snapshot().request_id;

        session.dismiss();
        session.settle(
            stale_id,
            ExtractionSource::Url,
            Ok(ExtractionRecord::default()),
        );

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ExtractionStatus::Idle);
        assert!(snapshot.record.is_none());
        assert!(snapshot.request_id > stale_id);
    }

    #[tokio::test]
    async fn test_superseded_attempt_never_overwrites_newer_one() {
        let gate = Arc::new(Notify::new());
        let extractor = FakeExtractor::gated(gate.clone());
        let session = ExtractionSession::new(extractor.clone());

        let first = session.submit_url("https://first").unwrap();
        while extractor.calls() < 1 {
            tokio::task::yield_now().await;
        }
        session.dismiss();

        let second = session.submit_url("https://second").unwrap();
        while extractor.calls() < 2 {
            tokio::task::yield_now().await;
        }
        // Release every waiter, including the first attempt if it is still parked
        gate.notify_waiters();

        second.await.unwrap();
        assert!(first.await.unwrap_err().is_cancelled());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ExtractionStatus::Success);
        assert_eq!(snapshot.record.unwrap().full_name.as_deref(), Some("https://second"));
        assert_eq!(snapshot.request_id, 3);
    }
}
