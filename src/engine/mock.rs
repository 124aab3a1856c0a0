use crate::engine::{EngineError, TranscribeOptions, TranscriptSegment, TranscriptionEngine};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted engine for tests.
///
/// Records every invocation, verifies the staged file exists at call time,
/// and can simulate slow or failing engines.
#[derive(Debug)]
pub struct MockEngine {
    segments: Vec<TranscriptSegment>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<PathBuf>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockEngine {
    /// An engine that answers every call with the given segment texts.
    pub fn returning<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: lines.into_iter().map(TranscriptSegment::new).collect(),
            fail_with: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// An engine that fails every call.
    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::returning(Vec::<String>::new())
        }
    }

    /// Hold each call open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Staged paths received so far, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().expect("mock engine call log poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock engine call log poisoned").len()
    }

    /// Highest number of overlapping calls observed.
    pub fn max_observed_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionEngine for MockEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        _options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, EngineError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        // A missing staged file at call time is a pipeline bug; surface it.
        let staged = tokio::fs::metadata(audio_path).await;

        self.calls
            .lock()
            .expect("mock engine call log poisoned")
            .push(audio_path.to_path_buf());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match (staged, &self.fail_with) {
            (Err(e), _) => Err(EngineError::Audio(e)),
            (Ok(_), Some(message)) => Err(EngineError::Failed(message.clone())),
            (Ok(_), None) => Ok(self.segments.clone()),
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
