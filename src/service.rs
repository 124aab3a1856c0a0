//! Request orchestration: decrypt, stage, transcribe, seal, clean up.
//!
//! The pipeline for one upload:
//!
//! ```text
//! envelope ──decrypt──► audio ──stage──► file ──transcribe──► segments
//!                                                                │
//!                 response ◄──seal── transcript ◄──join("\n")────┘
//! ```
//!
//! Decrypted audio exists only inside this pipeline. The staged file is
//! removed on every outcome, success or failure, before the response or
//! error leaves `process`.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, Secrets};
use crate::engine::{TranscribeOptions, TranscriptionEngine};
use crate::error::{AppError, AppResult};
use crate::staging::StagedAudio;
use stenogramma_protocol::{envelope, SymmetricKey};

/// Extension uploads must declare, checked before anything is decrypted.
pub const AUDIO_EXT: &str = ".wav";

/// The per-request pipeline around the transcription engine.
///
/// One instance is built at startup and shared read-only across requests.
pub struct TranscriptionService {
    engine: Arc<dyn TranscriptionEngine>,
    inbound_key: SymmetricKey,
    outbound_key: SymmetricKey,
    staging_dir: PathBuf,
    options: TranscribeOptions,
    /// Gate serializing access to a possibly non-reentrant engine
    engine_gate: Semaphore,
}

impl std::fmt::Debug for TranscriptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionService")
            .field("staging_dir", &self.staging_dir)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TranscriptionService {
    /// Create the service from config and loaded secrets.
    pub fn new(engine: Arc<dyn TranscriptionEngine>, config: &AppConfig, secrets: &Secrets) -> Self {
        Self {
            engine,
            inbound_key: secrets.inbound_key.clone(),
            outbound_key: secrets.outbound_key.clone(),
            staging_dir: config.staging.dir.clone(),
            options: TranscribeOptions::from(&config.engine),
            engine_gate: Semaphore::new(config.engine.max_concurrency),
        }
    }

    /// Run one upload through the full pipeline.
    ///
    /// `payload` is the inbound envelope; the return value is the sealed
    /// transcript envelope. Every failure cleans up the staged file before
    /// returning.
    pub async fn process(&self, filename: &str, payload: &[u8]) -> AppResult<Vec<u8>> {
        // 1. Validation, before anything sensitive is touched
        if !filename.ends_with(AUDIO_EXT) {
            return Err(AppError::validation("Only .wav files accepted"));
        }

        // 2. Decrypt the inbound envelope
        let audio = envelope::decrypt(payload, &self.inbound_key)?;
        debug!(bytes = audio.len(), "Decrypted inbound audio");

        // 3. Stage under a unique name
        let staged = StagedAudio::write(&self.staging_dir, &audio).await?;

        // 4-5. Transcribe and seal
        let result = self.transcribe_and_seal(&staged).await;

        // 6. Cleanup runs on every outcome. On the success path a failed
        // removal is an error of its own; after a failure the original
        // error wins and the removal failure is only logged.
        match result {
            Ok(sealed) => {
                staged.remove().await?;
                Ok(sealed)
            }
            Err(e) => {
                if let Err(remove_err) = staged.remove().await {
                    warn!(error = %remove_err, "Failed to remove staged audio after error");
                }
                Err(e)
            }
        }
    }

    async fn transcribe_and_seal(&self, staged: &StagedAudio) -> AppResult<Vec<u8>> {
        let _permit = self
            .engine_gate
            .acquire()
            .await
            .expect("engine gate never closes");

        let segments = self.engine.transcribe(staged.path(), &self.options).await?;

        let transcript = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        info!(
            segments = segments.len(),
            chars = transcript.len(),
            "Transcription assembled"
        );

        Ok(envelope::encrypt(transcript.as_bytes(), &self.outbound_key))
    }
}
