//! Transcription engine seam.
//!
//! The orchestrator stages decrypted audio to a file and hands the path to
//! a [`TranscriptionEngine`]. The production adapter speaks the
//! faster-whisper REST dialect ([`WhisperRestEngine`]); tests plug in
//! [`MockEngine`]. Engines return ordered transcript segments; assembling
//! them into the final text is the orchestrator's job.

pub mod mock;
pub mod rest;

pub use mock::MockEngine;
pub use rest::WhisperRestEngine;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors from the transcription collaborator
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Service {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("could not read staged audio: {0}")]
    Audio(#[from] std::io::Error),

    #[error("transcription failed: {0}")]
    Failed(String),
}

/// Per-request transcription parameters
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    pub language: String,
    pub beam_size: u32,
    pub vad_filter: bool,
}

impl From<&crate::config::EngineConfig> for TranscribeOptions {
    fn from(config: &crate::config::EngineConfig) -> Self {
        Self {
            language: config.language.clone(),
            beam_size: config.beam_size,
            vad_filter: config.vad_filter,
        }
    }
}

/// One ordered piece of engine output
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
}

impl TranscriptSegment {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}

/// The speech-to-text collaborator.
///
/// Implementations may be non-reentrant; callers are expected to gate
/// concurrency themselves.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, EngineError>;
}
