use crate::config::EngineConfig;
use crate::engine::{EngineError, TranscribeOptions, TranscriptSegment, TranscriptionEngine};
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// Body of a `verbose_json` transcription response
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    segments: Vec<TranscriptSegment>,
}

/// Client for a faster-whisper compatible REST service
pub struct WhisperRestEngine {
    http: Client,
    transcriptions_url: String,
    models_url: String,
    model: String,
}

impl std::fmt::Debug for WhisperRestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRestEngine")
            .field("transcriptions_url", &self.transcriptions_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl WhisperRestEngine {
    /// Create a new engine client from config
    pub fn new(config: &EngineConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            transcriptions_url: config.endpoint("audio/transcriptions"),
            models_url: config.endpoint("models"),
            model: config.model.clone(),
        }
    }

    /// Check if the transcription service is reachable
    pub async fn health_check(&self) -> Result<(), EngineError> {
        debug!("Checking transcription service at {}", self.models_url);

        let response = self.http.get(&self.models_url).send().await?;
        if !response.status().is_success() {
            return Err(EngineError::Service {
                status: response.status(),
                body: String::new(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TranscriptionEngine for WhisperRestEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>, EngineError> {
        let audio = tokio::fs::read(audio_path).await?;

        let file_part = multipart::Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| EngineError::Failed(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", options.language.clone())
            .text("response_format", "verbose_json")
            .text("beam_size", options.beam_size.to_string())
            .text("vad_filter", options.vad_filter.to_string())
            .part("file", file_part);

        debug!(model = %self.model, language = %options.language, "Sending staged audio to transcription service");

        let response = self
            .http
            .post(&self.transcriptions_url)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!("Transcription failed with status {}: {}", status, body);
            return Err(EngineError::Service { status, body });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

        info!(segments = parsed.segments.len(), "Transcription completed");
        Ok(parsed.segments)
    }
}
