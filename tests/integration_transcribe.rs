//! Integration tests for the encrypted transcription pipeline.
//!
//! These spin up the real router on a real socket, pointed at a mock
//! speech-to-text backend, and drive it over HTTP exactly the way a
//! client deployment would: encrypt, upload, decrypt.
//!
//! Unit tests passing != system works. This is where we test the system.

use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use stenogramma::config::{AppConfig, EngineConfig, Secrets, StagingConfig};
use stenogramma::engine::WhisperRestEngine;
use stenogramma::service::TranscriptionService;
use stenogramma::web::{create_router, AppState};
use stenogramma_protocol::{envelope, EndpointInfo, EndpointRegistry, SymmetricKey};

/// One upload as seen by the mock backend.
#[derive(Debug, Default, Clone)]
struct UploadRecord {
    model: String,
    language: String,
    response_format: String,
    audio_bytes: usize,
}

/// Canned behavior of the mock backend.
enum MockReply {
    Segments(Vec<String>),
    Error(StatusCode, String),
}

#[derive(Clone)]
struct MockWhisperState {
    uploads: Arc<Mutex<Vec<UploadRecord>>>,
    reply: Arc<MockReply>,
}

/// Mock faster-whisper REST service.
///
/// Speaks just enough of the OpenAI-compatible dialect for the engine
/// client: `POST /v1/audio/transcriptions` (multipart in, verbose_json
/// out) and `GET /v1/models`.
struct MockWhisper {
    url: String,
    uploads: Arc<Mutex<Vec<UploadRecord>>>,
    _task: tokio::task::JoinHandle<()>,
}

impl MockWhisper {
    async fn start(reply: MockReply) -> Self {
        let uploads = Arc::new(Mutex::new(Vec::new()));
        let state = MockWhisperState {
            uploads: Arc::clone(&uploads),
            reply: Arc::new(reply),
        };

        let router = Router::new()
            .route("/v1/audio/transcriptions", post(mock_transcriptions))
            .route("/v1/models", get(mock_models))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{}/v1", addr),
            uploads,
            _task: task,
        }
    }

    fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().unwrap().clone()
    }
}

async fn mock_transcriptions(
    State(state): State<MockWhisperState>,
    mut multipart: Multipart,
) -> Response {
    let mut record = UploadRecord::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "model" => record.model = field.text().await.unwrap(),
            "language" => record.language = field.text().await.unwrap(),
            "response_format" => record.response_format = field.text().await.unwrap(),
            "file" => record.audio_bytes = field.bytes().await.unwrap().len(),
            _ => {
                let _ = field.bytes().await;
            }
        }
    }
    state.uploads.lock().unwrap().push(record);

    match &*state.reply {
        MockReply::Segments(lines) => {
            let segments: Vec<_> = lines
                .iter()
                .enumerate()
                .map(|(i, text)| json!({"id": i, "start": i as f64, "end": i as f64 + 1.0, "text": text}))
                .collect();
            Json(json!({"language": "ru", "segments": segments})).into_response()
        }
        MockReply::Error(status, body) => (*status, body.clone()).into_response(),
    }
}

async fn mock_models() -> Json<serde_json::Value> {
    Json(json!({"data": [{"id": "large-v3"}]}))
}

/// A running Stenogramma server plus the client-side key material.
struct TestApp {
    base_url: String,
    token: String,
    inbound_key: SymmetricKey,
    outbound_key: SymmetricKey,
    staging_dir: tempfile::TempDir,
    _task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Boot the full stack against the given backend URL.
    async fn start(whisper_url: &str) -> Self {
        let staging_dir = tempfile::tempdir().unwrap();
        let secrets = Secrets {
            registry: EndpointRegistry::generate(),
            inbound_key: SymmetricKey::generate(),
            outbound_key: SymmetricKey::generate(),
            endpoint_generated: true,
        };
        let token = secrets.registry.endpoint().as_str().to_string();
        let inbound_key = secrets.inbound_key.clone();
        let outbound_key = secrets.outbound_key.clone();

        let config = AppConfig {
            engine: EngineConfig {
                url: whisper_url.to_string(),
                timeout_secs: 10,
                ..EngineConfig::default()
            },
            staging: StagingConfig {
                dir: staging_dir.path().to_path_buf(),
            },
            ..AppConfig::default()
        };

        let engine = Arc::new(WhisperRestEngine::new(&config.engine));
        let service = Arc::new(TranscriptionService::new(engine, &config, &secrets));
        let state = AppState {
            service,
            registry: Arc::new(secrets.registry),
        };
        let router = create_router(state, config.server.max_upload_bytes());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            token,
            inbound_key,
            outbound_key,
            staging_dir,
            _task: task,
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}", self.base_url, self.token)
    }

    fn staging_artifacts(&self) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(self.staging_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

/// Build the multipart form a client sends: one `file` part carrying the
/// sealed envelope under an `encrypted_*.wav` name.
fn upload_form(sealed: Vec<u8>, filename: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(sealed)
        .file_name(filename.to_string())
        .mime_str("audio/wav")
        .unwrap();
    reqwest::multipart::Form::new().part("file", part)
}

#[tokio::test]
async fn test_encrypted_round_trip_over_http() {
    //! The full happy path:
    //! - client encrypts audio with the inbound key and uploads it
    //! - server decrypts, stages, transcribes through the REST engine
    //! - response decrypts with the outbound key to the joined transcript
    //! - nothing is left in the staging directory

    let whisper = MockWhisper::start(MockReply::Segments(vec![
        " Добрый день.".to_string(),
        " Начинаем лекцию.".to_string(),
    ]))
    .await;
    let app = TestApp::start(&whisper.url).await;

    let audio = b"riff wav bytes, pretend this is a lecture".to_vec();
    let sealed = envelope::encrypt(&audio, &app.inbound_key);

    let response = reqwest::Client::new()
        .post(app.upload_url())
        .multipart(upload_form(sealed, "encrypted_lecture.wav"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/octet-stream")
    );
    assert_eq!(
        response
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok()),
        Some("attachment;filename=encrypted_result.bin")
    );

    let body = response.bytes().await.unwrap();
    let transcript = envelope::decrypt(&body, &app.outbound_key).unwrap();
    assert_eq!(
        String::from_utf8(transcript).unwrap(),
        " Добрый день.\n Начинаем лекцию."
    );

    // The backend saw the decrypted audio and the configured options.
    let uploads = whisper.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].model, "large-v3");
    assert_eq!(uploads[0].language, "ru");
    assert_eq!(uploads[0].response_format, "verbose_json");
    assert_eq!(uploads[0].audio_bytes, audio.len());

    assert!(app.staging_artifacts().is_empty());

    println!("✅ Encrypted round trip over HTTP passed");
}

#[tokio::test]
async fn test_wrong_token_is_plain_not_found() {
    //! A valid upload to the wrong path segment gets the same bare 404 an
    //! unknown route would, and never reaches the backend.

    let whisper = MockWhisper::start(MockReply::Segments(vec!["never".to_string()])).await;
    let app = TestApp::start(&whisper.url).await;

    let sealed = envelope::encrypt(b"audio", &app.inbound_key);
    let response = reqwest::Client::new()
        .post(format!("{}/{}", app.base_url, "not-the-token"))
        .multipart(upload_form(sealed, "encrypted_lecture.wav"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(whisper.uploads().is_empty());

    println!("✅ Wrong token test passed");
}

#[tokio::test]
async fn test_endpoint_info_is_public() {
    //! `GET /endpoint_info` needs no credential and reports the live token.

    let whisper = MockWhisper::start(MockReply::Segments(vec![])).await;
    let app = TestApp::start(&whisper.url).await;

    let info: EndpointInfo = reqwest::Client::new()
        .get(format!("{}/endpoint_info", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(info.endpoint, app.token);

    println!("✅ Endpoint info test passed");
}

#[tokio::test]
async fn test_non_wav_filename_rejected_before_decryption() {
    //! A bad extension is a 400 with the exact client-facing message, and
    //! the payload is never decrypted or staged.

    let whisper = MockWhisper::start(MockReply::Segments(vec!["never".to_string()])).await;
    let app = TestApp::start(&whisper.url).await;

    let sealed = envelope::encrypt(b"audio", &app.inbound_key);
    let response = reqwest::Client::new()
        .post(app.upload_url())
        .multipart(upload_form(sealed, "encrypted_notes.mp3"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Only .wav files accepted");
    assert_eq!(body["code"], 400);

    assert!(whisper.uploads().is_empty());
    assert!(app.staging_artifacts().is_empty());

    println!("✅ Non-wav rejection test passed");
}

#[tokio::test]
async fn test_truncated_envelope_is_server_error() {
    //! An envelope shorter than IV plus one block can never decrypt; the
    //! server answers 500 without touching the backend.

    let whisper = MockWhisper::start(MockReply::Segments(vec!["never".to_string()])).await;
    let app = TestApp::start(&whisper.url).await;

    let mut sealed = envelope::encrypt(b"audio", &app.inbound_key);
    sealed.truncate(20);

    let response = reqwest::Client::new()
        .post(app.upload_url())
        .multipart(upload_form(sealed, "encrypted_lecture.wav"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Processing error:"), "{message}");

    assert!(whisper.uploads().is_empty());
    assert!(app.staging_artifacts().is_empty());

    println!("✅ Truncated envelope test passed");
}

#[tokio::test]
async fn test_backend_failure_maps_to_server_error_and_cleans_up() {
    //! When the speech-to-text backend fails mid-request the client gets a
    //! 500 and no decrypted audio survives in the staging directory.

    let whisper = MockWhisper::start(MockReply::Error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "CUDA out of memory".to_string(),
    ))
    .await;
    let app = TestApp::start(&whisper.url).await;

    let sealed = envelope::encrypt(b"audio that will never transcribe", &app.inbound_key);
    let response = reqwest::Client::new()
        .post(app.upload_url())
        .multipart(upload_form(sealed, "encrypted_lecture.wav"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Processing error:"), "{message}");

    // The backend was reached once and the staged file is gone.
    assert_eq!(whisper.uploads().len(), 1);
    assert!(app.staging_artifacts().is_empty());

    println!("✅ Backend failure cleanup test passed");
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    //! A multipart body without a `file` part is a client error.

    let whisper = MockWhisper::start(MockReply::Segments(vec!["never".to_string()])).await;
    let app = TestApp::start(&whisper.url).await;

    let form = reqwest::multipart::Form::new().text("comment", "no file here");
    let response = reqwest::Client::new()
        .post(app.upload_url())
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No file uploaded");

    println!("✅ Missing file field test passed");
}
