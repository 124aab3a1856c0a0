use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

use stenogramma_protocol::{EndpointRegistry, KeyError, SymmetricKey};

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upload size cap in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_mb() -> usize {
    200
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

/// Whisper inference service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Base URL of the faster-whisper REST service
    #[serde(default = "default_engine_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Transcription language hint
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_beam_size")]
    pub beam_size: u32,
    /// Filter out non-speech segments before decoding
    #[serde(default = "default_vad_filter")]
    pub vad_filter: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Simultaneous transcriptions the engine can serve.
    /// Keep at 1 unless the engine is known to be reentrant.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_engine_url() -> String {
    "http://localhost:9000/v1".to_string()
}

fn default_model() -> String {
    "large-v3".to_string()
}

fn default_language() -> String {
    "ru".to_string()
}

fn default_beam_size() -> u32 {
    5
}

fn default_vad_filter() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    1200
}

fn default_max_concurrency() -> usize {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            model: default_model(),
            language: default_language(),
            beam_size: default_beam_size(),
            vad_filter: default_vad_filter(),
            timeout_secs: default_timeout_secs(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Staging area for decrypted audio awaiting transcription
#[derive(Debug, Deserialize, Clone)]
pub struct StagingConfig {
    #[serde(default = "default_staging_dir")]
    pub dir: PathBuf,
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir()
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: default_staging_dir(),
        }
    }
}

/// Root application configuration (non-sensitive parts only)
/// Keys and the secret endpoint are provided via environment variables.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub staging: StagingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default config file
            .add_source(File::with_name("config/default").required(false))
            // Override with local config if present
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (prefix: STENOGRAMMA_)
            // e.g., STENOGRAMMA_SERVER__PORT, STENOGRAMMA_ENGINE__URL
            .add_source(
                Environment::with_prefix("STENOGRAMMA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Initialize the global config singleton
    pub fn init() -> Result<&'static Self, ConfigError> {
        let config = Self::load()?;
        Ok(CONFIG.get_or_init(|| config))
    }
}

/// Helper to get engine URL with proper trailing slash handling
impl EngineConfig {
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

/// Errors from loading the secret material
#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid key in {var}: {source}")]
    InvalidKey { var: &'static str, source: KeyError },

    #[error("KEY_DECRYPT and KEY_ENCRYPT must be two different keys")]
    EqualKeys,
}

/// Secret material loaded from the environment, never from config files.
///
/// `KEY_DECRYPT` opens inbound audio envelopes, `KEY_ENCRYPT` seals
/// outbound transcripts. `SECRET_ENDPOINT` is optional; a fresh token is
/// generated when it is absent.
#[derive(Debug)]
pub struct Secrets {
    pub registry: EndpointRegistry,
    pub inbound_key: SymmetricKey,
    pub outbound_key: SymmetricKey,
    /// True when no SECRET_ENDPOINT was supplied and a token was generated.
    pub endpoint_generated: bool,
}

impl Secrets {
    pub fn from_env() -> Result<Self, SecretsError> {
        let inbound_key = key_from_env("KEY_DECRYPT")?;
        let outbound_key = key_from_env("KEY_ENCRYPT")?;
        if inbound_key == outbound_key {
            return Err(SecretsError::EqualKeys);
        }

        let (registry, endpoint_generated) = match std::env::var("SECRET_ENDPOINT") {
            Ok(token) if !token.trim().is_empty() => {
                (EndpointRegistry::from_token(token.trim()), false)
            }
            _ => (EndpointRegistry::generate(), true),
        };

        Ok(Self {
            registry,
            inbound_key,
            outbound_key,
            endpoint_generated,
        })
    }
}

fn key_from_env(var: &'static str) -> Result<SymmetricKey, SecretsError> {
    let hex_key = std::env::var(var).map_err(|_| SecretsError::Missing(var))?;
    SymmetricKey::from_hex(&hex_key).map_err(|source| SecretsError::InvalidKey { var, source })
}
