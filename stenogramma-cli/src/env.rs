//! Client configuration from the environment.

use anyhow::{Context, Result};
use stenogramma_protocol::SymmetricKey;

/// Everything the client needs to talk to a deployment.
///
/// The variable names are shared with the server, so the roles read
/// from the server's point of view: `KEY_DECRYPT` is the key the server
/// decrypts uploads with, which means the client encrypts with it, and
/// the other way around for `KEY_ENCRYPT`.
pub struct ClientEnv {
    pub server_url: String,
    pub endpoint: String,
    /// Seals outbound audio (the server's inbound key).
    pub encrypt_key: SymmetricKey,
    /// Opens returned transcripts (the server's outbound key).
    pub decrypt_key: SymmetricKey,
}

impl ClientEnv {
    /// Load from the process environment, honoring a `.env` file in the
    /// working directory.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let server_url = std::env::var("SERVER_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let endpoint = std::env::var("SECRET_ENDPOINT")
            .context("SECRET_ENDPOINT is not set (run: stenogramma-cli keygen)")?;

        let encrypt_key = SymmetricKey::from_hex(
            &std::env::var("KEY_DECRYPT").context("KEY_DECRYPT is not set")?,
        )
        .context("KEY_DECRYPT is not a valid key")?;
        let decrypt_key = SymmetricKey::from_hex(
            &std::env::var("KEY_ENCRYPT").context("KEY_ENCRYPT is not set")?,
        )
        .context("KEY_ENCRYPT is not a valid key")?;

        Ok(Self {
            server_url,
            endpoint,
            encrypt_key,
            decrypt_key,
        })
    }
}
