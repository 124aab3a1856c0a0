//! Encrypt an audio file, upload it, decrypt the transcript.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use stenogramma_protocol::envelope;

use crate::env::ClientEnv;

/// Generous upload timeout; transcribing a long lecture is slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1300);

pub async fn run(audio_file: PathBuf, output: Option<PathBuf>) -> Result<()> {
    if !audio_file.exists() {
        bail!("File not found: {}", audio_file.display());
    }
    let name = audio_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    if !name.to_lowercase().ends_with(".wav") {
        bail!("Only .wav files are supported");
    }

    let output = output.unwrap_or_else(|| PathBuf::from("transcript.txt"));
    let env = ClientEnv::load()?;

    let audio = tokio::fs::read(&audio_file)
        .await
        .with_context(|| format!("Could not read {}", audio_file.display()))?;
    println!("Loaded {} ({} bytes)", audio_file.display(), audio.len());

    let sealed = envelope::encrypt(&audio, &env.encrypt_key);
    println!("Encrypted upload ({} bytes)", sealed.len());

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Could not build HTTP client")?;

    let part = reqwest::multipart::Part::bytes(sealed)
        .file_name(format!("encrypted_{name}"))
        .mime_str("audio/wav")
        .context("Could not build upload part")?;
    let form = reqwest::multipart::Form::new().part("file", part);

    println!("Uploading to {}", env.server_url);
    let response = client
        .post(format!("{}/{}", env.server_url, env.endpoint))
        .multipart(form)
        .send()
        .await
        .context("Upload failed")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("Server returned {status}: {body}");
    }

    let sealed_transcript = response
        .bytes()
        .await
        .context("Could not read the server response")?;
    let transcript = envelope::decrypt(&sealed_transcript, &env.decrypt_key)
        .context("Could not decrypt the server response; check KEY_ENCRYPT")?;
    let transcript =
        String::from_utf8(transcript).context("Decrypted transcript is not valid UTF-8")?;

    tokio::fs::write(&output, &transcript)
        .await
        .with_context(|| format!("Could not write {}", output.display()))?;

    println!(
        "Transcript saved to {} ({} characters)",
        output.display(),
        transcript.chars().count()
    );
    Ok(())
}
