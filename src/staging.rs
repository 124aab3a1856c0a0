//! Scope-guarded staging of decrypted audio.
//!
//! Decrypted audio exists on disk only between decryption and
//! transcription. The guard owns that window: every request stages under
//! a fresh unique name, the orchestrator removes the file explicitly on
//! every outcome, and dropping the guard removes the file as a backstop
//! for cancelled or panicking requests.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A decrypted audio file staged for transcription.
#[derive(Debug)]
pub struct StagedAudio {
    // None once the file has been removed
    path: Option<PathBuf>,
}

impl StagedAudio {
    /// Write `audio` into `dir` under a fresh unique name.
    ///
    /// The guard owns the path before the first byte is written, so a
    /// failed or partial write is removed like any other staged file.
    pub async fn write(dir: &Path, audio: &[u8]) -> std::io::Result<Self> {
        let path = dir.join(format!("stenogramma-{}.wav", Uuid::new_v4()));
        let staged = Self { path: Some(path) };
        tokio::fs::write(staged.path(), audio).await?;
        debug!(path = %staged.path().display(), bytes = audio.len(), "Staged decrypted audio");
        Ok(staged)
    }

    /// The staged file location.
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .expect("staged audio used after removal")
    }

    /// Remove the staged file.
    ///
    /// Removing an already-absent file is success. Other IO failures are
    /// returned so the caller can decide whether they are fatal.
    pub async fn remove(mut self) -> std::io::Result<()> {
        let path = match self.path.take() {
            Some(path) => path,
            None => return Ok(()),
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed staged audio");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for StagedAudio {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove staged audio on drop");
                }
            }
        }
    }
}
