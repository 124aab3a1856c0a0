//! Mint deployment secrets and write them to `.env`.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::Path;
use stenogramma_protocol::{SecretEndpoint, SymmetricKey};

const ENV_FILE: &str = ".env";

pub async fn run(force: bool) -> Result<()> {
    if Path::new(ENV_FILE).exists() && !force {
        bail!("{ENV_FILE} already exists; pass --force to overwrite it");
    }

    let endpoint = SecretEndpoint::generate();
    let decrypt_key = SymmetricKey::generate();
    let encrypt_key = SymmetricKey::generate();

    println!("Generated deployment secrets:");
    println!("{}", "=".repeat(50));
    println!("SECRET_ENDPOINT={}", endpoint.as_str());
    println!("KEY_DECRYPT={}", decrypt_key.to_hex());
    println!("KEY_ENCRYPT={}", encrypt_key.to_hex());
    println!("{}", "=".repeat(50));

    let content = format!(
        "# Stenogramma deployment secrets\n\
         # Generated: {}\n\
         # Keep this file out of version control.\n\
         \n\
         SECRET_ENDPOINT={}\n\
         KEY_DECRYPT={}\n\
         KEY_ENCRYPT={}\n",
        Utc::now().to_rfc3339(),
        endpoint.as_str(),
        decrypt_key.to_hex(),
        encrypt_key.to_hex(),
    );

    tokio::fs::write(ENV_FILE, content)
        .await
        .with_context(|| format!("Could not write {ENV_FILE}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(ENV_FILE, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Could not restrict permissions on {ENV_FILE}"))?;
    }

    println!("Secrets written to {ENV_FILE}");
    println!("Back the keys up somewhere safe; they cannot be recovered.");
    Ok(())
}
