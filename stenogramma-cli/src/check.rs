//! Deployment self-test: environment, crypto, server reachability.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use stenogramma_protocol::{envelope, EndpointInfo, SymmetricKey};

use crate::env::ClientEnv;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(server_url: Option<String>) -> Result<()> {
    let mut passed = 0usize;
    let mut failed = 0usize;

    let env = match ClientEnv::load() {
        Ok(env) => {
            println!("ok: environment variables present and keys well-formed");
            passed += 1;
            Some(env)
        }
        Err(e) => {
            println!("FAIL: {e:#}");
            failed += 1;
            None
        }
    };

    if let Some(env) = &env {
        if env.encrypt_key == env.decrypt_key {
            println!("FAIL: KEY_DECRYPT and KEY_ENCRYPT must be two different keys");
            failed += 1;
        } else {
            println!("ok: directional keys are distinct");
            passed += 1;
        }
    }

    // Crypto self-test with a throwaway key.
    let sample = "Hello, World! Тест шифрования.".as_bytes();
    let key = SymmetricKey::generate();
    let opened = envelope::decrypt(&envelope::encrypt(sample, &key), &key);
    if opened.ok().as_deref() == Some(sample) {
        println!("ok: envelope round trip");
        passed += 1;
    } else {
        println!("FAIL: envelope round trip broken");
        failed += 1;
    }

    let base = server_url
        .or_else(|| env.as_ref().map(|e| e.server_url.clone()))
        .unwrap_or_else(|| "http://localhost:8000".to_string());
    let base = base.trim_end_matches('/').to_string();

    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .context("Could not build HTTP client")?;

    match client.get(format!("{base}/health")).send().await {
        Ok(response) if response.status().is_success() => {
            println!("ok: server reachable at {base}");
            passed += 1;
        }
        Ok(response) => {
            println!("FAIL: health route returned HTTP {}", response.status());
            failed += 1;
        }
        Err(e) => {
            println!("FAIL: server not reachable: {e}");
            failed += 1;
        }
    }

    match client.get(format!("{base}/endpoint_info")).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<EndpointInfo>().await {
                Ok(info) => {
                    println!("ok: endpoint info published");
                    passed += 1;
                    if let Some(env) = &env {
                        if env.endpoint == info.endpoint {
                            println!("ok: server endpoint matches SECRET_ENDPOINT");
                            passed += 1;
                        } else {
                            println!("FAIL: server reports a different endpoint than SECRET_ENDPOINT");
                            failed += 1;
                        }
                    }
                }
                Err(e) => {
                    println!("FAIL: unexpected /endpoint_info payload: {e}");
                    failed += 1;
                }
            }
        }
        Ok(response) => {
            println!("FAIL: endpoint info returned HTTP {}", response.status());
            failed += 1;
        }
        Err(e) => {
            println!("FAIL: server not reachable: {e}");
            failed += 1;
        }
    }

    println!();
    println!("{passed} passed, {failed} failed");
    if failed > 0 {
        bail!("{failed} check(s) failed");
    }
    Ok(())
}
