use std::sync::Arc;
use stenogramma::{
    config::{AppConfig, Secrets},
    engine::WhisperRestEngine,
    service::TranscriptionService,
    web,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stenogramma=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Stenogramma v{}", env!("CARGO_PKG_VERSION"));

    // Key material conventionally lives in .env
    dotenvy::dotenv().ok();

    // Load non-sensitive configuration
    let config = AppConfig::init()?;
    info!("Configuration loaded");

    // Load keys and the secret endpoint from the environment
    let secrets = Secrets::from_env()
        .map_err(|e| anyhow::anyhow!("{e}. Generate a .env with: stenogramma-cli keygen"))?;
    if secrets.endpoint_generated {
        info!("No SECRET_ENDPOINT configured; generated a fresh endpoint token (query GET /endpoint_info)");
    } else {
        info!("Using configured secret endpoint");
    }

    // Make sure the staging area exists
    tokio::fs::create_dir_all(&config.staging.dir).await?;
    info!(dir = %config.staging.dir.display(), "Staging directory ready");

    // Engine client and reachability probe
    let engine = Arc::new(WhisperRestEngine::new(&config.engine));
    match engine.health_check().await {
        Ok(()) => info!(
            url = %config.engine.url,
            model = %config.engine.model,
            "Transcription service reachable"
        ),
        Err(e) => {
            warn!(
                "Transcription service not available: {}. \
                Uploads will fail until the service is started.",
                e
            );
        }
    }

    let service = Arc::new(TranscriptionService::new(engine, config, &secrets));
    let state = web::AppState {
        service,
        registry: Arc::new(secrets.registry),
    };

    let app = web::create_router(state, config.server.max_upload_bytes());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
