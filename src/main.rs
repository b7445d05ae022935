use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use emotion_service_rs::config::Config;
use emotion_service_rs::model::Classifier;
use emotion_service_rs::{build_router, db, fetch, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::from_env()?;
    let _log_guard = logging::init(&cfg)?;
    info!(version = env!("CARGO_PKG_VERSION"), "emotion service starting");

    if cfg.jwt.is_development_secret() {
        warn!("JWT_SECRET not set; tokens are signed with the development secret");
    }

    let pool = db::connect(&cfg.database_url)
        .await
        .with_context(|| format!("failed to open database {}", cfg.database_url))?;
    info!(database_url = %cfg.database_url, "database ready");

    fetch::ensure_model_file(&cfg.model).await?;
    let classifier = load_classifier(&cfg)?;
    info!(status = classifier.info().status, "model ready");

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("HOST/PORT do not form a valid socket address")?;

    let state = AppState::new(pool, cfg, classifier);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening (REST under /api/v1, WebSocket at /ws)");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("emotion service stopped");
    Ok(())
}

#[cfg(feature = "tensorflow")]
fn load_classifier(cfg: &Config) -> anyhow::Result<Arc<dyn Classifier>> {
    let model = emotion_service_rs::model::GraphModel::load(&cfg.model)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "tensorflow"))]
fn load_classifier(_cfg: &Config) -> anyhow::Result<Arc<dyn Classifier>> {
    anyhow::bail!("built without the `tensorflow` feature; no inference backend available")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
