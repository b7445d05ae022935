use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::db;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "Emotion Recognition Service";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(system_status))
}

/// GET /health, GET /api/v1/health
///
/// Always 200; a database failure is reported in the body.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let model_status = state.classifier.info().status;

    match db::health_check(&state.pool).await {
        Ok(()) => Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "components": {
                "api": "running",
                "model": model_status,
                "database": "connected",
            }
        })),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            Json(json!({
                "status": "unhealthy",
                "service": SERVICE_NAME,
                "error": e.to_string(),
            }))
        }
    }
}

/// GET /api/v1/status
async fn system_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "apis": {
            "rest": "active",
            "websocket": "active",
        },
        "model": state.classifier.info(),
    }))
}
