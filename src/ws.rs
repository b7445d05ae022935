//! WebSocket front end.
//!
//! Each text frame carries a JSON object with a `command` field (default
//! `predict`); every frame gets exactly one JSON reply.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::extract::user_from_token;
use crate::routes::health::SERVICE_NAME;
use crate::routes::predictions::load_emotions;
use crate::routes::ClientIp;
use crate::services::prediction::predict_emotion;
use crate::state::AppState;

/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, client_ip))
}

/// Keeps the connected-client gauge in step with the socket's lifetime.
struct ClientGuard(Arc<AtomicUsize>);

impl ClientGuard {
    fn register(counter: Arc<AtomicUsize>) -> (Self, usize) {
        let total = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (Self(counter), total)
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState, client_ip: Option<String>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let (_guard, total) = ClientGuard::register(state.ws_clients.clone());
    tracing::info!(conn_id = %conn_id, client_ip = ?client_ip, total, "WebSocket connected");

    if send_json(&mut socket, &welcome_message()).await.is_err() {
        return;
    }

    while let Some(result) = socket.recv().await {
        let reply = match result {
            Ok(Message::Text(text)) => {
                handle_command(&state, text.as_str(), client_ip.clone()).await
            }
            Ok(Message::Binary(_)) => error_message("Binary frames are not supported"),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        };

        if send_json(&mut socket, &reply).await.is_err() {
            tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
            break;
        }
    }

    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

async fn send_json(socket: &mut WebSocket, value: &Value) -> Result<(), axum::Error> {
    socket.send(Message::Text(value.to_string().into())).await
}

pub fn welcome_message() -> Value {
    json!({
        "type": "welcome",
        "message": format!("Welcome to the {SERVICE_NAME} WebSocket server"),
        "version": env!("CARGO_PKG_VERSION"),
        "commands": {
            "predict": "Predict the emotion in an image (requires base64 'image' field, optional 'token')",
            "emotions": "List the emotion classes",
            "model_info": "Information about the loaded model",
            "health": "Server status",
        }
    })
}

fn error_message(message: impl Into<String>) -> Value {
    json!({ "type": "error", "message": message.into() })
}

/// Parse one inbound frame and produce the reply.
pub async fn handle_command(state: &AppState, text: &str, client_ip: Option<String>) -> Value {
    let data: Value = match serde_json::from_str(text) {
        Ok(v @ Value::Object(_)) => v,
        Ok(_) => return error_message("Invalid message: expected a JSON object"),
        Err(_) => return error_message("Invalid JSON"),
    };

    let command = data
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or("predict");

    match command {
        "predict" => handle_predict(state, &data, client_ip).await,
        "emotions" => handle_emotions(state).await,
        "model_info" => json!({
            "type": "model_info",
            "status": "success",
            "info": state.classifier.info(),
        }),
        "health" => json!({
            "type": "health",
            "status": "healthy",
            "service": SERVICE_NAME,
            "timestamp": Utc::now().to_rfc3339(),
            "clients_connected": state.ws_clients.load(Ordering::SeqCst),
        }),
        other => error_message(format!("Unknown command: {other}")),
    }
}

async fn handle_predict(state: &AppState, data: &Value, client_ip: Option<String>) -> Value {
    let Some(encoded) = data.get("image").and_then(Value::as_str) else {
        return error_message("Field 'image' is required");
    };

    let image_bytes = match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(e) => return error_message(format!("Failed to decode image: {e}")),
    };
    if image_bytes.is_empty() {
        return error_message("The image is empty");
    }

    let user = match data.get("token").and_then(Value::as_str) {
        Some(token) => match user_from_token(state, token).await {
            Ok(user) => Some(user),
            Err(e) => return error_message(e.client_message()),
        },
        None => None,
    };

    tracing::info!(user = ?user.as_ref().map(|u| &u.username), "WebSocket prediction");
    match predict_emotion(state, image_bytes, client_ip, user.map(|u| u.user_id)).await {
        Ok(result) => json!({
            "type": "prediction",
            "status": "success",
            "emotion_name": result.emotion_name,
            "confidence": result.confidence,
            "model_version_tag": result.model_version_tag,
            "processing_time_ms": result.processing_time_ms,
            "timestamp": Utc::now().to_rfc3339(),
        }),
        Err(e) => {
            if !e.is_client_error() {
                tracing::error!(error = %e, "WebSocket prediction failed");
            }
            error_message(e.client_message())
        }
    }
}

async fn handle_emotions(state: &AppState) -> Value {
    match load_emotions(state).await {
        Ok(emotions) => json!({
            "type": "emotions",
            "status": "success",
            "emotions": emotions,
        }),
        Err(e) => {
            tracing::error!(error = %e, "failed to list emotions");
            error_message("Failed to fetch the emotion list")
        }
    }
}
