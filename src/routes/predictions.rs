use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::extract::Upload;
use super::ClientIp;
use crate::auth::extract::MaybeAuthUser;
use crate::db::models::EmotionClass;
use crate::db::repositories::EmotionRepo;
use crate::error::{AppError, AppResult};
use crate::model::ModelInfo;
use crate::services::prediction::{predict_emotion, PredictionResponse};
use crate::state::AppState;

const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/emotions", get(list_emotions))
        .route("/model/info", get(model_info))
}

/// POST /api/v1/predict
///
/// Multipart upload with the image in the `file` field. A bearer token is
/// optional and, when given, ties the logged prediction to that user.
async fn predict_handler(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    MaybeAuthUser(user): MaybeAuthUser,
    Upload(mut multipart): Upload,
) -> AppResult<Json<PredictionResponse>> {
    let mut image_data = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            tracing::warn!(content_type = %content_type, "rejected upload content type");
            return Err(AppError::BadRequest(format!(
                "File type not allowed: {content_type}. Use JPEG, PNG or WEBP"
            )));
        }

        tracing::info!(
            filename = field.file_name().unwrap_or("<unnamed>"),
            content_type = %content_type,
            "processing upload"
        );
        let bytes = field.bytes().await?;
        image_data = Some(bytes.to_vec());
        break;
    }

    let image_data =
        image_data.ok_or_else(|| AppError::BadRequest("No file was provided".into()))?;
    if image_data.is_empty() {
        return Err(AppError::BadRequest("The file is empty".into()));
    }

    let user_id = user.as_ref().map(|u| u.user_id);
    let result = predict_emotion(&state, image_data, client_ip, user_id).await?;

    tracing::info!(
        emotion = %result.emotion_name,
        user = user.as_ref().map(|u| u.username.as_str()).unwrap_or("anonymous"),
        "REST prediction served"
    );
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct EmotionsResponse {
    pub emotions: Vec<EmotionClass>,
}

/// Shown when the `emotion_class` table has been emptied.
pub fn default_emotions() -> Vec<EmotionClass> {
    [
        ("angry", "Anger or rage"),
        ("disgust", "Disgust or revulsion"),
        ("fear", "Fear or dread"),
        ("happy", "Happiness or joy"),
        ("neutral", "Neutral or no apparent emotion"),
        ("sad", "Sadness"),
        ("surprise", "Surprise"),
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, (name, desc))| EmotionClass {
        emotion_id: idx as i64 + 1,
        emotion_name: name.to_string(),
        emotion_desc: Some(desc.to_string()),
    })
    .collect()
}

pub async fn load_emotions(state: &AppState) -> AppResult<Vec<EmotionClass>> {
    let emotions = EmotionRepo::list(&state.pool).await?;
    if emotions.is_empty() {
        return Ok(default_emotions());
    }
    Ok(emotions)
}

/// GET /api/v1/emotions
async fn list_emotions(State(state): State<AppState>) -> AppResult<Json<EmotionsResponse>> {
    let emotions = load_emotions(&state).await?;
    Ok(Json(EmotionsResponse { emotions }))
}

/// GET /api/v1/model/info
async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.classifier.info())
}
