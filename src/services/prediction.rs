//! The prediction pipeline shared by the REST and WebSocket front ends:
//! preprocess, classify, log, respond.

use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use crate::db::models::NewPrediction;
use crate::db::repositories::{ModelVersionRepo, PredictionRepo};
use crate::error::{AppError, AppResult};
use crate::model::{classify, ModelError, Prediction, EMOTION_CLASSES};
use crate::preprocess::preprocess_image;
use crate::state::AppState;

/// Tag and id reported when no model version row is flagged active.
const FALLBACK_MODEL_TAG: &str = "v1.0.0";
const FALLBACK_MODEL_ID: i64 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub emotion_name: String,
    pub confidence: f64,
    pub model_version_tag: String,
    pub processing_time_ms: i64,
}

/// Classifier output position maps to the seeded `emotion_class` ids (1-based).
pub fn emotion_id(name: &str) -> Option<i64> {
    EMOTION_CLASSES
        .iter()
        .position(|c| *c == name)
        .map(|idx| idx as i64 + 1)
}

fn round4(value: f32) -> f64 {
    (value as f64 * 10_000.0).round() / 10_000.0
}

pub async fn predict_emotion(
    state: &AppState,
    image_bytes: Vec<u8>,
    source_ip: Option<String>,
    user_id: Option<i64>,
) -> AppResult<PredictionResponse> {
    let start = Instant::now();

    let classifier = state.classifier.clone();
    let prediction: Prediction = tokio::task::spawn_blocking(move || {
        let input = preprocess_image(&image_bytes)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "image preprocessed");

        let scores = classifier.predict(&input).map_err(inference_error)?;
        classify(&scores).map_err(inference_error)
    })
    .await
    .map_err(|e| AppError::Internal(format!("inference task failed: {e}")))??;

    let processing_time_ms = start.elapsed().as_millis() as i64;

    let (model_id, model_version_tag) = match ModelVersionRepo::find_active(&state.pool).await {
        Ok(Some(model)) => (model.model_id, model.model_version_tag),
        Ok(None) => {
            tracing::warn!("no active model version in database, using fallback tag");
            (FALLBACK_MODEL_ID, FALLBACK_MODEL_TAG.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to look up active model version");
            (FALLBACK_MODEL_ID, FALLBACK_MODEL_TAG.to_string())
        }
    };

    let emotion_id = emotion_id(prediction.emotion_name).ok_or_else(|| {
        AppError::Internal(format!("unrecognised emotion: {}", prediction.emotion_name))
    })?;

    let row = NewPrediction {
        emotion_id,
        confidence: prediction.confidence as f64,
        model_id,
        processing_time_ms,
        source_ip,
        user_id,
        timestamp: Utc::now(),
    };

    // The caller still gets its answer if the audit write fails.
    match PredictionRepo::insert(&state.pool, &row).await {
        Ok(id) => tracing::debug!(predic_id = id, "prediction logged"),
        Err(e) => tracing::error!(error = %e, "failed to log prediction"),
    }

    tracing::info!(
        emotion = prediction.emotion_name,
        confidence = prediction.confidence,
        processing_time_ms,
        user_id = ?user_id,
        "prediction complete"
    );

    Ok(PredictionResponse {
        emotion_name: prediction.emotion_name.to_string(),
        confidence: round4(prediction.confidence),
        model_version_tag,
        processing_time_ms,
    })
}

fn inference_error(e: ModelError) -> AppError {
    AppError::Inference(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_ids_follow_seed_order() {
        assert_eq!(emotion_id("angry"), Some(1));
        assert_eq!(emotion_id("happy"), Some(4));
        assert_eq!(emotion_id("surprise"), Some(7));
        assert_eq!(emotion_id("bored"), None);
    }

    #[test]
    fn confidence_rounds_to_four_places() {
        assert_eq!(round4(0.923_456_7), 0.9235);
        assert_eq!(round4(1.0), 1.0);
    }
}
