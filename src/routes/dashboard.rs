use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::{DailyCount, RecentPrediction};
use crate::db::repositories::{EmotionRepo, PredictionRepo};
use super::extract::AppQuery;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(stats))
        .route("/dashboard/recent", get(recent))
        .route("/dashboard/timeline", get(timeline))
        .route("/dashboard/emotion/{emotion_name}", get(emotion_stats))
}

#[derive(Debug, Serialize)]
pub struct MostCommonEmotion {
    pub name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_predictions: i64,
    pub most_common_emotion: MostCommonEmotion,
    pub average_confidence: f64,
    pub predictions_by_emotion: BTreeMap<String, i64>,
}

/// GET /api/v1/dashboard/stats
async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let total_predictions = PredictionRepo::count(&state.pool).await?;
    let average_confidence = PredictionRepo::average_confidence(&state.pool).await?;
    let by_emotion = PredictionRepo::count_by_emotion(&state.pool).await?;

    // Rows come back most frequent first.
    let most_common_emotion = match by_emotion.first() {
        Some(top) => MostCommonEmotion {
            name: Some(top.emotion_name.clone()),
            count: top.count,
        },
        None => MostCommonEmotion {
            name: None,
            count: 0,
        },
    };

    Ok(Json(StatsResponse {
        total_predictions,
        most_common_emotion,
        average_confidence,
        predictions_by_emotion: by_emotion
            .into_iter()
            .map(|row| (row.emotion_name, row.count))
            .collect(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecentQuery {
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub count: usize,
    pub predictions: Vec<RecentPrediction>,
}

/// GET /api/v1/dashboard/recent?limit=N
async fn recent(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RecentQuery>,
) -> AppResult<Json<RecentResponse>> {
    query.validate()?;
    let predictions = PredictionRepo::recent(&state.pool, query.limit).await?;
    Ok(Json(RecentResponse {
        count: predictions.len(),
        predictions,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TimelineQuery {
    #[validate(range(min = 1, max = 30))]
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub period_days: i64,
    pub timeline: Vec<DailyCount>,
}

/// GET /api/v1/dashboard/timeline?days=N
async fn timeline(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TimelineQuery>,
) -> AppResult<Json<TimelineResponse>> {
    query.validate()?;
    let since = Utc::now() - Duration::days(query.days);
    let timeline = PredictionRepo::daily_counts(&state.pool, since).await?;
    Ok(Json(TimelineResponse {
        period_days: query.days,
        timeline,
    }))
}

#[derive(Debug, Serialize)]
pub struct EmotionSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmotionStatistics {
    pub total_predictions: i64,
    pub average_confidence: f64,
    pub last_prediction: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct EmotionStatsResponse {
    pub emotion: EmotionSummary,
    pub statistics: EmotionStatistics,
}

/// GET /api/v1/dashboard/emotion/{emotion_name}
async fn emotion_stats(
    State(state): State<AppState>,
    Path(emotion_name): Path<String>,
) -> AppResult<Json<EmotionStatsResponse>> {
    let emotion = EmotionRepo::find_by_name(&state.pool, &emotion_name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Emotion '{emotion_name}' not found")))?;

    let agg = PredictionRepo::aggregate_for_emotion(&state.pool, emotion.emotion_id).await?;

    Ok(Json(EmotionStatsResponse {
        emotion: EmotionSummary {
            id: emotion.emotion_id,
            name: emotion.emotion_name,
            description: emotion.emotion_desc,
        },
        statistics: EmotionStatistics {
            total_predictions: agg.total_predictions,
            average_confidence: agg.average_confidence,
            last_prediction: agg.last_prediction,
        },
    }))
}
