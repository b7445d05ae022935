use chrono::{DateTime, Utc};
use serde::Serialize;

/// Status flag of the model version currently serving predictions.
pub const MODEL_STATUS_ACTIVE: &str = "01";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EmotionClass {
    #[serde(rename = "id")]
    pub emotion_id: i64,
    #[serde(rename = "name")]
    pub emotion_name: String,
    #[serde(rename = "description")]
    pub emotion_desc: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModelVersion {
    pub model_id: i64,
    pub model_version_tag: String,
    pub model_filename: String,
    pub model_status: String,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the append-only prediction log.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub emotion_id: i64,
    pub confidence: f64,
    pub model_id: i64,
    pub processing_time_ms: i64,
    pub source_ip: Option<String>,
    pub user_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentPrediction {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub emotion: String,
    pub confidence: f64,
    pub source_ip: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EmotionCount {
    pub emotion_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct EmotionAggregate {
    pub total_predictions: i64,
    pub average_confidence: f64,
    pub last_prediction: Option<DateTime<Utc>>,
}
