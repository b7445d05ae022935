use chrono::{DateTime, Utc};

use super::models::{
    DailyCount, EmotionAggregate, EmotionClass, EmotionCount, ModelVersion, NewPrediction,
    RecentPrediction, User, MODEL_STATUS_ACTIVE,
};
use super::DbPool;

pub struct EmotionRepo;

impl EmotionRepo {
    pub async fn list(pool: &DbPool) -> Result<Vec<EmotionClass>, sqlx::Error> {
        sqlx::query_as(
            "SELECT emotion_id, emotion_name, emotion_desc FROM emotion_class ORDER BY emotion_id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_name(
        pool: &DbPool,
        name: &str,
    ) -> Result<Option<EmotionClass>, sqlx::Error> {
        sqlx::query_as(
            "SELECT emotion_id, emotion_name, emotion_desc FROM emotion_class \
             WHERE emotion_name = ?1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }
}

pub struct ModelVersionRepo;

impl ModelVersionRepo {
    /// The first model version flagged as active, if any.
    pub async fn find_active(pool: &DbPool) -> Result<Option<ModelVersion>, sqlx::Error> {
        sqlx::query_as(
            "SELECT model_id, model_version_tag, model_filename, model_status, creation_date \
             FROM model_version WHERE model_status = ?1 ORDER BY model_id LIMIT 1",
        )
        .bind(MODEL_STATUS_ACTIVE)
        .fetch_optional(pool)
        .await
    }
}

pub struct UserRepo;

impl UserRepo {
    pub async fn find_by_username(
        pool: &DbPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT user_id, username, hashed_password, is_active, created_at, updated_at \
             FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &DbPool,
        username: &str,
        hashed_password: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO users (username, hashed_password, is_active) VALUES (?1, ?2, 1) \
             RETURNING user_id, username, hashed_password, is_active, created_at, updated_at",
        )
        .bind(username)
        .bind(hashed_password)
        .fetch_one(pool)
        .await
    }

    pub async fn set_active(pool: &DbPool, user_id: i64, active: bool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET is_active = ?1, \
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE user_id = ?2",
        )
        .bind(active)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

pub struct PredictionRepo;

impl PredictionRepo {
    /// Append a row to the prediction log and return its id.
    pub async fn insert(pool: &DbPool, row: &NewPrediction) -> Result<i64, sqlx::Error> {
        let id: (i64,) = sqlx::query_as(
            "INSERT INTO predictions_log \
             (emotion_id, confidence, model_id, processing_time_ms, source_ip, user_id, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING predic_id",
        )
        .bind(row.emotion_id)
        .bind(row.confidence)
        .bind(row.model_id)
        .bind(row.processing_time_ms)
        .bind(&row.source_ip)
        .bind(row.user_id)
        .bind(row.timestamp)
        .fetch_one(pool)
        .await?;
        Ok(id.0)
    }

    pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM predictions_log")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn average_confidence(pool: &DbPool) -> Result<f64, sqlx::Error> {
        let row: (f64,) =
            sqlx::query_as("SELECT COALESCE(AVG(confidence), 0.0) FROM predictions_log")
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Prediction counts per emotion, most frequent first.
    pub async fn count_by_emotion(pool: &DbPool) -> Result<Vec<EmotionCount>, sqlx::Error> {
        sqlx::query_as(
            "SELECT e.emotion_name AS emotion_name, COUNT(p.predic_id) AS count \
             FROM emotion_class e JOIN predictions_log p ON p.emotion_id = e.emotion_id \
             GROUP BY e.emotion_name ORDER BY count DESC, e.emotion_name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn recent(pool: &DbPool, limit: i64) -> Result<Vec<RecentPrediction>, sqlx::Error> {
        sqlx::query_as(
            "SELECT p.predic_id AS id, p.timestamp AS timestamp, e.emotion_name AS emotion, \
                    p.confidence AS confidence, p.source_ip AS source_ip, u.username AS username \
             FROM predictions_log p \
             JOIN emotion_class e ON e.emotion_id = p.emotion_id \
             LEFT JOIN users u ON u.user_id = p.user_id \
             ORDER BY julianday(p.timestamp) DESC, p.predic_id DESC \
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Daily counts for rows at or after `since`, oldest day first.
    pub async fn daily_counts(
        pool: &DbPool,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, sqlx::Error> {
        sqlx::query_as(
            "SELECT date(timestamp) AS date, COUNT(*) AS count FROM predictions_log \
             WHERE julianday(timestamp) >= julianday(?1) \
             GROUP BY date(timestamp) ORDER BY date(timestamp)",
        )
        .bind(since)
        .fetch_all(pool)
        .await
    }

    pub async fn aggregate_for_emotion(
        pool: &DbPool,
        emotion_id: i64,
    ) -> Result<EmotionAggregate, sqlx::Error> {
        let (total_predictions, average_confidence): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(AVG(confidence), 0.0) FROM predictions_log \
             WHERE emotion_id = ?1",
        )
        .bind(emotion_id)
        .fetch_one(pool)
        .await?;

        let last_prediction: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT timestamp FROM predictions_log WHERE emotion_id = ?1 \
             ORDER BY julianday(timestamp) DESC, predic_id DESC LIMIT 1",
        )
        .bind(emotion_id)
        .fetch_optional(pool)
        .await?;

        Ok(EmotionAggregate {
            total_predictions,
            average_confidence,
            last_prediction: last_prediction.map(|(ts,)| ts),
        })
    }
}
