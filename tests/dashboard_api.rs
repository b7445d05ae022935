//! HTTP tests for the dashboard aggregates.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, build_test_app, get, predict_png, test_state};
use emotion_service_rs::db::models::NewPrediction;
use emotion_service_rs::db::repositories::PredictionRepo;
use emotion_service_rs::AppState;

async fn log_row(state: &AppState, emotion_id: i64, confidence: f64, days_ago: i64) {
    let row = NewPrediction {
        emotion_id,
        confidence,
        model_id: 1,
        processing_time_ms: 20,
        source_ip: Some("10.0.0.7".into()),
        user_id: None,
        timestamp: Utc::now() - Duration::days(days_ago),
    };
    PredictionRepo::insert(&state.pool, &row).await.unwrap();
}

#[tokio::test]
async fn stats_on_empty_log() {
    let json = body_json(get(build_test_app(test_state().await), "/api/v1/dashboard/stats").await).await;

    assert_eq!(json["total_predictions"], 0);
    assert!(json["most_common_emotion"]["name"].is_null());
    assert_eq!(json["most_common_emotion"]["count"], 0);
    assert_eq!(json["average_confidence"], 0.0);
    assert!(json["predictions_by_emotion"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn stats_aggregate_log() {
    let state = test_state().await;
    log_row(&state, 6, 0.5, 0).await;
    log_row(&state, 6, 0.7, 0).await;
    log_row(&state, 1, 0.9, 0).await;

    let json = body_json(get(build_test_app(state), "/api/v1/dashboard/stats").await).await;
    assert_eq!(json["total_predictions"], 3);
    assert_eq!(json["most_common_emotion"]["name"], "sad");
    assert_eq!(json["most_common_emotion"]["count"], 2);
    assert!((json["average_confidence"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    assert_eq!(json["predictions_by_emotion"]["sad"], 2);
    assert_eq!(json["predictions_by_emotion"]["angry"], 1);
}

#[tokio::test]
async fn recent_is_newest_first_and_limited() {
    let state = test_state().await;
    log_row(&state, 1, 0.4, 2).await;
    log_row(&state, 2, 0.5, 1).await;
    predict_png(build_test_app(state.clone()), None).await;

    let json = body_json(get(build_test_app(state), "/api/v1/dashboard/recent?limit=2").await).await;
    assert_eq!(json["count"], 2);
    let predictions = json["predictions"].as_array().unwrap();
    assert_eq!(predictions[0]["emotion"], "happy");
    assert_eq!(predictions[1]["emotion"], "disgust");
    assert_eq!(predictions[1]["source_ip"], "10.0.0.7");
}

#[tokio::test]
async fn recent_limit_out_of_range_is_rejected() {
    let state = test_state().await;
    for uri in ["/api/v1/dashboard/recent?limit=0", "/api/v1/dashboard/recent?limit=101"] {
        let response = get(build_test_app(state.clone()), uri).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn malformed_query_gets_json_error() {
    let state = test_state().await;
    for uri in ["/api/v1/dashboard/recent?limit=abc", "/api/v1/dashboard/timeline?days=week"] {
        let response = get(build_test_app(state.clone()), uri).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn timeline_groups_by_day_within_window() {
    let state = test_state().await;
    log_row(&state, 4, 0.9, 0).await;
    log_row(&state, 4, 0.8, 0).await;
    log_row(&state, 5, 0.6, 2).await;
    log_row(&state, 5, 0.6, 20).await;

    let json = body_json(get(build_test_app(state), "/api/v1/dashboard/timeline?days=7").await).await;
    assert_eq!(json["period_days"], 7);

    let timeline = json["timeline"].as_array().unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0]["count"], 1);
    assert_eq!(timeline[1]["count"], 2);
    assert!(timeline[0]["date"].as_str().unwrap() < timeline[1]["date"].as_str().unwrap());
}

#[tokio::test]
async fn timeline_defaults_and_bounds() {
    let state = test_state().await;

    let json = body_json(get(build_test_app(state.clone()), "/api/v1/dashboard/timeline").await).await;
    assert_eq!(json["period_days"], 7);

    let response = get(build_test_app(state), "/api/v1/dashboard/timeline?days=31").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn emotion_stats_for_known_emotion() {
    let state = test_state().await;
    log_row(&state, 7, 0.6, 1).await;
    log_row(&state, 7, 0.8, 0).await;

    let json = body_json(get(build_test_app(state), "/api/v1/dashboard/emotion/surprise").await).await;
    assert_eq!(json["emotion"]["id"], 7);
    assert_eq!(json["emotion"]["name"], "surprise");
    assert_eq!(json["statistics"]["total_predictions"], 2);
    assert!((json["statistics"]["average_confidence"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    assert!(json["statistics"]["last_prediction"].is_string());
}

#[tokio::test]
async fn emotion_stats_without_predictions() {
    let json = body_json(
        get(build_test_app(test_state().await), "/api/v1/dashboard/emotion/fear").await,
    )
    .await;
    assert_eq!(json["statistics"]["total_predictions"], 0);
    assert!(json["statistics"]["last_prediction"].is_null());
}

#[tokio::test]
async fn emotion_stats_unknown_emotion_is_not_found() {
    let response = get(build_test_app(test_state().await), "/api/v1/dashboard/emotion/bored").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Emotion 'bored' not found");
}
