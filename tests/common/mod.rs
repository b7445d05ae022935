#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
use tower::ServiceExt;

use emotion_service_rs::config::{Config, JwtConfig, ModelConfig};
use emotion_service_rs::db::{self, DbPool};
use emotion_service_rs::model::{
    check_input_shape, Classifier, ModelError, ModelInfo, EMOTION_CLASSES,
};
use emotion_service_rs::preprocess::ImageInput;
use emotion_service_rs::{build_router, AppState};

pub const BOUNDARY: &str = "emotion-test-boundary";

/// Returns canned scores instead of running a real graph.
pub struct StubClassifier {
    pub scores: Vec<f32>,
}

impl StubClassifier {
    /// Always answers `happy` with confidence 0.87654.
    pub fn happy() -> Self {
        Self {
            scores: vec![0.01, 0.01, 0.02, 0.87654, 0.05, 0.03, 0.00346],
        }
    }
}

impl Classifier for StubClassifier {
    fn predict(&self, input: &ImageInput) -> Result<Vec<f32>, ModelError> {
        check_input_shape(input)?;
        Ok(self.scores.clone())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            status: "loaded",
            model_path: "stub".into(),
            input_shape: "(None, 96, 96, 3)".into(),
            output_shape: "(None, 7)".into(),
            num_operations: 0,
            emotion_classes: EMOTION_CLASSES.to_vec(),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        body_limit_bytes: 5 * 1024 * 1024,
        database_url: "sqlite::memory:".into(),
        model: ModelConfig {
            path: PathBuf::from("stub"),
            url: None,
            input_op: "x".into(),
            output_op: "Identity".into(),
        },
        jwt: JwtConfig {
            secret: "integration-test-secret".into(),
            access_token_expire_minutes: 60,
        },
        allowed_origins: vec!["*".into()],
        log_dir: std::env::temp_dir(),
        log_json: false,
    }
}

pub async fn test_pool() -> DbPool {
    db::connect("sqlite::memory:")
        .await
        .expect("in-memory database should open")
}

pub async fn test_state() -> AppState {
    test_state_with(StubClassifier::happy()).await
}

pub async fn test_state_with(classifier: impl Classifier) -> AppState {
    AppState::new(test_pool().await, test_config(), Arc::new(classifier))
}

pub async fn test_state_with_config(config: Config) -> AppState {
    AppState::new(test_pool().await, config, Arc::new(StubClassifier::happy()))
}

pub fn build_test_app(state: AppState) -> Router {
    build_router(state)
}

pub fn png_bytes() -> Vec<u8> {
    let img = ImageBuffer::from_fn(120, 80, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageOutputFormat::Png)
        .expect("png encoding should succeed");
    buf.into_inner()
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(
    app: Router,
    uri: &str,
    body: Vec<u8>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn predict_png(app: Router, token: Option<&str>) -> Response<Body> {
    let body = multipart_body("file", "face.png", "image/png", &png_bytes());
    post_multipart(app, "/api/v1/predict", body, token).await
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Register a user and log in, returning the access token.
pub async fn register_and_login(state: &AppState, username: &str, password: &str) -> String {
    let app = build_test_app(state.clone());
    let response = post_json(
        app,
        "/api/v1/auth/register",
        serde_json::json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(response.status(), 201);

    let app = build_test_app(state.clone());
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(response.status(), 200);
    body_json(response).await["access_token"]
        .as_str()
        .expect("login returns a token")
        .to_string()
}
