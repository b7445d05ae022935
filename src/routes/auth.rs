//! `/api/v1/auth`: register, login, token verification and profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::{AppJson, AppQuery};
use crate::auth::extract::{user_from_token, AuthUser};
use crate::auth::jwt::create_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::db::models::User;
use crate::db::repositories::UserRepo;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify", get(verify))
        .route("/users/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 6, max = 72))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

/// Public view of a user; never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub username: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    AppJson(input): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    input.validate()?;

    if UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .is_some()
    {
        tracing::warn!(username = %input.username, "registration with existing username");
        return Err(AppError::BadRequest("Username is already registered".into()));
    }

    let hashed = hash_password(&input.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let user = UserRepo::create(&state.pool, &input.username, &hashed)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("Username is already registered".into())
            }
            _ => AppError::Database(e),
        })?;

    tracing::info!(username = %user.username, user_id = user.user_id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let invalid = || AppError::Unauthorized("Incorrect username or password".into());

    let Some(user) = UserRepo::find_by_username(&state.pool, &input.username).await? else {
        tracing::warn!(username = %input.username, "login for unknown user");
        return Err(invalid());
    };

    let password_ok = verify_password(&input.password, &user.hashed_password)
        .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))?;

    if !password_ok || !user.is_active {
        tracing::warn!(username = %input.username, "failed login");
        return Err(invalid());
    }

    let access_token = create_access_token(&user.username, &state.config.jwt)
        .map_err(|e| AppError::Internal(format!("token generation failed: {e}")))?;

    tracing::info!(username = %user.username, "login succeeded");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// GET /api/v1/auth/verify?token=...
async fn verify(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<VerifyQuery>,
) -> AppResult<Json<UserResponse>> {
    let user = user_from_token(&state, &query.token).await?;
    Ok(Json(user.into()))
}

/// GET /api/v1/auth/users/me
async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}
