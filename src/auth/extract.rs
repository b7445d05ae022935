use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::jwt::verify_token;
use crate::db::models::User;
use crate::db::repositories::UserRepo;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Resolve a bearer token to an active user.
pub async fn user_from_token(state: &AppState, token: &str) -> AppResult<User> {
    let claims = verify_token(token, &state.config.jwt).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    let user = UserRepo::find_by_username(&state.pool, &claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Inactive user".into()));
    }
    Ok(user)
}

fn bearer_token(parts: &Parts) -> AppResult<Option<&str>> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;
    let invalid_format =
        || AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into());

    // The auth scheme is case-insensitive.
    let (scheme, token) = value.split_once(' ').ok_or_else(invalid_format)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(invalid_format());
    }
    Ok(Some(token.trim()))
}

/// Authenticated caller; rejects the request with 401 when the
/// `Authorization: Bearer` header is missing or invalid.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;
        Ok(AuthUser(user_from_token(state, token).await?))
    }
}

/// Optional caller identity. No header means anonymous; a header that is
/// present but invalid is still a 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        match bearer_token(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(user_from_token(state, token).await?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
