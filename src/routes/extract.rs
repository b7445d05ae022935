//! Thin wrappers over axum's body and query extractors whose rejections go
//! through [`AppError`], so malformed requests still get the JSON error body.

use axum::extract::{FromRequest, FromRequestParts, Multipart};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `multipart/form-data` body.
#[derive(FromRequest)]
#[from_request(rejection(AppError))]
pub struct Upload(pub Multipart);
