//! Facial-emotion classification service.
//!
//! An axum server that accepts images over REST (multipart) or WebSocket
//! (base64 JSON), runs them through a pretrained classifier, appends the
//! result to a SQLite prediction log and answers with JSON. Username and
//! password accounts with bearer tokens and a few dashboard aggregates sit
//! on top.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod preprocess;
pub mod routes;
pub mod services;
pub mod state;
pub mod ws;

pub use routes::build as build_router;
pub use state::AppState;
