use std::env;
use std::path::PathBuf;

use anyhow::Context;

const DEV_JWT_SECRET: &str = "emotion-service-development-secret-change-me";

/// Runtime configuration, read from the environment (and `.env` when present).
///
/// | Env Var                       | Default                          |
/// |-------------------------------|----------------------------------|
/// | `HOST`                        | `0.0.0.0`                        |
/// | `PORT`                        | `8000`                           |
/// | `BODY_LIMIT_MB`               | `5`                              |
/// | `DATABASE_URL`                | `sqlite://emotions.db?mode=rwc`  |
/// | `MODEL_PATH`                  | `./model/frozen_graph.pb`        |
/// | `MODEL_URL`                   | unset                            |
/// | `MODEL_INPUT_OP`              | `x`                              |
/// | `MODEL_OUTPUT_OP`             | `Identity`                       |
/// | `JWT_SECRET`                  | development secret               |
/// | `ACCESS_TOKEN_EXPIRE_MINUTES` | `1440`                           |
/// | `ALLOWED_ORIGINS`             | `*`                              |
/// | `LOG_DIR`                     | `logs`                           |
/// | `LOG_JSON`                    | `false`                          |
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub database_url: String,
    pub model: ModelConfig,
    pub jwt: JwtConfig,
    pub allowed_origins: Vec<String>,
    pub log_dir: PathBuf,
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Where to fetch the graph from when `path` does not exist yet.
    pub url: Option<String>,
    pub input_op: String,
    pub output_op: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expire_minutes: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let body_limit_bytes = megabytes_to_bytes(parse_var("BODY_LIMIT_MB", 5)?)?;

        let secret = match env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => DEV_JWT_SECRET.to_string(),
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 8000)?,
            body_limit_bytes,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://emotions.db?mode=rwc".into()),
            model: ModelConfig {
                path: env::var("MODEL_PATH")
                    .unwrap_or_else(|_| "./model/frozen_graph.pb".into())
                    .into(),
                url: env::var("MODEL_URL").ok().filter(|s| !s.is_empty()),
                input_op: env::var("MODEL_INPUT_OP").unwrap_or_else(|_| "x".into()),
                output_op: env::var("MODEL_OUTPUT_OP").unwrap_or_else(|_| "Identity".into()),
            },
            jwt: JwtConfig {
                secret,
                access_token_expire_minutes: parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", 60 * 24)?,
            },
            allowed_origins,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".into()).into(),
            log_json: parse_var("LOG_JSON", false)?,
        })
    }
}

impl JwtConfig {
    pub fn is_development_secret(&self) -> bool {
        self.secret == DEV_JWT_SECRET
    }
}

fn megabytes_to_bytes(mb: usize) -> anyhow::Result<usize> {
    mb.checked_mul(1024 * 1024)
        .with_context(|| format!("BODY_LIMIT_MB is too large: {mb}"))
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
