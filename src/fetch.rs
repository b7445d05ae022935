use std::path::Path;

use anyhow::{bail, Context};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::config::ModelConfig;

async fn download_file(url: &str, path: &Path) -> anyhow::Result<()> {
    tracing::info!(url, path = %path.display(), "downloading model file");

    let mut header_map = HeaderMap::new();
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        let auth_value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("GITHUB_TOKEN is not a valid header value")?;
        header_map.insert(AUTHORIZATION, auth_value);
    }
    header_map.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));

    let response = reqwest::Client::new()
        .get(url)
        .headers(header_map)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    if !response.status().is_success() {
        bail!("failed to download {url}: {}", response.status());
    }

    let bytes = response.bytes().await?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(bytes = bytes.len(), "model file saved");
    Ok(())
}

/// Make sure the model graph is on disk, fetching it from `MODEL_URL` when it
/// is missing.
pub async fn ensure_model_file(cfg: &ModelConfig) -> anyhow::Result<()> {
    if cfg.path.exists() {
        return Ok(());
    }

    match &cfg.url {
        Some(url) => download_file(url, &cfg.path).await,
        None => bail!(
            "model not found at {} and MODEL_URL is not set",
            cfg.path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[tokio::test]
    async fn existing_file_is_not_fetched() {
        let mut model_file = tempfile::NamedTempFile::new().unwrap();
        model_file.write_all(b"graph").unwrap();

        let cfg = ModelConfig {
            path: model_file.path().to_path_buf(),
            url: Some("http://127.0.0.1:9/unreachable".into()),
            input_op: "x".into(),
            output_op: "Identity".into(),
        };
        ensure_model_file(&cfg).await.unwrap();

        assert_eq!(std::fs::read(model_file.path()).unwrap(), b"graph");
    }

    #[tokio::test]
    async fn missing_file_with_unreachable_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ModelConfig {
            path: dir.path().join("model.pb"),
            url: Some("http://127.0.0.1:9/unreachable".into()),
            input_op: "x".into(),
            output_op: "Identity".into(),
        };

        assert!(ensure_model_file(&cfg).await.is_err());
        assert!(!cfg.path.exists());
    }

    #[tokio::test]
    async fn missing_file_without_url_fails() {
        let cfg = ModelConfig {
            path: "/nonexistent/emotion/model.pb".into(),
            url: None,
            input_op: "x".into(),
            output_op: "Identity".into(),
        };
        let err = ensure_model_file(&cfg).await.unwrap_err();
        assert!(err.to_string().contains("MODEL_URL"));
    }
}
