use crate::config::AppConfig;
use anyhow::Context;
use std::path::Path;
use tracing::info;

/// Creates the upload and template directories when missing.
pub async fn ensure_directories(config: &AppConfig) -> anyhow::Result<()> {
    for dir in [&config.upload_dir, &config.template_dir] {
        create_dir(dir).await?;
    }
    Ok(())
}

async fn create_dir(dir: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    info!("📁 Directory ready: {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_directories_creates_missing() {
        let root = tempfile::tempdir().unwrap();
        let config = AppConfig::development(
            "token",
            root.path().join("uploads"),
            root.path().join("nested/templates"),
        );

        ensure_directories(&config).await.unwrap();
        assert!(config.upload_dir.is_dir());
        assert!(config.template_dir.is_dir());

        // Idempotent
        ensure_directories(&config).await.unwrap();
    }
}
