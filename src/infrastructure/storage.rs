use crate::config::AppConfig;
use crate::services::cloud_providers::RemoteStorage;
use crate::services::cloud_providers::yandex_disk::YandexDiskClient;
use std::sync::Arc;
use tracing::info;

pub fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn RemoteStorage>> {
    info!(
        "☁️  Remote Storage: {} (root: {})",
        config.api_base_url, config.remote_root
    );

    let client = YandexDiskClient::new(config)?;
    Ok(Arc::new(client))
}
