use super::{RemoteListing, RemoteStorage};
use crate::config::AppConfig;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Local file error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct FilesPage {
    #[serde(default)]
    items: Vec<ResourceItem>,
    #[serde(rename = "_links", default)]
    links: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
struct ResourceItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    next: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

/// Target returned by the upload-link call, valid for one PUT.
#[derive(Debug, Deserialize)]
struct UploadTicket {
    href: String,
}

impl FilesPage {
    fn next_href(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_ref())
            .map(|n| n.href.as_str())
    }
}

/// Client for the Yandex Disk REST API (or any server speaking its contract).
pub struct YandexDiskClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    page_size: u32,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl YandexDiskClient {
    pub fn new(config: &AppConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.oauth_token.clone(),
            page_size: config.list_page_size,
            request_timeout: config.request_timeout,
            upload_timeout: config.upload_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        Url::parse(&url).map_err(|source| RemoteError::InvalidUrl { url, source })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .timeout(self.request_timeout)
    }

    async fn fetch_page(&self, url: &Url) -> Result<FilesPage, RemoteError> {
        let response = self
            .authorized(self.http.get(url.clone()))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<FilesPage>().await?)
    }

    async fn request_upload_link(&self, remote_path: &str) -> Result<UploadTicket, RemoteError> {
        let url = self.endpoint("/resources/upload")?;
        let response = self
            .authorized(self.http.get(url))
            .query(&[("path", remote_path), ("overwrite", "true")])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<UploadTicket>().await?)
    }

    async fn put_file(&self, ticket: &UploadTicket, local_path: &Path) -> Result<StatusCode, RemoteError> {
        let data = tokio::fs::read(local_path).await?;
        let response = self
            .http
            .put(ticket.href.as_str())
            .timeout(self.upload_timeout)
            .body(data)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::ACCEPTED => Ok(response.status()),
            status => Err(RemoteError::Status(status)),
        }
    }
}

fn log_remote_error(action: &str, err: &RemoteError) {
    match err {
        RemoteError::Transport(e) if e.is_timeout() => {
            error!("Timed out while {}: {}", action, e)
        }
        RemoteError::Transport(e) if e.is_decode() => {
            error!("Malformed response while {}: {}", action, e)
        }
        RemoteError::Transport(e) => match e.status() {
            Some(status) => error!("HTTP error {} while {}", status, action),
            None => error!("Transport error while {}: {}", action, e),
        },
        other => error!("Failed {}: {}", action, other),
    }
}

#[async_trait]
impl RemoteStorage for YandexDiskClient {
    fn provider_id(&self) -> &'static str {
        "yandex_disk"
    }

    async fn list_all(&self) -> RemoteListing {
        let mut listing = RemoteListing::default();

        let mut url = match self.endpoint("/resources/files") {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("limit", &self.page_size.to_string());
                url
            }
            Err(e) => {
                log_remote_error("building listing URL", &e);
                return listing;
            }
        };

        loop {
            let page = match self.fetch_page(&url).await {
                Ok(page) => page,
                Err(e) => {
                    log_remote_error("listing remote files", &e);
                    warn!(
                        "Remote listing truncated after {} names",
                        listing.names.len()
                    );
                    return listing;
                }
            };

            let next = page.next_href().map(str::to_string);
            listing
                .names
                .extend(page.items.into_iter().map(|item| item.name));

            let Some(href) = next else {
                listing.complete = true;
                return listing;
            };

            match url.join(&href) {
                Ok(next_url) if next_url != url => url = next_url,
                Ok(_) => {
                    warn!("Remote listing returned a self-referencing next link, stopping");
                    return listing;
                }
                Err(source) => {
                    log_remote_error(
                        "following listing link",
                        &RemoteError::InvalidUrl { url: href, source },
                    );
                    return listing;
                }
            }
        }
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> bool {
        let ticket = match self.request_upload_link(remote_path).await {
            Ok(ticket) => {
                info!("Received upload link for {}", remote_path);
                ticket
            }
            Err(e) => {
                log_remote_error("requesting upload link", &e);
                return false;
            }
        };

        match self.put_file(&ticket, local_path).await {
            Ok(status) => info!("Uploaded {} (status {})", remote_path, status),
            Err(e) => {
                log_remote_error("uploading file bytes", &e);
                return false;
            }
        }

        if !self.exists(remote_path).await {
            error!("{} not found on remote storage after upload", remote_path);
            return false;
        }

        true
    }

    async fn exists(&self, remote_path: &str) -> bool {
        let url = match self.endpoint("/resources") {
            Ok(url) => url,
            Err(e) => {
                log_remote_error("building metadata URL", &e);
                return false;
            }
        };

        let result = self
            .authorized(self.http.get(url))
            .query(&[("path", remote_path)])
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => {
                info!("{} confirmed on remote storage", remote_path);
                true
            }
            Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                warn!("{} does not exist on remote storage", remote_path);
                false
            }
            Ok(response) => {
                error!(
                    "Unexpected status {} while checking {}",
                    response.status(),
                    remote_path
                );
                false
            }
            Err(e) => {
                log_remote_error("checking remote file", &RemoteError::Transport(e));
                false
            }
        }
    }
}
