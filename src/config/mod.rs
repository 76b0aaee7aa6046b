use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the provider's OAuth token.
pub const TOKEN_ENV_VAR: &str = "YANDEX_DISK_TOKEN";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is not set")]
    MissingToken(&'static str),

    #[error("OAuth token contains non-ASCII characters")]
    NonAsciiToken,
}

/// Runtime configuration, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OAuth token sent as `Authorization: OAuth <token>`
    pub oauth_token: String,

    /// Base URL of the disk REST API (default: Yandex Disk v1)
    pub api_base_url: String,

    /// Prefix prepended to file names to form remote paths (default: "disk:/")
    pub remote_root: String,

    /// Temporary local storage for received files (default: "uploads")
    pub upload_dir: PathBuf,

    /// Directory containing `index.html` (default: "templates")
    pub template_dir: PathBuf,

    /// Log file written alongside console output (default: "server.log")
    pub log_file: PathBuf,

    /// Maximum declared request body size in bytes (default: 256 MB)
    pub max_upload_size: usize,

    /// Ceiling on requests served at the same time (default: 64)
    pub max_concurrent_requests: usize,

    /// Items requested per listing page (default: 100)
    pub list_page_size: u32,

    /// Timeout for listing, upload-link and metadata calls (default: 10s)
    pub request_timeout: Duration,

    /// Timeout for the PUT carrying file bytes (default: 30s)
    pub upload_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            oauth_token: String::new(),
            api_base_url: "https://cloud-api.yandex.net/v1/disk".to_string(),
            remote_root: "disk:/".to_string(),
            upload_dir: PathBuf::from("uploads"),
            template_dir: PathBuf::from("templates"),
            log_file: PathBuf::from("server.log"),
            max_upload_size: 256 * 1024 * 1024, // 256 MB
            max_concurrent_requests: 64,
            list_page_size: 100,
            request_timeout: Duration::from_secs(10),
            upload_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Fails when the token is missing, blank, or not pure ASCII; every other
    /// setting falls back to its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        let oauth_token = validate_token(env::var(TOKEN_ENV_VAR).ok())?;

        Ok(Self {
            oauth_token,

            api_base_url: env::var("DISK_API_BASE_URL").unwrap_or(default.api_base_url),

            remote_root: env::var("DISK_REMOTE_ROOT").unwrap_or(default.remote_root),

            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            template_dir: env::var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.template_dir),

            log_file: log_file_from_env(),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            max_concurrent_requests: env::var("MAX_CONCURRENT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.max_concurrent_requests),

            list_page_size: env::var("LIST_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(default.list_page_size),

            request_timeout: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.request_timeout),

            upload_timeout: env::var("UPLOAD_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.upload_timeout),
        })
    }

    /// Config for tests and local development: everything default except the
    /// given token and directories.
    pub fn development(token: &str, upload_dir: PathBuf, template_dir: PathBuf) -> Self {
        Self {
            oauth_token: token.to_string(),
            upload_dir,
            template_dir,
            ..Self::default()
        }
    }

    /// Remote path for a sanitized local file name.
    pub fn remote_path(&self, filename: &str) -> String {
        format!("{}{}", self.remote_root, filename)
    }
}

/// Log file location, readable before the rest of the configuration so that
/// configuration errors are logged too.
pub fn log_file_from_env() -> PathBuf {
    env::var("LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| AppConfig::default().log_file)
}

/// Trims the raw token and rejects blank or non-ASCII values.
pub fn validate_token(raw: Option<String>) -> Result<String, ConfigError> {
    let token = raw
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ConfigError::MissingToken(TOKEN_ENV_VAR))?;

    if !token.is_ascii() {
        return Err(ConfigError::NonAsciiToken);
    }

    Ok(token)
}
