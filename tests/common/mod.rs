#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, header},
};
use disk_relay::config::AppConfig;
use disk_relay::services::cloud_providers::{RemoteListing, RemoteStorage};
use disk_relay::{AppState, create_app};
use http_body_util::BodyExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";
pub const TEMPLATE: &str = "<html><body>{{message_block}}<ul>{{file_list}}</ul></body></html>";

/// What the stub saw during an `upload` call.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub content: Option<Vec<u8>>,
}

/// In-memory `RemoteStorage` with scripted outcomes.
pub struct StubStorage {
    pub remote_names: Vec<String>,
    pub listing_complete: bool,
    pub upload_succeeds: bool,
    pub uploads: Mutex<Vec<RecordedUpload>>,
}

impl StubStorage {
    pub fn new(upload_succeeds: bool) -> Self {
        Self {
            remote_names: Vec::new(),
            listing_complete: true,
            upload_succeeds,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_remote(mut self, names: &[&str]) -> Self {
        self.remote_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn incomplete(mut self) -> Self {
        self.listing_complete = false;
        self
    }

    pub fn recorded(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStorage for StubStorage {
    fn provider_id(&self) -> &'static str {
        "stub"
    }

    async fn list_all(&self) -> RemoteListing {
        RemoteListing {
            names: self.remote_names.clone(),
            complete: self.listing_complete,
        }
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> bool {
        self.uploads.lock().unwrap().push(RecordedUpload {
            local_path: local_path.to_path_buf(),
            remote_path: remote_path.to_string(),
            content: std::fs::read(local_path).ok(),
        });
        self.upload_succeeds
    }

    async fn exists(&self, remote_path: &str) -> bool {
        self.remote_names
            .iter()
            .any(|n| remote_path.ends_with(n.as_str()))
    }
}

pub struct TestEnv {
    pub root: TempDir,
    pub config: AppConfig,
    pub storage: Arc<StubStorage>,
}

impl TestEnv {
    pub fn new(storage: StubStorage) -> Self {
        let _ = tracing_subscriber::fmt::try_init();

        let root = tempfile::tempdir().unwrap();
        let upload_dir = root.path().join("uploads");
        let template_dir = root.path().join("templates");
        std::fs::create_dir_all(&upload_dir).unwrap();
        std::fs::create_dir_all(&template_dir).unwrap();
        std::fs::write(template_dir.join("index.html"), TEMPLATE).unwrap();

        let config = AppConfig::development("test-token", upload_dir, template_dir);
        Self {
            root,
            config,
            storage: Arc::new(storage),
        }
    }

    pub fn app(&self) -> Router {
        create_app(AppState {
            config: Arc::new(self.config.clone()),
            storage: self.storage.clone(),
        })
    }

    pub fn upload_dir_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.config.upload_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn file_part(name: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
         Content-Type: text/plain\r\n\r\n"
    )
    .into_bytes();
    part.extend_from_slice(content);
    part.extend_from_slice(b"\r\n");
    part
}

pub fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
         {value}\r\n"
    )
    .into_bytes()
}

pub fn finish(mut body: Vec<u8>) -> Vec<u8> {
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn form_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn upload_request(content_type: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}
