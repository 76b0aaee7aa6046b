use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

/// Names reported by a remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteListing {
    pub names: Vec<String>,
    /// `false` when pagination stopped on an error and `names` may be short.
    pub complete: bool,
}

impl RemoteListing {
    pub fn name_set(&self) -> HashSet<&str> {
        self.names.iter().map(String::as_str).collect()
    }
}

/// Remote object store the relay pushes files into.
///
/// Failures never surface as errors: they are logged by the implementation and
/// reported as `false` or as an incomplete listing.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Provider identifier used in logs (e.g., "yandex_disk")
    fn provider_id(&self) -> &'static str;

    /// All file names, following pagination until exhausted or an error occurs
    async fn list_all(&self) -> RemoteListing;

    /// Uploads a local file, overwriting `remote_path`, then confirms it exists
    async fn upload(&self, local_path: &Path, remote_path: &str) -> bool;

    /// Whether `remote_path` is present; any error counts as absent
    async fn exists(&self, remote_path: &str) -> bool;
}

pub mod yandex_disk;
