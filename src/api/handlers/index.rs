use crate::AppState;
use crate::api::error::AppError;
use crate::utils::html::escape_html;
use axum::{
    extract::{RawQuery, State},
    response::Html,
};
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, warn};

pub const TEMPLATE_NAME: &str = "index.html";
pub const FILE_LIST_PLACEHOLDER: &str = "{{file_list}}";
pub const MESSAGE_PLACEHOLDER: &str = "{{message_block}}";

const INCOMPLETE_LISTING_WARNING: &str =
    "Remote file list could not be fully retrieved; upload marks may be missing.";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexQuery {
    pub message: Option<String>,
    pub kind: Option<String>,
}

impl IndexQuery {
    /// Reads `message` and `type` from a raw query string. Repeated keys keep
    /// their first value and unknown keys are ignored.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
            match key.as_ref() {
                "message" if query.message.is_none() => query.message = Some(value.into_owned()),
                "type" if query.kind.is_none() => query.kind = Some(value.into_owned()),
                _ => {}
            }
        }
        query
    }
}

/// Renders the upload page, marking local files already present remotely.
pub async fn index(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Html<String>, AppError> {
    let query = IndexQuery::parse(raw_query.as_deref());
    let template = load_template(&state.config.template_dir).await?;

    let local_files = list_local_files(&state.config.upload_dir).await;
    let remote = state.storage.list_all().await;
    if !remote.complete {
        warn!(
            "Rendering index with an incomplete {} listing ({} names)",
            state.storage.provider_id(),
            remote.names.len()
        );
    }

    let file_list = render_file_list(&local_files, &remote.name_set());

    let mut message_block = render_message(&query);
    if !remote.complete {
        message_block.push_str(&format!(
            r#"<div class="message warning">{}</div>"#,
            escape_html(INCOMPLETE_LISTING_WARNING)
        ));
    }

    let page = template
        .replace(FILE_LIST_PLACEHOLDER, &file_list)
        .replace(MESSAGE_PLACEHOLDER, &message_block);

    Ok(Html(page))
}

async fn load_template(template_dir: &Path) -> Result<String, AppError> {
    let path = template_dir.join(TEMPLATE_NAME);
    match tokio::fs::read_to_string(&path).await {
        Ok(template) => {
            info!("Template {} loaded", path.display());
            Ok(template)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::Internal(format!(
            "Template {} not found",
            path.display()
        ))),
        Err(e) => Err(AppError::Internal(format!(
            "Failed to read template {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Names in the upload directory, sorted. Read failures yield an empty list.
pub async fn list_local_files(upload_dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(upload_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to read upload directory {}: {}", upload_dir.display(), e);
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read upload directory entry: {}", e);
                break;
            }
        }
    }
    names.sort();

    info!("Found {} files in upload directory", names.len());
    names
}

pub fn render_file_list(local_files: &[String], remote: &HashSet<&str>) -> String {
    local_files
        .iter()
        .map(|name| {
            if remote.contains(name.as_str()) {
                format!(r#"<li class="uploaded">{}</li>"#, escape_html(name))
            } else {
                format!("<li>{}</li>", escape_html(name))
            }
        })
        .collect()
}

fn render_message(query: &IndexQuery) -> String {
    match query.message.as_deref().filter(|m| !m.is_empty()) {
        Some(message) => format!(
            r#"<div class="message {}">{}</div>"#,
            escape_html(query.kind.as_deref().unwrap_or("success")),
            escape_html(message)
        ),
        None => String::new(),
    }
}
