use crate::AppState;
use crate::api::error::AppError;
use crate::services::multipart::{self, UploadedField};
use crate::utils::validation::sanitize_filename;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, header},
    response::Redirect,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{error, info, warn};

pub const FILE_FIELD: &str = "file";
pub const SUCCESS_MESSAGE: &str = "File uploaded successfully";
pub const FAILURE_MESSAGE: &str = "Failed to upload file";

/// Receives a form upload, stores it locally and relays it to remote storage.
///
/// The local copy is removed only when the remote upload and its existence
/// check both succeed; otherwise it stays for a later retry.
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Redirect, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type header".to_string()))?
        .to_str()
        .map_err(|_| AppError::BadRequest("Invalid Content-Type header".to_string()))?;

    if !is_form_data(content_type) {
        return Err(AppError::BadRequest(
            "Content-Type must be multipart/form-data".to_string(),
        ));
    }

    let content_length = declared_length(&headers)?;
    if content_length == 0 {
        return Err(AppError::BadRequest("Empty request".to_string()));
    }
    if content_length > state.config.max_upload_size {
        return Err(AppError::PayloadTooLarge(format!(
            "Request body of {} bytes exceeds the {} byte limit",
            content_length, state.config.max_upload_size
        )));
    }

    let raw = multipart::read_declared(body.into_data_stream(), content_length).await?;
    let mut form = multipart::decode(content_type, &raw)?;
    info!("Form data parsed ({} fields)", form.len());

    let field = form
        .remove(FILE_FIELD)
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{}' field", FILE_FIELD)))?;
    let UploadedField::File {
        filename, content, ..
    } = field
    else {
        return Err(AppError::BadRequest("No file selected".to_string()));
    };

    let filename = sanitize_filename(&filename)?;
    let file_path = state.config.upload_dir.join(&filename);

    tokio::fs::write(&file_path, &content).await.map_err(|e| {
        AppError::Internal(format!("Failed to save file {}: {}", file_path.display(), e))
    })?;
    info!("Saved {} locally ({} bytes)", filename, content.len());

    let remote_path = state.config.remote_path(&filename);
    if !state.storage.upload(&file_path, &remote_path).await {
        warn!(
            "Upload of {} to {} failed, local copy kept at {}",
            filename,
            state.storage.provider_id(),
            file_path.display()
        );
        return Ok(redirect_with_message(FAILURE_MESSAGE, "error"));
    }

    match tokio::fs::remove_file(&file_path).await {
        Ok(()) => info!("Removed local copy of {} after upload", filename),
        Err(e) => error!("Failed to remove local copy of {}: {}", filename, e),
    }

    Ok(redirect_with_message(SUCCESS_MESSAGE, "success"))
}

fn is_form_data(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .map(|m| {
            m.type_().as_str().eq_ignore_ascii_case(mime::MULTIPART.as_str())
                && m.subtype().as_str().eq_ignore_ascii_case(mime::FORM_DATA.as_str())
        })
        .unwrap_or(false)
}

/// Declared `Content-Length`; a missing header counts as zero.
fn declared_length(headers: &HeaderMap) -> Result<usize, AppError> {
    match headers.get(header::CONTENT_LENGTH) {
        None => Ok(0),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| AppError::BadRequest("Invalid Content-Length header".to_string())),
    }
}

fn redirect_with_message(message: &str, kind: &str) -> Redirect {
    Redirect::to(&format!(
        "/?message={}&type={}",
        utf8_percent_encode(message, NON_ALPHANUMERIC),
        kind
    ))
}
