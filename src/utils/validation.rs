use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Filename cannot be empty")]
    EmptyFilename,

    #[error("Filename '{0}' does not name a file")]
    InvalidFilename(String),
}

/// Strips any directory component from a client-supplied file name.
///
/// Both `/` and `\` are treated as separators so Windows-style paths are
/// reduced the same way. Control characters are replaced with `_`.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from uploaded filename: {:?}", filename);
    }

    let name = filename.rsplit(['/', '\\']).next().unwrap_or("").trim();

    if name.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }
    if name == "." || name == ".." {
        return Err(ValidationError::InvalidFilename(filename.to_string()));
    }

    Ok(name
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect())
}
