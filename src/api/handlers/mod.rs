pub mod index;
pub mod upload;

use crate::api::error::AppError;

pub async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}
