pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::api::handlers::{index::index, not_found, upload::upload_file};
use crate::config::AppConfig;
use crate::services::cloud_providers::RemoteStorage;
use axum::{
    Router,
    routing::{MethodRouter, get, post},
};
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn RemoteStorage>,
}

/// `POST /upload` ingests files, every other `GET` renders the index page and
/// anything else is a 404.
pub fn create_app(state: AppState) -> Router {
    let max_in_flight = state.config.max_concurrent_requests;

    let index_or_not_found: MethodRouter = get(index).fallback(not_found).with_state(state.clone());

    Router::new()
        .route(
            "/upload",
            post(upload_file).get(index).fallback(not_found),
        )
        .fallback_service(index_or_not_found)
        .layer(GlobalConcurrencyLimitLayer::new(max_in_flight))
        .with_state(state)
}
