//! Route modules for the PropertyData server

pub mod enrich;
pub mod health;
pub mod info;
pub mod predict;

use axum::{routing::get, Router};

use crate::state::AppState;

/// All routes, bound to `state`
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config().server.max_upload_bytes;

    Router::new()
        .route("/", get(health::health_check))
        .route("/api-info", get(info::api_info))
        .merge(enrich::router())
        .merge(predict::router(max_upload_bytes))
        .with_state(state)
}
