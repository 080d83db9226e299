//! PropertyData Server Library
//!
//! Two thin HTTP services in one process:
//!
//! - `/enrich`: forwards an address to the property scraping backend and
//!   returns the listings as JSON records
//! - `/predict`: OCRs each page of an uploaded PDF and labels it with a
//!   pre-trained text classifier
//!
//! The binary in main.rs wires configuration and concrete backends; tests
//! build [`AppState`] with their own implementations of the backend traits.

pub mod classifier;
pub mod config;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod routes;
pub mod scraper;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, Services};

/// Build the application router with tracing and CORS layers
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
