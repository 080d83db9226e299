//! PropertyData Server
//!
//! Property enrichment proxy and PDF page classification service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use propdata_server::classifier::LoadedModel;
use propdata_server::config::Config;
use propdata_server::pdf::MupdfRasterizer;
use propdata_server::scraper::HttpScraper;
use propdata_server::{app, ocr, AppState, Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "propdata_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting PropertyData Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Scraper backend: {}", config.scraper.base_url);

    let model = match LoadedModel::load(&config.classifier) {
        Ok(model) => {
            tracing::info!(
                "Loaded {} model from {}",
                model.classifier.model_type(),
                config.classifier.model_path.display()
            );
            Some(model)
        }
        Err(e) => {
            tracing::warn!(
                "Document classification model unavailable ({}): {}. /predict will return 503",
                config.classifier.model_path.display(),
                e
            );
            None
        }
    };

    let ocr = ocr::engine_from_config(&config.ocr);
    if !ocr.is_available().await {
        tracing::warn!("OCR provider {:?} is not available", ocr.provider_type());
    }

    let services = Services {
        scraper: Arc::new(HttpScraper::new(&config.scraper.base_url)),
        ocr,
        rasterizer: Arc::new(MupdfRasterizer::new(config.ocr.dpi)),
        model,
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;

    let app = app(AppState::new(config, services));

    tracing::info!("PropertyData Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
