mod config;
mod document;
mod errors;
mod export;
mod layout;
mod models;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::document::autosave::Autosave;
use crate::document::form::FormController;
use crate::export::raster::BlockRasterizer;
use crate::export::ExportGate;
use crate::layout::default_style;
use crate::models::document::Document;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{DocumentStore, FileStore, KeyValueStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV editor v{}", env!("CARGO_PKG_VERSION"));

    // Initialize persistence
    let kv: Arc<dyn KeyValueStore> = match &config.storage_dir {
        Some(dir) => Arc::new(
            FileStore::open(dir)
                .with_context(|| format!("Cannot open storage directory {}", dir.display()))?,
        ),
        None => {
            warn!("Using in-memory storage; the CV will not survive a restart");
            Arc::new(MemoryStore::default())
        }
    };
    let store = DocumentStore::new(kv);

    // Restore the saved CV, migrated to the current shape
    let document = match store.load() {
        Some(doc) => {
            info!(
                "Restored saved CV: {} experience, {} education, {} project entries",
                doc.experience.len(),
                doc.education.len(),
                doc.projects.len()
            );
            doc
        }
        None => {
            info!("No saved CV found; starting from a blank document");
            Document::default()
        }
    };

    let editor = FormController::new(document, Autosave::new(store, config.autosave_delay));
    info!(
        "Autosave after {}ms of inactivity",
        config.autosave_delay.as_millis()
    );

    let style = default_style(config.font_family, config.arrangement);
    info!(
        "Page style: {:?} {}x{}mm, {:?} layout",
        style.font_family, style.page_width_mm, style.page_height_mm, style.arrangement
    );

    // Build app state
    let state = AppState {
        editor: Arc::new(Mutex::new(editor)),
        config: config.clone(),
        style,
        rasterizer: Arc::new(BlockRasterizer),
        export_gate: ExportGate::new(),
    };
    let editor = state.editor.clone();

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Persist edits still waiting on the debounce timer
    editor.lock().await.save_now();
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
