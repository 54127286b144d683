use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::document::form::FormController;
use crate::export::raster::Rasterizer;
use crate::export::ExportGate;
use crate::layout::StyleConfig;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single live document. One mutator at a time.
    pub editor: Arc<Mutex<FormController>>,
    pub config: Config,
    /// Page geometry and typography shared by preview and export.
    pub style: StyleConfig,
    /// Pluggable server-side rasterizer. Default: `BlockRasterizer`.
    pub rasterizer: Arc<dyn Rasterizer>,
    pub export_gate: ExportGate,
}
