use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::document::autosave::DEFAULT_AUTOSAVE_DELAY;
use crate::layout::font_metrics::FontFamily;
use crate::layout::style::Arrangement;

/// `STORAGE_DIR` value selecting the volatile in-memory store.
pub const IN_MEMORY_STORAGE: &str = ":memory:";

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Directory holding `cv-data.json`, or `None` for the in-memory store.
    pub storage_dir: Option<PathBuf>,
    pub autosave_delay: Duration,
    /// Pixels per point for server-side rasterization.
    pub export_scale: f32,
    pub font_family: FontFamily,
    pub arrangement: Arrangement,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let storage_dir = match var("STORAGE_DIR", "./data").trim() {
            IN_MEMORY_STORAGE => None,
            "" => bail!("STORAGE_DIR must not be empty"),
            dir => Some(PathBuf::from(dir)),
        };

        let export_scale = var("EXPORT_SCALE", "2.0")
            .parse::<f32>()
            .context("EXPORT_SCALE must be a number")?;
        if !(export_scale.is_finite() && export_scale > 0.0) {
            bail!("EXPORT_SCALE must be positive, got {export_scale}");
        }

        let font_name = var("FONT_FAMILY", "helvetica");
        let font_family = FontFamily::from_name(&font_name)
            .with_context(|| format!("Unknown FONT_FAMILY '{font_name}'"))?;

        let arrangement_name = var("LAYOUT_ARRANGEMENT", "linear");
        let arrangement = Arrangement::from_name(&arrangement_name)
            .with_context(|| format!("Unknown LAYOUT_ARRANGEMENT '{arrangement_name}'"))?;

        let autosave_delay = match lookup("AUTOSAVE_DELAY_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse::<u64>()
                    .context("AUTOSAVE_DELAY_MS must be a whole number of milliseconds")?,
            ),
            None => DEFAULT_AUTOSAVE_DELAY,
        };

        Ok(Config {
            port: var("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
            storage_dir,
            autosave_delay,
            export_scale,
            font_family,
            arrangement,
        })
    }
}
