//! PDF export: bitmap capture, slicing into A4 bands, PDF assembly.
//!
//! Two entry points share the pagination tail:
//! - `export_layout` rasterizes a rendered `PageLayout` server-side.
//! - `export_capture` takes a PNG/JPEG the front end captured itself.
//!
//! Decoding, slicing and encoding are CPU-bound and run inside
//! `tokio::task::spawn_blocking`.

pub mod handlers;
pub mod paginate;
pub mod pdf;
pub mod raster;

use std::sync::Arc;

use bytes::Bytes;
use image::RgbImage;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

use crate::layout::renderer::PageLayout;
use paginate::{plan_bands, PageGeometry};
use raster::Rasterizer;

pub const EXPORT_FILENAME: &str = "mon-cv.pdf";

/// The only failure message users ever see.
pub const EXPORT_FAILED_MESSAGE: &str = "Une erreur est survenue lors de l'export du CV.";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Capture is empty")]
    EmptyCapture,

    #[error("Could not decode capture: {0}")]
    Decode(String),

    #[error("Rasterization failed: {0}")]
    Raster(String),

    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("Export worker failed: {0}")]
    Worker(String),
}

/// A finished PDF ready to download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: &'static str,
    pub bytes: Bytes,
    pub page_count: usize,
}

/// Admits one export at a time.
#[derive(Clone)]
pub struct ExportGate {
    permits: Arc<Semaphore>,
}

impl ExportGate {
    pub fn new() -> Self {
        ExportGate {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// `None` while another export holds the gate.
    pub fn try_begin(&self) -> Option<OwnedSemaphorePermit> {
        self.permits.clone().try_acquire_owned().ok()
    }
}

impl Default for ExportGate {
    fn default() -> Self {
        Self::new()
    }
}

fn paginate_bitmap(bitmap: &RgbImage, geometry: PageGeometry) -> Result<ExportArtifact, ExportError> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(ExportError::EmptyCapture);
    }
    let bands = plan_bands(bitmap.width(), bitmap.height(), geometry);
    let bytes = pdf::assemble_pdf(bitmap, &bands, geometry)?;
    info!(
        "Exported {}x{} capture to {} page(s), {} bytes",
        bitmap.width(),
        bitmap.height(),
        bands.len(),
        bytes.len()
    );
    Ok(ExportArtifact {
        filename: EXPORT_FILENAME,
        bytes: Bytes::from(bytes),
        page_count: bands.len(),
    })
}

async fn paginate_off_thread(
    bitmap: RgbImage,
    geometry: PageGeometry,
) -> Result<ExportArtifact, ExportError> {
    tokio::task::spawn_blocking(move || paginate_bitmap(&bitmap, geometry))
        .await
        .map_err(|e| ExportError::Worker(format!("pagination task failed: {e}")))?
}

/// Rasterizes `layout` at `scale` and paginates the result.
pub async fn export_layout(
    rasterizer: &dyn Rasterizer,
    layout: &PageLayout,
    geometry: PageGeometry,
    scale: f32,
) -> Result<ExportArtifact, ExportError> {
    let bitmap = rasterizer.rasterize(layout, scale).await?;
    paginate_off_thread(bitmap, geometry).await
}

/// Decodes an uploaded PNG/JPEG capture and paginates it.
pub async fn export_capture(
    capture: Bytes,
    geometry: PageGeometry,
) -> Result<ExportArtifact, ExportError> {
    if capture.is_empty() {
        return Err(ExportError::EmptyCapture);
    }
    tokio::task::spawn_blocking(move || {
        let bitmap = image::load_from_memory(&capture)
            .map_err(|e| ExportError::Decode(e.to_string()))?
            .to_rgb8();
        paginate_bitmap(&bitmap, geometry)
    })
    .await
    .map_err(|e| ExportError::Worker(format!("capture task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use async_trait::async_trait;
    use image::{ImageFormat, Rgb};

    use crate::layout::font_metrics::FontFamily;

    struct FixedRasterizer {
        height: u32,
    }

    #[async_trait]
    impl Rasterizer for FixedRasterizer {
        async fn rasterize(&self, _layout: &PageLayout, _scale: f32) -> Result<RgbImage, ExportError> {
            Ok(RgbImage::from_pixel(100, self.height, Rgb([255, 255, 255])))
        }
    }

    fn empty_layout() -> PageLayout {
        PageLayout {
            width_pt: 595.28,
            page_height_pt: 841.89,
            content_height_pt: 0.0,
            font_family: FontFamily::Helvetica,
            elements: Vec::new(),
        }
    }

    fn png(width: u32, height: u32) -> Bytes {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        Bytes::from(buf.into_inner())
    }

    #[tokio::test]
    async fn test_export_layout_counts_pages() {
        let page = PageGeometry::A4.page_height_px(100);
        let rasterizer = FixedRasterizer {
            height: page * 3 + page / 2,
        };
        let artifact = export_layout(&rasterizer, &empty_layout(), PageGeometry::A4, 2.0)
            .await
            .unwrap();
        assert_eq!(artifact.page_count, 4);
        assert_eq!(artifact.filename, "mon-cv.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_capture_decodes_png() {
        let artifact = export_capture(png(120, 200), PageGeometry::A4).await.unwrap();
        assert_eq!(artifact.page_count, 1);
    }

    #[tokio::test]
    async fn test_export_capture_rejects_garbage_and_empty() {
        assert!(matches!(
            export_capture(Bytes::new(), PageGeometry::A4).await,
            Err(ExportError::EmptyCapture)
        ));
        assert!(matches!(
            export_capture(Bytes::from_static(b"not an image"), PageGeometry::A4).await,
            Err(ExportError::Decode(_))
        ));
    }

    #[test]
    fn test_gate_admits_one_export_at_a_time() {
        let gate = ExportGate::new();
        let first = gate.try_begin();
        assert!(first.is_some());
        assert!(gate.clone().try_begin().is_none());
        drop(first);
        assert!(gate.try_begin().is_some());
    }
}
