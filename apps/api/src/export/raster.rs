//! Rasterization of a `PageLayout` into one tall bitmap.
//!
//! `AppState` holds an `Arc<dyn Rasterizer>`. The default `BlockRasterizer`
//! paints each glyph as a solid block sized from the font metrics: enough for
//! an export whose pagination and proportions match the preview, without
//! shipping font files.

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tracing::warn;

use crate::export::ExportError;
use crate::layout::font_metrics::{get_metrics, BOLD_WIDTH_FACTOR};
use crate::layout::renderer::{Element, PageLayout};

/// Refuse bitmaps beyond this many pixels on either side.
pub const MAX_BITMAP_SIDE_PX: u32 = 60_000;

/// Pixel budget for one bitmap (about 190 MB of RGB). Longer documents are
/// painted at a lower scale instead of failing.
pub const MAX_BITMAP_PIXELS: u64 = 64_000_000;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([75, 85, 99]);
const BOLD_TEXT_COLOR: Rgb<u8> = Rgb([17, 24, 39]);
const RULE_COLOR: Rgb<u8> = Rgb([209, 213, 219]);

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Paints `layout` at `scale` pixels per point.
    async fn rasterize(&self, layout: &PageLayout, scale: f32) -> Result<RgbImage, ExportError>;
}

pub struct BlockRasterizer;

#[async_trait]
impl Rasterizer for BlockRasterizer {
    async fn rasterize(&self, layout: &PageLayout, scale: f32) -> Result<RgbImage, ExportError> {
        let layout = layout.clone();
        tokio::task::spawn_blocking(move || paint(&layout, scale))
            .await
            .map_err(|e| ExportError::Worker(format!("rasterization task failed: {e}")))?
    }
}

fn canvas_height_pt(layout: &PageLayout) -> f32 {
    layout.content_height_pt.max(layout.page_height_pt)
}

/// Largest scale up to `requested` whose bitmap stays inside both the side
/// limit and the pixel budget.
pub fn fit_scale(layout: &PageLayout, requested: f32) -> Result<f32, ExportError> {
    if !requested.is_finite() || requested <= 0.0 {
        return Err(ExportError::Raster(format!("invalid scale {requested}")));
    }
    let width_pt = layout.width_pt;
    let height_pt = canvas_height_pt(layout);
    if !(width_pt > 0.0 && height_pt > 0.0) {
        return Err(ExportError::Raster(format!(
            "empty canvas {width_pt}x{height_pt}pt"
        )));
    }
    // One pixel of slack on each side absorbs the ceil in `bitmap_size`.
    let by_side = (MAX_BITMAP_SIDE_PX - 1) as f32 / width_pt.max(height_pt);
    let padded_area = f64::from(width_pt + 1.0) * f64::from(height_pt + 1.0);
    let by_area = (MAX_BITMAP_PIXELS as f64 / padded_area).sqrt() as f32;
    let scale = requested.min(by_side).min(by_area);
    if scale < requested {
        warn!(
            "Document is {height_pt:.0}pt tall; rasterizing at {scale:.3}px/pt instead of {requested}"
        );
    }
    Ok(scale)
}

/// Bitmap size for `layout` at `scale`. Never shorter than one page.
pub fn bitmap_size(layout: &PageLayout, scale: f32) -> Result<(u32, u32), ExportError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ExportError::Raster(format!("invalid scale {scale}")));
    }
    let height_pt = canvas_height_pt(layout);
    let width = (layout.width_pt * scale).ceil();
    let height = (height_pt * scale).ceil();
    let limit = MAX_BITMAP_SIDE_PX as f32;
    if !(width >= 1.0 && height >= 1.0 && width <= limit && height <= limit) {
        return Err(ExportError::Raster(format!(
            "bitmap {width}x{height} outside 1..={MAX_BITMAP_SIDE_PX}"
        )));
    }
    Ok((width as u32, height as u32))
}

fn fill_rect(img: &mut RgbImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb<u8>) {
    let clamp_x = |v: f32| (v.round().max(0.0) as u32).min(img.width());
    let clamp_y = |v: f32| (v.round().max(0.0) as u32).min(img.height());
    let (left, right) = (clamp_x(x0), clamp_x(x1));
    let (top, bottom) = (clamp_y(y0), clamp_y(y1));
    for y in top..bottom {
        for x in left..right {
            img.put_pixel(x, y, color);
        }
    }
}

/// Synchronous painter, run on a blocking thread. `scale` is an upper bound;
/// see `fit_scale`.
pub fn paint(layout: &PageLayout, scale: f32) -> Result<RgbImage, ExportError> {
    let scale = fit_scale(layout, scale)?;
    let (width, height) = bitmap_size(layout, scale)?;
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    let metrics = get_metrics(layout.font_family);

    for element in &layout.elements {
        match element {
            Element::Text {
                x_pt,
                y_pt,
                size_pt,
                bold,
                text,
                ..
            } => {
                let factor = if *bold { BOLD_WIDTH_FACTOR } else { 1.0 };
                let color = if *bold { BOLD_TEXT_COLOR } else { TEXT_COLOR };
                // x-height band of the line box
                let top = (y_pt + size_pt * 0.35) * scale;
                let bottom = (y_pt + size_pt * 0.95) * scale;
                let mut pen = *x_pt;
                for c in text.chars() {
                    let advance = metrics.char_width(c) * size_pt * factor;
                    if !c.is_whitespace() {
                        let inset = advance * 0.12;
                        fill_rect(
                            &mut img,
                            (pen + inset) * scale,
                            top,
                            (pen + advance - inset) * scale,
                            bottom,
                            color,
                        );
                    }
                    pen += advance;
                }
            }
            Element::Rule {
                x_pt,
                y_pt,
                width_pt,
                thickness_pt,
            } => {
                let bottom = (y_pt + thickness_pt) * scale;
                fill_rect(
                    &mut img,
                    x_pt * scale,
                    y_pt * scale,
                    (x_pt + width_pt) * scale,
                    bottom.max(y_pt * scale + 1.0),
                    RULE_COLOR,
                );
            }
        }
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::FontFamily;

    fn layout_with(elements: Vec<Element>, content_height_pt: f32) -> PageLayout {
        PageLayout {
            width_pt: 595.28,
            page_height_pt: 841.89,
            content_height_pt,
            font_family: FontFamily::Helvetica,
            elements,
        }
    }

    #[test]
    fn test_blank_layout_is_one_white_page() {
        let img = paint(&layout_with(Vec::new(), 0.0), 2.0).unwrap();
        assert_eq!(img.width(), 1191);
        assert_eq!(img.height(), 1684);
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_tall_layout_keeps_full_height() {
        let img = paint(&layout_with(Vec::new(), 2000.0), 1.0).unwrap();
        assert_eq!(img.height(), 2000);
    }

    #[test]
    fn test_text_paints_ink_inside_its_box() {
        let text = Element::Text {
            x_pt: 100.0,
            y_pt: 100.0,
            width_pt: 50.0,
            size_pt: 20.0,
            bold: true,
            text: "MMM".to_string(),
        };
        let img = paint(&layout_with(vec![text], 0.0), 1.0).unwrap();
        assert_eq!(*img.get_pixel(105, 112), BOLD_TEXT_COLOR);
        assert_eq!(*img.get_pixel(105, 90), WHITE);
        assert_eq!(*img.get_pixel(300, 112), WHITE);
    }

    #[test]
    fn test_rule_is_at_least_one_pixel_tall() {
        let rule = Element::Rule {
            x_pt: 10.0,
            y_pt: 50.0,
            width_pt: 100.0,
            thickness_pt: 0.1,
        };
        let img = paint(&layout_with(vec![rule], 0.0), 1.0).unwrap();
        assert_eq!(*img.get_pixel(50, 50), RULE_COLOR);
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        let layout = layout_with(Vec::new(), 0.0);
        assert!(matches!(paint(&layout, 0.0), Err(ExportError::Raster(_))));
        assert!(matches!(paint(&layout, f32::NAN), Err(ExportError::Raster(_))));
        assert!(matches!(bitmap_size(&layout, 1000.0), Err(ExportError::Raster(_))));
    }

    #[test]
    fn test_short_document_keeps_requested_scale() {
        let layout = layout_with(Vec::new(), 841.89 * 3.0);
        assert_eq!(fit_scale(&layout, 2.0).unwrap(), 2.0);
    }

    #[test]
    fn test_long_document_is_scaled_down_to_fit() {
        // 120 pages: 2px/pt would be about 200000px tall.
        let layout = layout_with(Vec::new(), 841.89 * 120.0);
        assert!(bitmap_size(&layout, 2.0).is_err());

        let scale = fit_scale(&layout, 2.0).unwrap();
        assert!(scale < 2.0);
        let (width, height) = bitmap_size(&layout, scale).unwrap();
        assert!(height <= MAX_BITMAP_SIDE_PX);
        assert!(u64::from(width) * u64::from(height) <= MAX_BITMAP_PIXELS);
    }

    #[test]
    fn test_huge_scale_is_clamped_to_pixel_budget() {
        let layout = layout_with(Vec::new(), 0.0);
        let scale = fit_scale(&layout, 1000.0).unwrap();
        let (width, height) = bitmap_size(&layout, scale).unwrap();
        assert!(u64::from(width) * u64::from(height) <= MAX_BITMAP_PIXELS);
    }

    #[tokio::test]
    async fn test_block_rasterizer_runs_off_thread() {
        let img = BlockRasterizer
            .rasterize(&layout_with(Vec::new(), 0.0), 1.0)
            .await
            .unwrap();
        assert_eq!(img.width(), 596);
    }
}
