use serde::{Deserialize, Serialize};

use crate::layout::style::{mm_to_pt, StyleConfig};

/// Physical page size the bitmap is sliced for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    pub fn width_pt(&self) -> f32 {
        mm_to_pt(self.width_mm)
    }

    pub fn height_pt(&self) -> f32 {
        mm_to_pt(self.height_mm)
    }

    /// Pixel height of one page for a bitmap `bitmap_width` pixels wide.
    pub fn page_height_px(&self, bitmap_width: u32) -> u32 {
        if self.width_mm <= 0.0 {
            return bitmap_width.max(1);
        }
        let ratio = f64::from(self.height_mm) / f64::from(self.width_mm);
        ((f64::from(bitmap_width) * ratio).round() as u32).max(1)
    }
}

impl From<&StyleConfig> for PageGeometry {
    fn from(style: &StyleConfig) -> Self {
        PageGeometry {
            width_mm: style.page_width_mm,
            height_mm: style.page_height_mm,
        }
    }
}

/// A horizontal slice of the bitmap that becomes one PDF page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBand {
    pub index: usize,
    pub top_px: u32,
    /// Rows actually taken from the bitmap; less than a page on the last band.
    pub height_px: u32,
    /// Full page height in pixels; the band is padded to this with white.
    pub page_height_px: u32,
}

/// Slices a `bitmap_width` x `bitmap_height` bitmap into page-height bands.
///
/// Always returns at least one band. A bitmap that is an exact multiple of
/// the page height yields exactly that many pages, no trailing blank one.
pub fn plan_bands(bitmap_width: u32, bitmap_height: u32, geometry: PageGeometry) -> Vec<PageBand> {
    let page_height_px = geometry.page_height_px(bitmap_width);
    let mut bands = Vec::new();
    let mut top: u32 = 0;

    loop {
        let height_px = bitmap_height.saturating_sub(top).min(page_height_px);
        bands.push(PageBand {
            index: bands.len(),
            top_px: top,
            height_px,
            page_height_px,
        });
        top = top.saturating_add(page_height_px);
        if top >= bitmap_height {
            break;
        }
    }
    bands
}
