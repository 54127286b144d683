use serde::{Deserialize, Serialize};

use crate::export::paginate::PageGeometry;
use crate::layout::font_metrics::FontFamily;

pub const MM_PER_INCH: f32 = 25.4;
pub const PT_PER_INCH: f32 = 72.0;

/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.15;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_INCH / MM_PER_INCH
}

/// Where the Skills and Languages sections go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrangement {
    /// Every section stacked in reading order.
    Linear,
    /// Skills and Languages side by side, right after Education.
    SkillsLanguagesColumns,
}

impl Arrangement {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "linear" => Some(Arrangement::Linear),
            "columns" | "skills_languages_columns" => Some(Arrangement::SkillsLanguagesColumns),
            _ => None,
        }
    }
}

/// Page geometry and typography for the preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    /// Multiplies every font size; 1.0 gives an 11pt body.
    pub base_font_scale: f32,
    pub font_family: FontFamily,
    pub arrangement: Arrangement,
}

impl StyleConfig {
    pub fn page_width_pt(&self) -> f32 {
        mm_to_pt(self.page_width_mm)
    }

    pub fn page_height_pt(&self) -> f32 {
        mm_to_pt(self.page_height_mm)
    }

    pub fn margin_pt(&self) -> f32 {
        mm_to_pt(self.margin_mm)
    }

    pub fn content_width_pt(&self) -> f32 {
        (self.page_width_pt() - 2.0 * self.margin_pt()).max(0.0)
    }

    /// Font size in points for a role, scaled by `base_font_scale`.
    pub fn size_pt(&self, role: TextRole) -> f32 {
        let base = match role {
            TextRole::Name => 22.0,
            TextRole::JobTitle => 14.0,
            TextRole::Heading => 13.0,
            TextRole::EntryTitle => 11.0,
            TextRole::Body => 11.0,
            TextRole::Detail => 9.5,
        };
        base * self.base_font_scale
    }
}

/// Typographic roles used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Name,
    JobTitle,
    Heading,
    EntryTitle,
    Body,
    Detail,
}

impl TextRole {
    pub fn is_bold(self) -> bool {
        matches!(
            self,
            TextRole::Name | TextRole::Heading | TextRole::EntryTitle
        )
    }
}

/// A4 portrait with 10mm margins.
pub fn default_style(font_family: FontFamily, arrangement: Arrangement) -> StyleConfig {
    StyleConfig {
        page_width_mm: PageGeometry::A4.width_mm,
        page_height_mm: PageGeometry::A4.height_mm,
        margin_mm: 10.0,
        base_font_scale: 1.0,
        font_family,
        arrangement,
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        default_style(FontFamily::Helvetica, Arrangement::Linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_matches_export_page() {
        let style = default_style(FontFamily::Times, Arrangement::SkillsLanguagesColumns);
        assert_eq!(PageGeometry::from(&style), PageGeometry::A4);
    }

    #[test]
    fn test_a4_in_points() {
        let style = StyleConfig::default();
        assert!((style.page_width_pt() - 595.28).abs() < 0.01);
        assert!((style.page_height_pt() - 841.89).abs() < 0.01);
        assert!((style.margin_pt() - 28.35).abs() < 0.01);
    }

    #[test]
    fn test_font_scale_applies_to_every_role() {
        let mut style = StyleConfig::default();
        let body = style.size_pt(TextRole::Body);
        style.base_font_scale = 2.0;
        assert!((style.size_pt(TextRole::Body) - body * 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_arrangement_names() {
        assert_eq!(Arrangement::from_name("Linear"), Some(Arrangement::Linear));
        assert_eq!(
            Arrangement::from_name("columns"),
            Some(Arrangement::SkillsLanguagesColumns)
        );
        assert_eq!(Arrangement::from_name("grid"), None);
    }
}
