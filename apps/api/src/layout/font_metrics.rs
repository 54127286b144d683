//! Static glyph-width tables for the three preview font families.
//!
//! Widths are in em units, taken from the standard PDF core-font metrics
//! (Helvetica, Times-Roman, Courier). The preview only needs line breaking
//! and box sizes, so kerning and ligatures are ignored.
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

/// Font families offered by the style configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    /// Arial-compatible sans-serif, the editor default.
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "helvetica" | "arial" | "sans-serif" => Some(FontFamily::Helvetica),
            "times" | "times new roman" | "serif" => Some(FontFamily::Times),
            "courier" | "monospace" => Some(FontFamily::Courier),
            _ => None,
        }
    }
}

/// Bold glyphs run slightly wider than the regular cut.
pub const BOLD_WIDTH_FACTOR: f32 = 1.06;

/// Character-width table for one family.
///
/// `widths[i]` = width of ASCII character `(i + 32)` at 1em.
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Width used for characters outside printable ASCII (accents, bullets).
    pub fallback_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    pub fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.fallback_width
        }
    }

    /// Width of `s` in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Greedy word wrap at `max_width_em`.
    ///
    /// Explicit newlines start a new line; a blank source line yields an empty
    /// output line. A single word wider than the line is kept whole on its own
    /// line. Empty input yields no lines.
    pub fn wrap(&self, text: &str, max_width_em: f32) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut lines = Vec::new();
        for paragraph in text.lines() {
            let mut current = String::new();
            let mut current_width = 0.0_f32;

            for word in paragraph.split_whitespace() {
                let word_w = self.measure_str(word);
                if current.is_empty() {
                    current.push_str(word);
                    current_width = word_w;
                } else if current_width + self.space_width + word_w > max_width_em {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_width = word_w;
                } else {
                    current.push(' ');
                    current.push_str(word);
                    current_width += self.space_width + word_w;
                }
            }
            lines.push(current);
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    fallback_width: 0.556,
    space_width: 0.278,
};

static TIMES_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.250, 0.333, 0.408, 0.500, 0.500, 0.833, 0.778, 0.180, 0.333, 0.333, 0.500, 0.564, 0.250, 0.333, 0.250, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.564, 0.564, 0.564, 0.444, 0.921,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.667, 0.667, 0.722, 0.611, 0.556, 0.722, 0.722, 0.333, 0.389, 0.722, 0.611, 0.889,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.722, 0.556, 0.722, 0.667, 0.556, 0.611, 0.722, 0.722, 0.944, 0.722, 0.722, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.469, 0.500, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.444, 0.500, 0.444, 0.500, 0.444, 0.333, 0.500, 0.500, 0.278, 0.278, 0.500, 0.278, 0.778,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.500, 0.500, 0.500, 0.500, 0.333, 0.389, 0.278, 0.500, 0.500, 0.722, 0.500, 0.500, 0.444,
        // {      |      }      ~
        0.480, 0.200, 0.480, 0.541,
    ],
    fallback_width: 0.500,
    space_width: 0.250,
};

/// Courier is monospaced: every glyph is 0.6em.
static COURIER_TABLE: FontMetricTable = FontMetricTable {
    widths: [0.600; 95],
    fallback_width: 0.600,
    space_width: 0.600,
};

pub fn get_metrics(family: FontFamily) -> &'static FontMetricTable {
    match family {
        FontFamily::Helvetica => &HELVETICA_TABLE,
        FontFamily::Times => &TIMES_TABLE,
        FontFamily::Courier => &COURIER_TABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_known_word() {
        let metrics = get_metrics(FontFamily::Helvetica);
        // R(0.722) + u(0.556) + s(0.500) + t(0.278) = 2.056
        let width = metrics.measure_str("Rust");
        assert!((width - 2.056).abs() < 1e-4, "got {width}");
    }

    #[test]
    fn test_non_ascii_uses_fallback() {
        let metrics = get_metrics(FontFamily::Times);
        assert_eq!(metrics.char_width('é'), metrics.fallback_width);
        assert_eq!(metrics.char_width('•'), metrics.fallback_width);
    }

    #[test]
    fn test_courier_is_monospaced() {
        let metrics = get_metrics(FontFamily::Courier);
        assert!((metrics.measure_str("iiii") - metrics.measure_str("WWWW")).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_empty_text_has_no_lines() {
        let metrics = get_metrics(FontFamily::Helvetica);
        assert!(metrics.wrap("", 40.0).is_empty());
        assert!(metrics.wrap("   \n ", 40.0).is_empty());
    }

    #[test]
    fn test_wrap_keeps_short_text_on_one_line() {
        let metrics = get_metrics(FontFamily::Helvetica);
        assert_eq!(metrics.wrap("Ingénieure logiciel", 40.0), vec!["Ingénieure logiciel"]);
    }

    #[test]
    fn test_wrap_breaks_long_text_without_losing_words() {
        let metrics = get_metrics(FontFamily::Helvetica);
        let text = "word ".repeat(40);
        let lines = metrics.wrap(&text, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(metrics.measure_str(line) <= 10.0 + 1e-4, "line too wide: {line}");
        }
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(rejoined.len(), 40);
    }

    #[test]
    fn test_wrap_honours_explicit_newlines() {
        let metrics = get_metrics(FontFamily::Times);
        let lines = metrics.wrap("first\n\nthird", 40.0);
        assert_eq!(lines, vec!["first", "", "third"]);
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let metrics = get_metrics(FontFamily::Courier);
        let lines = metrics.wrap("a supercalifragilistic b", 3.0);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_family_names() {
        assert_eq!(FontFamily::from_name("Arial"), Some(FontFamily::Helvetica));
        assert_eq!(FontFamily::from_name("serif"), Some(FontFamily::Times));
        assert_eq!(FontFamily::from_name("comic"), None);
    }

    #[test]
    fn test_serif_narrower_than_sans() {
        let text = "Expérience Professionnelle";
        assert!(
            get_metrics(FontFamily::Times).measure_str(text)
                < get_metrics(FontFamily::Helvetica).measure_str(text)
        );
    }
}
