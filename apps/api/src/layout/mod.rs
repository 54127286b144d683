// Preview layout: glyph metrics, page style, and the document renderer.
// Rendering is pure and fast enough to run inline in request handlers.

pub mod font_metrics;
pub mod handlers;
pub mod renderer;
pub mod style;

pub use style::{default_style, StyleConfig};
