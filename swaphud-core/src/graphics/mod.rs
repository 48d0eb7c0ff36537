//! Overlay rendering
//!
//! Glyph atlas baking, the text renderer, and the binding capture used to
//! hand the host's GL state back untouched. All GL access goes through
//! [`GraphicsBackend`].

pub mod atlas;
pub mod backend;
pub mod bindings;
pub mod shaders;
pub mod text;

#[cfg(test)]
pub(crate) mod fake;

pub use atlas::{GlyphAtlas, GlyphMetrics, GlyphQuad, GlyphTable, ATLAS_SIZE, FONT_PIXEL_HEIGHT};
pub use backend::{GlowBackend, GraphicsBackend, QuadBuffer};
pub use bindings::CapturedBindingSet;
pub use text::{projection, GlyphVertex, OverlayRenderer};
