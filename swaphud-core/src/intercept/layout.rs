//! Status line text and placement.

use crate::config::Corner;

/// Horizontal inset from the chosen screen edge, in pixels.
pub const INSET_X: f32 = 10.0;
/// Baseline of the status line, in pixels from the top edge.
pub const BASELINE_Y: f32 = 20.0;
/// Width assumed per character when right-aligning the status line.
pub const APPROX_GLYPH_WIDTH: f32 = 8.0;

/// Latest published metrics shown in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HudReadout {
    pub fps: f64,
    pub cpu_percent: f64,
}

impl HudReadout {
    pub fn status_line(&self) -> String {
        format!("FPS: {:.0} | CPU: {:.1}%", self.fps, self.cpu_percent)
    }
}

/// Baseline origin of a status line of `char_count` characters.
///
/// Right-edge placement estimates the text width from the character count,
/// so the result can be negative on very narrow viewports.
pub fn status_origin(corner: Corner, viewport_width: u32, char_count: usize) -> (f32, f32) {
    let x = match corner {
        Corner::TopLeft => INSET_X,
        Corner::TopRight => {
            viewport_width as f32 - char_count as f32 * APPROX_GLYPH_WIDTH - INSET_X
        }
    };
    (x, BASELINE_Y)
}
