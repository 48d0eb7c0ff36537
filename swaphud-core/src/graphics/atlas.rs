//! Glyph atlas baking
//!
//! Rasterises the 96 printable ASCII characters (codes 32–127) of a TrueType
//! font into a single-channel coverage bitmap, packed left to right in rows
//! with one pixel of spacing, and records where each glyph landed together
//! with the metrics needed to lay out a baseline string.
//!
//! Baking is deterministic: the same font bytes and pixel height always give
//! the same bitmap and metrics.

use crate::error::BootstrapError;
use rusttype::{point, Font, Scale};
use std::path::Path;

/// Width and height of the baked atlas in pixels.
pub const ATLAS_SIZE: u32 = 512;
/// Pixel height (ascent − descent) glyphs are baked at.
pub const FONT_PIXEL_HEIGHT: f32 = 16.0;
/// First character code in the atlas.
pub const FIRST_CHAR: u32 = 32;
/// Number of characters in the atlas.
pub const GLYPH_COUNT: usize = 96;

/// Where a glyph sits in the atlas and how it advances the pen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Bitmap rectangle, in atlas pixels, `x1`/`y1` exclusive.
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
    /// Offset from the pen position to the bitmap's top-left corner.
    /// `y_offset` is negative for ink above the baseline.
    pub x_offset: f32,
    pub y_offset: f32,
    pub advance: f32,
}

/// Screen rectangle and texture rectangle for one glyph.
///
/// Screen `y0` is the top edge (y grows downward); `t0` is the matching
/// bitmap row, i.e. the top of the glyph as rasterised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub s0: f32,
    pub t0: f32,
    pub s1: f32,
    pub t1: f32,
}

/// Per-character metrics for the 96 printable ASCII codes.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphTable {
    width: u32,
    height: u32,
    glyphs: Vec<GlyphMetrics>,
}

impl GlyphTable {
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &GlyphMetrics)> {
        self.glyphs
            .iter()
            .enumerate()
            .filter_map(|(i, m)| char::from_u32(FIRST_CHAR + i as u32).map(|c| (c, m)))
    }

    pub fn get(&self, c: char) -> Option<&GlyphMetrics> {
        let index = (c as u32).checked_sub(FIRST_CHAR)? as usize;
        self.glyphs.get(index)
    }

    /// Quad for `c` with its pen at `pen`, advancing `pen[0]`.
    ///
    /// Characters outside the atlas return `None` and leave the pen alone.
    /// Screen coordinates are snapped to whole pixels so glyphs sample the
    /// atlas texel-for-texel.
    pub fn quad(&self, c: char, pen: &mut [f32; 2]) -> Option<GlyphQuad> {
        let m = self.get(c)?;
        let (w, h) = (self.width as f32, self.height as f32);

        let left = (pen[0] + m.x_offset + 0.5).floor();
        let top = (pen[1] + m.y_offset + 0.5).floor();
        let quad = GlyphQuad {
            x0: left,
            y0: top,
            x1: left + f32::from(m.x1 - m.x0),
            y1: top + f32::from(m.y1 - m.y0),
            s0: f32::from(m.x0) / w,
            t0: f32::from(m.y0) / h,
            s1: f32::from(m.x1) / w,
            t1: f32::from(m.y1) / h,
        };

        pen[0] += m.advance;
        Some(quad)
    }
}

/// A baked coverage bitmap plus its glyph table.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    pixels: Vec<u8>,
    table: GlyphTable,
}

impl GlyphAtlas {
    /// Read a font file and bake it at the default size.
    pub fn from_font_file(path: &Path) -> Result<Self, BootstrapError> {
        let bytes = std::fs::read(path).map_err(|source| BootstrapError::FontUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::bake(&bytes, FONT_PIXEL_HEIGHT, ATLAS_SIZE, ATLAS_SIZE)
    }

    /// Bake the printable ASCII range of `font_data` at `pixel_height`.
    pub fn bake(
        font_data: &[u8],
        pixel_height: f32,
        width: u32,
        height: u32,
    ) -> Result<Self, BootstrapError> {
        let font = Font::try_from_bytes(font_data).ok_or(BootstrapError::InvalidFont)?;
        let scale = Scale::uniform(pixel_height);

        let mut pixels = vec![0u8; (width * height) as usize];
        let mut glyphs = Vec::with_capacity(GLYPH_COUNT);
        let (mut x, mut y, mut bottom) = (1u32, 1u32, 1u32);

        for code in FIRST_CHAR..FIRST_CHAR + GLYPH_COUNT as u32 {
            let c = char::from_u32(code).ok_or(BootstrapError::InvalidFont)?;
            let scaled = font.glyph(c).scaled(scale);
            let advance = scaled.h_metrics().advance_width;
            let glyph = scaled.positioned(point(0.0, 0.0));

            let (gw, gh, x_offset, y_offset) = match glyph.pixel_bounding_box() {
                Some(bb) => (
                    bb.width() as u32,
                    bb.height() as u32,
                    bb.min.x as f32,
                    bb.min.y as f32,
                ),
                None => (0, 0, 0.0, 0.0),
            };
            // Blank glyphs (space) still get a 1x1 transparent cell.
            let (cw, ch) = (gw.max(1), gh.max(1));

            if x + cw + 1 >= width {
                y = bottom;
                x = 1;
            }
            if y + ch + 1 >= height {
                return Err(BootstrapError::AtlasOverflow {
                    baked: glyphs.len(),
                });
            }

            let (cell_x, cell_y) = (x, y);
            glyph.draw(|gx, gy, coverage| {
                let px = cell_x + gx;
                let py = cell_y + gy;
                if px < width && py < height {
                    pixels[(py * width + px) as usize] =
                        (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            });

            glyphs.push(GlyphMetrics {
                x0: x as u16,
                y0: y as u16,
                x1: (x + cw) as u16,
                y1: (y + ch) as u16,
                x_offset,
                y_offset,
                advance,
            });

            x += cw + 1;
            bottom = bottom.max(y + ch + 1);
        }

        log::debug!(
            "Baked {} glyphs at {}px into {}x{} atlas ({} rows used)",
            glyphs.len(),
            pixel_height,
            width,
            height,
            bottom
        );

        Ok(Self {
            pixels,
            table: GlyphTable {
                width,
                height,
                glyphs,
            },
        })
    }

    pub fn width(&self) -> u32 {
        self.table.width
    }

    pub fn height(&self) -> u32 {
        self.table.height
    }

    /// Row-major coverage, one byte per pixel, row 0 at the top.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn table(&self) -> &GlyphTable {
        &self.table
    }

    pub fn into_table(self) -> GlyphTable {
        self.table
    }

    /// Fixed grid of `cell`-sized glyphs with a solid top row, for tests
    /// that need an atlas without a font file.
    #[cfg(test)]
    pub(crate) fn test_grid(cell: (u16, u16), advance: f32) -> Self {
        let (width, height) = (256u32, 256u32);
        let mut pixels = vec![0u8; (width * height) as usize];
        let per_row = (width as u16 - 1) / (cell.0 + 1);
        let glyphs = (0..GLYPH_COUNT as u16)
            .map(|i| {
                let x0 = 1 + (i % per_row) * (cell.0 + 1);
                let y0 = 1 + (i / per_row) * (cell.1 + 1);
                for px in x0..x0 + cell.0 {
                    pixels[(u32::from(y0) * width + u32::from(px)) as usize] = 255;
                }
                GlyphMetrics {
                    x0,
                    y0,
                    x1: x0 + cell.0,
                    y1: y0 + cell.1,
                    x_offset: 0.0,
                    y_offset: -f32::from(cell.1),
                    advance,
                }
            })
            .collect();
        Self {
            pixels,
            table: GlyphTable {
                width,
                height,
                glyphs,
            },
        }
    }
}

/// DejaVu Sans, shipped under `tests/fonts/` so real-font tests always run.
#[cfg(test)]
pub(crate) const TEST_FONT: &[u8] = include_bytes!("../../tests/fonts/DejaVuSans.ttf");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_font_bytes() {
        let err = GlyphAtlas::bake(b"definitely not a font", 16.0, 512, 512).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidFont));
    }

    #[test]
    fn missing_font_file_is_reported() {
        let err = GlyphAtlas::from_font_file(Path::new("/nonexistent/swaphud/font.ttf"))
            .unwrap_err();
        assert!(matches!(err, BootstrapError::FontUnreadable { .. }));
    }

    #[test]
    fn bakes_all_printable_ascii() {
        let atlas = GlyphAtlas::bake(TEST_FONT, FONT_PIXEL_HEIGHT, ATLAS_SIZE, ATLAS_SIZE).unwrap();
        assert_eq!(atlas.table().len(), GLYPH_COUNT);
        assert_eq!(atlas.pixels().len(), (ATLAS_SIZE * ATLAS_SIZE) as usize);

        let codes: Vec<u32> = atlas.table().iter().map(|(c, _)| c as u32).collect();
        assert_eq!(codes, (32..=127).collect::<Vec<_>>());

        for (c, m) in atlas.table().iter() {
            assert!(m.x1 > m.x0 && m.y1 > m.y0, "degenerate rect for {:?}", c);
            assert!(u32::from(m.x1) <= ATLAS_SIZE && u32::from(m.y1) <= ATLAS_SIZE);
        }

        let space = atlas.table().get(' ').unwrap();
        assert!(space.advance > 0.0);

        let a = atlas.table().get('A').unwrap();
        let ink: u32 = (a.y0..a.y1)
            .flat_map(|y| (a.x0..a.x1).map(move |x| (x, y)))
            .map(|(x, y)| atlas.pixels()[y as usize * ATLAS_SIZE as usize + x as usize] as u32)
            .sum();
        assert!(ink > 0, "'A' should have coverage");
        // Capital letters sit on the baseline with ink above it.
        assert!(a.y_offset < 0.0);
    }

    #[test]
    fn baking_is_deterministic() {
        let first = GlyphAtlas::bake(TEST_FONT, 16.0, 512, 512).unwrap();
        let second = GlyphAtlas::bake(TEST_FONT, 16.0, 512, 512).unwrap();
        assert_eq!(first.table(), second.table());
        assert_eq!(first.pixels(), second.pixels());
    }

    #[test]
    fn tiny_atlas_overflows() {
        let err = GlyphAtlas::bake(TEST_FONT, 16.0, 32, 32).unwrap_err();
        assert!(matches!(err, BootstrapError::AtlasOverflow { baked } if baked < GLYPH_COUNT));
    }

    #[test]
    fn quad_advances_pen_and_snaps_to_pixels() {
        let atlas = GlyphAtlas::test_grid((6, 10), 7.5);
        let mut pen = [10.25, 20.0];
        let q = atlas.table().quad('A', &mut pen).unwrap();
        assert_eq!(pen, [17.75, 20.0]);
        assert_eq!((q.x0, q.y0, q.x1, q.y1), (10.0, 10.0, 16.0, 20.0));
        assert!(q.s1 > q.s0 && q.t1 > q.t0);
    }

    #[test]
    fn characters_outside_atlas_are_skipped() {
        let atlas = GlyphAtlas::test_grid((6, 10), 7.0);
        let mut pen = [0.0, 0.0];
        assert!(atlas.table().quad('\n', &mut pen).is_none());
        assert!(atlas.table().quad('é', &mut pen).is_none());
        assert_eq!(pen, [0.0, 0.0]);
        assert!(atlas.table().quad('\u{7f}', &mut pen).is_some());
    }
}
