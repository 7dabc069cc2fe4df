use crate::glyph_atlas_data::{
    GlyphColumns, ASCII_END, ASCII_START, GLYPH_HEIGHT, GLYPH_WIDTH, PIXEL_5X7,
};

/// Blank columns between glyphs, in atlas pixels.
pub const GLYPH_SPACING: u32 = 1;
/// Atlas pixels per em: seven glyph rows plus one row of leading.
pub const EM_ROWS: u32 = 8;

const FALLBACK: char = '?';

/// Compiled-in bitmap font. Metrics are exact multiples of the atlas grid, so
/// measurement is identical on every machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelFontAtlas;

impl PixelFontAtlas {
    pub fn new() -> Self {
        Self
    }

    pub fn glyph_height(&self) -> u32 {
        GLYPH_HEIGHT
    }

    pub fn advance(&self) -> u32 {
        GLYPH_WIDTH + GLYPH_SPACING
    }

    pub fn supports(&self, ch: char) -> bool {
        ch.is_ascii() && (ASCII_START..=ASCII_END).contains(&(ch as u8))
    }

    fn columns(&self, ch: char) -> &'static GlyphColumns {
        let ch = if self.supports(ch) { ch } else { FALLBACK };
        &PIXEL_5X7[(ch as u8 - ASCII_START) as usize]
    }

    /// Whether atlas pixel `(x, y)` of `ch` is lit. Unsupported characters draw
    /// as `?`.
    pub fn sample(&self, ch: char, x: u32, y: u32) -> bool {
        if x >= GLYPH_WIDTH || y >= GLYPH_HEIGHT {
            return false;
        }
        (self.columns(ch)[x as usize] >> y) & 1 == 1
    }

    /// Lit `(x, y)` atlas pixels of `ch`, column by column.
    pub fn lit_pixels(&self, ch: char) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..GLYPH_WIDTH).flat_map(move |x| {
            (0..GLYPH_HEIGHT)
                .filter(move |&y| self.sample(ch, x, y))
                .map(move |y| (x, y))
        })
    }
}
