use std::collections::HashMap;

use anyhow::{anyhow, Result};
use fontdue::Font;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Rect, Transform};

use crate::color::Rgba8;
use crate::glyph_atlas::{PixelFontAtlas, EM_ROWS, GLYPH_SPACING};
use crate::schema::DEFAULT_FONT_FAMILY;

/// Measures and draws single lines of text. Implementations must be
/// deterministic: the same text and size always measure and draw the same.
pub trait TextBackend {
    fn family(&self) -> &str;

    /// Advance width of `text` at `font_px`, in surface pixels.
    fn measure(&self, text: &str, font_px: f32) -> f32;

    /// Draws `text` with its left edge at `x` and its baseline at `baseline`.
    fn draw_line(
        &mut self,
        target: &mut Pixmap,
        text: &str,
        x: f32,
        baseline: f32,
        font_px: f32,
        color: Rgba8,
    ) -> Result<()>;

    /// Characters this backend cannot draw faithfully.
    fn missing_codepoints(&self, text: &str) -> Vec<char>;
}

/// Built-in backend over [`PixelFontAtlas`], scaled so one em is `font_px`.
#[derive(Debug, Clone, Default)]
pub struct PixelFontPainter {
    atlas: PixelFontAtlas,
}

impl PixelFontPainter {
    pub fn new() -> Self {
        Self {
            atlas: PixelFontAtlas::new(),
        }
    }

    fn scale(font_px: f32) -> f32 {
        font_px / EM_ROWS as f32
    }
}

impl TextBackend for PixelFontPainter {
    fn family(&self) -> &str {
        DEFAULT_FONT_FAMILY
    }

    fn measure(&self, text: &str, font_px: f32) -> f32 {
        let count = text.chars().count() as u32;
        if count == 0 {
            return 0.0;
        }
        let atlas_px = count * self.atlas.advance() - GLYPH_SPACING;
        atlas_px as f32 * Self::scale(font_px)
    }

    fn draw_line(
        &mut self,
        target: &mut Pixmap,
        text: &str,
        x: f32,
        baseline: f32,
        font_px: f32,
        color: Rgba8,
    ) -> Result<()> {
        let scale = Self::scale(font_px);
        let top = baseline - self.atlas.glyph_height() as f32 * scale;
        let advance = self.atlas.advance() as f32 * scale;

        let mut builder = PathBuilder::new();
        for (index, ch) in text.chars().enumerate() {
            let pen_x = x + index as f32 * advance;
            for (gx, gy) in self.atlas.lit_pixels(ch) {
                if let Some(cell) = Rect::from_xywh(
                    pen_x + gx as f32 * scale,
                    top + gy as f32 * scale,
                    scale,
                    scale,
                ) {
                    builder.push_rect(cell);
                }
            }
        }

        // Nothing lit (blank text or only spaces).
        let Some(path) = builder.finish() else {
            return Ok(());
        };

        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = false;
        target.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        Ok(())
    }

    fn missing_codepoints(&self, text: &str) -> Vec<char> {
        text.chars()
            .filter(|ch| !self.atlas.supports(*ch))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub xmin: i32,
    pub ymin: i32,
    pub advance: f32,
    pub bitmap: Vec<u8>,
}

/// TrueType backend rasterizing through `fontdue`, with a per-size glyph cache.
pub struct FontduePainter {
    family: String,
    font: Font,
    glyph_cache: HashMap<(char, u32), GlyphBitmap>,
}

impl FontduePainter {
    pub fn from_bytes(family: impl Into<String>, font_bytes: Vec<u8>) -> Result<Self> {
        let family = family.into();
        let font = Font::from_bytes(font_bytes, fontdue::FontSettings::default())
            .map_err(|error| anyhow!("failed to parse font for family '{family}': {error}"))?;
        Ok(Self {
            family,
            font,
            glyph_cache: HashMap::new(),
        })
    }
}

impl TextBackend for FontduePainter {
    fn family(&self) -> &str {
        &self.family
    }

    fn measure(&self, text: &str, font_px: f32) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, font_px).advance_width)
            .sum()
    }

    fn draw_line(
        &mut self,
        target: &mut Pixmap,
        text: &str,
        x: f32,
        baseline: f32,
        font_px: f32,
        color: Rgba8,
    ) -> Result<()> {
        let mut pen_x = x;
        for ch in text.chars() {
            let glyph = self
                .glyph_cache
                .entry((ch, font_px.to_bits()))
                .or_insert_with(|| {
                    let (metrics, bitmap) = self.font.rasterize(ch, font_px);
                    GlyphBitmap {
                        width: metrics.width,
                        height: metrics.height,
                        xmin: metrics.xmin,
                        ymin: metrics.ymin,
                        advance: metrics.advance_width,
                        bitmap,
                    }
                });

            // fontdue reports ymin upward from the baseline.
            let left = (pen_x + glyph.xmin as f32).round() as i32;
            let top = (baseline - (glyph.height as f32 + glyph.ymin as f32)).round() as i32;
            blend_glyph(target, left, top, glyph, color);
            pen_x += glyph.advance;
        }
        Ok(())
    }

    fn missing_codepoints(&self, text: &str) -> Vec<char> {
        text.chars()
            .filter(|ch| !ch.is_whitespace() && self.font.lookup_glyph_index(*ch) == 0)
            .collect()
    }
}

/// Source-over of a coverage mask tinted with `color` onto a premultiplied pixmap.
pub fn blend_glyph(target: &mut Pixmap, x: i32, y: i32, glyph: &GlyphBitmap, color: Rgba8) {
    let frame_width = target.width() as i32;
    let frame_height = target.height() as i32;
    let pixels = target.pixels_mut();

    for row in 0..glyph.height {
        let py = y + row as i32;
        if py < 0 || py >= frame_height {
            continue;
        }

        for col in 0..glyph.width {
            let px = x + col as i32;
            if px < 0 || px >= frame_width {
                continue;
            }

            let coverage = glyph.bitmap[row * glyph.width + col];
            if coverage == 0 {
                continue;
            }

            let alpha = mul_div255(coverage, color.a);
            let idx = (py * frame_width + px) as usize;
            pixels[idx] = blend_pixel(pixels[idx], color, alpha);
        }
    }
}

fn blend_pixel(dst: PremultipliedColorU8, color: Rgba8, alpha: u8) -> PremultipliedColorU8 {
    let inv = 255 - alpha;
    let over = |src: u8, dst: u8| mul_div255(src, alpha).saturating_add(mul_div255(dst, inv));
    PremultipliedColorU8::from_rgba(
        over(color.r, dst.red()),
        over(color.g, dst.green()),
        over(color.b, dst.blue()),
        alpha.saturating_add(mul_div255(dst.alpha(), inv)),
    )
    .unwrap_or(dst)
}

fn mul_div255(a: u8, b: u8) -> u8 {
    ((u16::from(a) * u16::from(b) + 127) / 255) as u8
}
