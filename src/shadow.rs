use anyhow::{Context, Result};
use tiny_skia::{Pixmap, PremultipliedColorU8};

use crate::color::Rgba8;

const BOX_PASSES: usize = 3;

/// Drop shadow derived from a slider depth: blur `2 x depth`, offset `depth`
/// on both axes, black at 10% alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSpec {
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub color: Rgba8,
}

impl ShadowSpec {
    pub fn from_depth(depth: f32) -> Option<Self> {
        if depth.is_nan() || depth <= 0.0 {
            return None;
        }
        Some(Self {
            blur: depth * 2.0,
            offset_x: depth,
            offset_y: depth,
            color: Rgba8::BLACK.with_alpha(26),
        })
    }

    /// Box radius whose three-pass blur approximates a Gaussian with
    /// sigma = blur / 2.
    pub fn box_radius(&self) -> usize {
        (self.blur / 2.0).round().max(0.0) as usize
    }
}

/// Builds a pixmap the size of `source` holding the blurred, tinted silhouette
/// of its alpha channel. Offsetting is left to the caller when compositing.
pub fn shadow_layer(source: &Pixmap, spec: &ShadowSpec) -> Result<Pixmap> {
    let width = source.width() as usize;
    let height = source.height() as usize;
    let mut alpha: Vec<u8> = source.pixels().iter().map(|px| px.alpha()).collect();

    let radius = spec.box_radius();
    if radius > 0 {
        for _ in 0..BOX_PASSES {
            box_blur_horizontal(&mut alpha, width, height, radius);
            box_blur_vertical(&mut alpha, width, height, radius);
        }
    }

    let mut layer = Pixmap::new(source.width(), source.height())
        .context("failed to allocate shadow layer")?;
    let tint = spec.color;
    for (dst, coverage) in layer.pixels_mut().iter_mut().zip(alpha) {
        let a = ((u16::from(coverage) * u16::from(tint.a) + 127) / 255) as u8;
        if a == 0 {
            continue;
        }
        let premul = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
        if let Some(px) =
            PremultipliedColorU8::from_rgba(premul(tint.r), premul(tint.g), premul(tint.b), a)
        {
            *dst = px;
        }
    }
    Ok(layer)
}

/// Sliding-window mean over each row; samples beyond the edge count as zero.
fn box_blur_horizontal(data: &mut [u8], width: usize, height: usize, radius: usize) {
    let window = (2 * radius + 1) as u32;
    let mut row = vec![0_u8; width];
    for y in 0..height {
        let start = y * width;
        row.copy_from_slice(&data[start..start + width]);
        let mut sum: u32 = row.iter().take(radius + 1).map(|&v| u32::from(v)).sum();
        for x in 0..width {
            data[start + x] = ((sum + window / 2) / window) as u8;
            if x + radius + 1 < width {
                sum += u32::from(row[x + radius + 1]);
            }
            if x >= radius {
                sum -= u32::from(row[x - radius]);
            }
        }
    }
}

fn box_blur_vertical(data: &mut [u8], width: usize, height: usize, radius: usize) {
    let window = (2 * radius + 1) as u32;
    let mut column = vec![0_u8; height];
    for x in 0..width {
        for (y, slot) in column.iter_mut().enumerate() {
            *slot = data[y * width + x];
        }
        let mut sum: u32 = column.iter().take(radius + 1).map(|&v| u32::from(v)).sum();
        for y in 0..height {
            data[y * width + x] = ((sum + window / 2) / window) as u8;
            if y + radius + 1 < height {
                sum += u32::from(column[y + radius + 1]);
            }
            if y >= radius {
                sum -= u32::from(column[y - radius]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tiny_skia::{Color, Pixmap};

    use super::{box_blur_horizontal, shadow_layer, ShadowSpec};

    #[test]
    fn zero_and_invalid_depth_disable_the_shadow() {
        assert!(ShadowSpec::from_depth(0.0).is_none());
        assert!(ShadowSpec::from_depth(f32::NAN).is_none());
        let spec = ShadowSpec::from_depth(4.0).unwrap();
        assert_eq!(spec.blur, 8.0);
        assert_eq!(spec.offset_x, 4.0);
        assert_eq!(spec.box_radius(), 4);
    }

    #[test]
    fn box_blur_preserves_flat_interior_and_spreads_edges() {
        let mut row = vec![0, 0, 0, 255, 255, 255, 255, 0, 0, 0];
        box_blur_horizontal(&mut row, 10, 1, 1);
        assert_eq!(row[2], 85);
        assert_eq!(row[4], 255);
        assert_eq!(row[0], 0);
    }

    #[test]
    fn shadow_layer_is_faint_black_and_spreads() {
        let mut source = Pixmap::new(30, 30).unwrap();
        source.fill_rect(
            tiny_skia::Rect::from_xywh(10.0, 10.0, 10.0, 10.0).unwrap(),
            &{
                let mut paint = tiny_skia::Paint::default();
                paint.set_color(Color::BLACK);
                paint
            },
            tiny_skia::Transform::identity(),
            None,
        );

        let spec = ShadowSpec::from_depth(2.0).unwrap();
        let layer = shadow_layer(&source, &spec).unwrap();

        let center = layer.pixel(15, 15).unwrap();
        assert_eq!(center.red(), 0);
        assert!(center.alpha() > 0 && center.alpha() <= 26);
        assert!(layer.pixel(8, 15).unwrap().alpha() > 0, "blur spreads past the edge");
        assert_eq!(layer.pixel(0, 0).unwrap().alpha(), 0);
    }
}
