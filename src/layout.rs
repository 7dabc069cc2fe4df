use serde::Serialize;

use crate::schema::{LayoutMode, TextAlignment};

pub const HEADLINE_BASELINE_OFFSET: f32 = 24.0;
pub const DESCRIPTION_BASELINE_OFFSET: f32 = 80.0;
pub const CTA_WIDTH: f32 = 120.0;
pub const CTA_HEIGHT: f32 = 40.0;

/// Anchor for a block of wrapped text. `y` is the baseline of the first line;
/// `x` is interpreted according to `align`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextRegion {
    pub x: f32,
    pub y: f32,
    pub max_width: f32,
    pub align: TextAlignment,
}

impl TextRegion {
    /// Horizontal extent `(left, right)` the wrapped lines may occupy.
    pub fn span(&self) -> (f32, f32) {
        let left = match self.align {
            TextAlignment::Left => self.x,
            TextAlignment::Center => self.x - self.max_width / 2.0,
            TextAlignment::Right => self.x - self.max_width,
        };
        (left, left + self.max_width)
    }

    /// Re-anchors a left-anchored region so lines align inside the same span.
    fn realigned(self, align: TextAlignment) -> Self {
        let (left, right) = self.span();
        let x = match align {
            TextAlignment::Left => left,
            TextAlignment::Center => (left + right) / 2.0,
            TextAlignment::Right => right,
        };
        Self { x, align, ..self }
    }

    /// Pen x for a line of `line_width` pixels.
    pub fn line_start_x(&self, line_width: f32) -> f32 {
        match self.align {
            TextAlignment::Left => self.x,
            TextAlignment::Center => self.x - line_width / 2.0,
            TextAlignment::Right => self.x - line_width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ButtonRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ButtonRegion {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn to_rect(&self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdLayout {
    pub mode: LayoutMode,
    pub headline: TextRegion,
    pub description: TextRegion,
    pub cta: ButtonRegion,
}

impl AdLayout {
    /// Applies the customization's text alignment. Centered layouts always
    /// center their text, so the request only moves standard and split anchors.
    pub fn with_alignment(self, align: TextAlignment) -> Self {
        if self.mode == LayoutMode::Centered {
            return self;
        }
        Self {
            headline: self.headline.realigned(align),
            description: self.description.realigned(align),
            ..self
        }
    }

    /// Whether every region fits inside a `width` x `height` surface.
    pub fn fits_within(&self, width: f32, height: f32) -> bool {
        let text_fits = |region: &TextRegion| {
            let (left, right) = region.span();
            left >= 0.0 && right <= width && region.y >= 0.0 && region.y <= height
        };
        let cta = &self.cta;
        text_fits(&self.headline)
            && text_fits(&self.description)
            && cta.x >= 0.0
            && cta.y >= 0.0
            && cta.x + cta.width <= width
            && cta.y + cta.height <= height
    }
}

/// Places the headline, description and CTA for a surface. Pure: the result
/// depends only on the four arguments.
pub fn resolve_layout(mode: LayoutMode, width: f32, height: f32, padding: f32) -> AdLayout {
    let headline_y = padding + HEADLINE_BASELINE_OFFSET;
    let description_y = padding + DESCRIPTION_BASELINE_OFFSET;
    let full_width = (width - 2.0 * padding).max(0.0);

    let (headline, description, cta) = match mode {
        LayoutMode::Standard => {
            let region = |y| TextRegion {
                x: padding,
                y,
                max_width: full_width,
                align: TextAlignment::Left,
            };
            (
                region(headline_y),
                region(description_y),
                ButtonRegion {
                    x: padding,
                    y: height - padding - CTA_HEIGHT,
                    width: CTA_WIDTH,
                    height: CTA_HEIGHT,
                },
            )
        }
        LayoutMode::Centered => {
            let region = |y| TextRegion {
                x: width / 2.0,
                y,
                max_width: full_width,
                align: TextAlignment::Center,
            };
            (
                region(headline_y),
                region(description_y),
                ButtonRegion {
                    x: width / 2.0 - CTA_WIDTH / 2.0,
                    y: height - padding - CTA_HEIGHT,
                    width: CTA_WIDTH,
                    height: CTA_HEIGHT,
                },
            )
        }
        LayoutMode::Split => {
            let half_width = (width / 2.0 - 2.0 * padding).max(0.0);
            let region = |y| TextRegion {
                x: padding,
                y,
                max_width: half_width,
                align: TextAlignment::Left,
            };
            (
                region(headline_y),
                region(description_y),
                ButtonRegion {
                    x: width * 0.75 - CTA_WIDTH / 2.0,
                    y: height / 2.0 - CTA_HEIGHT / 2.0,
                    width: CTA_WIDTH,
                    height: CTA_HEIGHT,
                },
            )
        }
    };

    AdLayout {
        mode,
        headline,
        description,
        cta,
    }
}
