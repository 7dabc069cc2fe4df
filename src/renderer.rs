use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tiny_skia::{
    FillRule, GradientStop, LinearGradient, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    Point, Rect, SpreadMode, Transform,
};

use crate::color::{legible_text_color, Rgba8};
use crate::error_codes::{CodedError, INVALID_PROFILE, INVALID_SURFACE_SIZE};
use crate::font_assets::FontRegistry;
use crate::layout::{resolve_layout, AdLayout, TextRegion};
use crate::preview_mode::PreviewMode;
use crate::schema::{AdContent, ContentVariationSelector, VisualCustomization};
use crate::shadow::{shadow_layer, ShadowSpec};
use crate::text_painter::TextBackend;
use crate::text_wrap::wrap_greedy;
use crate::variations::VariantPools;

/// Vertical gap between wrapped lines, in pixels.
pub const LINE_GAP: f32 = 6.0;
/// Alpha of the accent end of the background gradient (0x20, about 12%).
pub const GRADIENT_ACCENT_ALPHA: u8 = 0x20;
pub const HEADLINE_SCALE: f32 = 1.5;

/// Drawing capabilities. The two preview screens differ only in these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderFeatures {
    pub gradient: bool,
    pub rounded_corners: bool,
    pub shadow: bool,
    pub contrast_aware_cta: bool,
}

impl RenderFeatures {
    pub fn for_profile(profile: RenderProfile) -> Self {
        match profile {
            RenderProfile::AdGenerator => Self {
                gradient: false,
                rounded_corners: false,
                shadow: false,
                contrast_aware_cta: false,
            },
            RenderProfile::RealTimeCustomization => Self {
                gradient: true,
                rounded_corners: true,
                shadow: true,
                contrast_aware_cta: false,
            },
        }
    }

    pub fn with_contrast_aware_cta(self, enabled: bool) -> Self {
        Self {
            contrast_aware_cta: enabled,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderProfile {
    /// Flat preview: background, text and button only.
    AdGenerator,
    /// Full preview with gradient, rounded clip and drop shadow.
    #[default]
    RealTimeCustomization,
}

impl RenderProfile {
    pub fn from_keyword(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ad_generator" | "generator" => Ok(Self::AdGenerator),
            "real_time_customization" | "realtime" | "customization" => {
                Ok(Self::RealTimeCustomization)
            }
            _ => Err(anyhow!(CodedError::usage(
                INVALID_PROFILE,
                format!("invalid render profile '{value}'"),
            )
            .with_details(json!({
                "provided": value,
                "allowed": ["ad_generator", "real_time_customization"]
            })))),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::AdGenerator => "ad_generator",
            Self::RealTimeCustomization => "real_time_customization",
        }
    }
}

/// Raster target for one preview. Premultiplied RGBA, cleared on every render.
pub struct RenderSurface {
    pixmap: Pixmap,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            anyhow!(CodedError::usage(
                INVALID_SURFACE_SIZE,
                format!("surface size {width}x{height} is not drawable"),
            ))
        })?;
        Ok(Self { pixmap })
    }

    pub fn for_preview(mode: PreviewMode) -> Result<Self> {
        let (width, height) = mode.dimensions_px();
        Self::new(width, height)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Straight-alpha RGBA8 bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for pixel in self.pixmap.pixels() {
            let color = pixel.demultiply();
            out.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        out
    }
}

/// Wrapped lines placed for one text region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedText {
    pub font_px: f32,
    pub lines: Vec<PlacedLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
}

/// What a render resolved, for inspection and reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutcome {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub features: RenderFeatures,
    pub customization: VisualCustomization,
    pub content: AdContent,
    pub layout: AdLayout,
    pub headline: PlacedText,
    pub description: PlacedText,
    pub cta_label: PlacedLine,
    pub cta_label_color: Rgba8,
}

/// Draws ad previews. Holds only font caches; every render starts from a
/// cleared surface, so repeated renders with equal inputs are byte-identical.
pub struct AdPreviewRenderer {
    features: RenderFeatures,
    fonts: FontRegistry,
}

impl AdPreviewRenderer {
    pub fn new(features: RenderFeatures) -> Self {
        Self::with_fonts(features, FontRegistry::builtin())
    }

    pub fn with_fonts(features: RenderFeatures, fonts: FontRegistry) -> Self {
        Self { features, fonts }
    }

    /// Resolves placement and copy without touching any pixels.
    pub fn plan(
        &mut self,
        width: u32,
        height: u32,
        content: &AdContent,
        customization: &VisualCustomization,
        selector: &ContentVariationSelector,
    ) -> RenderOutcome {
        let custom = customization.clamped();
        let layout = resolve_layout(custom.layout, width as f32, height as f32, custom.padding)
            .with_alignment(custom.text_alignment);
        let content = selector.resolve(&VariantPools::from_content(content), content);

        let backend = self.fonts.backend_for(&custom.font_family);
        let font_family = backend.family().to_owned();
        let headline_px = (custom.font_size * HEADLINE_SCALE).round();
        let headline = place_text(&*backend, &content.headline, &layout.headline, headline_px);
        let description = place_text(
            &*backend,
            &content.description,
            &layout.description,
            custom.font_size,
        );

        let label_px = custom.font_size;
        let label_width = backend.measure(&content.call_to_action, label_px);
        let (center_x, center_y) = layout.cta.center();
        let cta_label = PlacedLine {
            text: content.call_to_action.clone(),
            x: center_x - label_width / 2.0,
            // Pixel glyphs sit seven eighths of an em above the baseline.
            baseline: (center_y + label_px * 0.4375).round(),
            width: label_width,
        };
        let cta_label_color = if self.features.contrast_aware_cta {
            legible_text_color(custom.accent_color)
        } else {
            Rgba8::WHITE
        };

        RenderOutcome {
            width,
            height,
            font_family,
            features: self.features,
            customization: custom,
            content,
            layout,
            headline,
            description,
            cta_label,
            cta_label_color,
        }
    }

    /// Draws the ad onto `surface`, replacing whatever it held. On error the
    /// surface may be left partially drawn.
    pub fn render(
        &mut self,
        surface: &mut RenderSurface,
        content: &AdContent,
        customization: &VisualCustomization,
        selector: &ContentVariationSelector,
    ) -> Result<RenderOutcome> {
        let (width, height) = (surface.width(), surface.height());
        let plan = self.plan(width, height, content, customization, selector);
        let custom = &plan.customization;

        surface.clear();

        let clip = if self.features.rounded_corners && custom.border_radius > 0.0 {
            Some(rounded_clip_mask(width, height, custom.border_radius)?)
        } else {
            None
        };

        self.draw_background(surface, custom, clip.as_ref())?;

        let mut foreground =
            Pixmap::new(width, height).context("failed to allocate foreground layer")?;
        self.draw_foreground(&mut foreground, &plan)?;

        let shadow = if self.features.shadow {
            ShadowSpec::from_depth(custom.shadow_depth)
        } else {
            None
        };
        if let Some(spec) = shadow {
            let layer = shadow_layer(&foreground, &spec)?;
            surface.pixmap.draw_pixmap(
                spec.offset_x.round() as i32,
                spec.offset_y.round() as i32,
                layer.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                clip.as_ref(),
            );
        }

        surface.pixmap.draw_pixmap(
            0,
            0,
            foreground.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            clip.as_ref(),
        );

        tracing::debug!(
            width,
            height,
            layout = ?custom.layout,
            headline_lines = plan.headline.lines.len(),
            description_lines = plan.description.lines.len(),
            clipped = clip.is_some(),
            shadowed = shadow.is_some(),
            "rendered ad preview"
        );
        Ok(plan)
    }

    fn draw_background(
        &self,
        surface: &mut RenderSurface,
        custom: &VisualCustomization,
        clip: Option<&Mask>,
    ) -> Result<()> {
        let (width, height) = (surface.width() as f32, surface.height() as f32);
        let bounds =
            Rect::from_xywh(0.0, 0.0, width, height).context("surface bounds are empty")?;

        let mut paint = Paint::default();
        paint.set_color(custom.background_color.to_skia());
        surface
            .pixmap
            .fill_rect(bounds, &paint, Transform::identity(), clip);

        if self.features.gradient && custom.accent_color != custom.background_color {
            let shader = LinearGradient::new(
                Point::from_xy(0.0, 0.0),
                Point::from_xy(width, height),
                vec![
                    GradientStop::new(0.0, custom.background_color.to_skia()),
                    GradientStop::new(
                        1.0,
                        custom
                            .accent_color
                            .with_alpha(GRADIENT_ACCENT_ALPHA)
                            .to_skia(),
                    ),
                ],
                SpreadMode::Pad,
                Transform::identity(),
            )
            .ok_or_else(|| anyhow!("failed to build background gradient"))?;

            let overlay = Paint {
                shader,
                anti_alias: true,
                ..Paint::default()
            };
            surface
                .pixmap
                .fill_rect(bounds, &overlay, Transform::identity(), clip);
        }
        Ok(())
    }

    fn draw_foreground(&mut self, target: &mut Pixmap, plan: &RenderOutcome) -> Result<()> {
        let custom = &plan.customization;
        let backend = self.fonts.backend_for(&custom.font_family);

        warn_missing_glyphs(&*backend, &plan.content);

        for placed in [&plan.headline, &plan.description] {
            for line in &placed.lines {
                backend.draw_line(
                    target,
                    &line.text,
                    line.x,
                    line.baseline,
                    placed.font_px,
                    custom.text_color,
                )?;
            }
        }

        if let Some(button) = plan.layout.cta.to_rect() {
            let mut paint = Paint::default();
            paint.set_color(custom.accent_color.to_skia());
            target.fill_rect(button, &paint, Transform::identity(), None);
        }

        let label = &plan.cta_label;
        backend.draw_line(
            target,
            &label.text,
            label.x,
            label.baseline,
            custom.font_size,
            plan.cta_label_color,
        )?;
        Ok(())
    }
}

fn place_text(backend: &dyn TextBackend, text: &str, region: &TextRegion, font_px: f32) -> PlacedText {
    let lines = wrap_greedy(text, region.max_width, |candidate| {
        backend.measure(candidate, font_px)
    })
    .into_iter()
    .enumerate()
    .map(|(index, line)| {
        let width = backend.measure(&line, font_px);
        PlacedLine {
            x: region.line_start_x(width),
            baseline: region.y + index as f32 * (font_px + LINE_GAP),
            width,
            text: line,
        }
    })
    .collect();

    PlacedText { font_px, lines }
}

fn warn_missing_glyphs(backend: &dyn TextBackend, content: &AdContent) {
    let mut missing: Vec<char> = [
        &content.headline,
        &content.description,
        &content.call_to_action,
    ]
    .into_iter()
    .flat_map(|text| backend.missing_codepoints(text))
    .collect();
    if missing.is_empty() {
        return;
    }
    missing.sort_unstable();
    missing.dedup();
    let listed: String = missing.iter().collect();
    tracing::warn!(
        family = backend.family(),
        missing = %listed,
        "font has no glyphs for some characters"
    );
}

/// Rounded rectangle over the whole surface. Radius is capped at half the
/// shorter side.
pub fn rounded_rect_path(width: f32, height: f32, radius: f32) -> Option<Path> {
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    if r == 0.0 {
        return PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, width, height)?).into();
    }

    // Cubic control offset for a quarter circle.
    let k = r * 0.552_284_8;
    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(width - r, 0.0);
    pb.cubic_to(width - r + k, 0.0, width, r - k, width, r);
    pb.line_to(width, height - r);
    pb.cubic_to(width, height - r + k, width - r + k, height, width - r, height);
    pb.line_to(r, height);
    pb.cubic_to(r - k, height, 0.0, height - r + k, 0.0, height - r);
    pb.line_to(0.0, r);
    pb.cubic_to(0.0, r - k, r - k, 0.0, r, 0.0);
    pb.close();
    pb.finish()
}

fn rounded_clip_mask(width: u32, height: u32, radius: f32) -> Result<Mask> {
    let path = rounded_rect_path(width as f32, height as f32, radius)
        .context("failed to build rounded clip path")?;
    let mut mask = Mask::new(width, height).context("failed to allocate clip mask")?;
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
    Ok(mask)
}
