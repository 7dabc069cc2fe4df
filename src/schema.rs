use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::color::Rgba8;
use crate::preview_mode::PreviewMode;
use crate::renderer::RenderProfile;
use crate::templates::TemplateRequest;

pub const FONT_SIZE_RANGE: (f32, f32) = (12.0, 24.0);
pub const BORDER_RADIUS_RANGE: (f32, f32) = (0.0, 20.0);
pub const SHADOW_DEPTH_RANGE: (f32, f32) = (0.0, 10.0);
pub const PADDING_RANGE: (f32, f32) = (10.0, 40.0);

pub const DEFAULT_FONT_FAMILY: &str = "pixel";

/// The ad copy being previewed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdContent {
    pub headline: String,
    pub description: String,
    #[serde(alias = "callToAction", alias = "cta")]
    pub call_to_action: String,
}

impl AdContent {
    pub fn new(
        headline: impl Into<String>,
        description: impl Into<String>,
        call_to_action: impl Into<String>,
    ) -> Self {
        Self {
            headline: headline.into(),
            description: description.into(),
            call_to_action: call_to_action.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Standard,
    Centered,
    Split,
}

impl LayoutMode {
    pub const ALL: [Self; 3] = [Self::Standard, Self::Centered, Self::Split];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// User-controlled styling. Numbers come straight from UI sliders and are only
/// trusted after [`VisualCustomization::clamped`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualCustomization {
    #[serde(alias = "backgroundColor")]
    pub background_color: Rgba8,
    #[serde(alias = "textColor")]
    pub text_color: Rgba8,
    #[serde(alias = "accentColor")]
    pub accent_color: Rgba8,
    #[serde(alias = "fontSize")]
    pub font_size: f32,
    #[serde(alias = "fontFamily")]
    pub font_family: String,
    #[serde(alias = "borderRadius")]
    pub border_radius: f32,
    #[serde(alias = "shadowDepth")]
    pub shadow_depth: f32,
    pub padding: f32,
    pub layout: LayoutMode,
    #[serde(alias = "textAlignment")]
    pub text_alignment: TextAlignment,
}

impl Default for VisualCustomization {
    fn default() -> Self {
        Self {
            background_color: Rgba8::WHITE,
            text_color: Rgba8::BLACK,
            accent_color: Rgba8::rgb(0x00, 0x7b, 0xff),
            font_size: 16.0,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            border_radius: 8.0,
            shadow_depth: 0.0,
            padding: 20.0,
            layout: LayoutMode::Standard,
            text_alignment: TextAlignment::Left,
        }
    }
}

impl VisualCustomization {
    /// Copy with every numeric field forced into its slider range. Non-finite
    /// values take the default instead of a bound.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        Self {
            font_size: clamp_or(self.font_size, FONT_SIZE_RANGE, defaults.font_size),
            border_radius: clamp_or(
                self.border_radius,
                BORDER_RADIUS_RANGE,
                defaults.border_radius,
            ),
            shadow_depth: clamp_or(self.shadow_depth, SHADOW_DEPTH_RANGE, defaults.shadow_depth),
            padding: clamp_or(self.padding, PADDING_RANGE, defaults.padding),
            ..self.clone()
        }
    }
}

fn clamp_or(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Per-field index into the fixed variant pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentVariationSelector {
    #[serde(alias = "headlineVariation")]
    pub headline: usize,
    #[serde(alias = "descriptionVariation")]
    pub description: usize,
    #[serde(alias = "ctaVariation")]
    pub cta: usize,
}

/// A TrueType font the document wants available under `family`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontSource {
    pub family: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// One ad preview as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub preview: PreviewMode,
    #[serde(default)]
    pub profile: RenderProfile,
    #[serde(default)]
    pub contrast_aware_cta: bool,
    #[serde(default)]
    pub content: Option<AdContent>,
    #[serde(default)]
    pub template: Option<TemplateRequest>,
    #[serde(default)]
    pub customization: VisualCustomization,
    #[serde(default)]
    pub variation: ContentVariationSelector,
    #[serde(default)]
    pub fonts: Vec<FontSource>,
}

impl AdDocument {
    pub fn validate(&self) -> Result<()> {
        match (&self.content, &self.template) {
            (Some(_), Some(_)) => bail!("ad document must define either content or template, not both"),
            (None, None) => bail!("ad document must define content or template"),
            _ => {}
        }

        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                bail!("ad id cannot be empty");
            }
            if id.contains(|ch: char| ch == '/' || ch == '\\') || id.contains("..") {
                bail!("ad id '{}' must not contain path separators", id);
            }
        }

        if let Some(template) = &self.template {
            template.validate()?;
        }

        for font in &self.fonts {
            if font.family.trim().is_empty() {
                bail!("font family cannot be empty");
            }
            if font.family.eq_ignore_ascii_case(DEFAULT_FONT_FAMILY) {
                bail!(
                    "font family '{}' is reserved for the built-in pixel font",
                    font.family
                );
            }
        }

        Ok(())
    }

    /// The content to render: literal copy, or copy generated from the template.
    pub fn resolved_content(&self) -> AdContent {
        match (&self.content, &self.template) {
            (Some(content), _) => content.clone(),
            (None, Some(template)) => template.generate(),
            (None, None) => AdContent::default(),
        }
    }
}
