//! Copy generation without an AI provider: placeholder substitution over a
//! small template library, plus per-platform length and tone tuning.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use anyhow::{anyhow, bail, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error_codes::{CodedError, INVALID_OBJECTIVE};
use crate::schema::AdContent;

const HEADLINE_TEMPLATES: [&str; 5] = [
    "Discover {product_name}",
    "Transform Your Life with {product_name}",
    "The Future of {product_noun} is Here",
    "Experience Premium {product_name}",
    "Unlock the Power of {product_name}",
];

const DESCRIPTION_TEMPLATES: [&str; 4] = [
    "Join thousands who have already discovered the benefits of {product_name}. {product_description}",
    "Revolutionary {product_name} that changes everything. {product_description}",
    "Premium quality meets innovation. {product_description}",
    "Don't miss out on this game-changing {product_name}. {product_description}",
];

/// Attention mark for casual platforms. Plain ASCII so the built-in pixel font
/// can draw it.
const HIGHLIGHT_MARK: &str = "*";
const EMOJI_MARKERS: [&str; 4] = ["\u{1f525}", "\u{2728}", "\u{1f48e}", "\u{1f680}"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignObjective {
    Awareness,
    Engagement,
    #[default]
    Conversion,
    Retention,
}

impl CampaignObjective {
    pub fn from_keyword(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "awareness" => Ok(Self::Awareness),
            "engagement" => Ok(Self::Engagement),
            "conversion" => Ok(Self::Conversion),
            "retention" => Ok(Self::Retention),
            _ => Err(anyhow!(CodedError::usage(
                INVALID_OBJECTIVE,
                format!("invalid campaign objective '{value}'"),
            )
            .with_details(json!({
                "provided": value,
                "allowed": ["awareness", "engagement", "conversion", "retention"]
            })))),
        }
    }

    pub fn calls_to_action(self) -> &'static [&'static str] {
        match self {
            Self::Awareness => &["Learn More", "Discover Now", "Find Out How"],
            Self::Engagement => &["Join Us", "Get Started", "Try It Free"],
            Self::Conversion => &["Buy Now", "Shop Today", "Order Now"],
            Self::Retention => &["Continue", "Upgrade", "Renew"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    Linkedin,
    Google,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformRules {
    pub headline_max: usize,
    pub description_max: usize,
    pub emojis: bool,
    pub hashtags: bool,
    pub professional: bool,
}

impl Platform {
    /// Unknown names get Facebook rules.
    pub fn from_name(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "instagram" => Self::Instagram,
            "twitter" => Self::Twitter,
            "linkedin" => Self::Linkedin,
            "google" => Self::Google,
            "facebook" => Self::Facebook,
            other => {
                tracing::debug!(platform = other, "unknown platform, using facebook rules");
                Self::Facebook
            }
        }
    }

    pub fn rules(self) -> PlatformRules {
        match self {
            Self::Facebook => PlatformRules {
                headline_max: 60,
                description_max: 90,
                emojis: true,
                hashtags: false,
                professional: false,
            },
            Self::Instagram => PlatformRules {
                headline_max: 50,
                description_max: 80,
                emojis: true,
                hashtags: true,
                professional: false,
            },
            Self::Twitter => PlatformRules {
                headline_max: 50,
                description_max: 120,
                emojis: true,
                hashtags: true,
                professional: false,
            },
            Self::Linkedin => PlatformRules {
                headline_max: 70,
                description_max: 150,
                emojis: false,
                hashtags: false,
                professional: true,
            },
            Self::Google => PlatformRules {
                headline_max: 30,
                description_max: 90,
                emojis: false,
                hashtags: false,
                professional: false,
            },
        }
    }
}

/// Inputs for rule-based copy generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateRequest {
    pub product_name: String,
    pub product_description: String,
    #[serde(default)]
    pub objective: CampaignObjective,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub seed: u64,
}

impl TemplateRequest {
    pub fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            bail!("template product_name cannot be empty");
        }
        Ok(())
    }

    pub fn placeholder_values(&self) -> BTreeMap<String, String> {
        let name = self.product_name.trim();
        let noun = name.split_whitespace().last().unwrap_or(name);
        BTreeMap::from([
            ("product_name".to_owned(), name.to_owned()),
            ("product_noun".to_owned(), noun.to_owned()),
            (
                "product_description".to_owned(),
                self.product_description.trim().to_owned(),
            ),
        ])
    }

    /// Deterministic stand-in for AI generation: `seed` picks one template per
    /// field, then the platform rules (if any) are applied.
    pub fn generate(&self) -> AdContent {
        let content = fallback_content(&self.placeholder_values(), self.objective, self.seed);
        match &self.platform {
            Some(platform) => optimize_for_platform(&content, Platform::from_name(platform)),
            None => content,
        }
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex should compile")
    })
}

/// Replaces `{name}` tokens with `values[name]`. Unknown tokens stay as written.
pub fn personalize(template: &str, values: &BTreeMap<String, String>) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_owned(),
        })
        .into_owned()
}

/// Picks headline, description and CTA templates by `seed` and fills them in.
pub fn fallback_content(
    values: &BTreeMap<String, String>,
    objective: CampaignObjective,
    seed: u64,
) -> AdContent {
    let ctas = objective.calls_to_action();
    let pick = |len: usize, salt: u64| (seed.wrapping_add(salt) % len as u64) as usize;

    AdContent {
        headline: personalize(HEADLINE_TEMPLATES[pick(HEADLINE_TEMPLATES.len(), 0)], values),
        description: personalize(
            DESCRIPTION_TEMPLATES[pick(DESCRIPTION_TEMPLATES.len(), 1)],
            values,
        ),
        call_to_action: ctas[pick(ctas.len(), 2)].to_owned(),
    }
}

/// Trims copy to the platform's limits and adds its customary decorations.
pub fn optimize_for_platform(content: &AdContent, platform: Platform) -> AdContent {
    let rules = platform.rules();

    let mut headline = truncate_with_ellipsis(&content.headline, rules.headline_max);
    let mut description = truncate_with_ellipsis(&content.description, rules.description_max);

    if rules.hashtags && !description.contains('#') && !description.contains('@') {
        description.push_str(" #premium #quality");
    }

    if rules.emojis
        && !rules.professional
        && !headline.starts_with(HIGHLIGHT_MARK)
        && !EMOJI_MARKERS.iter().any(|marker| headline.contains(marker))
    {
        headline = format!("{HIGHLIGHT_MARK} {headline}");
    }

    AdContent {
        headline,
        description,
        call_to_action: content.call_to_action.clone(),
    }
}

/// Cuts to `max_chars` characters, ending in `...` when anything was removed.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}
