use serde::Serialize;

use crate::schema::{AdContent, ContentVariationSelector};

/// Fixed variant pools for each field. Index 0 is always the original copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantPools {
    pub headline: Vec<String>,
    pub description: Vec<String>,
    pub cta: Vec<String>,
}

impl VariantPools {
    /// Original, urgency-suffixed and exclusive-prefixed copy per field.
    pub fn from_content(content: &AdContent) -> Self {
        let AdContent {
            headline,
            description,
            call_to_action,
        } = content;

        Self {
            headline: vec![
                headline.clone(),
                format!("{headline} - Limited Time!"),
                format!("Exclusive: {headline}"),
            ],
            description: vec![
                description.clone(),
                format!("{description} Hurry, offer ends soon!"),
                format!("Exclusive offer: {description}"),
            ],
            cta: vec![
                call_to_action.clone(),
                format!("{call_to_action} Now"),
                format!("Exclusive {call_to_action}"),
            ],
        }
    }
}

impl ContentVariationSelector {
    /// Picks the selected variant per field. Indices past the end of a pool, or
    /// an empty pool, resolve to `original`.
    pub fn resolve(&self, pools: &VariantPools, original: &AdContent) -> AdContent {
        AdContent {
            headline: pick(&pools.headline, self.headline, &original.headline),
            description: pick(&pools.description, self.description, &original.description),
            call_to_action: pick(&pools.cta, self.cta, &original.call_to_action),
        }
    }
}

fn pick(pool: &[String], index: usize, original: &str) -> String {
    pool.get(index)
        .map(String::as_str)
        .unwrap_or(original)
        .to_owned()
}

/// Builds `count` A/B variations of `base` by cycling the wider variant lists
/// used for campaign testing.
pub fn generate_variations(base: &AdContent, count: usize) -> Vec<AdContent> {
    let AdContent {
        headline,
        description,
        call_to_action,
    } = base;

    let headlines = [
        headline.clone(),
        headline.replace("Discover", "Experience"),
        headline.replace("Transform", "Revolutionize"),
        format!("Hot: {headline}"),
        format!("New: {headline}"),
    ];
    let descriptions = [
        description.clone(),
        format!("Limited time: {description}"),
        format!("Exclusive offer: {description}"),
        format!("{description} Don't wait - supplies are limited!"),
        format!("{description} Join the revolution today."),
    ];
    let ctas = [
        call_to_action.clone(),
        format!("{call_to_action} Today"),
        format!("{call_to_action} ->"),
        format!("> {call_to_action}"),
        format!("{call_to_action} Now"),
    ];

    (0..count)
        .map(|i| AdContent {
            headline: headlines[i % headlines.len()].clone(),
            description: descriptions[i % descriptions.len()].clone(),
            call_to_action: ctas[i % ctas.len()].clone(),
        })
        .collect()
}
