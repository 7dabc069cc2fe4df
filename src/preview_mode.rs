use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error_codes::{CodedError, INVALID_PREVIEW_MODE};

/// Device frame the preview surface is sized for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl PreviewMode {
    pub const ALL: [Self; 3] = [Self::Desktop, Self::Tablet, Self::Mobile];

    pub fn from_keyword(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            _ => Err(anyhow!(CodedError::usage(
                INVALID_PREVIEW_MODE,
                format!("invalid preview mode '{value}'"),
            )
            .with_details(json!({
                "provided": value,
                "allowed": ["desktop", "tablet", "mobile"]
            })))),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        }
    }

    pub fn dimensions_px(self) -> (u32, u32) {
        match self {
            Self::Desktop => (600, 400),
            Self::Tablet => (768, 500),
            Self::Mobile => (320, 400),
        }
    }
}
