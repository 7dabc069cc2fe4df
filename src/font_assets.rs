use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error_codes::{CodedError, FONT_ASSET_HASH_MISMATCH};
use crate::schema::{FontSource, DEFAULT_FONT_FAMILY};
use crate::text_painter::{FontduePainter, PixelFontPainter, TextBackend};

/// Fonts available to the renderer, keyed by lowercase family name. The
/// built-in pixel font is always present and catches unknown families.
pub struct FontRegistry {
    pixel: PixelFontPainter,
    loaded: BTreeMap<String, FontduePainter>,
    warned_families: HashSet<String>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FontRegistry {
    pub fn builtin() -> Self {
        Self {
            pixel: PixelFontPainter::new(),
            loaded: BTreeMap::new(),
            warned_families: HashSet::new(),
        }
    }

    /// Loads every source, verifying pinned hashes before parsing.
    pub fn from_sources(sources: &[FontSource]) -> Result<Self> {
        let mut registry = Self::builtin();
        for source in sources {
            let bytes = read_font_bytes(&source.path, source.sha256.as_deref())
                .with_context(|| format!("failed loading font family '{}'", source.family))?;
            registry.register_bytes(&source.family, bytes)?;
        }
        Ok(registry)
    }

    pub fn register_bytes(&mut self, family: &str, bytes: Vec<u8>) -> Result<()> {
        let painter = FontduePainter::from_bytes(family, bytes)?;
        tracing::debug!(family, "registered font");
        self.loaded.insert(family.trim().to_ascii_lowercase(), painter);
        Ok(())
    }

    pub fn families(&self) -> Vec<String> {
        let mut families = vec![DEFAULT_FONT_FAMILY.to_owned()];
        families.extend(
            self.loaded
                .values()
                .map(|painter| painter.family().to_owned()),
        );
        families
    }

    /// Backend for `family`, falling back to the pixel font with a one-time warning.
    pub fn backend_for(&mut self, family: &str) -> &mut dyn TextBackend {
        let key = family.trim().to_ascii_lowercase();
        if key == DEFAULT_FONT_FAMILY {
            return &mut self.pixel;
        }
        match self.loaded.get_mut(&key) {
            Some(painter) => painter,
            None => {
                if self.warned_families.insert(key) {
                    tracing::warn!(
                        family,
                        fallback = DEFAULT_FONT_FAMILY,
                        "font family not registered, using built-in pixel font"
                    );
                }
                &mut self.pixel
            }
        }
    }
}

/// Reads a font file; when `expected_sha256` is set the bytes must match it.
pub fn read_font_bytes(path: &Path, expected_sha256: Option<&str>) -> Result<Vec<u8>> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read font file '{}'", path.display()))?;

    if let Some(expected) = expected_sha256 {
        let actual = sha256_hex(&bytes);
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(anyhow!(CodedError::asset(
                FONT_ASSET_HASH_MISMATCH,
                format!(
                    "{} expected sha256={} actual sha256={}",
                    path.display(),
                    expected,
                    actual
                ),
            )
            .with_details(json!({
                "path": path.display().to_string(),
                "expected": expected,
                "actual": actual
            }))));
        }
    }

    Ok(bytes)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
