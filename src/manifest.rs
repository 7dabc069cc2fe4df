use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::json;

use crate::error_codes::{CodedError, INVALID_AD_DOCUMENT};
use crate::schema::AdDocument;

/// Reads an ad document, validates it and resolves font paths against the
/// document's directory.
pub fn load_and_validate_ad_document(path: &Path) -> Result<AdDocument> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read ad document {}", path.display()))?;
    let mut document: AdDocument = serde_yaml::from_str(&contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(CodedError::usage(
            INVALID_AD_DOCUMENT,
            format!(
                "failed to parse yaml in {} at {}: {}",
                path.display(),
                location,
                error
            ),
        )
        .with_details(json!({
            "path": path.display().to_string(),
            "location": location
        })))
    })?;

    validate_ad_document(&mut document, path)?;
    Ok(document)
}

fn validate_ad_document(document: &mut AdDocument, document_path: &Path) -> Result<()> {
    document.validate().map_err(|error| {
        anyhow!(CodedError::usage(
            INVALID_AD_DOCUMENT,
            format!("{}: {error:#}", document_path.display()),
        ))
    })?;

    let document_dir = document_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let mut seen_families = Vec::with_capacity(document.fonts.len());
    for font in &mut document.fonts {
        let family = font.family.trim().to_ascii_lowercase();
        if seen_families.contains(&family) {
            bail!("duplicate font family '{}'", font.family);
        }
        seen_families.push(family);

        font.path = resolve_and_validate_asset_path(&document_dir, &font.path, &font.family)?;
    }

    Ok(())
}

fn resolve_and_validate_asset_path(
    document_dir: &Path,
    source_path: &Path,
    family: &str,
) -> Result<PathBuf> {
    let resolved = if source_path.is_absolute() {
        source_path.to_path_buf()
    } else {
        document_dir.join(source_path)
    };

    if !resolved.exists() {
        bail!(
            "font '{}' path does not exist: {}",
            family,
            resolved.display()
        );
    }

    if !resolved.is_file() {
        bail!("font '{}' path is not a file: {}", family, resolved.display());
    }

    Ok(resolved)
}
