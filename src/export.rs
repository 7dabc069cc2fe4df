use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader};
use serde::Serialize;
use serde_json::json;

use crate::error_codes::{CodedError, EXPORT_FORMAT_UNSUPPORTED};
use crate::font_assets::sha256_hex;
use crate::renderer::RenderSurface;

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Which screen produced the export; decides the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Generated,
    Customized,
}

impl ExportKind {
    pub fn file_name(self, id: &str) -> String {
        match self {
            Self::Generated => format!("ad-{id}.png"),
            Self::Customized => format!("customized-ad-{id}.png"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Pdf,
    Html,
}

impl ExportFormat {
    pub fn from_keyword(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            "html" => Ok(Self::Html),
            _ => Err(unsupported_format(value)),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }

    /// Only PNG has an encoder; the others are accepted by the parser so
    /// callers get a stable error code instead of a parse failure.
    pub fn ensure_supported(self) -> Result<()> {
        match self {
            Self::Png => Ok(()),
            Self::Pdf | Self::Html => Err(unsupported_format(self.keyword())),
        }
    }
}

fn unsupported_format(value: &str) -> anyhow::Error {
    anyhow!(CodedError::usage(
        EXPORT_FORMAT_UNSUPPORTED,
        format!("export format '{value}' is not supported"),
    )
    .with_details(json!({
        "provided": value,
        "supported": ["png"]
    })))
}

/// Encodes the surface as an RGBA8 PNG.
pub fn encode_png(surface: &RenderSurface) -> Result<Vec<u8>> {
    let rgba = surface.to_rgba8();
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            &rgba,
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgba8,
        )
        .context("failed to encode png")?;
    Ok(bytes)
}

pub fn png_data_uri(png: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    format!("{PNG_DATA_URI_PREFIX}{encoded}")
}

/// Width and height declared in a PNG's header.
pub fn read_png_dimensions(png: &[u8]) -> Result<(u32, u32)> {
    ImageReader::with_format(Cursor::new(png), image::ImageFormat::Png)
        .into_dimensions()
        .context("failed to read png dimensions")
}

/// sha256 of the straight-alpha pixels, independent of PNG encoder settings.
pub fn render_digest(surface: &RenderSurface) -> String {
    sha256_hex(&surface.to_rgba8())
}

/// Stable identifier for an export when the document does not name one.
pub fn default_export_id() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub sha256: String,
}

/// Writes `png` to `path`, creating parent directories as needed.
pub fn write_png(path: &Path, png: &[u8]) -> Result<ExportReport> {
    let (width, height) = read_png_dimensions(png)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, png).with_context(|| format!("failed to write {}", path.display()))?;

    let report = ExportReport {
        path: path.to_path_buf(),
        width,
        height,
        bytes: png.len(),
        sha256: sha256_hex(png),
    };
    tracing::info!(
        path = %report.path.display(),
        width,
        height,
        bytes = report.bytes,
        "exported ad preview"
    );
    Ok(report)
}

/// Encodes and writes the surface as `<dir>/<kind file name>`.
pub fn export_png(
    surface: &RenderSurface,
    dir: &Path,
    kind: ExportKind,
    id: &str,
) -> Result<ExportReport> {
    let png = encode_png(surface)?;
    write_png(&dir.join(kind.file_name(id)), &png)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{
        encode_png, export_png, png_data_uri, read_png_dimensions, render_digest, ExportFormat,
        ExportKind, PNG_DATA_URI_PREFIX,
    };
    use crate::error_codes::{find_coded_error, EXPORT_FORMAT_UNSUPPORTED};
    use crate::renderer::RenderSurface;

    #[test]
    fn file_names_follow_the_screen() {
        assert_eq!(ExportKind::Generated.file_name("42"), "ad-42.png");
        assert_eq!(
            ExportKind::Customized.file_name("42"),
            "customized-ad-42.png"
        );
    }

    #[test]
    fn pdf_and_html_parse_but_are_unsupported() {
        assert!(ExportFormat::from_keyword("PNG")
            .unwrap()
            .ensure_supported()
            .is_ok());
        for keyword in ["pdf", "html"] {
            let format = ExportFormat::from_keyword(keyword).unwrap();
            let error = format.ensure_supported().unwrap_err();
            assert_eq!(
                find_coded_error(&error).map(|coded| coded.code),
                Some(EXPORT_FORMAT_UNSUPPORTED)
            );
        }
        assert!(ExportFormat::from_keyword("gif").is_err());
    }

    #[test]
    fn png_header_matches_surface() {
        let surface = RenderSurface::new(37, 11).unwrap();
        let png = encode_png(&surface).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(read_png_dimensions(&png).unwrap(), (37, 11));
    }

    #[test]
    fn digest_tracks_pixels_not_encoding() {
        let blank = RenderSurface::new(4, 4).unwrap();
        let other = RenderSurface::new(4, 4).unwrap();
        assert_eq!(render_digest(&blank), render_digest(&other));
        assert_eq!(render_digest(&blank).len(), 64);
    }

    #[test]
    fn data_uri_is_base64_png() {
        let uri = png_data_uri(&[0x89, b'P', b'N', b'G']);
        assert!(uri.starts_with(PNG_DATA_URI_PREFIX));
        assert_eq!(&uri[PNG_DATA_URI_PREFIX.len()..], "iVBORw==");
    }

    #[test]
    fn export_writes_into_nested_directory() {
        let dir = tempdir().unwrap();
        let surface = RenderSurface::new(8, 4).unwrap();
        let report = export_png(
            &surface,
            &dir.path().join("out"),
            ExportKind::Customized,
            "x1",
        )
        .unwrap();
        assert!(report.path.ends_with("out/customized-ad-x1.png"));
        assert!(report.path.is_file());
        assert_eq!((report.width, report.height), (8, 4));
        assert_eq!(report.sha256.len(), 64);
    }
}
