use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use adpreview::error_codes::find_coded_error;
use adpreview::export::{
    default_export_id, encode_png, png_data_uri, render_digest, write_png, ExportFormat,
    ExportKind,
};
use adpreview::font_assets::FontRegistry;
use adpreview::manifest::load_and_validate_ad_document;
use adpreview::preview_mode::PreviewMode;
use adpreview::renderer::{AdPreviewRenderer, RenderFeatures, RenderProfile, RenderSurface};
use adpreview::schema::{AdContent, AdDocument};
use adpreview::templates::{CampaignObjective, TemplateRequest};
use adpreview::variations::{generate_variations, VariantPools};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ADPREVIEW_GIT_HASH"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "adpreview")]
#[command(about = "Render customizable ad previews to PNG")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate an ad document.
    Check { document: PathBuf },
    /// Render an ad document and export it.
    Render {
        document: PathBuf,
        /// Exact output file. Overrides --out-dir.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// Directory for `ad-<id>.png` / `customized-ad-<id>.png`.
        #[arg(long = "out-dir")]
        out_dir: Option<PathBuf>,
        #[command(flatten)]
        overrides: RenderOverrides,
        #[arg(long = "format", default_value = "png")]
        format: String,
        /// Print the PNG as a data URI on stdout.
        #[arg(long = "data-uri")]
        data_uri: bool,
        #[arg(long = "json")]
        json: bool,
    },
    /// Print resolved regions and wrapped lines without drawing.
    Layout {
        document: PathBuf,
        #[command(flatten)]
        overrides: RenderOverrides,
        #[arg(long = "json")]
        json: bool,
    },
    /// Print variant pools and A/B variations as JSON.
    Variants {
        document: PathBuf,
        #[arg(long = "count", default_value_t = 5)]
        count: usize,
    },
    /// Generate copy from a product description and print it as YAML.
    Generate {
        #[arg(long = "product")]
        product: String,
        #[arg(long = "description", default_value = "")]
        description: String,
        #[arg(long = "objective", default_value = "conversion")]
        objective: String,
        #[arg(long = "platform")]
        platform: Option<String>,
        #[arg(long = "seed", default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Debug, Clone, Default, clap::Args)]
struct RenderOverrides {
    #[arg(long = "preview")]
    preview: Option<String>,
    #[arg(long = "profile")]
    profile: Option<String>,
    #[arg(long = "headline-variation")]
    headline_variation: Option<usize>,
    #[arg(long = "description-variation")]
    description_variation: Option<usize>,
    #[arg(long = "cta-variation")]
    cta_variation: Option<usize>,
}

impl RenderOverrides {
    fn apply(&self, document: &mut AdDocument) -> Result<()> {
        if let Some(preview) = &self.preview {
            document.preview = PreviewMode::from_keyword(preview)?;
        }
        if let Some(profile) = &self.profile {
            document.profile = RenderProfile::from_keyword(profile)?;
        }
        if let Some(index) = self.headline_variation {
            document.variation.headline = index;
        }
        if let Some(index) = self.description_variation {
            document.variation.description = index;
        }
        if let Some(index) = self.cta_variation {
            document.variation.cta = index;
        }
        Ok(())
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        std::process::exit(report_error(&error));
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "adpreview=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(error: &anyhow::Error) -> i32 {
    if let Some(coded) = find_coded_error(error) {
        match serde_json::to_string(&coded.envelope()) {
            Ok(envelope) => eprintln!("{envelope}"),
            Err(_) => eprintln!("{coded}"),
        }
        return coded.exit_code();
    }
    eprintln!("error: {error:#}");
    1
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { document } => run_check(&document),
        Commands::Render {
            document,
            output,
            out_dir,
            overrides,
            format,
            data_uri,
            json,
        } => run_render(
            &document,
            RenderTarget {
                output,
                out_dir,
                data_uri,
            },
            &overrides,
            &format,
            json,
        ),
        Commands::Layout {
            document,
            overrides,
            json,
        } => run_layout(&document, &overrides, json),
        Commands::Variants { document, count } => run_variants(&document, count),
        Commands::Generate {
            product,
            description,
            objective,
            platform,
            seed,
        } => run_generate(TemplateRequest {
            product_name: product,
            product_description: description,
            objective: CampaignObjective::from_keyword(&objective)?,
            platform,
            seed,
        }),
    }
}

fn run_check(document_path: &Path) -> Result<()> {
    let document = load_and_validate_ad_document(document_path)?;
    let fonts = FontRegistry::from_sources(&document.fonts)?;
    let (width, height) = document.preview.dimensions_px();
    println!(
        "OK: {} ({} {}x{}, profile {}, layout {:?})",
        document_path.display(),
        document.preview.keyword(),
        width,
        height,
        document.profile.keyword(),
        document.customization.layout
    );
    println!("Fonts: {}", fonts.families().join(", "));
    Ok(())
}

struct RenderTarget {
    output: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    data_uri: bool,
}

fn prepare_renderer(
    document_path: &Path,
    overrides: &RenderOverrides,
) -> Result<(AdDocument, AdPreviewRenderer)> {
    let mut document = load_and_validate_ad_document(document_path)?;
    overrides.apply(&mut document)?;

    let fonts = FontRegistry::from_sources(&document.fonts)?;
    let features = RenderFeatures::for_profile(document.profile)
        .with_contrast_aware_cta(document.contrast_aware_cta);
    Ok((document, AdPreviewRenderer::with_fonts(features, fonts)))
}

fn run_render(
    document_path: &Path,
    target: RenderTarget,
    overrides: &RenderOverrides,
    format: &str,
    json: bool,
) -> Result<()> {
    ExportFormat::from_keyword(format)?.ensure_supported()?;

    let (document, mut renderer) = prepare_renderer(document_path, overrides)?;
    let content = document.resolved_content();
    let mut surface = RenderSurface::for_preview(document.preview)?;
    let outcome = renderer
        .render(
            &mut surface,
            &content,
            &document.customization,
            &document.variation,
        )
        .with_context(|| format!("failed to render {}", document_path.display()))?;
    let png = encode_png(&surface)?;

    let write_file = !target.data_uri || target.output.is_some() || target.out_dir.is_some();
    let report = if write_file {
        let path = match target.output {
            Some(path) => path,
            None => {
                let kind = match document.profile {
                    RenderProfile::AdGenerator => ExportKind::Generated,
                    RenderProfile::RealTimeCustomization => ExportKind::Customized,
                };
                let id = document.id.clone().unwrap_or_else(default_export_id);
                target
                    .out_dir
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(kind.file_name(&id))
            }
        };
        Some(write_png(&path, &png)?)
    } else {
        None
    };
    let uri = target.data_uri.then(|| png_data_uri(&png));

    if json {
        let summary = json!({
            "ok": true,
            "document": document_path.display().to_string(),
            "preview": document.preview.keyword(),
            "profile": document.profile.keyword(),
            "width": surface.width(),
            "height": surface.height(),
            "export": report,
            "pixels_sha256": render_digest(&surface),
            "content": outcome.content,
            "data_uri": uri,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if let Some(report) = &report {
        println!(
            "Wrote {} ({}x{}, {} bytes, sha256 {})",
            report.path.display(),
            report.width,
            report.height,
            report.bytes,
            report.sha256
        );
    }
    if let Some(uri) = uri {
        println!("{uri}");
    }
    Ok(())
}

fn run_layout(document_path: &Path, overrides: &RenderOverrides, json: bool) -> Result<()> {
    let (document, mut renderer) = prepare_renderer(document_path, overrides)?;
    let (width, height) = document.preview.dimensions_px();
    let outcome = renderer.plan(
        width,
        height,
        &document.resolved_content(),
        &document.customization,
        &document.variation,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "{} {}x{} layout {:?} font {}",
        document.preview.keyword(),
        width,
        height,
        outcome.layout.mode,
        outcome.font_family
    );
    for (label, placed) in [
        ("headline", &outcome.headline),
        ("description", &outcome.description),
    ] {
        for line in &placed.lines {
            println!(
                "{label:<12} ({:>6.1}, {:>6.1}) w={:>6.1} {}",
                line.x, line.baseline, line.width, line.text
            );
        }
    }
    let cta = outcome.layout.cta;
    println!(
        "{:<12} ({:>6.1}, {:>6.1}) {}x{} {}",
        "cta", cta.x, cta.y, cta.width, cta.height, outcome.cta_label.text
    );
    Ok(())
}

fn run_variants(document_path: &Path, count: usize) -> Result<()> {
    let document = load_and_validate_ad_document(document_path)?;
    let content: AdContent = document.resolved_content();
    let summary = json!({
        "content": content,
        "pools": VariantPools::from_content(&content),
        "variations": generate_variations(&content, count),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_generate(request: TemplateRequest) -> Result<()> {
    request.validate()?;
    let content = request.generate();
    print!("{}", serde_yaml::to_string(&content)?);
    Ok(())
}
