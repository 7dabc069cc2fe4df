use std::fs;
use std::path::{Path, PathBuf};

use adpreview::font_assets::{sha256_hex, FontRegistry};
use adpreview::renderer::{AdPreviewRenderer, RenderFeatures, RenderProfile, RenderSurface};
use adpreview::schema::{AdContent, ContentVariationSelector, FontSource, VisualCustomization};
use adpreview::text_painter::{FontduePainter, TextBackend};
use tiny_skia::Pixmap;

const FAMILY: &str = "DejaVu Mono";

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf")
}

fn fixture_bytes() -> Vec<u8> {
    fs::read(fixture_path()).expect("font fixture should read")
}

fn registry() -> FontRegistry {
    let bytes = fixture_bytes();
    let source = FontSource {
        family: FAMILY.to_owned(),
        path: fixture_path(),
        sha256: Some(sha256_hex(&bytes)),
    };
    FontRegistry::from_sources(&[source]).expect("pinned fixture should load")
}

fn branded() -> VisualCustomization {
    VisualCustomization {
        font_family: FAMILY.to_owned(),
        shadow_depth: 3.0,
        ..VisualCustomization::default()
    }
}

fn long_copy() -> AdContent {
    AdContent::new(
        "Save Today with a rather long headline that wraps onto a second line",
        "Every lamp, rug and cushion in the store is twenty percent off this weekend only",
        "Shop Now",
    )
}

#[test]
fn truetype_measure_grows_with_text_and_size() {
    let painter = FontduePainter::from_bytes(FAMILY, fixture_bytes()).expect("font should parse");
    let short = painter.measure("Shop", 16.0);
    assert!(short > 0.0);
    assert!(painter.measure("Shop Now", 16.0) > short);
    assert!(painter.measure("Shop", 32.0) > short);
    assert_eq!(painter.measure("", 16.0), 0.0);
    assert!(painter.missing_codepoints("Shop Now 20%").is_empty());
}

#[test]
fn truetype_glyphs_sit_on_the_baseline() {
    let mut painter =
        FontduePainter::from_bytes(FAMILY, fixture_bytes()).expect("font should parse");
    let mut pixmap = Pixmap::new(200, 80).expect("pixmap");
    let baseline = 50.0;
    painter
        .draw_line(
            &mut pixmap,
            "HILT",
            10.0,
            baseline,
            24.0,
            adpreview::color::Rgba8::BLACK,
        )
        .expect("draw should succeed");

    let lit_rows: Vec<u32> = (0..80)
        .filter(|&y| (0..200).any(|x| pixmap.pixel(x, y).expect("pixel").alpha() > 0))
        .collect();
    let first = *lit_rows.first().expect("glyphs should be drawn");
    let last = *lit_rows.last().expect("glyphs should be drawn");
    assert!(last <= baseline as u32, "flat-bottomed capitals end at the baseline, got {last}");
    assert!(first < baseline as u32 - 10, "capitals rise well above the baseline, got {first}");
}

#[test]
fn truetype_wrapped_lines_fit_their_region() {
    let mut renderer = AdPreviewRenderer::with_fonts(
        RenderFeatures::for_profile(RenderProfile::RealTimeCustomization),
        registry(),
    );
    let outcome = renderer.plan(
        600,
        400,
        &long_copy(),
        &branded(),
        &ContentVariationSelector::default(),
    );

    assert_eq!(outcome.font_family, FAMILY);
    for (placed, region) in [
        (&outcome.headline, &outcome.layout.headline),
        (&outcome.description, &outcome.layout.description),
    ] {
        assert!(placed.lines.len() > 1, "long copy should wrap");
        for line in &placed.lines {
            assert!(
                line.width <= region.max_width || !line.text.contains(' '),
                "'{}' measures {} over {}",
                line.text,
                line.width,
                region.max_width
            );
        }
    }
}

#[test]
fn truetype_renders_are_byte_identical() {
    let selector = ContentVariationSelector::default();
    let features = RenderFeatures::for_profile(RenderProfile::RealTimeCustomization);

    let mut renderer = AdPreviewRenderer::with_fonts(features, registry());
    let mut first = RenderSurface::new(600, 400).expect("surface");
    renderer
        .render(&mut first, &long_copy(), &branded(), &selector)
        .expect("render");
    // Second pass hits the warm glyph cache.
    let mut second = RenderSurface::new(600, 400).expect("surface");
    renderer
        .render(&mut second, &long_copy(), &branded(), &selector)
        .expect("render");

    let mut cold = AdPreviewRenderer::with_fonts(features, registry());
    let mut third = RenderSurface::new(600, 400).expect("surface");
    cold.render(&mut third, &long_copy(), &branded(), &selector)
        .expect("render");

    assert_eq!(first.to_rgba8(), second.to_rgba8());
    assert_eq!(first.to_rgba8(), third.to_rgba8());

    let mut pixel = RenderSurface::new(600, 400).expect("surface");
    AdPreviewRenderer::new(features)
        .render(
            &mut pixel,
            &long_copy(),
            &VisualCustomization {
                shadow_depth: 3.0,
                ..VisualCustomization::default()
            },
            &selector,
        )
        .expect("render");
    assert_ne!(first.to_rgba8(), pixel.to_rgba8(), "the loaded family should be used");
}
