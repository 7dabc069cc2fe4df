use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

const SALE: &str = r##"
id: sale-1
preview: desktop
content:
  headline: Save Today
  description: Get 20% off
  call_to_action: Shop Now
customization:
  accentColor: "#007bff"
  shadowDepth: 3
"##;

fn write_document(path: &Path, yaml: &str) {
    fs::write(path, yaml).expect("document should write");
}

fn run_adpreview(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_adpreview"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("adpreview command should run")
}

fn stderr_envelope(output: &std::process::Output) -> Value {
    let stderr = String::from_utf8_lossy(&output.stderr);
    serde_json::from_str(stderr.trim()).expect("stderr should be envelope json")
}

#[test]
fn check_reports_preview_and_profile() {
    let dir = tempdir().expect("tempdir should create");
    write_document(&dir.path().join("sale.ad.yaml"), SALE);

    let output = run_adpreview(dir.path(), &["check", "sale.ad.yaml"]);
    assert!(output.status.success(), "check should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("OK: sale.ad.yaml"), "{stdout}");
    assert!(stdout.contains("desktop 600x400"), "{stdout}");
    assert!(stdout.contains("real_time_customization"), "{stdout}");
    assert!(stdout.contains("Fonts: pixel"), "{stdout}");
}

#[test]
fn check_lists_registered_truetype_families() {
    let dir = tempdir().expect("tempdir should create");
    let font = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf");
    write_document(
        &dir.path().join("branded.ad.yaml"),
        &format!(
            "content: {{ headline: a, description: b, call_to_action: c }}\nfonts:\n  - family: Mono\n    path: {}\n",
            font.display()
        ),
    );

    let output = run_adpreview(dir.path(), &["check", "branded.ad.yaml"]);
    assert!(output.status.success(), "check should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Fonts: pixel, Mono"), "{stdout}");
}

#[test]
fn render_json_writes_customized_png_into_out_dir() {
    let dir = tempdir().expect("tempdir should create");
    write_document(&dir.path().join("sale.ad.yaml"), SALE);

    let output = run_adpreview(
        dir.path(),
        &["render", "sale.ad.yaml", "--out-dir", "out", "--json"],
    );
    assert!(output.status.success(), "render should succeed");

    let parsed: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(parsed["ok"], Value::Bool(true));
    assert_eq!(parsed["width"], Value::from(600));
    assert_eq!(parsed["height"], Value::from(400));
    assert_eq!(parsed["data_uri"], Value::Null);

    let png = dir.path().join("out/customized-ad-sale-1.png");
    assert!(png.is_file(), "customized export should exist");
    let bytes = fs::read(&png).expect("png should read");
    assert_eq!(parsed["export"]["bytes"], Value::from(bytes.len()));
    assert_eq!(
        parsed["export"]["sha256"].as_str().map(str::len),
        Some(64)
    );
}

#[test]
fn render_with_generator_profile_uses_plain_file_name() {
    let dir = tempdir().expect("tempdir should create");
    write_document(&dir.path().join("sale.ad.yaml"), SALE);

    let output = run_adpreview(
        dir.path(),
        &[
            "render",
            "sale.ad.yaml",
            "--profile",
            "ad_generator",
            "--preview",
            "mobile",
            "--cta-variation",
            "1",
            "--json",
        ],
    );
    assert!(output.status.success(), "render should succeed");
    let parsed: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(parsed["width"], Value::from(320));
    assert_eq!(
        parsed["content"]["call_to_action"],
        Value::String("Shop Now Now".to_owned())
    );
    assert!(dir.path().join("ad-sale-1.png").is_file());
}

#[test]
fn render_data_uri_without_out_dir_skips_the_file() {
    let dir = tempdir().expect("tempdir should create");
    write_document(&dir.path().join("sale.ad.yaml"), SALE);

    let output = run_adpreview(dir.path(), &["render", "sale.ad.yaml", "--data-uri"]);
    assert!(output.status.success(), "render should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().starts_with("data:image/png;base64,"));
    assert!(!dir.path().join("customized-ad-sale-1.png").exists());
}

#[test]
fn invalid_preview_emits_typed_error_envelope() {
    let dir = tempdir().expect("tempdir should create");
    write_document(&dir.path().join("sale.ad.yaml"), SALE);

    let output = run_adpreview(
        dir.path(),
        &["render", "sale.ad.yaml", "--preview", "watch"],
    );
    assert_eq!(output.status.code(), Some(2));

    let parsed = stderr_envelope(&output);
    assert_eq!(parsed["ok"], Value::Bool(false));
    assert_eq!(
        parsed["error"]["code"],
        Value::String("INVALID_PREVIEW_MODE".to_owned())
    );
}

#[test]
fn pdf_export_is_reported_as_unsupported() {
    let dir = tempdir().expect("tempdir should create");
    write_document(&dir.path().join("sale.ad.yaml"), SALE);

    let output = run_adpreview(
        dir.path(),
        &["render", "sale.ad.yaml", "--format", "pdf"],
    );
    assert_eq!(output.status.code(), Some(2));
    let parsed = stderr_envelope(&output);
    assert_eq!(
        parsed["error"]["code"],
        Value::String("EXPORT_FORMAT_UNSUPPORTED".to_owned())
    );
    assert!(fs::read_dir(dir.path())
        .expect("dir should list")
        .all(|entry| !entry
            .expect("entry")
            .file_name()
            .to_string_lossy()
            .ends_with(".png")));
}

#[test]
fn malformed_document_emits_invalid_ad_document() {
    let dir = tempdir().expect("tempdir should create");
    write_document(
        &dir.path().join("bad.ad.yaml"),
        "content: { headline: a, description: b, call_to_action: c }\nsparkles: true\n",
    );

    let output = run_adpreview(dir.path(), &["check", "bad.ad.yaml"]);
    assert_eq!(output.status.code(), Some(2));
    let parsed = stderr_envelope(&output);
    assert_eq!(
        parsed["error"]["code"],
        Value::String("INVALID_AD_DOCUMENT".to_owned())
    );
}

#[test]
fn layout_json_lists_regions() {
    let dir = tempdir().expect("tempdir should create");
    write_document(&dir.path().join("sale.ad.yaml"), SALE);

    let output = run_adpreview(dir.path(), &["layout", "sale.ad.yaml", "--json"]);
    assert!(output.status.success(), "layout should succeed");
    let parsed: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(parsed["layout"]["cta"]["y"], Value::from(340.0));
    assert_eq!(parsed["headline"]["lines"][0]["baseline"], Value::from(44.0));
    assert_eq!(parsed["font_family"], Value::String("pixel".to_owned()));
}

#[test]
fn variants_prints_requested_number_of_variations() {
    let dir = tempdir().expect("tempdir should create");
    write_document(&dir.path().join("sale.ad.yaml"), SALE);

    let output = run_adpreview(dir.path(), &["variants", "sale.ad.yaml", "--count", "7"]);
    assert!(output.status.success(), "variants should succeed");
    let parsed: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(parsed["variations"].as_array().map(Vec::len), Some(7));
    assert_eq!(parsed["pools"]["headline"].as_array().map(Vec::len), Some(3));
}

#[test]
fn generate_prints_yaml_content_and_rejects_unknown_objective() {
    let dir = tempdir().expect("tempdir should create");

    let output = run_adpreview(
        dir.path(),
        &[
            "generate",
            "--product",
            "Aurora Lamp",
            "--description",
            "Warm light.",
            "--objective",
            "awareness",
            "--seed",
            "0",
        ],
    );
    assert!(output.status.success(), "generate should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("headline: Discover Aurora Lamp"), "{stdout}");
    assert!(stdout.contains("call_to_action: Find Out How"), "{stdout}");

    let output = run_adpreview(
        dir.path(),
        &["generate", "--product", "Lamp", "--objective", "virality"],
    );
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(
        stderr_envelope(&output)["error"]["code"],
        Value::String("INVALID_OBJECTIVE".to_owned())
    );
}
