use std::process::Command;

// Short git hash for `adpreview --version`; "unknown" outside a checkout.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    let hash = git_short_hash().unwrap_or_else(|| "unknown".to_owned());
    println!("cargo:rustc-env=ADPREVIEW_GIT_HASH={hash}");
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_owned())
}
