//! Generates `version.rs` with the build identity logged at startup

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    let revision = protocol_revision(&manifest_dir.join("Cargo.toml"))?;
    let built = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let commit = git_commit().unwrap_or_else(|| "unknown".to_string());

    let generated = format!(
        "pub const PROTOCOL_REVISION: &str = {revision:?};\n\
         pub const BUILD_TIME: &str = \"{built}\";\n\
         pub const GIT_HASH: &str = {commit:?};\n"
    );
    std::fs::write(out_dir.join("version.rs"), generated)?;
    Ok(())
}

/// `[package.metadata] protocol_revision`; the build fails without it
fn protocol_revision(manifest: &Path) -> Result<String, Box<dyn Error>> {
    let manifest: toml::Table = std::fs::read_to_string(manifest)?.parse()?;
    manifest
        .get("package")
        .and_then(|package| package.get("metadata"))
        .and_then(|metadata| metadata.get("protocol_revision"))
        .and_then(|revision| revision.as_integer())
        .map(|revision| revision.to_string())
        .ok_or_else(|| "Cargo.toml lacks an integer [package.metadata] protocol_revision".into())
}

fn git_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let commit = String::from_utf8(output.stdout).ok()?;
    Some(commit.trim().to_string())
}
