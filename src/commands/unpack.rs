// src/commands/unpack.rs

//! Unpack command - restore an archive into a Go module

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use vendpack::{DiskFs, GoToolchain, Toolchain, UnpackOptions, Unpacker};

/// Restore the base64 archive in `input` into `dir`
pub fn cmd_unpack(dir: &Path, input: &Path, opts: &UnpackOptions) -> Result<()> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("destination {} does not exist", dir.display()))?;
    let text = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let toolchain = GoToolchain::locate()?;
    let go_version = toolchain.go_version().context("probing go version")?;
    info!("Using {} for staged modules", go_version);

    let report = Unpacker::new(&toolchain, go_version)
        .unpack_base64(&text, &DiskFs::default(), &dir, opts)
        .with_context(|| format!("unpacking into {}", dir.display()))?;

    for module in &report.materialized {
        println!("  [added] {}", module);
    }
    for module in &report.untouched {
        println!("  [kept]  {}", module);
    }
    if let Some(host) = &report.host_dir {
        println!("Modules staged under {}", host.display());
    }
    println!(
        "Unpacked {} modules ({} already present)",
        report.materialized.len(),
        report.untouched.len()
    );
    Ok(())
}
