// src/unpack/ledgers.rs

//! Destination ledger updates for a restored module

use crate::error::{Result, ResultExt};
use crate::fs::{self, WriteFs};
use crate::manifest::{GO_MOD, checksums, modules_txt};
use crate::toolchain::{GoVersion, Toolchain};
use std::path::Path;
use tracing::info;

/// Merge `module@version` into the directory listing at `listing`
///
/// The listing and its parent directory are created when missing.
pub fn merge_listing(dest: &dyn WriteFs, listing: &Path, module: &str, version: &str) -> Result<()> {
    let existing = match fs::read_file(dest, listing) {
        Ok(data) => String::from_utf8_lossy(&data).into_owned(),
        Err(e) if e.is_not_found() => {
            if let Some(parent) = listing.parent().filter(|p| !p.as_os_str().is_empty()) {
                dest.mkdir_all(parent, 0o755)?;
            }
            String::new()
        }
        Err(e) => return Err(e),
    };
    let merged = modules_txt::merge_module(&existing, module, version);
    fs::write_file(dest, listing, merged.as_bytes())
        .with_context(|| format!("updating {}", listing.display()))
}

/// Record a freshly materialized module in all three ledgers
pub fn record_module(
    toolchain: &dyn Toolchain,
    dest: &dyn WriteFs,
    dir: &Path,
    listing: &Path,
    module: &str,
    version: &str,
    sums: &[String],
) -> Result<()> {
    toolchain
        .require(dir, module, version)
        .with_context(|| format!("requiring {}@{}", module, version))?;
    checksums::append_lines(dest, &dir.join(crate::manifest::GO_SUM), sums)
        .context("updating go.sum")?;
    merge_listing(dest, listing, module, version)?;
    info!("Module added: {} {}", module, version);
    Ok(())
}

/// Minimal `go.mod` that cuts transitive resolution below a staged module
pub fn synthetic_go_mod(module: &str, go: &GoVersion) -> String {
    format!("module {}\n\ngo {}\n", module, go.directive())
}

/// Write [`synthetic_go_mod`] into `module_dir`, replacing any existing one
pub fn write_synthetic_go_mod(
    dest: &dyn WriteFs,
    module_dir: &Path,
    module: &str,
    go: &GoVersion,
) -> Result<()> {
    dest.mkdir_all(module_dir, 0o755)?;
    fs::write_file(
        dest,
        &module_dir.join(GO_MOD),
        synthetic_go_mod(module, go).as_bytes(),
    )
    .with_context(|| format!("writing go.mod for staged module {}", module))
}
