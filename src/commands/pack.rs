// src/commands/pack.rs

//! Pack command - embed a module's vendor tree into generated Go source

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use vendpack::{CodeTarget, GoToolchain, PackOptions, Packer};

/// Pack `dir` and write `output` (plus an optional raw data file)
pub fn cmd_pack(
    dir: &Path,
    pkg: &str,
    var_name: &str,
    output: &Path,
    data_file: Option<&Path>,
    opts: &PackOptions,
) -> Result<()> {
    info!("Packing {}", dir.display());

    let toolchain = GoToolchain::locate()?;
    let target = CodeTarget {
        package: pkg,
        var_name,
        output_file: output,
        data_file,
    };
    Packer::new(&toolchain)
        .pack_to_code(dir, &target, opts)
        .with_context(|| format!("packing {}", dir.display()))?;

    println!("Generated {}", output.display());
    if let Some(data_file) = data_file {
        println!("Archive data written to {}", data_file.display());
    }
    if !opts.whitelist.is_empty() {
        println!("Modules packed: {}", opts.whitelist.len());
    }
    Ok(())
}
