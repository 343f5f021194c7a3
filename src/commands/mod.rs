// src/commands/mod.rs
//! Command handlers for the vendpack CLI

mod pack;
mod unpack;

pub use pack::cmd_pack;
pub use unpack::cmd_unpack;

use anyhow::Result;
use vendpack::{GoToolchain, Toolchain};

/// Print the vendpack version and, when available, the Go toolchain version
pub fn cmd_version() -> Result<()> {
    println!("vendpack {}", env!("CARGO_PKG_VERSION"));
    match GoToolchain::locate().and_then(|go| go.go_version()) {
        Ok(version) => println!("{} {}/{}", version, version.os, version.arch),
        Err(e) => println!("go: unavailable ({})", e),
    }
    Ok(())
}
