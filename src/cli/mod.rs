// src/cli/mod.rs
//! CLI definitions for vendpack
//!
//! Only argument parsing lives here; the handlers are in the `commands`
//! module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vendpack")]
#[command(version)]
#[command(about = "Pack vendored Go modules into an embeddable archive and restore them elsewhere", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a module's vendor tree into a generated Go source file
    Pack {
        /// Go module directory to pack
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Package clause of the generated file
        #[arg(long)]
        pkg: String,

        /// Name of the string variable holding the archive
        #[arg(long = "var")]
        var_name: String,

        /// Generated Go source file
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the raw base64 archive to this file
        #[arg(long)]
        output_data_file: Option<PathBuf>,

        /// Run `go mod tidy` before packing
        #[arg(long)]
        run_go_mod_tidy: bool,

        /// Run `go mod vendor` before packing
        #[arg(long)]
        run_go_mod_vendor: bool,

        /// Only pack these modules (comma separated)
        #[arg(long, value_delimiter = ',')]
        module_whitelist: Vec<String>,

        /// Delete non-whitelisted modules from the source vendor tree
        #[arg(long, requires = "module_whitelist")]
        rm_non_whitelist_vendors: bool,

        /// Keep file modification times instead of clearing them
        #[arg(long)]
        keep_timestamps: bool,
    },

    /// Restore a packed archive into a Go module
    Unpack {
        /// Destination Go module directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// File holding the base64 archive
        #[arg(short, long)]
        input_data_file: PathBuf,

        /// Restore files only; leave go.mod, go.sum and modules.txt alone
        #[arg(long)]
        ignore_sums: bool,

        /// Replace already present packages of every module
        #[arg(long)]
        force_upgrade_all: bool,

        /// Replace already present packages of this module (repeatable)
        #[arg(long = "force-upgrade", value_name = "MODULE")]
        force_upgrade: Vec<String>,

        /// Allow this module to have no go.sum entry (repeatable)
        #[arg(long = "optional-sum", value_name = "MODULE")]
        optional_sum: Vec<String>,

        /// Staging directory used when the destination has no vendor directory
        #[arg(long)]
        non_vendor_host_dir: Option<PathBuf>,
    },

    /// Print the vendpack and Go toolchain versions
    Version,
}
