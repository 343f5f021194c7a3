// src/toolchain/mod.rs

//! Build toolchain collaborator
//!
//! Pack and unpack never resolve dependencies themselves. Package
//! enumeration, `go.mod` inspection and `go.mod` edits are delegated to a
//! [`Toolchain`], whose output is taken as ground truth. [`GoToolchain`] is
//! the real implementation; tests substitute a recording fake.

mod go;
mod model;
mod version;

pub use go::GoToolchain;
pub use model::{GoMod, ModPath, ModuleInfo, ModuleVersion, PackageInfo, Replace, Require, Retract};
pub use version::GoVersion;

use crate::error::Result;
use std::path::Path;

pub trait Toolchain {
    /// `go mod tidy` in `dir`
    fn mod_tidy(&self, dir: &Path) -> Result<()>;

    /// `go mod vendor` in `dir`
    fn mod_vendor(&self, dir: &Path) -> Result<()>;

    /// Full transitive package list of the module in `dir`
    fn list_packages(&self, dir: &Path) -> Result<Vec<PackageInfo>>;

    /// Parsed `go.mod` of `dir`
    fn read_go_mod(&self, dir: &Path) -> Result<GoMod>;

    /// Set or insert a requirement in `dir/go.mod`
    fn require(&self, dir: &Path, module: &str, version: &str) -> Result<()>;

    /// Redirect `module` to a local directory in `dir/go.mod`
    fn replace(&self, dir: &Path, module: &str, target: &Path) -> Result<()>;

    fn go_version(&self) -> Result<GoVersion>;
}
