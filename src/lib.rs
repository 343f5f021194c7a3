// src/lib.rs

//! vendpack
//!
//! Packs a Go module's vendored dependencies and manifests into a single
//! gzip-compressed, base64-encoded archive that can be embedded in generated
//! source, and restores selected modules from such an archive into another
//! module without running dependency resolution there.
//!
//! # Architecture
//!
//! - [`fs`]: read-only and read-write filesystem contracts with disk and
//!   in-memory implementations
//! - [`archive`]: tar+gzip codec and the archive-backed read-only tree
//! - [`manifest`]: `go.mod.versions`, `go.sum`, `vendor/modules.txt`, the
//!   whitelist and the `go.list.json` summary record
//! - [`toolchain`]: the `go` command collaborator
//! - [`pack`] / [`unpack`]: the two engines

pub mod archive;
mod error;
pub mod fs;
pub mod manifest;
pub mod pack;
pub mod toolchain;
pub mod unpack;

pub use archive::{ArchiveFs, ArchiveWriter, TreeOptions};
pub use error::{Error, Result, ResultExt};
pub use fs::{DirEntry, DiskFs, FileInfo, MemFs, ReadFs, WriteFs};
pub use manifest::{
    ChecksumLedger, PackSummary, RequirementLedger, SummaryModule, Whitelist, read_summary,
};
pub use pack::{CodeTarget, PackOptions, Packer, module_checksums, pack_module};
pub use toolchain::{GoMod, GoToolchain, GoVersion, ModuleInfo, PackageInfo, Toolchain};
pub use unpack::{UnpackOptions, UnpackReport, Unpacker};
