// src/manifest/mod.rs

//! Dependency ledgers and the pack summary record
//!
//! Three coupled text ledgers travel inside every archive and are patched in
//! the destination on unpack:
//!
//! - the requirement ledger (`go.mod.versions` in the archive, `go.mod` in the
//!   destination, edited through the toolchain),
//! - the checksum ledger (`go.sum`), append-only,
//! - the directory listing ledger (`vendor/modules.txt`), patched line by line.

pub mod checksums;
pub mod modules_txt;
pub mod requirements;
pub mod summary;
pub mod whitelist;

pub use checksums::ChecksumLedger;
pub use requirements::RequirementLedger;
pub use summary::{PackSummary, PackageRef, SummaryModule, read_summary};
pub use whitelist::Whitelist;

pub const GO_MOD: &str = "go.mod";
pub const GO_SUM: &str = "go.sum";
pub const VENDOR_DIR: &str = "vendor";
pub const MODULES_TXT: &str = "vendor/modules.txt";
pub const SUMMARY_FILE: &str = "go.list.json";
pub const WHITELIST_FILE: &str = "go.mod.whitelist";
pub const VERSIONS_FILE: &str = "go.mod.versions";
