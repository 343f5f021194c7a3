// src/unpack/mod.rs

//! Unpack engine
//!
//! Restores the modules of an archive into a destination Go module. When the
//! destination has a `vendor` directory the modules land there. Otherwise
//! they are staged under a host directory and `go.mod` gets a `replace`
//! directive per module pointing at the staged copy.

mod copy;
mod ledgers;

pub use copy::{CopyStats, copy_dir};
pub use ledgers::{merge_listing, synthetic_go_mod};

use crate::archive::ArchiveFs;
use crate::error::{Error, Result, ResultExt};
use crate::fs::{self, ReadFs, WriteFs};
use crate::manifest::{
    ChecksumLedger, GO_SUM, MODULES_TXT, RequirementLedger, VENDOR_DIR, VERSIONS_FILE,
    WHITELIST_FILE, Whitelist,
};
use crate::toolchain::{GoVersion, Toolchain};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for [`Unpacker::unpack`]
#[derive(Debug, Clone, Default)]
pub struct UnpackOptions {
    /// Staging host for destinations without a `vendor` directory;
    /// a fresh temporary directory is used when unset
    pub non_vendor_host_dir: Option<PathBuf>,
    pub force_upgrade_all: bool,
    pub force_upgrade_modules: HashSet<String>,
    /// Per module, package sub-paths (relative to the module root, `""` for
    /// the root) whose files are replaced even when present
    pub force_upgrade_module_pkgs: HashMap<String, HashSet<String>>,
    /// Restore files without touching go.mod, go.sum or modules.txt
    pub ignore_sums: bool,
    /// Modules allowed to have no go.sum entry (e.g. locally replaced)
    pub optional_sum_modules: HashSet<String>,
}

impl UnpackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_non_vendor_host_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.non_vendor_host_dir = Some(dir.into());
        self
    }

    pub fn with_force_upgrade_all(mut self, force: bool) -> Self {
        self.force_upgrade_all = force;
        self
    }

    pub fn with_force_upgrade_module(mut self, module: impl Into<String>) -> Self {
        self.force_upgrade_modules.insert(module.into());
        self
    }

    pub fn with_force_upgrade_package(
        mut self,
        module: impl Into<String>,
        sub_path: impl Into<String>,
    ) -> Self {
        self.force_upgrade_module_pkgs
            .entry(module.into())
            .or_default()
            .insert(sub_path.into());
        self
    }

    pub fn with_ignore_sums(mut self, ignore: bool) -> Self {
        self.ignore_sums = ignore;
        self
    }

    pub fn with_optional_sum_module(mut self, module: impl Into<String>) -> Self {
        self.optional_sum_modules.insert(module.into());
        self
    }

    fn should_override(&self, module: &str, sub_path: &str) -> bool {
        self.force_upgrade_all
            || self.force_upgrade_modules.contains(module)
            || self
                .force_upgrade_module_pkgs
                .get(module)
                .is_some_and(|pkgs| pkgs.contains(sub_path))
    }
}

/// What an unpack did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackReport {
    /// Modules with at least one package directory written
    pub materialized: Vec<String>,
    /// Modules whose package directories all existed and were kept
    pub untouched: Vec<String>,
    /// Staging host used when the destination has no `vendor` directory
    pub host_dir: Option<PathBuf>,
}

fn read_required(archive: &dyn ReadFs, name: &str) -> Result<String> {
    match archive.read_file(name) {
        Ok(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
        Err(e) if e.is_not_found() => Err(Error::Precondition(format!("archive has no {}", name))),
        Err(e) => Err(e.context(format!("reading {} from archive", name))),
    }
}

fn read_optional(archive: &dyn ReadFs, name: &str) -> Result<String> {
    match archive.read_file(name) {
        Ok(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
        Err(e) if e.is_not_found() => Ok(String::new()),
        Err(e) => Err(e.context(format!("reading {} from archive", name))),
    }
}

/// Restores archives into a destination module
pub struct Unpacker<'a> {
    toolchain: &'a dyn Toolchain,
    go_version: GoVersion,
}

impl<'a> Unpacker<'a> {
    /// `go_version` is written into the `go.mod` of staged modules
    pub fn new(toolchain: &'a dyn Toolchain, go_version: GoVersion) -> Self {
        Self {
            toolchain,
            go_version,
        }
    }

    /// Decode base64 archive text and unpack it
    pub fn unpack_base64(
        &self,
        text: &str,
        dest: &dyn WriteFs,
        dir: &Path,
        opts: &UnpackOptions,
    ) -> Result<UnpackReport> {
        let archive = ArchiveFs::from_base64(text)?;
        self.unpack(&archive, dest, dir, opts)
    }

    /// Restore `archive` into the Go module at `dir` on `dest`
    pub fn unpack(
        &self,
        archive: &dyn ReadFs,
        dest: &dyn WriteFs,
        dir: &Path,
        opts: &UnpackOptions,
    ) -> Result<UnpackReport> {
        let versions = RequirementLedger::parse(&read_required(archive, VERSIONS_FILE)?);
        let whitelist = Whitelist::parse(&read_optional(archive, WHITELIST_FILE)?);
        let sums = ChecksumLedger::parse(&read_required(archive, GO_SUM)?);

        let vendored = fs::is_dir(dest, &dir.join(VENDOR_DIR))?;
        let host_dir = if vendored {
            None
        } else {
            Some(self.host_dir(dest, opts)?)
        };
        let target_root = host_dir.as_deref().unwrap_or(dir);
        let listing = target_root.join(MODULES_TXT);

        let mut report = UnpackReport {
            host_dir: host_dir.clone(),
            ..Default::default()
        };

        for (module, version) in versions.iter() {
            if !whitelist.allows(module) || version.is_empty() {
                continue;
            }

            let module_sums = sums.lines_for(module);
            if module_sums.is_empty() && !opts.optional_sum_modules.contains(module) {
                return Err(Error::Consistency(format!(
                    "module {} does not appear in go.sum; if it is replaced, mark it as an optional-sum module",
                    module
                )));
            }

            let module_dir = target_root.join(VENDOR_DIR).join(module);
            let nested = versions.nested_in(module);
            let stats = copy_dir(
                archive,
                &format!("{}/{}", VENDOR_DIR, module),
                dest,
                &module_dir,
                &|sub_path| opts.should_override(module, sub_path),
                &|sub_path| nested.contains(&sub_path),
            )
            .with_context(|| format!("unpacking {}", module))?;
            debug!("{}: {:?}", module, stats);

            if stats.changed() {
                if !opts.ignore_sums {
                    ledgers::record_module(
                        self.toolchain,
                        dest,
                        dir,
                        &listing,
                        module,
                        version,
                        &module_sums,
                    )
                    .with_context(|| format!("unpacking {}", module))?;
                }
                report.materialized.push(module.to_string());
            } else {
                report.untouched.push(module.to_string());
            }

            if host_dir.is_some() {
                self.toolchain
                    .replace(dir, module, &module_dir)
                    .with_context(|| format!("replacing non-vendor module {}", module))?;
                ledgers::write_synthetic_go_mod(dest, &module_dir, module, &self.go_version)?;
            }
        }

        info!(
            "Unpacked into {}: {} modules written, {} kept",
            dir.display(),
            report.materialized.len(),
            report.untouched.len()
        );
        Ok(report)
    }

    /// The configured staging host, or a fresh directory in `dest`'s own
    /// temporary area
    fn host_dir(&self, dest: &dyn WriteFs, opts: &UnpackOptions) -> Result<PathBuf> {
        if let Some(dir) = &opts.non_vendor_host_dir {
            return Ok(dir.clone());
        }
        let dir = dest
            .make_temp_dir("vendor")
            .context("creating non-vendor host dir")?;
        info!("Created temporary non-vendor host dir: {}", dir.display());
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_override() {
        let opts = UnpackOptions::new()
            .with_force_upgrade_module("a")
            .with_force_upgrade_package("b", "sub/pkg");
        assert!(opts.should_override("a", ""));
        assert!(opts.should_override("a", "x"));
        assert!(opts.should_override("b", "sub/pkg"));
        assert!(!opts.should_override("b", ""));
        assert!(!opts.should_override("c", ""));

        let all = UnpackOptions::new().with_force_upgrade_all(true);
        assert!(all.should_override("anything", "any"));
    }

    #[test]
    fn test_temporary_host_dir_stays_in_destination_tree() {
        let go = crate::toolchain::GoToolchain::with_binary("go");
        let unpacker = Unpacker::new(&go, GoVersion::new(1, 21, 0));
        let dest = crate::fs::MemFs::new();

        let host = unpacker.host_dir(&dest, &UnpackOptions::new()).unwrap();
        assert_eq!(host, PathBuf::from("/tmp/vendor0"));
        assert!(fs::is_dir(&dest, &host).unwrap());
        let next = unpacker.host_dir(&dest, &UnpackOptions::new()).unwrap();
        assert_eq!(next, PathBuf::from("/tmp/vendor1"));

        let given = unpacker
            .host_dir(&dest, &UnpackOptions::new().with_non_vendor_host_dir("/staging"))
            .unwrap();
        assert_eq!(given, PathBuf::from("/staging"));
    }

    #[test]
    fn test_read_required_maps_missing_to_precondition() {
        let archive = crate::fs::MemFs::new();
        let err = read_required(&archive, VERSIONS_FILE).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert_eq!(read_optional(&archive, WHITELIST_FILE).unwrap(), "");
    }
}
