// src/pack/mod.rs

//! Pack engine
//!
//! Turns a Go module with a `vendor` tree into one compressed archive:
//!
//! 1. optional `go mod tidy` / `go mod vendor`
//! 2. package enumeration through the [`Toolchain`]
//! 3. `go.mod.versions` and, in whitelist mode, `go.mod.whitelist`
//! 4. archive body written through an MD5 accumulator
//! 5. summary record (`go.list.json`), reused verbatim when the digest is
//!    unchanged, appended as the last entry
//! 6. base64 text, optionally rendered as Go source

mod prune;

pub use prune::prune_vendor;

use crate::archive::{self, ArchiveWriter, TreeOptions, encode_base64};
use crate::error::{Error, Result, ResultExt};
use crate::manifest::summary::group_packages;
use crate::manifest::{
    MODULES_TXT, PackSummary, RequirementLedger, SUMMARY_FILE, VENDOR_DIR, VERSIONS_FILE,
    WHITELIST_FILE, Whitelist, checksums, modules_txt,
};
use crate::toolchain::{PackageInfo, Toolchain};
use chrono::Utc;
use flate2::{Compression, write::GzEncoder};
use md5::{Digest, Md5};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Options for [`Packer::pack`]
#[derive(Debug, Clone)]
pub struct PackOptions {
    pub run_mod_tidy: bool,
    pub run_mod_vendor: bool,
    pub whitelist: Whitelist,
    /// Physically delete non-whitelisted modules from the source vendor tree
    pub remove_non_whitelisted: bool,
    pub clear_timestamps: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            run_mod_tidy: false,
            run_mod_vendor: false,
            whitelist: Whitelist::default(),
            remove_non_whitelisted: false,
            clear_timestamps: true,
        }
    }
}

impl PackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mod_tidy(mut self, run: bool) -> Self {
        self.run_mod_tidy = run;
        self
    }

    pub fn with_mod_vendor(mut self, run: bool) -> Self {
        self.run_mod_vendor = run;
        self
    }

    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn with_remove_non_whitelisted(mut self, remove: bool) -> Self {
        self.remove_non_whitelisted = remove;
        self
    }

    pub fn with_clear_timestamps(mut self, clear: bool) -> Self {
        self.clear_timestamps = clear;
        self
    }
}

/// Where [`Packer::pack_to_code`] writes its output
#[derive(Debug, Clone)]
pub struct CodeTarget<'a> {
    /// Go package clause of the generated file
    pub package: &'a str,
    /// Name of the string variable holding the archive
    pub var_name: &'a str,
    pub output_file: &'a Path,
    /// Optional raw copy of the base64 text
    pub data_file: Option<&'a Path>,
}

/// Write fan-out: every byte goes to `inner` and into an MD5 accumulator
struct DigestWriter<W> {
    inner: W,
    hasher: Md5,
}

impl<W: Write> DigestWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Md5::new(),
        }
    }

    /// Lowercase hex digest of everything written so far
    fn hex_digest(&self) -> String {
        hex::encode(self.hasher.clone().finalize())
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Check every non-standard package is attributed to a module
fn check_attribution(packages: &[PackageInfo]) -> Result<()> {
    for pkg in packages.iter().filter(|p| !p.standard) {
        if pkg.module.as_ref().is_none_or(|m| m.path.is_empty()) {
            return Err(Error::Consistency(format!(
                "package {} is not part of any module",
                pkg.import_path
            )));
        }
    }
    Ok(())
}

/// Write `data` to `path` through a temporary file in the same directory
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temporary file next to {}", path.display()))?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| Error::Io(e.error))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Render the generated Go source embedding `data`
pub fn render_code(package: &str, var_name: &str, data: &str) -> String {
    format!(
        "// Code generated by vendpack. DO NOT EDIT.\npackage {}\n\nvar {} = \"{}\"\n",
        package, var_name, data
    )
}

/// Drives a pack against a [`Toolchain`]
pub struct Packer<'a> {
    toolchain: &'a dyn Toolchain,
}

impl<'a> Packer<'a> {
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        Self { toolchain }
    }

    /// Pack `dir` and return the compressed archive bytes
    pub fn pack(&self, dir: &Path, opts: &PackOptions) -> Result<Vec<u8>> {
        if dir.as_os_str().is_empty() {
            return Err(Error::Precondition("pack requires a source directory".to_string()));
        }

        if opts.run_mod_tidy {
            info!("Running go mod tidy in {}", dir.display());
            self.toolchain.mod_tidy(dir)?;
        }
        if opts.run_mod_vendor {
            info!("Running go mod vendor in {}", dir.display());
            self.toolchain.mod_vendor(dir)?;
        }

        let packages = self
            .toolchain
            .list_packages(dir)
            .context("listing packages")?;
        check_attribution(&packages)?;
        let mut modules = group_packages(&packages);

        let versions: RequirementLedger = modules
            .iter()
            .map(|m| (m.module.path.as_str(), m.module.version.as_str()))
            .collect();
        fs::write(dir.join(VERSIONS_FILE), versions.render())
            .with_context(|| format!("writing {}", VERSIONS_FILE))?;

        let go_mod = self.toolchain.read_go_mod(dir).context("reading go.mod")?;

        let whitelist = &opts.whitelist;
        let whitelist_path = dir.join(WHITELIST_FILE);
        if whitelist.is_empty() {
            match fs::remove_file(&whitelist_path) {
                Ok(()) => debug!("Removed stale {}", WHITELIST_FILE),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e).context(format!("cleaning {}", WHITELIST_FILE))),
            }
        } else {
            if let Some(missing) = whitelist.iter().find(|w| !versions.contains(w)) {
                return Err(Error::Precondition(format!(
                    "whitelisted module does not exist: {}",
                    missing
                )));
            }
            modules.retain(|m| whitelist.contains(&m.module.path));
            fs::write(&whitelist_path, whitelist.render())
                .with_context(|| format!("writing {}", WHITELIST_FILE))?;
            if opts.remove_non_whitelisted {
                prune_vendor(dir, whitelist).context("removing non-whitelisted vendor modules")?;
            }
        }

        let mut writer = ArchiveWriter::new(DigestWriter::new(GzEncoder::new(
            Vec::new(),
            Compression::default(),
        )));
        self.append_sources(&mut writer, dir, &versions, opts)?;
        let digest = writer.get_mut().hex_digest();

        let summary_path = dir.join(SUMMARY_FILE);
        let previous = match fs::read(&summary_path) {
            Ok(data) => Some(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::Io(e).context(format!("reading {}", SUMMARY_FILE))),
        };
        let summary = match previous {
            Some(data) if PackSummary::digest_of(&data).as_deref() == Some(digest.as_str()) => {
                info!("Content digest {} unchanged, keeping {}", digest, SUMMARY_FILE);
                data
            }
            _ => {
                let data =
                    PackSummary::new(digest.as_str(), Some(go_mod), modules, Utc::now()).to_json()?;
                fs::write(&summary_path, &data)
                    .with_context(|| format!("writing {}", SUMMARY_FILE))?;
                info!("Wrote {} with digest {}", SUMMARY_FILE, digest);
                data
            }
        };
        writer.append_file(SUMMARY_FILE, 0o644, &summary)?;

        let data = writer
            .finish()?
            .into_inner()
            .finish()
            .context("finishing gzip stream")?;
        info!("Packed {} ({} bytes compressed)", dir.display(), data.len());
        Ok(data)
    }

    /// Everything except the summary record
    fn append_sources<W: Write>(
        &self,
        writer: &mut ArchiveWriter<W>,
        dir: &Path,
        versions: &RequirementLedger,
        opts: &PackOptions,
    ) -> Result<()> {
        let whitelist = &opts.whitelist;
        if whitelist.is_empty() {
            let tree = TreeOptions::new()
                .clear_timestamps(opts.clear_timestamps)
                .with_filter(|name, _| name != SUMMARY_FILE);
            return writer.append_tree(dir, &tree);
        }

        let tree = TreeOptions::new()
            .clear_timestamps(opts.clear_timestamps)
            .with_filter(|name, _| name != VENDOR_DIR && name != SUMMARY_FILE);
        writer.append_tree(dir, &tree)?;
        writer.append_dir(VENDOR_DIR, 0o755)?;

        match fs::read_to_string(dir.join(MODULES_TXT)) {
            Ok(listing) => {
                let filtered = modules_txt::retain_modules(&listing, |m| whitelist.contains(m));
                writer.append_file(MODULES_TXT, 0o644, filtered.as_bytes())?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e).context(format!("reading {}", MODULES_TXT))),
        }

        for module in whitelist.iter() {
            let prefix = format!("{}/{}", VENDOR_DIR, module);
            writer.append_parents(&prefix, 0o755)?;
            // Modules nested inside this one are archived only on their own
            let nested: HashSet<String> = versions
                .nested_in(module)
                .into_iter()
                .map(|rel| format!("{}/{}", prefix, rel))
                .collect();
            let tree = TreeOptions::new()
                .clear_timestamps(opts.clear_timestamps)
                .with_prefix(prefix.as_str())
                .with_filter(move |name, is_dir| !(is_dir && nested.contains(name)));
            writer
                .append_tree(&dir.join(VENDOR_DIR).join(module), &tree)
                .with_context(|| format!("archiving vendored module {}", module))?;
        }
        Ok(())
    }

    /// Pack `dir` and return the archive as base64 text
    pub fn pack_base64(&self, dir: &Path, opts: &PackOptions) -> Result<String> {
        Ok(encode_base64(&self.pack(dir, opts)?))
    }

    /// Pack `dir` into a generated Go source file (and optionally a raw data file)
    pub fn pack_to_code(&self, dir: &Path, target: &CodeTarget<'_>, opts: &PackOptions) -> Result<()> {
        if target.package.is_empty() {
            return Err(Error::Precondition("requires a Go package name".to_string()));
        }
        if target.var_name.is_empty() {
            return Err(Error::Precondition("requires a variable name".to_string()));
        }

        let data = self.pack_base64(dir, opts)?;
        if let Some(data_file) = target.data_file {
            write_atomic(data_file, data.as_bytes())?;
        }
        write_atomic(
            target.output_file,
            render_code(target.package, target.var_name, &data).as_bytes(),
        )?;
        info!("Generated {}", target.output_file.display());
        Ok(())
    }
}

/// Archive only `dir/vendor/<module>`, without ledgers
pub fn pack_module(dir: &Path, module: &str) -> Result<Vec<u8>> {
    if module.is_empty() {
        return Err(Error::Precondition("requires a module path".to_string()));
    }
    let src = dir.join(VENDOR_DIR).join(module);
    archive::serialize(&src, Vec::new(), &TreeOptions::new())
        .with_context(|| format!("packing vendored module {}", module))
}

/// Checksum ledger lines recorded for `module` in `dir/go.sum`
pub fn module_checksums(dir: &Path, module: &str) -> Result<Vec<String>> {
    if module.is_empty() {
        return Err(Error::Precondition("requires a module path".to_string()));
    }
    let content = fs::read_to_string(dir.join(crate::manifest::GO_SUM))
        .with_context(|| format!("reading go.sum in {}", dir.display()))?;
    Ok(checksums::module_lines(&content, module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::ModuleInfo;

    #[test]
    fn test_digest_writer_matches_one_shot_md5() {
        let mut writer = DigestWriter::new(Vec::new());
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        assert_eq!(writer.hex_digest(), hex::encode(Md5::digest(b"hello world")));
        assert_eq!(writer.hex_digest(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(writer.into_inner(), b"hello world");
    }

    #[test]
    fn test_unattributed_package_is_rejected() {
        let packages = vec![
            PackageInfo {
                import_path: "fmt".into(),
                standard: true,
                ..Default::default()
            },
            PackageInfo {
                import_path: "example.org/lib".into(),
                module: Some(ModuleInfo {
                    path: "example.org/lib".into(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ];
        check_attribution(&packages).unwrap();

        let orphan = PackageInfo {
            import_path: "example.org/orphan".into(),
            ..Default::default()
        };
        let err = check_attribution(&[orphan]).unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
    }

    #[test]
    fn test_render_code() {
        assert_eq!(
            render_code("embed", "VendorData", "SDRz"),
            "// Code generated by vendpack. DO NOT EDIT.\npackage embed\n\nvar VendorData = \"SDRz\"\n"
        );
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.go");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_module_checksums() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(
            temp.path().join("go.sum"),
            "a.org/x v1 h1:A=\na.org/x v1/go.mod h1:B=\na.org/xy v1 h1:C=\n",
        )
        .unwrap();
        assert_eq!(
            module_checksums(temp.path(), "a.org/x").unwrap(),
            vec!["a.org/x v1 h1:A=", "a.org/x v1/go.mod h1:B="]
        );
        assert!(module_checksums(temp.path(), "").is_err());
    }

    #[test]
    fn test_pack_module_archives_one_tree() {
        let temp = tempfile::tempdir().unwrap();
        let module_dir = temp.path().join("vendor/example.org/lib");
        fs::create_dir_all(&module_dir).unwrap();
        fs::write(module_dir.join("a.go"), "package lib").unwrap();

        let data = pack_module(temp.path(), "example.org/lib").unwrap();
        let archive = crate::archive::ArchiveFs::from_bytes(&data).unwrap();
        assert_eq!(archive.paths().collect::<Vec<_>>(), vec!["a.go"]);
    }
}
