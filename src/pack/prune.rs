// src/pack/prune.rs

//! Physical removal of non-whitelisted vendored modules
//!
//! The vendor tree is renamed into a staging directory inside the source
//! tree, an empty vendor directory is recreated and only whitelisted module
//! trees are moved back. On failure the staging directory is kept so the
//! original tree can be recovered by hand.

use crate::error::{Error, Result, ResultExt};
use crate::manifest::{VENDOR_DIR, Whitelist};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Keep only whitelisted modules (and `modules.txt`) under `dir/vendor`
pub fn prune_vendor(dir: &Path, whitelist: &Whitelist) -> Result<()> {
    let vendor = dir.join(VENDOR_DIR);
    if !vendor.is_dir() {
        return Err(Error::Precondition(format!(
            "cannot prune: {} is not a directory",
            vendor.display()
        )));
    }

    let staging = tempfile::Builder::new()
        .prefix(".vendpack-prune-")
        .tempdir_in(dir)
        .context("creating prune staging directory")?;
    let backup = staging.path().join(VENDOR_DIR);
    fs::rename(&vendor, &backup)
        .with_context(|| format!("moving {} aside", vendor.display()))?;

    match restore_whitelisted(&backup, &vendor, whitelist) {
        Ok(()) => {
            staging.close().context("removing prune staging directory")?;
            info!("Pruned vendor tree to {} whitelisted modules", whitelist.len());
            Ok(())
        }
        Err(e) => {
            let kept = staging.into_path();
            warn!("Prune failed, original vendor tree left at {}", kept.display());
            Err(e.context(format!("original vendor tree kept at {}", kept.display())))
        }
    }
}

fn restore_whitelisted(backup: &Path, vendor: &Path, whitelist: &Whitelist) -> Result<()> {
    fs::create_dir_all(vendor)?;

    let listing = backup.join("modules.txt");
    if listing.exists() {
        fs::rename(&listing, vendor.join("modules.txt"))?;
    }

    // Nested modules first, so a parent module is merged around them
    let mut modules: Vec<&str> = whitelist.iter().collect();
    modules.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

    for module in modules {
        let src = backup.join(module);
        if !src.exists() {
            return Err(Error::NotFound(format!("vendored module {}", module)));
        }
        move_merge(&src, &vendor.join(module))
            .with_context(|| format!("reserving module {}", module))?;
        debug!("Kept vendored module {}", module);
    }
    Ok(())
}

/// Rename `src` to `dst`, descending into `dst` when it already exists
fn move_merge(src: &Path, dst: &Path) -> Result<()> {
    if !dst.exists() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(src, dst)?;
        return Ok(());
    }

    if !(src.is_dir() && dst.is_dir()) {
        fs::rename(src, dst)?;
        return Ok(());
    }

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        move_merge(&entry.path(), &dst.join(entry.file_name()))?;
    }
    fs::remove_dir(src)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn staging_dirs(root: &Path) -> Vec<String> {
        fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".vendpack-prune-"))
            .collect()
    }

    #[test]
    fn test_prune_keeps_nested_whitelisted_modules() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(root, "vendor/modules.txt");
        touch(root, "vendor/example.org/a/a.go");
        touch(root, "vendor/example.org/a/b/b.go");
        touch(root, "vendor/example.org/c/c.go");
        touch(root, "vendor/other.org/d/d.go");

        let whitelist = Whitelist::new(["example.org/a", "example.org/a/b"]);
        prune_vendor(root, &whitelist).unwrap();

        assert!(root.join("vendor/modules.txt").exists());
        assert!(root.join("vendor/example.org/a/a.go").exists());
        assert!(root.join("vendor/example.org/a/b/b.go").exists());
        assert!(!root.join("vendor/example.org/c").exists());
        assert!(!root.join("vendor/other.org").exists());
        assert!(staging_dirs(root).is_empty());
    }

    #[test]
    fn test_prune_failure_keeps_staging_copy() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(root, "vendor/example.org/a/a.go");

        let whitelist = Whitelist::new(["example.org/missing"]);
        let err = prune_vendor(root, &whitelist).unwrap_err();
        assert!(err.to_string().contains("original vendor tree kept at"));

        let staged = staging_dirs(root);
        assert_eq!(staged.len(), 1);
        assert!(root.join(&staged[0]).join("vendor/example.org/a/a.go").exists());
    }

    #[test]
    fn test_prune_requires_vendor_dir() {
        let temp = tempfile::tempdir().unwrap();
        let err = prune_vendor(temp.path(), &Whitelist::new(["x"])).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }
}
