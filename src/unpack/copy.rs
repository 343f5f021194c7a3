// src/unpack/copy.rs

//! Override-aware directory copy
//!
//! A directory's file set is one unit (a Go package). For each source
//! directory holding files:
//!
//! - destination missing: create it and copy every file,
//! - destination present and the override predicate accepts its relative
//!   path: delete the destination's files (never its subdirectories) and
//!   copy every file,
//! - otherwise: leave the destination files untouched.
//!
//! Subdirectories are visited unless they are the root of another module.
//! Directories are never deleted.

use crate::error::{Result, ResultExt};
use crate::fs::{self, ReadFs, WriteFs};
use std::path::Path;
use tracing::{debug, info};

/// Package directories handled by one copy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub added: usize,
    pub overridden: usize,
    pub reused: usize,
}

impl CopyStats {
    /// True if any destination file was written
    pub fn changed(&self) -> bool {
        self.added + self.overridden > 0
    }
}

/// Copy the archive directory `src` into `dest_dir`
///
/// `should_override` receives the `/`-separated path of a package directory
/// relative to `src` (`""` for `src` itself). Subdirectories for which
/// `skip_dir` holds (same relative form) are not entered; they belong to
/// another module.
pub fn copy_dir(
    src: &dyn ReadFs,
    src_dir: &str,
    dest: &dyn WriteFs,
    dest_dir: &Path,
    should_override: &dyn Fn(&str) -> bool,
    skip_dir: &dyn Fn(&str) -> bool,
) -> Result<CopyStats> {
    let copier = Copier {
        src,
        dest,
        should_override,
        skip_dir,
    };
    let mut stats = CopyStats::default();
    copier.copy_level(src_dir, dest_dir, "", &mut stats)?;
    Ok(stats)
}

struct Copier<'a> {
    src: &'a dyn ReadFs,
    dest: &'a dyn WriteFs,
    should_override: &'a dyn Fn(&str) -> bool,
    skip_dir: &'a dyn Fn(&str) -> bool,
}

impl Copier<'_> {
    fn copy_level(
        &self,
        src_dir: &str,
        dest_dir: &Path,
        rel: &str,
        stats: &mut CopyStats,
    ) -> Result<()> {
        let entries = self.src.read_dir(src_dir)?;
        let (dirs, files): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.is_dir);

        if !files.is_empty() {
            let exists = fs::is_dir(self.dest, dest_dir)?;
            let write = if !exists {
                info!("Package added: {}", src_dir);
                stats.added += 1;
                true
            } else if (self.should_override)(rel) {
                info!("Package override: {}", src_dir);
                stats.overridden += 1;
                true
            } else {
                debug!("Package reuse: {}", src_dir);
                stats.reused += 1;
                false
            };

            if write {
                self.dest.mkdir_all(dest_dir, 0o755)?;
                for existing in self.dest.list_dir(dest_dir)? {
                    if !existing.is_dir {
                        self.dest
                            .remove_file(&dest_dir.join(&existing.name))
                            .context("removing file in original directory")?;
                    }
                }
                for file in &files {
                    let from = format!("{}/{}", src_dir, file.name);
                    let content = self.src.read_file(&from)?;
                    fs::write_file(self.dest, &dest_dir.join(&file.name), &content)
                        .with_context(|| format!("copying {}", from))?;
                }
            }
        }

        for dir in &dirs {
            let child_rel = if rel.is_empty() {
                dir.name.clone()
            } else {
                format!("{}/{}", rel, dir.name)
            };
            if (self.skip_dir)(&child_rel) {
                debug!("Leaving nested module {}/{} to its own pass", src_dir, dir.name);
                continue;
            }
            self.copy_level(
                &format!("{}/{}", src_dir, dir.name),
                &dest_dir.join(&dir.name),
                &child_rel,
                stats,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;

    fn archive() -> MemFs {
        let src = MemFs::new();
        src.insert_file("vendor/m/a.go", b"new a").unwrap();
        src.insert_file("vendor/m/sub/b.go", b"new b").unwrap();
        src
    }

    #[test]
    fn test_copy_into_empty_destination() {
        let dest = MemFs::new();
        let stats = copy_dir(&archive(), "vendor/m", &dest, Path::new("/d/m"), &|_| false, &|_| false).unwrap();
        assert_eq!(stats, CopyStats { added: 2, overridden: 0, reused: 0 });
        assert_eq!(dest.file_paths(), vec!["d/m/a.go", "d/m/sub/b.go"]);
    }

    #[test]
    fn test_existing_package_left_alone_without_override() {
        let dest = MemFs::new();
        dest.insert_file("d/m/a.go", b"old a").unwrap();
        dest.insert_file("d/m/old.go", b"old").unwrap();

        let stats = copy_dir(&archive(), "vendor/m", &dest, Path::new("d/m"), &|_| false, &|_| false).unwrap();
        assert_eq!(stats, CopyStats { added: 1, overridden: 0, reused: 1 });
        assert_eq!(fs::read_file(&dest, Path::new("d/m/a.go")).unwrap(), b"old a");
        assert_eq!(dest.file_paths(), vec!["d/m/a.go", "d/m/old.go", "d/m/sub/b.go"]);
    }

    #[test]
    fn test_override_replaces_file_set_keeps_dirs() {
        let dest = MemFs::new();
        dest.insert_file("d/m/a.go", b"old a").unwrap();
        dest.insert_file("d/m/old.go", b"old").unwrap();
        dest.insert_file("d/m/keep/k.go", b"keep").unwrap();
        dest.insert_file("d/m/sub/b.go", b"old b").unwrap();

        let stats = copy_dir(&archive(), "vendor/m", &dest, Path::new("d/m"), &|rel| rel.is_empty(), &|_| false)
            .unwrap();
        assert_eq!(stats, CopyStats { added: 0, overridden: 1, reused: 1 });
        assert_eq!(
            dest.file_paths(),
            vec!["d/m/a.go", "d/m/keep/k.go", "d/m/sub/b.go"]
        );
        assert_eq!(fs::read_file(&dest, Path::new("d/m/a.go")).unwrap(), b"new a");
        assert_eq!(fs::read_file(&dest, Path::new("d/m/sub/b.go")).unwrap(), b"old b");
    }

    #[test]
    fn test_override_by_sub_path() {
        let dest = MemFs::new();
        dest.insert_file("d/m/a.go", b"old a").unwrap();
        dest.insert_file("d/m/sub/b.go", b"old b").unwrap();

        let stats = copy_dir(&archive(), "vendor/m", &dest, Path::new("d/m"), &|rel| rel == "sub", &|_| false)
            .unwrap();
        assert!(stats.changed());
        assert_eq!(fs::read_file(&dest, Path::new("d/m/a.go")).unwrap(), b"old a");
        assert_eq!(fs::read_file(&dest, Path::new("d/m/sub/b.go")).unwrap(), b"new b");
    }

    #[test]
    fn test_missing_source_is_not_found() {
        let dest = MemFs::new();
        let err = copy_dir(&archive(), "vendor/none", &dest, Path::new("d"), &|_| true, &|_| false).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_skipped_subdirectory_is_not_entered() {
        let dest = MemFs::new();
        dest.insert_file("d/m/sub/b.go", b"old b").unwrap();

        let stats = copy_dir(&archive(), "vendor/m", &dest, Path::new("d/m"), &|_| true, &|rel| {
            rel == "sub"
        })
        .unwrap();
        assert_eq!(stats, CopyStats { added: 0, overridden: 1, reused: 0 });
        assert_eq!(fs::read_file(&dest, Path::new("d/m/sub/b.go")).unwrap(), b"old b");
    }
}
