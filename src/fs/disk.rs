// src/fs/disk.rs

//! Live directory backed filesystem

use super::{DirEntry, FileInfo, ReadFs, WriteFs};
use crate::error::{Error, Result};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Filesystem rooted at a directory on disk
///
/// Relative paths are resolved against the root; absolute paths are used
/// as given. `DiskFs::default()` resolves against the process working
/// directory.
#[derive(Debug, Clone, Default)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

/// Convert an I/O error into the crate error, tagging missing paths
fn map_io(err: io::Error, path: &Path) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::NotFound(path.display().to_string())
    } else {
        Error::Io(err).context(path.display().to_string())
    }
}

fn file_info(name: String, metadata: &fs::Metadata) -> FileInfo {
    FileInfo {
        name,
        is_dir: metadata.is_dir(),
        size: metadata.len(),
        mode: metadata.permissions().mode() & 0o7777,
    }
}

impl ReadFs for DiskFs {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(Path::new(path));
        fs::read(&full).map_err(|e| map_io(e, &full))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let full = self.resolve(Path::new(path));
        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| map_io(e, &full))? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

impl WriteFs for DiskFs {
    fn stat(&self, path: &Path) -> Result<FileInfo> {
        let full = self.resolve(path);
        let metadata = fs::metadata(&full).map_err(|e| map_io(e, &full))?;
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(file_info(name, &metadata))
    }

    fn mkdir_all(&self, path: &Path, mode: u32) -> Result<()> {
        let full = self.resolve(path);
        DirBuilder::new()
            .recursive(true)
            .mode(mode)
            .create(&full)
            .map_err(|e| map_io(e, &full))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        let full = self.resolve(path);
        let file = fs::File::open(&full).map_err(|e| map_io(e, &full))?;
        Ok(Box::new(file))
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + '_>> {
        let full = self.resolve(path);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&full)
            .map_err(|e| map_io(e, &full))?;
        Ok(Box::new(file))
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn Write + '_>> {
        let full = self.resolve(path);
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&full)
            .map_err(|e| map_io(e, &full))?;
        Ok(Box::new(file))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path);
        let metadata = fs::symlink_metadata(&full).map_err(|e| map_io(e, &full))?;
        if metadata.is_dir() {
            fs::remove_dir(&full).map_err(|e| map_io(e, &full))
        } else {
            fs::remove_file(&full).map_err(|e| map_io(e, &full))
        }
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path);
        let metadata = match fs::symlink_metadata(&full) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(map_io(e, &full)),
        };
        if metadata.is_dir() {
            fs::remove_dir_all(&full).map_err(|e| map_io(e, &full))
        } else {
            fs::remove_file(&full).map_err(|e| map_io(e, &full))
        }
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<FileInfo>> {
        let full = self.resolve(path);
        let mut infos = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| map_io(e, &full))? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            infos.push(file_info(
                entry.file_name().to_string_lossy().into_owned(),
                &metadata,
            ));
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    /// Creates the directory under the system temporary directory
    fn make_temp_dir(&self, prefix: &str) -> Result<PathBuf> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        Ok(dir.into_path())
    }
}
