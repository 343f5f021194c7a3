// src/fs/mod.rs

//! Filesystem capabilities used by the pack and unpack engines
//!
//! Two small contracts keep the merge and restore algorithms independent of
//! where bytes actually live:
//!
//! - [`ReadFs`]: read-only tree addressed by `/`-separated relative paths.
//!   Implemented by [`DiskFs`] (a live directory), [`crate::archive::ArchiveFs`]
//!   (a deserialized archive) and [`MemFs`].
//! - [`WriteFs`]: read-write tree with streams, directory creation, removal and
//!   stat. Implemented by [`DiskFs`] and [`MemFs`].
//!
//! All implementations report missing paths as an error for which
//! [`crate::Error::is_not_found`] holds.

mod disk;
mod memory;

pub use disk::DiskFs;
pub use memory::MemFs;

use crate::error::Result;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Directory listing entry of a [`ReadFs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Metadata reported by a [`WriteFs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    /// Unix permission bits
    pub mode: u32,
}

/// Read-only tree
pub trait ReadFs {
    /// Read a whole file
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// List a directory's direct children
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>>;
}

/// Read-write tree
///
/// Directory mutation must be safe to share between threads. A single file's
/// stream is meant for one caller at a time.
pub trait WriteFs {
    fn stat(&self, path: &Path) -> Result<FileInfo>;

    /// Create a directory and all missing parents
    fn mkdir_all(&self, path: &Path, mode: u32) -> Result<()>;

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + '_>>;

    /// Open for writing, creating or truncating the file. The parent must exist.
    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + '_>>;

    /// Open for appending, creating the file if missing. The parent must exist.
    fn open_append(&self, path: &Path) -> Result<Box<dyn Write + '_>>;

    /// Remove a file or an empty directory
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove a path recursively; a missing path is not an error
    fn remove_all(&self, path: &Path) -> Result<()>;

    /// List a directory's direct children with their metadata
    fn list_dir(&self, path: &Path) -> Result<Vec<FileInfo>>;

    /// Create a fresh, uniquely named directory in this tree's temporary
    /// area and return its path. The directory is not removed automatically.
    fn make_temp_dir(&self, prefix: &str) -> Result<PathBuf>;
}

/// Read a whole file through a [`WriteFs`]
pub fn read_file(fs: &dyn WriteFs, path: &Path) -> Result<Vec<u8>> {
    let mut reader = fs.open_read(path)?;
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;
    Ok(content)
}

/// Replace a file's content through a [`WriteFs`]
pub fn write_file(fs: &dyn WriteFs, path: &Path, data: &[u8]) -> Result<()> {
    let mut writer = fs.open_write(path)?;
    writer.write_all(data)?;
    writer.flush()?;
    Ok(())
}

/// Stat a path, mapping not-found to `None`
pub fn try_stat(fs: &dyn WriteFs, path: &Path) -> Result<Option<FileInfo>> {
    match fs.stat(path) {
        Ok(info) => Ok(Some(info)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// True if `path` exists and is a directory
pub fn is_dir(fs: &dyn WriteFs, path: &Path) -> Result<bool> {
    Ok(try_stat(fs, path)?.is_some_and(|info| info.is_dir))
}
