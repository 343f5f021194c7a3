// src/archive/writer.rs

//! Archive serialization
//!
//! Entries are written as GNU tar headers with only path, type, mode, size and
//! mtime populated, so identical trees produce identical bytes.

use crate::error::{Error, Result, ResultExt};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::trace;
use walkdir::WalkDir;

/// Inclusion predicate: `(archive path, is_dir) -> keep?`
///
/// Returning `false` for a directory prunes its whole subtree.
pub type IncludeFn<'a> = dyn Fn(&str, bool) -> bool + 'a;

/// Options for [`ArchiveWriter::append_tree`]
#[derive(Default)]
pub struct TreeOptions<'a> {
    include: Option<Box<IncludeFn<'a>>>,
    prefix: String,
    clear_timestamps: bool,
}

impl<'a> TreeOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only archive entries accepted by `include`
    pub fn with_filter(mut self, include: impl Fn(&str, bool) -> bool + 'a) -> Self {
        self.include = Some(Box::new(include));
        self
    }

    /// Prefix every archive path with `prefix` (the tree root itself becomes `prefix`)
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Normalize every entry's mtime to the epoch
    pub fn clear_timestamps(mut self, clear: bool) -> Self {
        self.clear_timestamps = clear;
        self
    }

    fn includes(&self, name: &str, is_dir: bool) -> bool {
        self.include.as_ref().is_none_or(|f| f(name, is_dir))
    }
}

/// Join an archive prefix and a relative path with `/`
fn join_archive_path(prefix: &str, rel: &str) -> String {
    match (prefix.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, rel),
    }
}

/// Sequential archive writer over any byte sink
///
/// A path is written at most once; later attempts to add the same path are
/// ignored, which keeps overlapping subtrees (nested modules) duplicate-free.
pub struct ArchiveWriter<W: Write> {
    builder: tar::Builder<W>,
    written: HashSet<String>,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            builder: tar::Builder::new(inner),
            written: HashSet::new(),
        }
    }

    /// True if `name` has already been written
    pub fn contains(&self, name: &str) -> bool {
        self.written.contains(name.trim_matches('/'))
    }

    fn header(entry_type: tar::EntryType, mode: u32, size: u64, mtime: u64) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(entry_type);
        header.set_mode(mode);
        header.set_size(size);
        header.set_mtime(mtime);
        header.set_cksum();
        header
    }

    fn append_dir_at(&mut self, name: &str, mode: u32, mtime: u64) -> Result<()> {
        let name = name.trim_matches('/');
        if name.is_empty() || !self.written.insert(name.to_string()) {
            return Ok(());
        }
        trace!("archive add dir: {}", name);
        let mut header = Self::header(tar::EntryType::Directory, mode, 0, mtime);
        self.builder
            .append_data(&mut header, name, io::empty())
            .with_context(|| format!("writing directory entry {}", name))
    }

    fn append_file_at(&mut self, name: &str, mode: u32, mtime: u64, content: &[u8]) -> Result<()> {
        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(Error::InvalidPath("empty archive file name".to_string()));
        }
        if !self.written.insert(name.to_string()) {
            return Ok(());
        }
        trace!("archive add file: {}", name);
        let mut header =
            Self::header(tar::EntryType::Regular, mode, content.len() as u64, mtime);
        self.builder
            .append_data(&mut header, name, content)
            .with_context(|| format!("writing file entry {}", name))
    }

    /// Add a directory entry with no timestamp
    pub fn append_dir(&mut self, name: &str, mode: u32) -> Result<()> {
        self.append_dir_at(name, mode, 0)
    }

    /// Add a directory entry for every proper ancestor of `name`
    pub fn append_parents(&mut self, name: &str, mode: u32) -> Result<()> {
        let parts: Vec<&str> = name.trim_matches('/').split('/').collect();
        for i in 1..parts.len() {
            self.append_dir(&parts[..i].join("/"), mode)?;
        }
        Ok(())
    }

    /// Add a file entry with no timestamp
    pub fn append_file(&mut self, name: &str, mode: u32, content: &[u8]) -> Result<()> {
        self.append_file_at(name, mode, 0, content)
    }

    /// Depth-first walk of `src`, writing each accepted entry
    ///
    /// Children are visited in file name order. Anything that is neither a
    /// regular file nor a directory is skipped.
    pub fn append_tree(&mut self, src: &Path, opts: &TreeOptions<'_>) -> Result<()> {
        fs::metadata(src).with_context(|| format!("unable to archive {}", src.display()))?;

        let mut walker = WalkDir::new(src).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry.map_err(io::Error::from)?;
            let file_type = entry.file_type();
            let is_dir = file_type.is_dir();
            if !is_dir && !file_type.is_file() {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(src)
                .map_err(|_| Error::InvalidPath(entry.path().display().to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            let name = join_archive_path(&opts.prefix, &rel);
            if name.is_empty() {
                continue;
            }

            if !opts.includes(&name, is_dir) {
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }

            let metadata = entry.metadata().map_err(io::Error::from)?;
            let mode = metadata.permissions().mode() & 0o7777;
            let mtime = if opts.clear_timestamps {
                0
            } else {
                metadata
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map_or(0, |d| d.as_secs())
            };

            if is_dir {
                self.append_dir_at(&name, mode, mtime)?;
            } else {
                let content = fs::read(entry.path())
                    .with_context(|| format!("reading {}", entry.path().display()))?;
                self.append_file_at(&name, mode, mtime, &content)?;
            }
        }
        Ok(())
    }

    /// Access the underlying sink, e.g. to observe bytes written so far
    pub fn get_mut(&mut self) -> &mut W {
        self.builder.get_mut()
    }

    /// Write the end-of-archive marker and return the sink
    pub fn finish(self) -> Result<W> {
        self.builder
            .into_inner()
            .context("finishing archive")
    }
}
