// src/archive/reader.rs

//! In-memory archive filesystem
//!
//! The whole archive is decoded once into an arena of records. A path index
//! gives O(1) lookup and each directory keeps its children in archive order,
//! so listing never rescans the archive.

use crate::error::{Error, Result};
use crate::fs::{DirEntry, ReadFs};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

#[derive(Debug)]
struct Record {
    path: String,
    is_dir: bool,
    mode: u32,
    content: Vec<u8>,
    children: Vec<usize>,
}

impl Record {
    fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Read-only tree reconstructed from a gzip-compressed tar stream
#[derive(Debug, Default)]
pub struct ArchiveFs {
    records: Vec<Record>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
}

/// Normalize an archive or query path: no `./` prefix, no surrounding slashes
fn normalize(path: &str) -> &str {
    let mut path = path.trim_matches('/');
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.trim_start_matches('/');
    }
    if path == "." { "" } else { path }
}

fn corrupt(e: impl std::fmt::Display) -> Error {
    Error::Corrupt(format!("reading archive: {}", e))
}

impl ArchiveFs {
    /// Decode a gzip-compressed tar stream
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut archive = tar::Archive::new(GzDecoder::new(reader));
        let mut fs = ArchiveFs::default();

        for entry in archive.entries().map_err(corrupt)? {
            let mut entry = entry.map_err(corrupt)?;
            let is_dir = match entry.header().entry_type() {
                tar::EntryType::Directory => true,
                tar::EntryType::Regular | tar::EntryType::Continuous => false,
                _ => continue,
            };
            let raw = entry.path().map_err(corrupt)?;
            let raw = raw.to_string_lossy();
            let path = normalize(&raw).to_string();
            if path.is_empty() {
                continue;
            }
            let mode = entry.header().mode().unwrap_or(if is_dir { 0o755 } else { 0o644 });
            let mut content = Vec::new();
            if !is_dir {
                entry.read_to_end(&mut content).map_err(corrupt)?;
            }
            fs.insert(path, is_dir, mode, content);
        }

        fs.link()?;
        debug!("Decoded archive with {} entries", fs.records.len());
        Ok(fs)
    }

    /// Decode from compressed bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(data)
    }

    /// Decode from base64 text; whitespace (line wrapping) is ignored
    pub fn from_base64(text: &str) -> Result<Self> {
        let cleaned: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let data = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| Error::Corrupt(format!("decoding base64 archive: {}", e)))?;
        Self::from_bytes(&data)
    }

    /// A later entry for the same path replaces the earlier one's content
    fn insert(&mut self, path: String, is_dir: bool, mode: u32, content: Vec<u8>) {
        if let Some(&idx) = self.index.get(&path) {
            let record = &mut self.records[idx];
            record.is_dir = is_dir;
            record.mode = mode;
            record.content = content;
            return;
        }
        self.index.insert(path.clone(), self.records.len());
        self.records.push(Record {
            path,
            is_dir,
            mode,
            content,
            children: Vec::new(),
        });
    }

    /// Attach every record to its parent directory
    fn link(&mut self) -> Result<()> {
        for idx in 0..self.records.len() {
            let parent = match self.records[idx].path.rsplit_once('/') {
                Some((parent, _)) => parent.to_string(),
                None => {
                    self.roots.push(idx);
                    continue;
                }
            };
            let Some(&parent_idx) = self.index.get(&parent) else {
                return Err(Error::Corrupt(format!(
                    "building tree: parent {} of {} not found",
                    parent, self.records[idx].path
                )));
            };
            if !self.records[parent_idx].is_dir {
                return Err(Error::Corrupt(format!(
                    "building tree: parent {} of {} is not a directory",
                    parent, self.records[idx].path
                )));
            }
            self.records[parent_idx].children.push(idx);
        }
        Ok(())
    }

    fn lookup(&self, path: &str) -> Result<&Record> {
        let path = normalize(path);
        self.index
            .get(path)
            .map(|&idx| &self.records[idx])
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(normalize(path))
    }

    /// All paths in archive order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.path.as_str())
    }

    /// Permission bits recorded for `path`
    pub fn mode(&self, path: &str) -> Result<u32> {
        Ok(self.lookup(path)?.mode)
    }
}

impl ReadFs for ArchiveFs {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let record = self.lookup(path)?;
        if record.is_dir {
            return Err(Error::InvalidPath(format!("{} is a directory", record.path)));
        }
        Ok(record.content.clone())
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let children = if normalize(path).is_empty() {
            &self.roots
        } else {
            let record = self.lookup(path)?;
            if !record.is_dir {
                return Err(Error::InvalidPath(format!("{} is not a directory", record.path)));
            }
            &record.children
        };
        Ok(children
            .iter()
            .map(|&idx| {
                let child = &self.records[idx];
                DirEntry {
                    name: child.name().to_string(),
                    is_dir: child.is_dir,
                }
            })
            .collect())
    }
}

/// Base64 text of an archive, as embedded in generated code
pub fn encode_base64(data: &[u8]) -> String {
    BASE64.encode(data)
}
