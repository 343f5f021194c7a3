// src/manifest/checksums.rs

//! Checksum ledger (`go.sum`)
//!
//! Lines have the shape `modulePath versionedSubkey hash`, e.g.
//! `example.org/lib v1.2.0/go.mod h1:AAA=`. A module usually has two lines,
//! one for its source tree and one for its `go.mod`.

use crate::error::{Result, ResultExt};
use crate::fs::{self, WriteFs};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Checksum lines grouped by module, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumLedger {
    entries: BTreeMap<String, Vec<String>>,
}

impl ChecksumLedger {
    pub fn parse(content: &str) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim_end();
            let (module, rest) = line.split_once(' ').unwrap_or((line, ""));
            if module.is_empty() {
                continue;
            }
            entries
                .entry(module.to_string())
                .or_default()
                .push(rest.to_string());
        }
        Self { entries }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.entries.contains_key(module)
    }

    /// Everything after the module path on each of the module's lines
    pub fn entries_for(&self, module: &str) -> &[String] {
        self.entries.get(module).map_or(&[], Vec::as_slice)
    }

    /// Complete ledger lines for `module`
    pub fn lines_for(&self, module: &str) -> Vec<String> {
        self.entries_for(module)
            .iter()
            .map(|rest| format!("{} {}", module, rest))
            .collect()
    }
}

/// Lines of `content` starting with `module ` (exact module path match)
pub fn module_lines(content: &str, module: &str) -> Vec<String> {
    let prefix = format!("{} ", module);
    content
        .lines()
        .filter(|l| l.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

/// Append `lines` to the ledger at `path`, skipping lines already present
///
/// The ledger is created when missing. Returns the number of lines written.
pub fn append_lines(fs: &dyn WriteFs, path: &Path, lines: &[String]) -> Result<usize> {
    let existing = match fs::read_file(fs, path) {
        Ok(data) => String::from_utf8_lossy(&data).into_owned(),
        Err(e) if e.is_not_found() => String::new(),
        Err(e) => return Err(e),
    };
    let present: HashSet<&str> = existing.lines().map(str::trim_end).collect();

    let mut seen = HashSet::new();
    let fresh: Vec<&str> = lines
        .iter()
        .map(|l| l.trim_end())
        .filter(|l| !l.is_empty() && !present.contains(l) && seen.insert(*l))
        .collect();
    if fresh.is_empty() {
        return Ok(0);
    }

    let mut buf = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        buf.push('\n');
    }
    for line in &fresh {
        buf.push_str(line);
        buf.push('\n');
    }

    let mut writer = fs
        .open_append(path)
        .with_context(|| format!("updating {}", path.display()))?;
    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    debug!("Appended {} checksum lines to {}", fresh.len(), path.display());
    Ok(fresh.len())
}
