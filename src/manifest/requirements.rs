// src/manifest/requirements.rs

//! Module version ledger (`go.mod.versions`)
//!
//! One `modulePath version` pair per line. The main module has no version and
//! is written as its path alone.

use std::collections::BTreeMap;

/// Ordered `module -> version` map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementLedger {
    versions: BTreeMap<String, String>,
}

impl RequirementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse ledger text; a repeated module keeps its last version
    pub fn parse(content: &str) -> Self {
        let mut ledger = Self::new();
        for line in content.lines() {
            let (module, version) = match line.split_once(' ') {
                Some((m, v)) => (m.trim(), v.trim()),
                None => (line.trim(), ""),
            };
            if module.is_empty() {
                continue;
            }
            ledger.set(module, version);
        }
        ledger
    }

    /// Set or insert `module`; returns true if the ledger changed
    pub fn set(&mut self, module: &str, version: &str) -> bool {
        match self.versions.get_mut(module) {
            Some(existing) if existing == version => false,
            Some(existing) => {
                *existing = version.to_string();
                true
            }
            None => {
                self.versions.insert(module.to_string(), version.to_string());
                true
            }
        }
    }

    pub fn get(&self, module: &str) -> Option<&str> {
        self.versions.get(module).map(String::as_str)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.versions.contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// `(module, version)` pairs sorted by module path
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.versions.iter().map(|(m, v)| (m.as_str(), v.as_str()))
    }

    /// Modules whose path lies below `module`, relative to it
    ///
    /// For `example.org/a` with `example.org/a/b` present this yields `b`.
    /// `example.org/ab` is not nested.
    pub fn nested_in(&self, module: &str) -> Vec<&str> {
        self.versions
            .keys()
            .filter_map(|m| m.strip_prefix(module)?.strip_prefix('/'))
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (module, version) in self.iter() {
            out.push_str(module);
            if !version.is_empty() {
                out.push(' ');
                out.push_str(version);
            }
            out.push('\n');
        }
        out
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RequirementLedger {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut ledger = Self::new();
        for (module, version) in iter {
            ledger.set(module, version);
        }
        ledger
    }
}
