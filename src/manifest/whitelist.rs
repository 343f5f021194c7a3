// src/manifest/whitelist.rs

use std::collections::BTreeSet;

/// Optional restriction set of module paths
///
/// Stored as a newline-separated, sorted list. An empty whitelist means
/// "every module".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    modules: BTreeSet<String>,
}

impl Whitelist {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: modules
                .into_iter()
                .map(Into::into)
                .map(|m: String| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn parse(content: &str) -> Self {
        Self::new(content.lines())
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether `module` passes the whitelist (always true when empty)
    pub fn allows(&self, module: &str) -> bool {
        self.modules.is_empty() || self.modules.contains(module)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    /// Module paths in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for module in &self.modules {
            out.push_str(module);
            out.push('\n');
        }
        out
    }
}
