// src/toolchain/version.rs

use crate::error::{Error, Result};
use std::fmt;

/// Go toolchain version as reported by `go version`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub os: String,
    pub arch: String,
}

/// Leading decimal digits of `s` (`"22rc1"` -> 22)
fn leading_number(s: &str) -> Option<u32> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

impl GoVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            ..Default::default()
        }
    }

    /// Parse `go version` output, e.g. `go version go1.21.5 linux/amd64`
    pub fn parse(output: &str) -> Result<Self> {
        let invalid = || Error::Corrupt(format!("unrecognised go version output: {}", output.trim()));

        let mut tokens = output.split_whitespace();
        let version = tokens
            .by_ref()
            .find_map(|t| {
                t.strip_prefix("go")
                    .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            })
            .ok_or_else(invalid)?;

        let mut parts = version.split('.');
        let major = parts.next().and_then(leading_number).ok_or_else(invalid)?;
        let minor = parts.next().map_or(Some(0), leading_number).ok_or_else(invalid)?;
        let patch = parts.next().and_then(leading_number).unwrap_or(0);

        let (os, arch) = tokens
            .next()
            .and_then(|t| t.split_once('/'))
            .map(|(os, arch)| (os.to_string(), arch.to_string()))
            .unwrap_or_default();

        Ok(Self {
            major,
            minor,
            patch,
            os,
            arch,
        })
    }

    /// Value of a `go` directive, e.g. `1.21`
    pub fn directive(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for GoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "go{}.{}.{}", self.major, self.minor, self.patch)
    }
}
