// src/manifest/summary.rs

//! Pack summary record (`go.list.json`)

use super::SUMMARY_FILE;
use crate::error::{Result, ResultExt};
use crate::fs::ReadFs;
use crate::toolchain::{GoMod, ModuleInfo, PackageInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Timestamp layout of `PackTimeUTC`
pub const PACK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Package label inside a summary module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageRef {
    pub import_path: String,
    #[serde(default)]
    pub name: String,
}

/// A module with the packages attributed to it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummaryModule {
    #[serde(flatten)]
    pub module: ModuleInfo,
    #[serde(default)]
    pub packages: Vec<PackageRef>,
}

/// Digest-stamped description of one archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackSummary {
    #[serde(rename = "PackTimeUTC")]
    pub pack_time_utc: String,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_mod: Option<GoMod>,
    #[serde(default)]
    pub modules: Vec<SummaryModule>,
}

/// Only the digest of a previously written summary
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DigestOnly {
    #[serde(default)]
    digest: String,
}

impl PackSummary {
    pub fn new(
        digest: impl Into<String>,
        go_mod: Option<GoMod>,
        modules: Vec<SummaryModule>,
        packed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            pack_time_utc: packed_at.format(PACK_TIME_FORMAT).to_string(),
            digest: digest.into(),
            go_mod,
            modules,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut data = serde_json::to_vec_pretty(self)?;
        data.push(b'\n');
        Ok(data)
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).context("parsing pack summary")
    }

    /// Digest field of serialized summary bytes, if they carry one
    pub fn digest_of(data: &[u8]) -> Option<String> {
        serde_json::from_slice::<DigestOnly>(data)
            .ok()
            .map(|d| d.digest)
            .filter(|d| !d.is_empty())
    }

    pub fn module(&self, path: &str) -> Option<&SummaryModule> {
        self.modules.iter().find(|m| m.module.path == path)
    }
}

/// Group packages by module, in first-seen order; standard packages are skipped
///
/// Callers must have checked that every non-standard package has a module.
pub fn group_packages(packages: &[PackageInfo]) -> Vec<SummaryModule> {
    let mut modules: Vec<SummaryModule> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for pkg in packages.iter().filter(|p| !p.standard) {
        let Some(module) = pkg.module.as_ref().filter(|m| !m.path.is_empty()) else {
            continue;
        };
        let idx = *index.entry(module.path.clone()).or_insert_with(|| {
            modules.push(SummaryModule {
                module: ModuleInfo {
                    path: module.path.clone(),
                    version: module.version.clone(),
                    main: module.main,
                    indirect: module.indirect,
                    go_version: module.go_version.clone(),
                },
                packages: Vec::new(),
            });
            modules.len() - 1
        });
        modules[idx].packages.push(PackageRef {
            import_path: pkg.import_path.clone(),
            name: pkg.name.clone(),
        });
    }
    modules
}

/// Read the summary record from an archive
pub fn read_summary(fs: &dyn ReadFs) -> Result<PackSummary> {
    let data = fs.read_file(SUMMARY_FILE)?;
    PackSummary::from_json(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn package(import_path: &str, module: Option<(&str, &str)>) -> PackageInfo {
        PackageInfo {
            import_path: import_path.to_string(),
            name: import_path.rsplit('/').next().unwrap().to_string(),
            module: module.map(|(path, version)| ModuleInfo {
                path: path.to_string(),
                version: version.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_json_keys() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 5, 9).unwrap();
        let summary = PackSummary::new(
            "0123abcd",
            None,
            group_packages(&[package("example.org/lib", Some(("example.org/lib", "v1.2.0")))]),
            at,
        );
        let json: serde_json::Value = serde_json::from_slice(&summary.to_json().unwrap()).unwrap();

        assert_eq!(json["PackTimeUTC"], "2024-03-01 08:05:09");
        assert_eq!(json["Digest"], "0123abcd");
        assert_eq!(json["Modules"][0]["Path"], "example.org/lib");
        assert_eq!(json["Modules"][0]["Version"], "v1.2.0");
        assert_eq!(json["Modules"][0]["Packages"][0]["ImportPath"], "example.org/lib");
        assert!(json.get("GoMod").is_none());

        let back = PackSummary::from_json(&summary.to_json().unwrap()).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_group_packages() {
        let mut fmt = package("fmt", None);
        fmt.standard = true;
        let packages = vec![
            fmt,
            package("example.org/lib/a", Some(("example.org/lib", "v1.2.0"))),
            package("example.com/app", Some(("example.com/app", ""))),
            package("example.org/lib/b", Some(("example.org/lib", "v1.2.0"))),
        ];
        let modules = group_packages(&packages);

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].module.path, "example.org/lib");
        assert_eq!(modules[0].packages.len(), 2);
        assert_eq!(modules[1].module.path, "example.com/app");
    }

    #[test]
    fn test_digest_of() {
        assert_eq!(
            PackSummary::digest_of(br#"{"Digest":"ff","Modules":[]}"#),
            Some("ff".to_string())
        );
        assert_eq!(PackSummary::digest_of(b"not json"), None);
        assert_eq!(PackSummary::digest_of(b"{}"), None);
    }
}
