// src/toolchain/model.rs

//! JSON shapes emitted by `go list -json` and `go mod edit -json`
//!
//! Only the fields vendpack reads or republishes are modelled; unknown fields
//! are ignored on input.

use serde::{Deserialize, Deserializer, Serialize};

/// Go emits `null` for empty slices in some outputs
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One entry of `go list -deps -json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageInfo {
    #[serde(default)]
    pub import_path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub standard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleInfo>,
}

/// Module attribution of a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleInfo {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub main: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub indirect: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub go_version: String,
}

/// `go mod edit -json` view of a `go.mod` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GoMod {
    #[serde(default)]
    pub module: ModPath,
    #[serde(default)]
    pub go: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub require: Vec<Require>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude: Vec<ModuleVersion>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub replace: Vec<Replace>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub retract: Vec<Retract>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModPath {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deprecated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleVersion {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Require {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub indirect: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Replace {
    #[serde(default)]
    pub old: ModuleVersion,
    #[serde(default)]
    pub new: ModuleVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Retract {
    #[serde(default)]
    pub low: String,
    #[serde(default)]
    pub high: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rationale: String,
}
