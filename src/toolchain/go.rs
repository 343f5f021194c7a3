// src/toolchain/go.rs

//! `go` command backed toolchain

use super::{GoMod, GoVersion, PackageInfo, Toolchain};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Runs the `go` binary found on `PATH` (or an explicit one)
#[derive(Debug, Clone)]
pub struct GoToolchain {
    go: PathBuf,
}

impl GoToolchain {
    /// Locate `go` on `PATH`
    pub fn locate() -> Result<Self> {
        let go = which::which("go")
            .map_err(|e| Error::Precondition(format!("go not found in PATH: {}", e)))?;
        Ok(Self { go })
    }

    pub fn with_binary(go: impl Into<PathBuf>) -> Self {
        Self { go: go.into() }
    }

    pub fn binary(&self) -> &Path {
        &self.go
    }

    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<Output> {
        let command = format!("go {}", args.join(" "));
        debug!("Running {}", command);

        let mut cmd = Command::new(&self.go);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        let output = cmd.output().map_err(|e| Error::Collaborator {
            command: command.clone(),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(Error::Collaborator {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Decode a stream of concatenated JSON objects
fn decode_stream<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<Vec<T>> {
    serde_json::Deserializer::from_slice(data)
        .into_iter::<T>()
        .map(|item| item.map_err(Error::from))
        .collect()
}

impl Toolchain for GoToolchain {
    fn mod_tidy(&self, dir: &Path) -> Result<()> {
        self.run(Some(dir), &["mod", "tidy"]).map(|_| ())
    }

    fn mod_vendor(&self, dir: &Path) -> Result<()> {
        self.run(Some(dir), &["mod", "vendor"]).map(|_| ())
    }

    fn list_packages(&self, dir: &Path) -> Result<Vec<PackageInfo>> {
        let output = self.run(Some(dir), &["list", "-deps", "-json"])?;
        let packages: Vec<PackageInfo> = decode_stream(&output.stdout)?;
        debug!("go list reported {} packages", packages.len());
        Ok(packages)
    }

    fn read_go_mod(&self, dir: &Path) -> Result<GoMod> {
        let output = self.run(Some(dir), &["mod", "edit", "-json"])?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn require(&self, dir: &Path, module: &str, version: &str) -> Result<()> {
        if module.is_empty() || version.is_empty() {
            return Err(Error::Precondition(format!(
                "require needs module and version, got {:?}@{:?}",
                module, version
            )));
        }
        let arg = format!("-require={}@{}", module, version);
        self.run(Some(dir), &["mod", "edit", &arg]).map(|_| ())
    }

    fn replace(&self, dir: &Path, module: &str, target: &Path) -> Result<()> {
        if module.is_empty() {
            return Err(Error::Precondition("replace needs a module".to_string()));
        }
        let arg = format!("-replace={}={}", module, target.display());
        self.run(Some(dir), &["mod", "edit", &arg]).map(|_| ())
    }

    fn go_version(&self) -> Result<GoVersion> {
        let output = self.run(None, &["version"])?;
        GoVersion::parse(&String::from_utf8_lossy(&output.stdout))
    }
}
