// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use vendpack::toolchain::{ModPath, Require};
use vendpack::{Error, GoMod, GoVersion, ModuleInfo, PackageInfo, Result, Toolchain};

pub const LIB: &str = "example.org/lib";
pub const LIB_VERSION: &str = "v1.2.0";
pub const LIB_SUM: &str = "example.org/lib v1.2.0/go.mod h1:AAA=";
pub const OTHER: &str = "example.org/other";
pub const OTHER_VERSION: &str = "v0.3.0";
pub const OTHER_SUMS: [&str; 2] = [
    "example.org/other v0.3.0 h1:OOO=",
    "example.org/other v0.3.0/go.mod h1:PPP=",
];

/// `OUTER` holds `INNER` in a subdirectory of its module tree
pub const OUTER: &str = "example.org/a";
pub const OUTER_VERSION: &str = "v1.0.0";
pub const OUTER_SUM: &str = "example.org/a v1.0.0 h1:A=";
pub const INNER: &str = "example.org/a/b";
pub const INNER_VERSION: &str = "v2.0.0";
pub const INNER_SUM: &str = "example.org/a/b v2.0.0 h1:B=";

/// Toolchain stand-in that serves a fixed package list and records calls.
///
/// `require` and `replace` also append a line to `<dir>/go.mod` when that
/// file exists on disk, so tests can observe the edits.
pub struct FakeToolchain {
    pub packages: Vec<PackageInfo>,
    pub go_mod: GoMod,
    pub version: GoVersion,
    /// Calls starting with this prefix fail
    pub fail_on: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

fn module(path: &str, version: &str) -> ModuleInfo {
    ModuleInfo {
        path: path.to_string(),
        version: version.to_string(),
        main: version.is_empty(),
        ..Default::default()
    }
}

fn package(import_path: &str, name: &str, module_info: Option<ModuleInfo>) -> PackageInfo {
    PackageInfo {
        import_path: import_path.to_string(),
        name: name.to_string(),
        standard: module_info.is_none(),
        module: module_info,
        ..Default::default()
    }
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self {
            packages: vec![
                package("fmt", "fmt", None),
                package(LIB, "lib", Some(module(LIB, LIB_VERSION))),
                package(
                    &format!("{}/sub", OTHER),
                    "sub",
                    Some(module(OTHER, OTHER_VERSION)),
                ),
                package(OTHER, "other", Some(module(OTHER, OTHER_VERSION))),
                package("example.com/app", "main", Some(module("example.com/app", ""))),
            ],
            go_mod: GoMod {
                module: ModPath {
                    path: "example.com/app".to_string(),
                    ..Default::default()
                },
                go: "1.21".to_string(),
                require: vec![
                    Require {
                        path: LIB.to_string(),
                        version: LIB_VERSION.to_string(),
                        indirect: false,
                    },
                    Require {
                        path: OTHER.to_string(),
                        version: OTHER_VERSION.to_string(),
                        indirect: true,
                    },
                ],
                ..Default::default()
            },
            version: GoVersion::new(1, 21, 5),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Package list of [`nested_source_tree`]
    pub fn nested() -> Self {
        let mut fake = Self::new();
        fake.packages = vec![
            package(OUTER, "a", Some(module(OUTER, OUTER_VERSION))),
            package(INNER, "b", Some(module(INNER, INNER_VERSION))),
            package("example.com/app", "main", Some(module("example.com/app", ""))),
        ];
        fake
    }

    pub fn failing_on(mut self, prefix: &'static str) -> Self {
        self.fail_on = Some(prefix);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        match self.fail_on {
            Some(prefix) if call.starts_with(prefix) => Err(Error::Collaborator {
                command: format!("go {}", call),
                stderr: "simulated failure".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn append_go_mod(dir: &Path, line: &str) {
        if let Ok(mut file) = OpenOptions::new().append(true).open(dir.join("go.mod")) {
            writeln!(file, "{}", line).unwrap();
        }
    }
}

impl Toolchain for FakeToolchain {
    fn mod_tidy(&self, _dir: &Path) -> Result<()> {
        self.record("mod tidy".to_string())
    }

    fn mod_vendor(&self, _dir: &Path) -> Result<()> {
        self.record("mod vendor".to_string())
    }

    fn list_packages(&self, _dir: &Path) -> Result<Vec<PackageInfo>> {
        self.record("list -deps -json".to_string())?;
        Ok(self.packages.clone())
    }

    fn read_go_mod(&self, _dir: &Path) -> Result<GoMod> {
        self.record("mod edit -json".to_string())?;
        Ok(self.go_mod.clone())
    }

    fn require(&self, dir: &Path, module: &str, version: &str) -> Result<()> {
        self.record(format!("require {}@{}", module, version))?;
        Self::append_go_mod(dir, &format!("require {} {}", module, version));
        Ok(())
    }

    fn replace(&self, dir: &Path, module: &str, target: &Path) -> Result<()> {
        self.record(format!("replace {}={}", module, target.display()))?;
        Self::append_go_mod(dir, &format!("replace {} => {}", module, target.display()));
        Ok(())
    }

    fn go_version(&self) -> Result<GoVersion> {
        self.record("version".to_string())?;
        Ok(self.version.clone())
    }
}

/// Write `content` to `root/rel`, creating parent directories
pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

/// A vendored Go module depending on `example.org/lib` and `example.org/other`.
///
/// Returns the TempDir - keep it alive to prevent cleanup.
pub fn source_tree() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    write(
        root,
        "go.mod",
        "module example.com/app\n\ngo 1.21\n\nrequire (\n\texample.org/lib v1.2.0\n\texample.org/other v0.3.0 // indirect\n)\n",
    );
    write(
        root,
        "go.sum",
        &format!("{}\n{}\n{}\n", LIB_SUM, OTHER_SUMS[0], OTHER_SUMS[1]),
    );
    write(root, "main.go", "package main\n\nimport _ \"example.org/lib\"\n");
    write(
        root,
        "vendor/modules.txt",
        "# example.org/lib v1.2.0\n## explicit\nexample.org/lib\n# example.org/other v0.3.0\nexample.org/other\nexample.org/other/sub\n",
    );
    write(root, "vendor/example.org/lib/a.go", "package lib");
    write(root, "vendor/example.org/other/b.go", "package other");
    write(root, "vendor/example.org/other/sub/c.go", "package sub");
    temp
}

/// A vendored Go module depending on `example.org/a` and the module
/// `example.org/a/b` nested inside it.
pub fn nested_source_tree() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    write(root, "go.mod", "module example.com/app\n\ngo 1.21\n");
    write(root, "go.sum", &format!("{}\n{}\n", OUTER_SUM, INNER_SUM));
    write(
        root,
        "vendor/modules.txt",
        "# example.org/a v1.0.0\n## explicit\nexample.org/a\n# example.org/a/b v2.0.0\n## explicit\nexample.org/a/b\n",
    );
    write(root, "vendor/example.org/a/a.go", "package a");
    write(root, "vendor/example.org/a/b/b.go", "package b");
    temp
}

/// A destination module, with or without a `vendor` directory.
pub fn destination(vendored: bool) -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    write(temp.path(), "go.mod", "module example.com/dst\n\ngo 1.21\n");
    write(temp.path(), "go.sum", "");
    if vendored {
        fs::create_dir_all(temp.path().join("vendor")).unwrap();
    }
    temp
}
