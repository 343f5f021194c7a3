// src/fs/memory.rs

//! In-memory filesystem
//!
//! Every directory node carries its own lock, so concurrent directory
//! creation, listing and removal through a shared `MemFs` is safe. A file's
//! content is swapped under the same node lock, but the engine only ever has
//! one stream open per path; interleaving two writers on one file is not
//! meaningful.

use super::{DirEntry, FileInfo, ReadFs, WriteFs};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_DIR_MODE: u32 = 0o755;
const DEFAULT_FILE_MODE: u32 = 0o644;
const TEMP_DIR: &str = "tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Directory,
    File,
}

#[derive(Debug)]
struct Node {
    name: String,
    kind: NodeKind,
    inner: Mutex<NodeInner>,
}

#[derive(Debug, Default)]
struct NodeInner {
    mode: u32,
    /// Children in creation order
    children: Vec<Arc<Node>>,
    index: HashMap<String, Arc<Node>>,
    data: Vec<u8>,
}

impl Node {
    fn new(name: &str, kind: NodeKind, mode: u32) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind,
            inner: Mutex::new(NodeInner {
                mode,
                ..NodeInner::default()
            }),
        })
    }

    fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    fn info(&self) -> FileInfo {
        let inner = self.inner.lock();
        FileInfo {
            name: self.name.clone(),
            is_dir: self.is_dir(),
            size: inner.data.len() as u64,
            mode: inner.mode,
        }
    }

    fn child(&self, name: &str) -> Option<Arc<Node>> {
        self.inner.lock().index.get(name).cloned()
    }
}

/// Thread-safe in-memory tree
#[derive(Debug, Clone)]
pub struct MemFs {
    root: Arc<Node>,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a path into normal components
///
/// Accepts `/` and `\` separators, ignores empty and `.` components and
/// rejects `..`. The root itself splits into an empty list.
fn split_path(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(Error::InvalidPath("empty path".to_string()));
    }
    let mut names = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(Error::InvalidPath(format!("invalid relative path: {}", path)));
            }
            name => names.push(name),
        }
    }
    Ok(names)
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

struct MemWriter {
    node: Arc<Node>,
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.node.inner.lock().data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl MemFs {
    pub fn new() -> Self {
        Self {
            root: Node::new("", NodeKind::Directory, DEFAULT_DIR_MODE),
        }
    }

    /// Walk to the node named by `names`, creating directories when asked
    fn navigate(&self, names: &[&str], create: bool, mode: u32) -> Result<Arc<Node>> {
        let mut current = Arc::clone(&self.root);
        for (i, name) in names.iter().enumerate() {
            if !current.is_dir() {
                return Err(Error::InvalidPath(format!(
                    "not a directory: {}",
                    names[..i].join("/")
                )));
            }
            let next = {
                let mut inner = current.inner.lock();
                match inner.index.get(*name) {
                    Some(node) => Arc::clone(node),
                    None if create => {
                        let node = Node::new(name, NodeKind::Directory, mode);
                        inner.children.push(Arc::clone(&node));
                        inner.index.insert(name.to_string(), Arc::clone(&node));
                        node
                    }
                    None => return Err(Error::NotFound(names[..=i].join("/"))),
                }
            };
            current = next;
        }
        Ok(current)
    }

    fn lookup(&self, path: &str) -> Result<Arc<Node>> {
        let names = split_path(path)?;
        self.navigate(&names, false, DEFAULT_DIR_MODE)
    }

    /// Resolve the parent directory and the final component of `path`
    fn parent_of<'a>(&self, path: &'a str) -> Result<(Arc<Node>, &'a str)> {
        let names = split_path(path)?;
        let Some((base, parents)) = names.split_last() else {
            return Err(Error::InvalidPath(format!("no parent: {}", path)));
        };
        let parent = self.navigate(parents, false, DEFAULT_DIR_MODE)?;
        if !parent.is_dir() {
            return Err(Error::InvalidPath(format!("not a directory: {}", parents.join("/"))));
        }
        Ok((parent, base))
    }

    fn open_file(&self, path: &Path, truncate: bool) -> Result<Box<dyn Write + '_>> {
        let path = path_str(path);
        let (parent, base) = self.parent_of(&path)?;
        let node = {
            let mut inner = parent.inner.lock();
            match inner.index.get(base) {
                Some(node) if node.is_dir() => {
                    return Err(Error::InvalidPath(format!("is a directory: {}", path)));
                }
                Some(node) => Arc::clone(node),
                None => {
                    let node = Node::new(base, NodeKind::File, DEFAULT_FILE_MODE);
                    inner.children.push(Arc::clone(&node));
                    inner.index.insert(base.to_string(), Arc::clone(&node));
                    node
                }
            }
        };
        if truncate {
            node.inner.lock().data.clear();
        }
        Ok(Box::new(MemWriter { node }))
    }

    fn remove(&self, path: &Path, recursive: bool) -> Result<()> {
        let path = path_str(path);
        let (parent, base) = match self.parent_of(&path) {
            Ok(found) => found,
            Err(e) if recursive && e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        let mut inner = parent.inner.lock();
        let Some(node) = inner.index.get(base).cloned() else {
            if recursive {
                return Ok(());
            }
            return Err(Error::NotFound(path));
        };
        if !recursive && node.is_dir() && !node.inner.lock().children.is_empty() {
            return Err(Error::InvalidPath(format!("directory not empty: {}", path)));
        }
        inner.index.remove(base);
        inner.children.retain(|child| !Arc::ptr_eq(child, &node));
        Ok(())
    }

    /// Write a file, creating parent directories as needed
    pub fn insert_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let p = Path::new(path);
        if let Some(parent) = p.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.mkdir_all(parent, DEFAULT_DIR_MODE)?;
        }
        super::write_file(self, p, data)
    }

    /// All file paths in the tree, sorted, `/`-separated without a leading slash
    pub fn file_paths(&self) -> Vec<String> {
        fn walk(node: &Node, prefix: &str, out: &mut Vec<String>) {
            let children = node.inner.lock().children.clone();
            for child in children {
                let path = if prefix.is_empty() {
                    child.name.clone()
                } else {
                    format!("{}/{}", prefix, child.name)
                };
                if child.is_dir() {
                    walk(&child, &path, out);
                } else {
                    out.push(path);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.root, "", &mut out);
        out.sort();
        out
    }
}

impl WriteFs for MemFs {
    fn stat(&self, path: &Path) -> Result<FileInfo> {
        Ok(self.lookup(&path_str(path))?.info())
    }

    fn mkdir_all(&self, path: &Path, mode: u32) -> Result<()> {
        let path = path_str(path);
        let names = split_path(&path)?;
        let node = self.navigate(&names, true, mode)?;
        if !node.is_dir() {
            return Err(Error::InvalidPath(format!("not a directory: {}", path)));
        }
        node.inner.lock().mode = mode;
        Ok(())
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        let path = path_str(path);
        let node = self.lookup(&path)?;
        if node.is_dir() {
            return Err(Error::InvalidPath(format!("is a directory: {}", path)));
        }
        // Readers get a snapshot so they don't observe later writes
        let data = node.inner.lock().data.clone();
        Ok(Box::new(Cursor::new(data)))
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + '_>> {
        self.open_file(path, true)
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn Write + '_>> {
        self.open_file(path, false)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove(path, false)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        self.remove(path, true)
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<FileInfo>> {
        let path = path_str(path);
        let node = self.lookup(&path)?;
        if !node.is_dir() {
            return Err(Error::InvalidPath(format!("not a directory: {}", path)));
        }
        let children = node.inner.lock().children.clone();
        Ok(children.iter().map(|child| child.info()).collect())
    }

    /// Creates `/tmp/<prefix><n>` inside this tree, `n` being the first free index
    fn make_temp_dir(&self, prefix: &str) -> Result<PathBuf> {
        let mut n = 0u32;
        loop {
            let path = PathBuf::from(format!("/{}/{}{}", TEMP_DIR, prefix, n));
            if super::try_stat(self, &path)?.is_none() {
                self.mkdir_all(&path, 0o700)?;
                return Ok(path);
            }
            n += 1;
        }
    }
}

impl ReadFs for MemFs {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let node = self.lookup(path)?;
        if node.is_dir() {
            return Err(Error::InvalidPath(format!("not a file: {}", path)));
        }
        let data = node.inner.lock().data.clone();
        Ok(data)
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let node = self.lookup(path)?;
        if !node.is_dir() {
            return Err(Error::InvalidPath(format!("not a directory: {}", path)));
        }
        let children = node.inner.lock().children.clone();
        Ok(children
            .iter()
            .map(|child| DirEntry {
                name: child.name.clone(),
                is_dir: child.is_dir(),
            })
            .collect())
    }
}
