// src/archive/mod.rs

//! Archive codec
//!
//! Packed source trees travel as gzip-compressed tar streams. [`ArchiveWriter`]
//! produces them from a directory (with filtering and path prefixing) and
//! [`ArchiveFs`] reads them back as a [`crate::fs::ReadFs`].

mod reader;
mod writer;

pub use reader::{ArchiveFs, encode_base64};
pub use writer::{ArchiveWriter, IncludeFn, TreeOptions};

use crate::error::{Result, ResultExt};
use flate2::{Compression, write::GzEncoder};
use std::io::Write;
use std::path::Path;

/// Serialize the tree under `src` into `out` as a gzip-compressed archive
pub fn serialize<W: Write>(src: &Path, out: W, opts: &TreeOptions<'_>) -> Result<W> {
    let mut writer = ArchiveWriter::new(GzEncoder::new(out, Compression::default()));
    writer.append_tree(src, opts)?;
    writer.finish()?.finish().context("finishing gzip stream")
}
