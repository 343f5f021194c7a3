// src/manifest/modules_txt.rs

//! Line-surgical edits of `vendor/modules.txt`
//!
//! The file is a sequence of blocks. Each block starts with a header line
//! `# <module> <version>` and is followed by an optional marker line
//! (`## explicit`, or `## explicit; go 1.17` in newer toolchains) and the
//! module's package paths:
//!
//! ```text
//! # example.org/lib v1.2.0
//! ## explicit
//! example.org/lib
//! ```
//!
//! Edits only ever touch the target module's block. Every other byte,
//! including `\r\n` line endings and trailing whitespace, is preserved.

/// Marker line written for freshly added or collapsed blocks
pub const EXPLICIT_MARKER: &str = "## explicit";

fn is_header(line: &str) -> bool {
    line.starts_with("# ")
}

fn is_explicit_marker(line: &str) -> bool {
    let line = line.trim();
    line == EXPLICIT_MARKER || line.starts_with("## explicit;")
}

/// Line terminator of `line` as produced by `split_inclusive('\n')`
fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Module path named by a block header, if `line` is one
pub fn header_module(line: &str) -> Option<&str> {
    if !is_header(line) {
        return None;
    }
    line[2..].split_whitespace().next()
}

/// Set `module` to `version` in the listing `content`
///
/// - No block for `module`: a three line block (header, explicit marker,
///   module path) is appended at the end.
/// - Block followed by an explicit marker: only the header line changes.
/// - Block with a per-package list: the list is replaced in place by the
///   explicit marker and the module path, and the header is bumped.
pub fn merge_module(content: &str, module: &str, version: &str) -> String {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let prefix = format!("# {} ", module);

    let Some(idx) = lines.iter().position(|l| l.starts_with(&prefix)) else {
        return append_block(content, module, version);
    };

    let header_eol = line_ending(lines[idx]);
    let eol = if header_eol.is_empty() { "\n" } else { header_eol };
    let mut out = String::with_capacity(content.len() + 64);
    out.extend(lines[..idx].iter().copied());

    if lines.get(idx + 1).is_some_and(|l| is_explicit_marker(l)) {
        out.push_str(&prefix);
        out.push_str(version);
        out.push_str(header_eol);
        out.extend(lines[idx + 1..].iter().copied());
        return out;
    }

    // Detailed listing: drop everything up to the next block header
    let end = lines[idx + 1..]
        .iter()
        .position(|l| is_header(l))
        .map_or(lines.len(), |p| idx + 1 + p);
    let tail_eol = if end == lines.len() {
        lines.last().map_or(header_eol, |l| line_ending(l))
    } else {
        eol
    };

    out.push_str(&prefix);
    out.push_str(version);
    out.push_str(eol);
    out.push_str(EXPLICIT_MARKER);
    out.push_str(eol);
    out.push_str(module);
    out.push_str(tail_eol);
    out.extend(lines[end..].iter().copied());
    out
}

fn append_block(content: &str, module: &str, version: &str) -> String {
    let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let mut out = String::with_capacity(content.len() + 64);
    out.push_str(content);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(eol);
    }
    out.push_str(&format!("# {} {}{}", module, version, eol));
    out.push_str(EXPLICIT_MARKER);
    out.push_str(eol);
    out.push_str(module);
    out.push_str(eol);
    out
}

/// Keep only the blocks whose module satisfies `keep`
///
/// Lines before the first block header are kept as they are.
pub fn retain_modules(content: &str, keep: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(content.len());
    let mut keeping = true;
    for line in content.split_inclusive('\n') {
        if let Some(module) = header_module(line) {
            keeping = keep(module);
        } else if is_header(line) {
            keeping = false;
        }
        if keeping {
            out.push_str(line);
        }
    }
    out
}

/// Module paths of all blocks, in file order
pub fn modules(content: &str) -> Vec<&str> {
    content.lines().filter_map(header_module).collect()
}
