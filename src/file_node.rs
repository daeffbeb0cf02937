use std::collections::BTreeMap;

use crate::{AbsolutePackPath, PackError};

const INCLUDE_TOKEN: &str = "#include";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Immutable snapshot of one pack file, with its `#include` lines already resolved.
#[derive(Clone, Debug)]
pub struct FileNode {
    path: AbsolutePackPath,
    lines: Vec<String>,
    /// 0-based line index -> included file
    includes: BTreeMap<usize, AbsolutePackPath>,
}

impl FileNode {
    /// Build a node, scanning `lines` for include directives.
    ///
    /// Include targets are resolved against the directory containing `path`. A line
    /// whose target does not resolve is kept as ordinary text. A UTF-8 byte order mark
    /// at the start of the file is dropped.
    pub fn from_lines(path: AbsolutePackPath, mut lines: Vec<String>) -> Result<Self, PackError> {
        if let Some(first) = lines.first_mut() {
            if first.starts_with(BYTE_ORDER_MARK) {
                first.remove(0);
            }
        }

        let dir = path
            .parent()
            .ok_or_else(|| PackError::NoParent { path: path.clone() })?;

        let includes = lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                let target = parse_include_target(line)?;
                dir.join(target).ok().map(|resolved| (idx, resolved))
            })
            .collect();

        Ok(Self {
            path,
            lines,
            includes,
        })
    }

    pub fn path(&self) -> &AbsolutePackPath {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn includes(&self) -> &BTreeMap<usize, AbsolutePackPath> {
        &self.includes
    }

    pub fn include_at(&self, line: usize) -> Option<&AbsolutePackPath> {
        self.includes.get(&line)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn parse_include_target(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix(INCLUDE_TOKEN)?.trim();
    let rest = rest.strip_prefix('"').unwrap_or(rest);
    let rest = rest.strip_suffix('"').unwrap_or(rest);
    Some(rest)
}
