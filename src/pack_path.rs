use std::fmt;
use std::path::{Path, PathBuf};

use crate::PackError;

/// Normalized, `/`-rooted path inside a shader pack's virtual filesystem.
///
/// Two paths compare equal iff their normalized strings are equal, which makes this
/// usable as a graph key. Instances only come out of the validating constructors.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbsolutePackPath(String);

impl AbsolutePackPath {
    pub fn root() -> Self {
        AbsolutePackPath("/".to_string())
    }

    /// Parse and normalize an absolute path.
    ///
    /// Empty and `.` segments are dropped, `..` pops one segment and is ignored at the root.
    pub fn from_absolute_path(path: &str) -> Result<Self, PackError> {
        if !path.starts_with('/') {
            return Err(PackError::InvalidPath {
                path: path.to_string(),
                reason: "pack paths must start with '/'",
            });
        }

        Ok(Self::normalize(path))
    }

    fn normalize(path: &str) -> Self {
        let mut segments: Vec<&str> = Vec::new();

        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    let _ = segments.pop();
                }
                _ => segments.push(segment),
            }
        }

        AbsolutePackPath(format!("/{}", segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }

        match self.0.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(AbsolutePackPath(self.0[..idx].to_string())),
        }
    }

    /// Resolve `relative` against this path.
    ///
    /// A leading `/` makes `relative` absolute. Otherwise the base is guessed: if the last
    /// segment contains a dot past its first character, `self` is taken to be a file and its
    /// parent is used; otherwise `self` is taken to be a directory. A directory named
    /// `lib.assets` is misclassified; use [`join`](Self::join) when the base is known.
    pub fn resolve(&self, relative: &str) -> Result<Self, PackError> {
        if relative.starts_with('/') {
            return Self::from_absolute_path(relative);
        }

        let looks_like_file = self
            .file_name()
            .and_then(|name| name.rfind('.'))
            .map_or(false, |dot| dot > 0);

        if looks_like_file {
            match self.parent() {
                Some(parent) => parent.join(relative),
                None => Self::root().join(relative),
            }
        } else {
            self.join(relative)
        }
    }

    /// Resolve `relative` treating `self` as a directory.
    pub fn join(&self, relative: &str) -> Result<Self, PackError> {
        if relative.is_empty() {
            return Err(PackError::InvalidPath {
                path: relative.to_string(),
                reason: "empty relative path",
            });
        }

        if relative.starts_with('/') {
            return Self::from_absolute_path(relative);
        }

        Ok(Self::normalize(&format!("{}/{}", self.0, relative)))
    }

    /// Map onto the real filesystem below `root`.
    pub fn resolved(&self, root: &Path) -> PathBuf {
        if self.is_root() {
            return root.to_path_buf();
        }

        self.0[1..]
            .split('/')
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
    }
}

impl fmt::Display for AbsolutePackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AbsolutePackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
