use std::path::{Path, PathBuf};

use crate::{AbsolutePackPath, BoxedIncludeProviderError};

/// User-supplied pack file reader
pub trait IncludeProvider {
    /// Read the file at `path`, split into lines without terminators.
    fn read_lines(
        &mut self,
        path: &AbsolutePackPath,
    ) -> Result<Vec<String>, BoxedIncludeProviderError>;
}

/// Reads pack files from a directory on disk.
pub struct FileSystemIncludeProvider {
    root: PathBuf,
}

impl FileSystemIncludeProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl IncludeProvider for FileSystemIncludeProvider {
    fn read_lines(
        &mut self,
        path: &AbsolutePackPath,
    ) -> Result<Vec<String>, BoxedIncludeProviderError> {
        let text = std::fs::read_to_string(path.resolved(&self.root))?;
        Ok(text.lines().map(str::to_owned).collect())
    }
}
