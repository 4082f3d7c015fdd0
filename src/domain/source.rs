//! Where fragment text comes from
//!
//! Include classification asks "does this path name a file?", and loading asks
//! for a file's text. Both go through [`FragmentSource`] so the graph and sort
//! logic can run against an in-memory tree.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::fragment::normalize_path;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read fragment {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read access to a tree of fragment files
pub trait FragmentSource {
    /// Returns true if `path` names an existing regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Reads the full text of the file at `path`
    fn read_to_string(&self, path: &Path) -> Result<String, SourceError>;
}

/// An in-memory file tree
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, builder style
    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Adds or replaces a file
    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize_path(path.as_ref()), text.into());
    }
}

impl FragmentSource for MemorySource {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, SourceError> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| SourceError::Read {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            })
    }
}
