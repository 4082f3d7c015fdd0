//! Disk-backed fragment source

use std::fs;
use std::path::Path;

use tracing::trace;

use crate::domain::{FragmentSource, SourceError};

/// Reads fragments from the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FsSource {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentSource for FsSource {
    fn is_file(&self, path: &Path) -> bool {
        let found = path.is_file();
        trace!(path = %path.display(), found, "probing include target");
        found
    }

    fn read_to_string(&self, path: &Path) -> Result<String, SourceError> {
        fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}
