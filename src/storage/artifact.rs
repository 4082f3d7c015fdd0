//! Output artifact writing
//!
//! The artifact is always fully rewritten. Content goes to a sibling temp file
//! first and is renamed over the target, so a failed write leaves either the
//! previous artifact or nothing, never a partial file.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to create directory: {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to rename {} to {}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single output file
#[derive(Debug, Clone)]
pub struct Artifact {
    path: PathBuf,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the temp file used while writing
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Replaces the artifact's contents
    pub fn write(&self, contents: &str) -> Result<(), ArtifactError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ArtifactError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp_path = self.temp_path();
        if let Err(source) = write_file(&temp_path, contents) {
            let _ = fs::remove_file(&temp_path);
            return Err(ArtifactError::Write {
                path: temp_path,
                source,
            });
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            ArtifactError::Rename {
                from: temp_path.clone(),
                to: self.path.clone(),
                source,
            }
        })?;

        debug!(path = %self.path.display(), bytes = contents.len(), "wrote artifact");
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    let mut writer = BufWriter::new(file);
    writer.write_all(contents.as_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()
}
