//! Build configuration
//!
//! A build is described by an optional `amalgam.toml` manifest, found by
//! walking up from the current directory, plus command-line overrides.
//! Relative paths in the manifest resolve against the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

/// Manifest file name looked up during discovery
pub const MANIFEST_FILE: &str = "amalgam.toml";

/// Output path used when neither the manifest nor the CLI names one
pub const DEFAULT_OUTPUT: &str = "amalgamated.h";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Contents of an `amalgam.toml` manifest
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Directory declared fragment paths are relative to
    pub base_dir: Option<PathBuf>,

    /// Where the amalgamated header is written
    pub output: Option<PathBuf>,

    /// Fragments in declaration order
    pub fragment_paths: Vec<String>,
}

impl Manifest {
    /// Parses manifest TOML
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    /// Finds the nearest manifest at or above `start`
    pub fn find(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(MANIFEST_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

/// Command-line values that take precedence over the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub fragment_paths: Vec<String>,
    pub base_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub base_dir: PathBuf,
    pub output: PathBuf,
    pub fragment_paths: Vec<String>,

    /// Manifest the settings came from, if any
    pub manifest: Option<PathBuf>,
}

impl BuildConfig {
    /// Resolves settings from CLI overrides and, when needed, a manifest.
    ///
    /// An explicit `config` path is always loaded. Otherwise the manifest is
    /// discovered from `cwd` only when no fragments were given on the
    /// command line.
    pub fn load(config: Option<&Path>, overrides: Overrides, cwd: &Path) -> Result<Self> {
        let manifest_path = match config {
            Some(path) => Some(path.to_path_buf()),
            None if overrides.fragment_paths.is_empty() => Manifest::find(cwd),
            None => None,
        };

        let manifest = match &manifest_path {
            Some(path) => Some((path.as_path(), Manifest::load(path)?)),
            None => None,
        };

        Ok(Self::resolve(manifest, overrides)?)
    }

    /// Merges a loaded manifest with overrides
    pub fn resolve(manifest: Option<(&Path, Manifest)>, overrides: Overrides) -> Result<Self, ConfigError> {
        let (manifest_path, manifest) = match manifest {
            Some((path, manifest)) => (Some(path.to_path_buf()), manifest),
            None => (None, Manifest::default()),
        };
        let manifest_dir = manifest_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let base_dir = match (overrides.base_dir, manifest.base_dir) {
            (Some(dir), _) => dir,
            (None, Some(dir)) => manifest_dir.join(dir),
            (None, None) => manifest_dir.clone(),
        };

        let output = match (overrides.output, manifest.output) {
            (Some(path), _) => path,
            (None, Some(path)) => manifest_dir.join(path),
            (None, None) => manifest_dir.join(DEFAULT_OUTPUT),
        };

        let fragment_paths = if overrides.fragment_paths.is_empty() {
            manifest.fragment_paths
        } else {
            overrides.fragment_paths
        };

        if fragment_paths.is_empty() {
            return Err(ConfigError::Invalid(match manifest_path {
                Some(path) => format!("{} declares no fragment_paths", path.display()),
                None => format!("no fragments given and no {MANIFEST_FILE} found"),
            }));
        }

        if let Some(blank) = fragment_paths.iter().position(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "fragment_paths entry {} is empty",
                blank + 1
            )));
        }

        Ok(Self {
            base_dir,
            output,
            fragment_paths,
            manifest: manifest_path,
        })
    }
}
