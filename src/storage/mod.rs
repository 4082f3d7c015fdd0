//! # Storage Layer
//!
//! Everything that touches the file system: reading fragments, loading the
//! build manifest and writing the output artifact.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Manifest | TOML | `amalgam.toml` (nearest ancestor of the working directory) |
//! | Fragments | Header text | `base_dir` + declared path |
//! | Artifact | Header text | `output` (default `amalgamated.h`) |
//!
//! ## Write Safety
//!
//! - [`Artifact`] writes through a temp file and an atomic rename
//! - A run that fails before rendering never touches the artifact
//!
//! ## Key Types
//!
//! - [`FsSource`] - [`crate::domain::FragmentSource`] over the local disk
//! - [`Artifact`] - The single output file
//! - [`Manifest`] / [`BuildConfig`] - Configuration

mod fs_source;
mod artifact;
mod config;

pub use fs_source::FsSource;
pub use artifact::{Artifact, ArtifactError};
pub use config::{BuildConfig, ConfigError, Manifest, Overrides, DEFAULT_OUTPUT, MANIFEST_FILE};
