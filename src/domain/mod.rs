//! Domain models for header amalgamation
//!
//! Contains the include parsing, dependency graph and ordering logic. File
//! access goes through [`FragmentSource`], so nothing here touches the disk
//! directly.

mod fragment;
mod source;
mod include;
mod graph;
mod amalgam;

pub use fragment::{normalize_path, tree_root, Fragment, FragmentId};
pub use source::{FragmentSource, MemorySource, SourceError};
pub use include::{parse_directive, Delimiter, IncludeKind, IncludeRef, IncludeScanner};
pub use graph::{DependencyGraph, GraphError, IncludeSite};
pub use amalgam::{
    AmalgamError, Amalgamation, Amalgamator, FragmentReport, PROVENANCE_PREFIX, SECTION_SEPARATOR,
};
