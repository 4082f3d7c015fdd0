//! Header Amalgam - single-header builder for header-only libraries
//!
//! Reads a declared list of header fragments, orders them so every fragment
//! follows the fragments it includes, strips the now-redundant local
//! `#include` lines and concatenates the result into one self-contained
//! header. External includes such as `<vector>` are kept as written.

pub mod domain;
pub mod storage;
pub mod harness;
pub mod cli;

pub use domain::{AmalgamError, Amalgamation, Amalgamator, FragmentSource, MemorySource};
pub use storage::{Artifact, FsSource};
