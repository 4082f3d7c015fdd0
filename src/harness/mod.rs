//! # Test Harness
//!
//! Produces reference results for the library's numeric tests. A suite is a
//! list of cases written as typed steps (see [`suite`]); each case runs in a
//! fresh [`Evaluator`] backed by a scalar autograd [`Tape`], and its captured
//! results are written to `<case name>_output.json`.
//!
//! Steps are data, not code: the evaluator only knows how to construct
//! values, combine them with a fixed set of operators, and back-propagate.

pub mod suite;
mod eval;
mod tape;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::storage::{Artifact, ArtifactError};

pub use eval::{run_case, Evaluator, StepError};
pub use suite::{Operand, Step, TestCase, TestSuite};
pub use tape::{BinaryOp, NodeId, Tape, UnaryOp};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Failed to read test suite {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse test suite: {0}")]
    Parse(String),

    #[error("Invalid test case name: {0:?}")]
    InvalidCaseName(String),

    #[error("Test case {case}, step {step}")]
    Step {
        case: String,
        step: usize,
        #[source]
        source: StepError,
    },

    #[error("Test case {case}, results")]
    Capture {
        case: String,
        #[source]
        source: StepError,
    },

    #[error("Failed to serialize results: {0}")]
    Serialize(String),

    #[error(transparent)]
    Write(#[from] ArtifactError),
}

/// Runs every case and writes one output file per case into `out_dir`,
/// returning the written paths in case order
pub fn run_suite(suite: &TestSuite, out_dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let mut written = Vec::with_capacity(suite.cases.len());

    for case in &suite.cases {
        let captured = run_case(case)?;

        let artifact = Artifact::new(out_dir.join(case.output_file_name()));
        artifact.write(&to_json(&captured)?)?;
        info!(case = %case.name, results = captured.len(), path = %artifact.path().display(), "wrote case results");

        written.push(artifact.path().to_path_buf());
    }

    Ok(written)
}

/// Pretty JSON with four-space indentation
fn to_json<T: Serialize>(value: &T) -> Result<String, HarnessError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| HarnessError::Serialize(e.to_string()))?;

    String::from_utf8(buf).map_err(|e| HarnessError::Serialize(e.to_string()))
}
