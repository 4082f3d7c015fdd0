//! Test-harness command

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use super::output::Output;
use crate::harness::{run_suite, TestSuite};

/// Runs a suite and writes `<case>_output.json` files into `out_dir`
pub fn run(output: &Output, suite_path: &Path, out_dir: &Path) -> Result<()> {
    let suite = TestSuite::load(suite_path)?;
    let written = run_suite(&suite, out_dir)
        .with_context(|| format!("Failed to run test suite: {}", suite_path.display()))?;

    if output.is_json() {
        let files: Vec<_> = written.iter().map(|p| p.display().to_string()).collect();
        output.data(&json!({ "cases": suite.cases.len(), "files": files }));
    } else {
        for path in &written {
            output.row(&[path.display().to_string().as_str()]);
        }
        output.success(&format!("Ran {} test cases", suite.cases.len()));
    }

    Ok(())
}
