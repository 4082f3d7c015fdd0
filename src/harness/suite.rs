//! Test-suite schema
//!
//! A suite is a JSON array of cases. Each case is a list of typed steps and
//! the names whose values should be captured once the steps have run:
//!
//! ```json
//! [
//!   {
//!     "name": "test_add_value",
//!     "steps": [
//!       { "op": "value", "name": "a", "data": 64 },
//!       { "op": "value", "name": "b", "data": 8 },
//!       { "op": "binary", "name": "c", "operator": "add", "lhs": "a", "rhs": "b" },
//!       { "op": "backward", "target": "c" }
//!     ],
//!     "results": ["a", "b", "c"]
//!   }
//! ]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::tape::{BinaryOp, UnaryOp};
use super::HarnessError;

/// Input to an operation: a previously bound name, or a constant that is
/// recorded as a fresh leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Constant(f64),
    Name(String),
}

/// One typed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Binds a tracked value
    Value { name: String, data: f64 },

    /// Binds a plain JSON value that is reported verbatim
    Literal { name: String, value: serde_json::Value },

    Binary {
        name: String,
        operator: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },

    Pow {
        name: String,
        base: Operand,
        exponent: f64,
    },

    Unary {
        name: String,
        operator: UnaryOp,
        arg: Operand,
    },

    /// Back-propagates from a tracked value
    Backward { target: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Names to capture after the steps run
    #[serde(default)]
    pub results: Vec<String>,
}

impl TestCase {
    /// File the case's captured results are written to
    pub fn output_file_name(&self) -> String {
        format!("{}_output.json", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestSuite {
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    /// Parses suite JSON
    pub fn parse(json: &str) -> Result<Self, HarnessError> {
        let suite: Self = serde_json::from_str(json).map_err(|e| HarnessError::Parse(e.to_string()))?;

        for case in &suite.cases {
            if case.name.is_empty() || case.name.contains(['/', '\\']) {
                return Err(HarnessError::InvalidCaseName(case.name.clone()));
            }
        }

        Ok(suite)
    }

    /// Loads a suite from disk
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let json = fs::read_to_string(path).map_err(|source| HarnessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_suite() {
        let json = r#"[
            {
                "name": "test_add_constant",
                "steps": [
                    { "op": "value", "name": "a", "data": 64 },
                    { "op": "binary", "name": "b", "operator": "add", "lhs": "a", "rhs": 8.9 },
                    { "op": "unary", "name": "t", "operator": "tanh", "arg": "b" },
                    { "op": "pow", "name": "p", "base": "t", "exponent": 2 },
                    { "op": "literal", "name": "label", "value": "sum" },
                    { "op": "backward", "target": "b" }
                ],
                "results": ["a", "b"]
            }
        ]"#;

        let suite = TestSuite::parse(json).unwrap();
        let case = &suite.cases[0];

        assert_eq!(case.name, "test_add_constant");
        assert_eq!(case.steps.len(), 6);
        assert_eq!(
            case.steps[1],
            Step::Binary {
                name: "b".to_string(),
                operator: BinaryOp::Add,
                lhs: Operand::Name("a".to_string()),
                rhs: Operand::Constant(8.9),
            }
        );
        assert_eq!(case.results, vec!["a", "b"]);
        assert_eq!(case.output_file_name(), "test_add_constant_output.json");
    }

    #[test]
    fn results_default_to_empty() {
        let suite = TestSuite::parse(r#"[{ "name": "noop" }]"#).unwrap();
        assert!(suite.cases[0].steps.is_empty());
        assert!(suite.cases[0].results.is_empty());
    }

    #[test]
    fn unknown_op_is_rejected() {
        let err = TestSuite::parse(r#"[{ "name": "x", "steps": [{ "op": "exec", "code": "a = 1" }] }]"#)
            .unwrap_err();
        assert!(matches!(err, HarnessError::Parse(_)));
    }

    #[test]
    fn path_like_case_name_is_rejected() {
        let err = TestSuite::parse(r#"[{ "name": "../escape" }]"#).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidCaseName(_)));
    }
}
