//! Step evaluator

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use thiserror::Error;

use super::suite::{Operand, Step, TestCase};
use super::tape::{NodeId, Tape};
use super::HarnessError;

#[derive(Debug, Error, PartialEq)]
pub enum StepError {
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Variable {0} is a literal, not a tracked value")]
    NotTracked(String),

    /// JSON has no encoding for infinities or NaN
    #[error("Result {0} is not a finite number")]
    NonFinite(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Binding {
    Tracked(NodeId),
    Plain(Value),
}

/// Evaluation context for one test case
#[derive(Debug, Default)]
pub struct Evaluator {
    tape: Tape,
    bindings: HashMap<String, Binding>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one step. Rebinding an existing name replaces it.
    pub fn apply(&mut self, step: &Step) -> Result<(), StepError> {
        match step {
            Step::Value { name, data } => {
                let id = self.tape.leaf(*data);
                self.bind(name, Binding::Tracked(id));
            }
            Step::Literal { name, value } => {
                self.bind(name, Binding::Plain(value.clone()));
            }
            Step::Binary { name, operator, lhs, rhs } => {
                let lhs = self.operand(lhs)?;
                let rhs = self.operand(rhs)?;
                let id = self.tape.binary(*operator, lhs, rhs);
                self.bind(name, Binding::Tracked(id));
            }
            Step::Pow { name, base, exponent } => {
                let base = self.operand(base)?;
                let id = self.tape.pow(base, *exponent);
                self.bind(name, Binding::Tracked(id));
            }
            Step::Unary { name, operator, arg } => {
                let arg = self.operand(arg)?;
                let id = self.tape.unary(*operator, arg);
                self.bind(name, Binding::Tracked(id));
            }
            Step::Backward { target } => {
                let id = self.tracked(target)?;
                self.tape.backward(id);
            }
        }
        Ok(())
    }

    /// Captures the requested names. Tracked values become `{data, grad}`,
    /// literals are copied; names never bound are skipped. A tracked value
    /// whose data or gradient is infinite or NaN is an error.
    pub fn capture(&self, results: &[String]) -> Result<Map<String, Value>, StepError> {
        let mut captured = Map::new();

        for name in results {
            let value = match self.bindings.get(name) {
                Some(Binding::Tracked(id)) => {
                    let (data, grad) = (self.tape.data(*id), self.tape.grad(*id));
                    if !data.is_finite() || !grad.is_finite() {
                        return Err(StepError::NonFinite(name.clone()));
                    }
                    json!({ "data": data, "grad": grad })
                }
                Some(Binding::Plain(value)) => value.clone(),
                None => continue,
            };
            captured.insert(name.clone(), value);
        }

        Ok(captured)
    }

    fn bind(&mut self, name: &str, binding: Binding) {
        self.bindings.insert(name.to_string(), binding);
    }

    fn tracked(&self, name: &str) -> Result<NodeId, StepError> {
        match self.bindings.get(name) {
            Some(Binding::Tracked(id)) => Ok(*id),
            Some(Binding::Plain(_)) => Err(StepError::NotTracked(name.to_string())),
            None => Err(StepError::UnknownVariable(name.to_string())),
        }
    }

    fn operand(&mut self, operand: &Operand) -> Result<NodeId, StepError> {
        match operand {
            Operand::Constant(value) => Ok(self.tape.leaf(*value)),
            Operand::Name(name) => self.tracked(name),
        }
    }
}

/// Runs one case in a fresh evaluator and returns its captured results.
/// Step failures carry the 1-based index of the failing step.
pub fn run_case(case: &TestCase) -> Result<Map<String, Value>, HarnessError> {
    let mut evaluator = Evaluator::new();

    for (index, step) in case.steps.iter().enumerate() {
        evaluator.apply(step).map_err(|source| HarnessError::Step {
            case: case.name.clone(),
            step: index + 1,
            source,
        })?;
    }

    evaluator.capture(&case.results).map_err(|source| HarnessError::Capture {
        case: case.name.clone(),
        source,
    })
}
