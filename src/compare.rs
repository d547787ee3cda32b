//! Tolerance-aware comparison of solver answers against expected values.
//!
//! This is the only place that decides whether an answer is correct. It is
//! pure: no I/O, no logging.
use crate::schema::{ExpectedValue, SolverOutput};
use serde_json::Value;
use std::fmt::Display;

/// Compare `observed` (as reported for state `label`) with `expected`.
///
/// Floats are accepted inside an inclusive window: `[(1-p)e, (1+p)e]` in
/// relative mode, `[e - p/2, e + p/2]` otherwise. Any other pair must be
/// equal. A type mismatch is always incorrect; a missing value is an error.
///
/// JSON has a single number type, so an integer answer such as `1` is
/// compared as the float `1.0` and can match a float expectation.
pub fn compare(
    label: &str,
    observed: &Value,
    expected: &ExpectedValue,
    precision: f64,
    relative: bool,
) -> SolverOutput {
    if observed.is_null() {
        return SolverOutput::error(format!("{label}: No value present"));
    }
    match (observed, expected) {
        (Value::Number(number), ExpectedValue::Float(expected)) => {
            let Some(value) = number.as_f64() else {
                return type_mismatch(label, observed, "float");
            };
            let (lower, upper) = tolerance_window(*expected, precision, relative);
            if lower <= value && value <= upper {
                SolverOutput::correct(format!(
                    "{label}: Value {value} within bounds {lower}, {upper}"
                ))
            } else {
                SolverOutput::incorrect(format!(
                    "{label}: Value {value} outside bounds {lower}, {upper}"
                ))
            }
        }
        (Value::Bool(value), ExpectedValue::Bool(expected)) => {
            equality_output(label, value, expected, value == expected)
        }
        (Value::String(value), ExpectedValue::Text(expected)) => {
            equality_output(label, value, expected, value == expected)
        }
        _ => type_mismatch(label, observed, expected.type_name()),
    }
}

/// Inclusive acceptance window for a float expectation.
pub fn tolerance_window(expected: f64, precision: f64, relative: bool) -> (f64, f64) {
    if relative {
        let a = (1.0 - precision) * expected;
        let b = (1.0 + precision) * expected;
        // negative expectations flip the ends
        (a.min(b), a.max(b))
    } else {
        (expected - precision / 2.0, expected + precision / 2.0)
    }
}

fn equality_output(
    label: &str,
    observed: &dyn Display,
    expected: &dyn Display,
    equal: bool,
) -> SolverOutput {
    if equal {
        SolverOutput::correct(format!("{label}: Got expected value {expected}"))
    } else {
        SolverOutput::incorrect(format!("{label}: Expected {expected} but got {observed}"))
    }
}

fn type_mismatch(label: &str, observed: &Value, expected_type: &str) -> SolverOutput {
    SolverOutput::incorrect(format!(
        "{label}: Expected type {expected_type} but got {}",
        json_type_name(observed)
    ))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
#[path = "compare_tests.rs"]
mod tests;
