//! Schema types shared by solvers, the comparator and the report.

use serde::Serialize;
use std::fmt;

/// Classification of a single solver answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    Unknown,
    Error,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::Unknown => "unknown",
            Verdict::Error => "error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus the message shown in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub verdict: Verdict,
    pub message: String,
}

impl SolverOutput {
    pub fn new(verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            verdict,
            message: message.into(),
        }
    }

    pub fn correct(message: impl Into<String>) -> Self {
        Self::new(Verdict::Correct, message)
    }

    pub fn incorrect(message: impl Into<String>) -> Self {
        Self::new(Verdict::Incorrect, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Verdict::Unknown, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Verdict::Error, message)
    }
}

/// Expected answer attached to a value query.
///
/// Parsed permissively from configuration: `true`/`false` (any case) become
/// booleans, anything that reads as a number becomes a float, the rest is kept
/// as text.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedValue {
    Bool(bool),
    Float(f64),
    Text(String),
}

impl ExpectedValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return ExpectedValue::Bool(true),
            "false" => return ExpectedValue::Bool(false),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(value) => ExpectedValue::Float(value),
            Err(_) => ExpectedValue::Text(raw.to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ExpectedValue::Bool(_) => "bool",
            ExpectedValue::Float(_) => "float",
            ExpectedValue::Text(_) => "str",
        }
    }
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedValue::Bool(value) => write!(f, "{value}"),
            ExpectedValue::Float(value) => write!(f, "{value}"),
            ExpectedValue::Text(value) => f.write_str(value),
        }
    }
}
