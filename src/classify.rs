//! Best-effort classification of solver crashes.
//!
//! A failing solver is categorized by scanning its stderr for known
//! signatures. Signatures are an ordered table and the first match wins;
//! anything unrecognized degrades to [`FailureCategory::Generic`].
use serde::Deserialize;
use std::fmt;

/// Coarse failure categories shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    #[serde(rename = "stackoverflow")]
    StackOverflow,
    Memory,
    Bounds,
    Convergence,
    Internal,
    Generic,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::StackOverflow => "stackoverflow",
            FailureCategory::Memory => "memory",
            FailureCategory::Bounds => "bounds",
            FailureCategory::Convergence => "convergence",
            FailureCategory::Internal => "internal",
            FailureCategory::Generic => "generic",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stderr substring and the category it implies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FailureSignature {
    pub pattern: String,
    pub category: FailureCategory,
}

const BUILTIN_SIGNATURES: &[(&str, FailureCategory)] = &[
    ("java.lang.StackOverflowError", FailureCategory::StackOverflow),
    ("java.lang.OutOfMemoryError", FailureCategory::Memory),
    ("Can not create DoubleVector", FailureCategory::Bounds),
    ("Iterative method did not converge", FailureCategory::Convergence),
    ("ArrayIndexOutOfBounds", FailureCategory::Memory),
    ("NegativeArraySizeException", FailureCategory::Memory),
    ("IllegalArgumentException", FailureCategory::Internal),
];

/// Ordered signature table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureClassifier {
    signatures: Vec<FailureSignature>,
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::with_extra(Vec::new())
    }
}

impl FailureClassifier {
    /// Built-in table preceded by `extra`, which therefore takes priority.
    pub fn with_extra(extra: Vec<FailureSignature>) -> Self {
        let mut signatures = extra;
        signatures.extend(
            BUILTIN_SIGNATURES
                .iter()
                .map(|(pattern, category)| FailureSignature {
                    pattern: (*pattern).to_string(),
                    category: *category,
                }),
        );
        Self { signatures }
    }

    pub fn signatures(&self) -> &[FailureSignature] {
        &self.signatures
    }

    pub fn classify(&self, stderr: &str) -> FailureCategory {
        if let Some(signature) = self
            .signatures
            .iter()
            .find(|signature| stderr.contains(&signature.pattern))
        {
            return signature.category;
        }
        tracing::warn!("Unrecognized error:\n{stderr}");
        FailureCategory::Generic
    }
}
