//! Query variants posed against a model.
//!
//! A query is a closed sum type; every consumer matches on it exhaustively so
//! a new kind cannot slip through unhandled.
use crate::config::ConfigError;
use crate::schema::ExpectedValue;
use clap::ValueEnum;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Kind tag of a query; the declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
pub enum QueryKind {
    #[serde(rename = "core")]
    #[value(name = "core")]
    Core,
    #[serde(rename = "reach")]
    #[value(name = "reach")]
    Reachability,
    #[serde(rename = "mean-payoff")]
    #[value(name = "mean-payoff")]
    MeanPayoff,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Core => "core",
            QueryKind::Reachability => "reach",
            QueryKind::MeanPayoff => "mean-payoff",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Unbounded state-space exploration.
    Core,
    /// Value of reaching states that satisfy `property`.
    Reachability {
        property: String,
        expected: Option<ExpectedValue>,
    },
    /// Long-run average of `rewards`, known to lie in `[reward_min, reward_max]`.
    MeanPayoff {
        rewards: String,
        reward_min: f64,
        reward_max: f64,
        expected: Option<ExpectedValue>,
    },
}

impl Query {
    /// Parse a query from its configuration `type` and `spec` mapping.
    pub fn parse(kind: &str, spec: &Mapping) -> Result<Self, ConfigError> {
        match kind {
            "core" => Ok(Query::Core),
            "reach" => Ok(Query::Reachability {
                property: required_string(spec, kind, "property")?,
                expected: optional_expected(spec),
            }),
            "mean_payoff" => Ok(Query::MeanPayoff {
                rewards: required_string(spec, kind, "rewards")?,
                reward_min: required_number(spec, kind, "reward_min")?,
                reward_max: required_number(spec, kind, "reward_max")?,
                expected: optional_expected(spec),
            }),
            other => Err(ConfigError::UnknownQueryType(other.to_string())),
        }
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Core => QueryKind::Core,
            Query::Reachability { .. } => QueryKind::Reachability,
            Query::MeanPayoff { .. } => QueryKind::MeanPayoff,
        }
    }

    /// Stable display name, e.g. `reach(goal)`.
    pub fn name(&self) -> String {
        match self {
            Query::Core => "core".to_string(),
            Query::Reachability { property, .. } => format!("reach({property})"),
            Query::MeanPayoff { rewards, .. } => format!("mean_payoff({rewards})"),
        }
    }

    pub fn expected(&self) -> Option<&ExpectedValue> {
        match self {
            Query::Core => None,
            Query::Reachability { expected, .. } | Query::MeanPayoff { expected, .. } => {
                expected.as_ref()
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn field<'a>(spec: &'a Mapping, name: &str) -> Option<&'a Value> {
    spec.get(name).filter(|value| !value.is_null())
}

fn missing(kind: &str, name: &str) -> ConfigError {
    ConfigError::MissingField {
        context: format!("{kind} query"),
        field: name.to_string(),
    }
}

fn required_string(spec: &Mapping, kind: &str, name: &str) -> Result<String, ConfigError> {
    let value = field(spec, name).ok_or_else(|| missing(kind, name))?;
    scalar_text(value).ok_or_else(|| ConfigError::InvalidField {
        context: format!("{kind} query"),
        field: name.to_string(),
        reason: "expected a scalar".to_string(),
    })
}

fn required_number(spec: &Mapping, kind: &str, name: &str) -> Result<f64, ConfigError> {
    let value = field(spec, name).ok_or_else(|| missing(kind, name))?;
    let text = scalar_text(value);
    value
        .as_f64()
        .or_else(|| text.as_deref().and_then(|text| text.trim().parse().ok()))
        .ok_or_else(|| ConfigError::InvalidField {
            context: format!("{kind} query"),
            field: name.to_string(),
            reason: format!("expected a number, got {}", text.unwrap_or_default()),
        })
}

fn optional_expected(spec: &Mapping) -> Option<ExpectedValue> {
    let value = field(spec, "expected")?;
    match value {
        Value::Bool(flag) => Some(ExpectedValue::Bool(*flag)),
        Value::Number(number) => number.as_f64().map(ExpectedValue::Float),
        other => scalar_text(other).map(|text| ExpectedValue::parse(&text)),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
