//! Loading of the models and solvers YAML files.
//!
//! Everything here runs before the first solver is started; any error is a
//! configuration error and aborts the run.
use crate::classify::{FailureClassifier, FailureSignature};
use crate::model::Model;
use crate::query::Query;
use crate::solver::{ErrorMode, PetSolver, Solver};
use serde::{Deserialize, Deserializer};
use serde_yaml::Mapping;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_HEURISTIC: &str = "WEIGHTED";
pub const DEFAULT_PRECISION: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No file found at {}", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Model {} does not exist", .0.display())]
    ModelNotFound(PathBuf),
    #[error("Query file {} does not exist", .0.display())]
    PropertiesNotFound(PathBuf),
    #[error("Unknown query type {0}")]
    UnknownQueryType(String),
    #[error("Unknown solver type {0}")]
    UnknownSolverType(String),
    #[error("{context}: missing field `{field}`")]
    MissingField { context: String, field: String },
    #[error("{context}: invalid field `{field}`: {reason}")]
    InvalidField {
        context: String,
        field: String,
        reason: String,
    },
    #[error("solver {name}: executable {path} not found")]
    ExecutableNotFound {
        name: String,
        path: String,
        #[source]
        source: which::Error,
    },
    #[error("No solvers found")]
    NoSolvers,
}

/// One entry of the models file.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub model: ModelFiles,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub queries: Vec<QueryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelFiles {
    pub path: PathBuf,
    #[serde(default, rename = "const")]
    pub constants: Option<String>,
    #[serde(default)]
    pub properties: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub spec: Option<Mapping>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One entry of the solvers file. `conf` is interpreted per `type`.
#[derive(Debug, Clone, Deserialize)]
pub struct SolverEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub conf: serde_yaml::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PetConf {
    pub path: String,
    #[serde(default = "default_heuristic")]
    pub heuristic: String,
    #[serde(default = "default_precision", deserialize_with = "number_or_string")]
    pub precision: f64,
    #[serde(default)]
    pub error: ErrorMode,
    #[serde(default)]
    pub failure_signatures: Vec<FailureSignature>,
}

fn default_heuristic() -> String {
    DEFAULT_HEURISTIC.to_string()
}

fn default_precision() -> f64 {
    DEFAULT_PRECISION
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

// PyYAML-era files write `1e-6`, which YAML 1.1 reads as a string.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// A model with its parsed queries and the tags inherited by each query.
#[derive(Debug, Clone)]
pub struct ModelDescription {
    pub model: Model,
    pub tags: Vec<String>,
    pub queries: Vec<QueryDescription>,
    pub source_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct QueryDescription {
    pub query: Query,
    pub tags: Vec<String>,
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the models file; model and properties paths are resolved relative to
/// the directory containing it.
pub fn load_models(path: &Path) -> Result<Vec<ModelDescription>, ConfigError> {
    let entries: Vec<ModelEntry> = read_yaml(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    entries
        .into_iter()
        .map(|entry| describe_model(base, entry))
        .collect()
}

fn describe_model(base: &Path, entry: ModelEntry) -> Result<ModelDescription, ConfigError> {
    let ModelEntry {
        model: files,
        tags,
        queries,
    } = entry;
    let model_path = resolve_existing(base, &files.path)
        .ok_or_else(|| ConfigError::ModelNotFound(files.path.clone()))?;
    let properties_path = match files.properties.as_ref() {
        Some(properties) => Some(
            resolve_existing(base, properties)
                .ok_or_else(|| ConfigError::PropertiesNotFound(base.join(properties)))?,
        ),
        None => None,
    };
    let model = Model::new(model_path, files.constants, properties_path);
    let queries = queries
        .into_iter()
        .map(|entry| {
            Ok(QueryDescription {
                query: Query::parse(&entry.kind, &entry.spec.unwrap_or_default())?,
                tags: entry.tags,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;
    Ok(ModelDescription {
        model,
        tags,
        queries,
        source_path: files.path,
    })
}

fn resolve_existing(base: &Path, rel: &Path) -> Option<PathBuf> {
    base.join(rel).canonicalize().ok()
}

/// Load the solvers file, keeping only solvers named in `allowed` (all when
/// empty).
pub fn load_solvers(
    path: &Path,
    allowed: &[String],
) -> Result<Vec<Arc<dyn Solver>>, ConfigError> {
    let entries: Vec<SolverEntry> = read_yaml(path)?;
    let mut solvers: Vec<Arc<dyn Solver>> = Vec::new();
    for entry in entries {
        if !allowed.is_empty() && !allowed.contains(&entry.name) {
            continue;
        }
        solvers.push(build_solver(entry)?);
    }
    if solvers.is_empty() {
        return Err(ConfigError::NoSolvers);
    }
    Ok(solvers)
}

fn build_solver(entry: SolverEntry) -> Result<Arc<dyn Solver>, ConfigError> {
    match entry.kind.as_str() {
        "pet" => {
            let conf: PetConf =
                serde_yaml::from_value(entry.conf).map_err(|err| ConfigError::InvalidField {
                    context: format!("solver {}", entry.name),
                    field: "conf".to_string(),
                    reason: err.to_string(),
                })?;
            let executable =
                which::which(&conf.path).map_err(|source| ConfigError::ExecutableNotFound {
                    name: entry.name.clone(),
                    path: conf.path.clone(),
                    source,
                })?;
            let classifier = FailureClassifier::with_extra(conf.failure_signatures);
            tracing::debug!(
                solver = %entry.name,
                executable = %executable.display(),
                signatures = classifier.signatures().len(),
                "solver configured"
            );
            Ok(Arc::new(PetSolver {
                name: entry.name,
                executable,
                heuristic: conf.heuristic,
                precision: conf.precision,
                error_mode: conf.error,
                classifier,
            }))
        }
        other => Err(ConfigError::UnknownSolverType(other.to_string())),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
