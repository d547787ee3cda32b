//! Solver backends.
//!
//! A solver turns a (model, query) pair into an [`Invocation`] and judges the
//! resulting output. The runner and instance builder only see the [`Solver`]
//! trait, so adding a backend does not touch them.
mod pet;

pub use pet::PetSolver;

use crate::classify::{FailureCategory, FailureClassifier};
use crate::model::Model;
use crate::query::Query;
use crate::schema::SolverOutput;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

/// Seed forwarded to solvers when the caller does not set `SEED`.
pub const DEFAULT_SEED: &str = "1234";

/// Ambient variables forwarded to the child when present.
const PASSTHROUGH_ENV: &[&str] = &["JAVA_HOME", "JAVA_OPTS"];

pub trait Solver: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Whether this solver can answer `query` on `model`. Unsupported pairs
    /// are never invoked.
    fn is_supported(&self, model: &Model, query: &Query) -> bool;

    fn create_invocation(&self, model: &Model, query: &Query, validate: bool) -> Invocation;

    /// Judge a run that exited successfully.
    fn check_output(&self, stdout: &str, stderr: &str, model: &Model, query: &Query)
        -> SolverOutput;

    /// Categorize a run that exited with a failure status.
    fn classify_failure(&self, stderr: &str) -> FailureCategory {
        FailureClassifier::default().classify(stderr)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    #[default]
    Absolute,
    Relative,
}

/// Fully resolved process invocation: program, arguments and the complete
/// child environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Build a command whose environment is exactly `self.env`.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).env_clear().envs(&self.env);
        cmd
    }

    /// Shell-quoted command line for logs.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.display().to_string());
        parts.extend(self.args.iter().cloned());
        shell_words::join(parts)
    }
}

/// Child environment built from an allow-list of ambient variables: `PATH`,
/// `SEED` (defaulted) and the JVM variables when set.
pub fn solver_env<F>(lookup: F) -> BTreeMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = BTreeMap::new();
    if let Some(path) = lookup("PATH") {
        env.insert("PATH".to_string(), path);
    }
    env.insert(
        "SEED".to_string(),
        lookup("SEED").unwrap_or_else(|| DEFAULT_SEED.to_string()),
    );
    for key in PASSTHROUGH_ENV {
        if let Some(value) = lookup(key) {
            env.insert((*key).to_string(), value);
        }
    }
    env
}

/// [`solver_env`] over the current process environment.
pub fn ambient_solver_env() -> BTreeMap<String, String> {
    solver_env(|key| std::env::var(key).ok())
}
