use super::{ambient_solver_env, ErrorMode, Invocation, Solver};
use crate::classify::{FailureCategory, FailureClassifier};
use crate::compare::compare;
use crate::model::Model;
use crate::query::Query;
use crate::schema::SolverOutput;
use serde_json::Value;
use std::path::PathBuf;

/// The PET command line solver.
#[derive(Debug, Clone)]
pub struct PetSolver {
    pub name: String,
    pub executable: PathBuf,
    pub heuristic: String,
    pub precision: f64,
    pub error_mode: ErrorMode,
    pub classifier: FailureClassifier,
}

impl PetSolver {
    fn relative(&self) -> bool {
        self.error_mode == ErrorMode::Relative
    }

    fn model_arguments(model: &Model) -> Vec<String> {
        let mut args = vec![
            "--model".to_string(),
            model.model_file().display().to_string(),
        ];
        if let Some(constants) = model.constants() {
            args.push("--const".to_string());
            args.push(constants.to_string());
        }
        if let Some(properties) = model.properties_file() {
            args.push("--properties".to_string());
            args.push(properties.display().to_string());
        }
        args
    }

    /// Arguments for a query invocation, excluding the executable.
    pub fn arguments(&self, model: &Model, query: &Query, validate: bool) -> Vec<String> {
        let (subcommand, query_args) = match query {
            Query::Core => ("core", vec!["--unbounded".to_string()]),
            Query::Reachability { property, .. } => (
                "reachability",
                vec!["--property".to_string(), property.clone()],
            ),
            Query::MeanPayoff {
                rewards,
                reward_min,
                reward_max,
                ..
            } => (
                "mean-payoff",
                vec![
                    "--rewards".to_string(),
                    rewards.clone(),
                    "--reward-min".to_string(),
                    reward_min.to_string(),
                    "--reward-max".to_string(),
                    reward_max.to_string(),
                ],
            ),
        };

        let mut args = vec![subcommand.to_string()];
        args.extend(Self::model_arguments(model));
        args.extend(query_args);
        args.push("--precision".to_string());
        args.push(self.precision.to_string());
        if self.relative() {
            args.push("--relative".to_string());
        }
        if validate {
            args.push("--validate".to_string());
        }
        args
    }

    fn check_values(&self, output: &Value, query: &Query) -> SolverOutput {
        let values = output.get("values").and_then(Value::as_object);
        let single = values.filter(|values| values.len() == 1);
        let Some((label, value)) = single.and_then(|values| values.iter().next()) else {
            let labels = values
                .map(|values| values.keys().cloned().collect::<Vec<_>>().join(" "))
                .filter(|labels| !labels.is_empty())
                .unwrap_or_else(|| "none".to_string());
            return SolverOutput::error(format!("Expected single state, got {labels}"));
        };
        match query.expected() {
            Some(expected) => compare(label, value, expected, self.precision, self.relative()),
            None => SolverOutput::unknown(render_value(value)),
        }
    }
}

impl Solver for PetSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_supported(&self, _model: &Model, _query: &Query) -> bool {
        true
    }

    fn create_invocation(&self, model: &Model, query: &Query, validate: bool) -> Invocation {
        tracing::debug!(
            solver = %self.name,
            heuristic = %self.heuristic,
            query = %query,
            "building invocation"
        );
        Invocation {
            program: self.executable.clone(),
            args: self.arguments(model, query, validate),
            env: ambient_solver_env(),
        }
    }

    fn check_output(
        &self,
        stdout: &str,
        _stderr: &str,
        _model: &Model,
        query: &Query,
    ) -> SolverOutput {
        let output: Value = match serde_json::from_str(stdout) {
            Ok(output) => output,
            Err(_) => return SolverOutput::error("Failed to parse JSON"),
        };
        match query {
            Query::Core => match output.pointer("/unbounded_statistics/states") {
                Some(states) => SolverOutput::correct(format!("{} states", render_value(states))),
                None => SolverOutput::correct("state count not reported"),
            },
            Query::Reachability { .. } | Query::MeanPayoff { .. } => {
                self.check_values(&output, query)
            }
        }
    }

    fn classify_failure(&self, stderr: &str) -> FailureCategory {
        self.classifier.classify(stderr)
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "pet_tests.rs"]
mod tests;
