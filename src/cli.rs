//! CLI argument parsing for the evaluation harness.
use crate::instance::InstanceFilter;
use crate::query::QueryKind;
use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "solver-eval",
    version,
    about = "Run benchmark queries against model-checking solvers and check their answers",
    after_help = concat!(
        "Examples:\n",
        "  solver-eval --models models.yaml --solvers solvers.yaml\n",
        "  solver-eval --models models.yaml --solvers solvers.yaml --timeout 60 --validate\n",
        "  solver-eval --models models.yaml --solvers solvers.yaml \\\n",
        "      --query-type reach --exclude-tag slow --list",
    )
)]
pub struct RootArgs {
    /// YAML file listing models, their queries and expected values
    #[arg(long, value_name = "FILE")]
    pub models: PathBuf,

    /// YAML file listing solver configurations
    #[arg(long, value_name = "FILE")]
    pub solvers: PathBuf,

    /// Per-instance wall-clock limit in seconds (unbounded when omitted)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Skip instances carrying this tag
    #[arg(long = "exclude-tag", value_name = "TAG")]
    pub exclude_tags: Vec<String>,

    /// Only run instances carrying at least one of these tags
    #[arg(long = "include-tag", value_name = "TAG")]
    pub include_tags: Vec<String>,

    /// Only run queries of this type
    #[arg(long = "query-type", value_enum, value_name = "TYPE")]
    pub query_types: Vec<QueryKind>,

    /// Only run models whose file name contains this text
    #[arg(long = "model-name", value_name = "TEXT")]
    pub model_names: Vec<String>,

    /// Only use the solver with this name
    #[arg(long = "solver-name", value_name = "NAME")]
    pub solver_names: Vec<String>,

    /// Ask solvers to self-check and fail unless every answer is correct
    #[arg(long)]
    pub validate: bool,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the selected instances without running them
    #[arg(long)]
    pub list: bool,
}

impl RootArgs {
    pub fn filter(&self) -> InstanceFilter {
        InstanceFilter {
            query_kinds: self.query_types.clone(),
            exclude_tags: self.exclude_tags.clone(),
            include_tags: self.include_tags.clone(),
            model_names: self.model_names.clone(),
        }
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        match self.timeout {
            None => Ok(None),
            Some(secs) if secs > 0.0 => match Duration::try_from_secs_f64(secs) {
                Ok(limit) => Ok(Some(limit)),
                Err(_) => bail!("--timeout {secs} is out of range"),
            },
            Some(secs) => bail!("--timeout must be a positive number of seconds, got {secs}"),
        }
    }
}
