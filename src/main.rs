use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

mod classify;
mod cli;
mod compare;
mod config;
mod instance;
mod model;
mod progress;
mod query;
mod report;
mod runner;
mod schema;
mod solver;
mod util;

use cli::RootArgs;
use instance::Instance;
use report::Report;

fn main() -> Result<()> {
    let bar = progress::hidden_bar();
    let log_bar = bar.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(move || progress::SuspendingWriter::new(log_bar.clone(), std::io::stderr()))
        .init();

    let args = RootArgs::parse();
    run(&args, &bar)
}

fn run(args: &RootArgs, bar: &ProgressBar) -> Result<()> {
    let timeout = args.timeout()?;
    let models = config::load_models(&args.models)
        .with_context(|| format!("load models from {}", args.models.display()))?;
    let solvers = config::load_solvers(&args.solvers, &args.solver_names)
        .with_context(|| format!("load solvers from {}", args.solvers.display()))?;
    let instances = instance::build_instances(&models, &solvers, &args.filter());
    tracing::info!(
        models = models.len(),
        solvers = solvers.len(),
        instances = instances.len(),
        "configuration loaded"
    );

    if args.list {
        print_instances(&instances);
        return Ok(());
    }

    progress::start(bar, instances.len())?;
    let mut results = Vec::with_capacity(instances.len());
    for instance in instances {
        bar.set_message(instance.to_string());
        let result = runner::evaluate(
            instance.solver.as_ref(),
            &instance.model,
            &instance.query,
            timeout,
            args.validate,
        )
        .with_context(|| format!("run {instance}"))?;
        tracing::info!(
            instance = %instance,
            result = result.kind_label(),
            elapsed_secs = result.elapsed_secs(),
            message = %result.message(),
            "instance finished"
        );
        bar.inc(1);
        results.push((instance, result));
    }
    bar.finish_and_clear();

    let report = Report::new(results);
    if args.json {
        let text = serde_json::to_string_pretty(&report.to_json()).context("serialize report")?;
        println!("{text}");
    } else {
        print!("{}", report.render_table());
    }

    if args.validate && !report.validation_passed() {
        for entry in report.validation_failures() {
            tracing::warn!(
                "{} not validated: {}",
                entry.instance,
                entry.result.message()
            );
        }
        bail!("Validation failed");
    }
    Ok(())
}

fn print_instances(instances: &[Instance]) {
    for instance in instances {
        let tags: Vec<&str> = instance.tags.iter().map(String::as_str).collect();
        if tags.is_empty() {
            println!("{instance}");
        } else {
            println!("{instance} [{}]", tags.join(", "));
        }
    }
    println!("{} instances", instances.len());
}
