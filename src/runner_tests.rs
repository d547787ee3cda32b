use super::{evaluate, ProcessResult};
use crate::classify::{FailureCategory, FailureClassifier};
use crate::model::Model;
use crate::query::Query;
use crate::schema::{ExpectedValue, SolverOutput, Verdict};
use crate::solver::{ambient_solver_env, ErrorMode, Invocation, PetSolver, Solver};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Runs a shell script through `/bin/sh` and judges it like PET does.
#[derive(Debug)]
struct ScriptSolver {
    script: PathBuf,
    pet: PetSolver,
}

impl ScriptSolver {
    fn new(dir: &Path, body: &str) -> Self {
        let script = dir.join("solver.sh");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write script");
        Self {
            script,
            pet: PetSolver {
                name: "script".to_string(),
                executable: PathBuf::from("/bin/sh"),
                heuristic: "WEIGHTED".to_string(),
                precision: 1e-6,
                error_mode: ErrorMode::Absolute,
                classifier: FailureClassifier::default(),
            },
        }
    }
}

impl Solver for ScriptSolver {
    fn name(&self) -> &str {
        "script"
    }

    fn is_supported(&self, _model: &Model, _query: &Query) -> bool {
        true
    }

    fn create_invocation(&self, _model: &Model, _query: &Query, _validate: bool) -> Invocation {
        Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec![self.script.display().to_string()],
            env: ambient_solver_env(),
        }
    }

    fn check_output(
        &self,
        stdout: &str,
        stderr: &str,
        model: &Model,
        query: &Query,
    ) -> SolverOutput {
        self.pet.check_output(stdout, stderr, model, query)
    }

    fn classify_failure(&self, stderr: &str) -> FailureCategory {
        self.pet.classify_failure(stderr)
    }
}

fn model() -> Model {
    Model::new(PathBuf::from("/bench/coin.prism"), None, None)
}

fn reach_half() -> Query {
    Query::Reachability {
        property: "P".to_string(),
        expected: Some(ExpectedValue::Float(0.5)),
    }
}

#[test]
fn successful_run_is_checked_by_solver() {
    let dir = TempDir::new().unwrap();
    let solver = ScriptSolver::new(dir.path(), r#"echo '{"values": {"s0": 0.5}}'"#);
    let limit = Some(Duration::from_secs(30));
    let result = evaluate(&solver, &model(), &reach_half(), limit, false).unwrap();
    match &result {
        ProcessResult::Success { output, .. } => assert_eq!(output.verdict, Verdict::Correct),
        other => panic!("expected success, got {other:?}"),
    }
    assert!(result.is_validated());
    assert_eq!(result.kind_label(), "success");
}

#[test]
fn core_run_reports_state_count() {
    let dir = TempDir::new().unwrap();
    let solver = ScriptSolver::new(
        dir.path(),
        r#"echo '{"unbounded_statistics": {"states": 42}}'"#,
    );
    let result = evaluate(&solver, &model(), &Query::Core, None, false).unwrap();
    assert_eq!(result.verdict(), Some(Verdict::Correct));
    assert!(result.message().contains("42 states"));
}

#[test]
fn nonzero_exit_is_classified_from_stderr() {
    let dir = TempDir::new().unwrap();
    let solver = ScriptSolver::new(
        dir.path(),
        concat!(
            "echo 'Exception in thread \"main\" java.lang.OutOfMemoryError: Java heap space' >&2\n",
            "exit 1"
        ),
    );
    let limit = Some(Duration::from_secs(30));
    let result = evaluate(&solver, &model(), &reach_half(), limit, false).unwrap();
    match &result {
        ProcessResult::Error {
            exit_code,
            category,
            stderr,
            ..
        } => {
            assert_eq!(*exit_code, Some(1));
            assert_eq!(*category, FailureCategory::Memory);
            assert!(stderr.contains("OutOfMemoryError"));
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(result.message(), "memory");
    assert!(!result.is_validated());
}

#[test]
fn unparseable_stdout_is_success_with_error_verdict() {
    let dir = TempDir::new().unwrap();
    let solver = ScriptSolver::new(dir.path(), "echo 'Result: 0.5'");
    let result = evaluate(&solver, &model(), &reach_half(), None, false).unwrap();
    assert_eq!(result.verdict(), Some(Verdict::Error));
    assert_eq!(result.message(), "Failed to parse JSON");
}

#[test]
fn environment_is_restricted_for_the_child() {
    let dir = TempDir::new().unwrap();
    let solver = ScriptSolver::new(
        dir.path(),
        r#"printf '{"values": {"env": "%s|%s"}}' "${SEED}" "${HOME:-unset}""#,
    );
    let query = Query::Reachability {
        property: "P".to_string(),
        expected: None,
    };
    let result = evaluate(&solver, &model(), &query, None, false).unwrap();
    let seed = std::env::var("SEED").unwrap_or_else(|_| "1234".to_string());
    assert_eq!(result.message(), format!("{seed}|unset"));
}

#[test]
fn missing_executable_is_a_spawn_error() {
    let dir = TempDir::new().unwrap();
    let mut pet = ScriptSolver::new(dir.path(), "").pet;
    pet.executable = dir.path().join("missing-solver");
    let err = evaluate(&pet, &model(), &Query::Core, None, false).unwrap_err();
    assert!(err.to_string().contains("spawn solver"));
}

#[cfg(target_os = "linux")]
fn is_alive(pid: i32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // state follows the parenthesized command name
    let state = stat
        .rsplit_once(')')
        .and_then(|(_, rest)| rest.trim_start().chars().next());
    !matches!(state, Some('Z') | Some('X') | None)
}

#[cfg(target_os = "linux")]
fn read_pid(path: &Path) -> i32 {
    std::fs::read_to_string(path)
        .expect("pid file")
        .trim()
        .parse()
        .expect("pid")
}

#[cfg(target_os = "linux")]
#[test]
fn timeout_kills_solver_and_its_children() {
    let dir = TempDir::new().unwrap();
    let shell_pid = dir.path().join("shell.pid");
    let sleep_pid = dir.path().join("sleep.pid");
    let body = format!(
        "echo $$ > {}\nsleep 30 &\necho $! > {}\necho partial\nwait",
        shell_pid.display(),
        sleep_pid.display()
    );
    let solver = ScriptSolver::new(dir.path(), &body);
    let started = std::time::Instant::now();
    let result = evaluate(
        &solver,
        &model(),
        &Query::Core,
        Some(Duration::from_millis(500)),
        false,
    )
    .unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    match &result {
        ProcessResult::Timeout {
            stdout,
            elapsed_secs,
            ..
        } => {
            assert!(*elapsed_secs >= 0.5);
            assert!(stdout.contains("partial"));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(result.message(), "Timeout");
    assert!(!result.is_validated());

    let pids = [read_pid(&shell_pid), read_pid(&sleep_pid)];
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while pids.iter().any(|pid| is_alive(*pid)) && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    for pid in pids {
        assert!(!is_alive(pid), "process {pid} still running");
    }
}

#[test]
fn fast_solver_finishes_within_timeout() {
    let dir = TempDir::new().unwrap();
    let solver = ScriptSolver::new(dir.path(), r#"echo '{"values": {"s0": 0.7}}'"#);
    let limit = Some(Duration::from_secs(30));
    let result = evaluate(&solver, &model(), &reach_half(), limit, true).unwrap();
    assert_eq!(result.verdict(), Some(Verdict::Incorrect));
    assert!(result.elapsed_secs() < 30.0);
}

#[cfg(target_os = "linux")]
#[test]
fn timeout_does_not_wait_for_processes_that_left_the_group() {
    let dir = TempDir::new().unwrap();
    let solver = ScriptSolver::new(dir.path(), "setsid sleep 6 &\necho partial\nsleep 30");
    let started = std::time::Instant::now();
    let result = evaluate(
        &solver,
        &model(),
        &Query::Core,
        Some(Duration::from_millis(500)),
        false,
    )
    .unwrap();
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "evaluate took {:?}",
        started.elapsed()
    );
    match &result {
        ProcessResult::Timeout { stdout, .. } => assert!(stdout.contains("partial")),
        other => panic!("expected timeout, got {other:?}"),
    }
}
