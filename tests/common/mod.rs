//! Shared test infrastructure for integration tests.
//!
//! A fixture is a scratch directory holding a fake `pet` executable, a few
//! model files and the two YAML configs. The fake solver picks its behavior
//! from the model file name and appends every command line it receives to
//! `invocations.log`.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Model files the fake solver knows how to answer.
pub const MODEL_FILES: &[&str] = &["ok.prism", "wrong.prism", "oom.prism", "slow.prism"];

const FAKE_PET: &str = r#"#!/bin/sh
printf '%s\n' "$*" >> "__LOG__"
cmd="$1"
shift
model=""
while [ $# -gt 0 ]; do
    case "$1" in
        --model) model="$2"; shift 2 ;;
        *) shift ;;
    esac
done
case "${model##*/}" in
    oom.prism)
        echo 'Exception in thread "main" java.lang.OutOfMemoryError: Java heap space' >&2
        exit 1 ;;
    slow.prism)
        exec sleep 30 ;;
esac
case "$cmd" in
    core) echo '{"unbounded_statistics": {"states": 42}}' ;;
    *)
        if [ "${model##*/}" = wrong.prism ]; then
            echo '{"values": {"s0": 0.7}}'
        else
            echo '{"values": {"s0": 0.5}}'
        fi ;;
esac
"#;

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Scratch directory with the fake solver, model files and a solvers
    /// file registering it as `pet`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let fixture = Self { dir };
        let script = FAKE_PET.replace("__LOG__", &fixture.log_path().display().to_string());
        let pet = fixture.pet_path();
        write_file(&pet, &script);
        std::fs::set_permissions(&pet, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake solver");
        for name in MODEL_FILES {
            write_file(&fixture.root().join("models").join(name), "mdp\n");
        }
        fixture.write_solvers(&format!(
            "- name: pet\n  type: pet\n  conf:\n    path: {}\n    precision: 1e-6\n",
            pet.display()
        ));
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn pet_path(&self) -> PathBuf {
        self.root().join("bin/pet")
    }

    pub fn models_path(&self) -> PathBuf {
        self.root().join("models.yaml")
    }

    pub fn solvers_path(&self) -> PathBuf {
        self.root().join("solvers.yaml")
    }

    fn log_path(&self) -> PathBuf {
        self.root().join("invocations.log")
    }

    pub fn write_models(&self, yaml: &str) {
        write_file(&self.models_path(), yaml);
    }

    pub fn write_solvers(&self, yaml: &str) {
        write_file(&self.solvers_path(), yaml);
    }

    /// Run `solver-eval` against this fixture's config files.
    pub fn run(&self, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_solver-eval"))
            .arg("--models")
            .arg(self.models_path())
            .arg("--solvers")
            .arg(self.solvers_path())
            .args(extra)
            .env_remove("RUST_LOG")
            .output()
            .expect("run solver-eval")
    }

    /// Command lines received by the fake solver, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// A models file with one `reach` query per named model.
pub fn reach_models(models: &[&str]) -> String {
    models
        .iter()
        .map(|name| {
            format!(
                concat!(
                    "- model:\n",
                    "    path: models/{}\n",
                    "  queries:\n",
                    "    - type: reach\n",
                    "      spec:\n",
                    "        property: P\n",
                    "        expected: 0.5\n",
                ),
                name
            )
        })
        .collect()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, contents.as_bytes()).expect("write file");
}
