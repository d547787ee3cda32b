//! Result aggregation and rendering.
use crate::instance::Instance;
use crate::query::QueryKind;
use crate::runner::ProcessResult;
use crate::schema::Verdict;
use crate::util::first_line;
use serde::Serialize;
use std::fmt;

const HEADERS: [&str; 5] = ["model", "query", "solver", "time", "message"];
const MAX_MESSAGE_CHARS: usize = 120;

#[derive(Debug)]
pub struct ReportEntry {
    pub instance: Instance,
    pub result: ProcessResult,
}

/// All results of a run, held in report order.
#[derive(Debug, Default)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

/// Outcome counts. Verdict counts cover successful runs only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unknown: usize,
    pub invalid_output: usize,
    pub failed: usize,
    pub timeout: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            concat!(
                "{} instances: {} correct, {} incorrect, {} unknown, ",
                "{} invalid output, {} failed, {} timeout"
            ),
            self.total,
            self.correct,
            self.incorrect,
            self.unknown,
            self.invalid_output,
            self.failed,
            self.timeout
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub model: String,
    pub constants: Option<String>,
    pub query: String,
    pub kind: QueryKind,
    pub solver: String,
    pub tags: Vec<String>,
    pub result: &'static str,
    pub verdict: Option<Verdict>,
    pub exit_code: Option<i32>,
    pub elapsed_secs: f64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub results: Vec<ReportRow>,
    pub summary: Summary,
    pub validated: bool,
}

impl Report {
    pub fn new(results: Vec<(Instance, ProcessResult)>) -> Self {
        let mut entries: Vec<ReportEntry> = results
            .into_iter()
            .map(|(instance, result)| ReportEntry { instance, result })
            .collect();
        entries.sort_by(|a, b| a.instance.cmp_for_report(&b.instance));
        Self { entries }
    }

    /// Entries that are not a successful run with a correct answer.
    pub fn validation_failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|entry| !entry.result.is_validated())
    }

    pub fn validation_passed(&self) -> bool {
        self.validation_failures().next().is_none()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.entries.len(),
            ..Summary::default()
        };
        for entry in &self.entries {
            match &entry.result {
                ProcessResult::Timeout { .. } => summary.timeout += 1,
                ProcessResult::Error { .. } => summary.failed += 1,
                ProcessResult::Success { output, .. } => match output.verdict {
                    Verdict::Correct => summary.correct += 1,
                    Verdict::Incorrect => summary.incorrect += 1,
                    Verdict::Unknown => summary.unknown += 1,
                    Verdict::Error => summary.invalid_output += 1,
                },
            }
        }
        summary
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.entries
            .iter()
            .map(|entry| {
                let instance = &entry.instance;
                let exit_code = match &entry.result {
                    ProcessResult::Error { exit_code, .. } => *exit_code,
                    ProcessResult::Success { .. } => Some(0),
                    ProcessResult::Timeout { .. } => None,
                };
                ReportRow {
                    model: instance.model.name(),
                    constants: instance.model.constants().map(str::to_string),
                    query: instance.query.name(),
                    kind: instance.query.kind(),
                    solver: instance.solver.name().to_string(),
                    tags: instance.tags.iter().cloned().collect(),
                    result: entry.result.kind_label(),
                    verdict: entry.result.verdict(),
                    exit_code,
                    elapsed_secs: entry.result.elapsed_secs(),
                    message: entry.result.message(),
                }
            })
            .collect()
    }

    pub fn to_json(&self) -> JsonReport {
        JsonReport {
            results: self.rows(),
            summary: self.summary(),
            validated: self.validation_passed(),
        }
    }

    /// Column-aligned table, one line per result, followed by the summary.
    pub fn render_table(&self) -> String {
        let rows: Vec<[String; 5]> = self
            .entries
            .iter()
            .map(|entry| {
                [
                    entry.instance.model.to_string(),
                    entry.instance.query.name(),
                    entry.instance.solver.name().to_string(),
                    format!("{:.2}", entry.result.elapsed_secs()),
                    first_line(&entry.result.message(), MAX_MESSAGE_CHARS),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_row(&mut out, &widths, HEADERS.iter().copied());
        for row in &rows {
            push_row(&mut out, &widths, row.iter().map(String::as_str));
        }
        out.push_str(&self.summary().to_string());
        out.push('\n');
        out
    }
}

fn push_row<'a>(out: &mut String, widths: &[usize; 5], cells: impl Iterator<Item = &'a str>) {
    let line = cells
        .zip(widths.iter())
        .enumerate()
        .map(|(index, (cell, &width))| {
            // time is right-aligned, the last column is never padded
            if index == 3 {
                format!("{cell:>width$}")
            } else if index == widths.len() - 1 {
                cell.to_string()
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
