//! End-of-run conflict reporting.
//!
//! Conflicts accumulate in memory for the duration of one generation run,
//! grouped per entity in emission order, and are flushed once at the end to
//! a per-run log file. The file is named `<project>-<YYYY-MM-DD>.log`; when
//! that name is already taken by an earlier run the same day, the start time
//! is appended (`<project>-<YYYY-MM-DD>-<HHMMSS>.log`).
//!
//! An optional machine-readable JSON dump is written next to the text log
//! with the same stem.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::ForgeError;
use crate::model::Conflict;

// ---------------------------------------------------------------------------
// ConflictReporter
// ---------------------------------------------------------------------------

/// Conflicts recorded for one entity, in merge traversal order.
#[derive(Clone, Debug, Serialize)]
pub struct ReportEntry {
    pub entity: String,
    pub conflicts: Vec<Conflict>,
}

/// Collects conflicts across a run and writes the per-run log on flush.
#[derive(Debug)]
pub struct ConflictReporter {
    project: String,
    log_dir: PathBuf,
    json: bool,
    entries: Vec<ReportEntry>,
}

impl ConflictReporter {
    #[must_use]
    pub fn new(project: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            log_dir: log_dir.into(),
            json: false,
            entries: Vec::new(),
        }
    }

    /// Also write a JSON dump next to the text log.
    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Record one entity's conflicts. Entities without conflicts leave no
    /// trace in the log.
    pub fn record(&mut self, entity: impl Into<String>, conflicts: Vec<Conflict>) {
        if conflicts.is_empty() {
            return;
        }
        self.entries.push(ReportEntry {
            entity: entity.into(),
            conflicts,
        });
    }

    /// Total conflicts recorded so far.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.conflicts.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the log file(s). Returns the text log path, or `None` when the
    /// run produced no conflicts (no empty file is created).
    pub fn flush(&self) -> Result<Option<PathBuf>, ForgeError> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        fs::create_dir_all(&self.log_dir)
            .map_err(|e| ForgeError::io("create directory", &self.log_dir, e))?;

        let path = self.log_path(Local::now());
        fs::write(&path, self.render()).map_err(|e| ForgeError::io("write", &path, e))?;

        if self.json {
            let json_path = path.with_extension("json");
            let body = serde_json::to_vec_pretty(&self.entries).map_err(|e| {
                ForgeError::io(
                    "serialize",
                    &json_path,
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                )
            })?;
            fs::write(&json_path, body).map_err(|e| ForgeError::io("write", &json_path, e))?;
        }
        Ok(Some(path))
    }

    /// Dated log name; the run start time is appended only when the plain
    /// dated name is already taken.
    fn log_path(&self, now: DateTime<Local>) -> PathBuf {
        let dated = self
            .log_dir
            .join(format!("{}-{}.log", self.project, now.format("%Y-%m-%d")));
        if !dated.exists() {
            return dated;
        }
        self.log_dir.join(format!(
            "{}-{}-{}.log",
            self.project,
            now.format("%Y-%m-%d"),
            now.format("%H%M%S")
        ))
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            for conflict in &entry.conflicts {
                out.push_str(&format!(
                    "== {} :: {}: {}\n",
                    entry.entity, conflict.location, conflict.description
                ));
                push_snippet(&mut out, "old", &conflict.existing);
                push_snippet(&mut out, "new", &conflict.generated);
                out.push('\n');
            }
        }
        out
    }
}

fn push_snippet(out: &mut String, label: &str, snippet: &str) {
    out.push_str(&format!("-- {label} --\n"));
    if snippet.is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str(snippet);
        out.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The directory a reporter writes into, defaulting next to the output root.
#[must_use]
pub fn default_log_dir(output_root: &Path) -> PathBuf {
    output_root.join("merge-logs")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_conflict() -> Conflict {
        Conflict::new(
            "Customer.value",
            "\"Alice\"",
            "\"Bob\"",
            "attribute initializer differs; existing kept",
        )
    }

    #[test]
    fn empty_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = ConflictReporter::new("demo", dir.path());
        assert_eq!(reporter.flush().unwrap(), None);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn conflicts_without_entries_are_not_recorded() {
        let mut reporter = ConflictReporter::new("demo", ".");
        reporter.record("Customer", vec![]);
        assert!(reporter.is_empty());
        assert_eq!(reporter.total(), 0);
    }

    #[test]
    fn flush_writes_dated_log_with_labelled_snippets() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = ConflictReporter::new("demo", dir.path());
        reporter.record("Customer", vec![sample_conflict()]);

        let path = reporter.flush().unwrap().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("demo-"));
        assert!(name.ends_with(".log"));

        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("== Customer :: Customer.value"));
        assert!(body.contains("-- old --\n\"Alice\""));
        assert!(body.contains("-- new --\n\"Bob\""));
    }

    #[test]
    fn second_run_same_day_gets_time_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = ConflictReporter::new("demo", dir.path());
        reporter.record("Customer", vec![sample_conflict()]);

        let first = reporter.flush().unwrap().unwrap();
        let second = reporter.flush().unwrap().unwrap();
        assert_ne!(first, second);
        let second_name = second.file_name().unwrap().to_string_lossy().into_owned();
        // demo-YYYY-MM-DD-HHMMSS.log
        assert_eq!(second_name.matches('-').count(), 4);
    }

    #[test]
    fn empty_snippet_rendered_as_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = ConflictReporter::new("demo", dir.path());
        reporter.record(
            "Customer",
            vec![Conflict::new(
                "Customer",
                "",
                "Comparable",
                "new supertype extension introduced by regeneration; review required",
            )],
        );
        let path = reporter.flush().unwrap().unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("-- old --\n(none)"));
    }

    #[test]
    fn json_dump_written_alongside_text_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = ConflictReporter::new("demo", dir.path()).with_json(true);
        reporter.record("Customer", vec![sample_conflict()]);

        let path = reporter.flush().unwrap().unwrap();
        let json_path = path.with_extension("json");
        let body = fs::read_to_string(&json_path).unwrap();
        assert!(body.contains("\"entity\": \"Customer\""));
        assert!(body.contains("\"location\": \"Customer.value\""));
    }

    #[test]
    fn total_counts_across_entities() {
        let mut reporter = ConflictReporter::new("demo", ".");
        reporter.record("A", vec![sample_conflict(), sample_conflict()]);
        reporter.record("B", vec![sample_conflict()]);
        assert_eq!(reporter.total(), 3);
    }
}
