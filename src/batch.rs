//! One full generation run.
//!
//! Drives the scheduler over the entity batch; for each entity, asks the
//! entity source for a fresh tree, merges it against the existing file when
//! one is found under the source roots, backs the file up, writes the merged
//! output, and records conflicts. Per-entity failures are logged and the
//! batch proceeds; the summary carries the counts and the conflict log path.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::backup::BackupSet;
use crate::config::ForgeConfig;
use crate::emit::render_unit;
use crate::entity::{self, EntitySpec};
use crate::error::ForgeError;
use crate::merge::merge_unit;
use crate::model::SourceUnit;
use crate::parse::parse_unit;
use crate::report::ConflictReporter;
use crate::schedule::{Reference, schedule};

// ---------------------------------------------------------------------------
// EntitySource — the domain-generator seam
// ---------------------------------------------------------------------------

/// Produces the freshly generated tree for one entity.
///
/// `resolved` holds the references of every entity emitted in earlier waves
/// plus any prior references the caller seeded.
pub trait EntitySource {
    /// # Errors
    /// A generation failure marks the entity failed; the batch continues.
    fn generate(
        &self,
        spec: &EntitySpec,
        resolved: &BTreeMap<String, Reference>,
    ) -> Result<SourceUnit, ForgeError>;
}

/// The built-in record generator (see [`entity::generate_unit`]).
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinSource;

impl EntitySource for BuiltinSource {
    fn generate(
        &self,
        spec: &EntitySpec,
        resolved: &BTreeMap<String, Reference>,
    ) -> Result<SourceUnit, ForgeError> {
        Ok(entity::generate_unit(spec, resolved))
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Final accounting of one generation run.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Entities written successfully.
    pub succeeded: usize,

    /// Entities that failed generation or writing.
    pub failed: Vec<String>,

    /// Total conflicts recorded across the run.
    pub conflicts: usize,

    /// The conflict log, when any conflict was recorded.
    pub log_path: Option<PathBuf>,
}

impl RunSummary {
    /// Batch-level success: every entity was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} conflict(s)",
            self.succeeded,
            self.failed.len(),
            self.conflicts
        )?;
        if let Some(path) = &self.log_path {
            write!(f, " — see {}", path.display())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GenerationRun
// ---------------------------------------------------------------------------

/// Orchestrates one run over a batch of entities.
pub struct GenerationRun {
    config: ForgeConfig,
}

impl GenerationRun {
    #[must_use]
    pub const fn new(config: ForgeConfig) -> Self {
        Self { config }
    }

    /// Run the batch. Returns the summary; only a failure to flush the
    /// conflict log is an error here, everything per-entity is partial.
    ///
    /// # Errors
    /// Flushing the conflict log failed.
    pub fn run(
        &self,
        entities: Vec<EntitySpec>,
        source: &dyn EntitySource,
    ) -> Result<RunSummary, ForgeError> {
        let mut reporter = ConflictReporter::new(
            &self.config.project.name,
            self.config.paths.effective_log_dir(),
        )
        .with_json(self.config.report.json);
        let backups = BackupSet::new(
            &self.config.paths.backup_root,
            self.config.paths.effective_source_roots(),
        );

        let result = schedule(entities, &BTreeMap::new(), |spec, resolved| {
            self.emit_entity(spec, resolved, source, &backups, &mut reporter)
        });

        let summary = RunSummary {
            succeeded: result.resolved.len(),
            failed: result.failed,
            conflicts: reporter.total(),
            log_path: reporter.flush()?,
        };
        info!(%summary, "generation run finished");
        Ok(summary)
    }

    fn emit_entity(
        &self,
        spec: &EntitySpec,
        resolved: &BTreeMap<String, Reference>,
        source: &dyn EntitySource,
        backups: &BackupSet,
        reporter: &mut ConflictReporter,
    ) -> Result<Reference, ForgeError> {
        let generated = source.generate(spec, resolved)?;
        let relative = spec.relative_path(&self.config.project.extension);
        let output = self.config.paths.output_root.join(&relative);

        let merged = match self.find_existing(&relative) {
            Some(existing_path) => self.merge_against(spec, generated, &existing_path, reporter)?,
            None => generated,
        };

        if output.exists() {
            backups.backup(&output)?;
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ForgeError::io("create directory", parent, e))?;
        }
        fs::write(&output, render_unit(&merged))
            .map_err(|e| ForgeError::io("write", &output, e))?;

        Ok(Reference::new(spec.qualified_name(), output))
    }

    /// The first source root containing the entity's file.
    fn find_existing(&self, relative: &Path) -> Option<PathBuf> {
        self.config
            .paths
            .effective_source_roots()
            .into_iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.exists())
    }

    fn merge_against(
        &self,
        spec: &EntitySpec,
        generated: SourceUnit,
        existing_path: &Path,
        reporter: &mut ConflictReporter,
    ) -> Result<SourceUnit, ForgeError> {
        let text = fs::read_to_string(existing_path)
            .map_err(|e| ForgeError::io("read", existing_path, e))?;
        match parse_unit(&text) {
            Ok(existing) => {
                let outcome = merge_unit(generated, existing);
                reporter.record(&spec.name, outcome.conflicts);
                Ok(outcome.merged)
            }
            Err(err) => {
                // Unparseable existing file: skip the merge, generated wins.
                warn!(
                    path = %existing_path.display(),
                    %err,
                    "existing file not parseable; regenerated output replaces it"
                );
                Ok(generated)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// check — parser smoke over an existing tree
// ---------------------------------------------------------------------------

/// Result of a read-only round-trip check over a source tree.
#[derive(Clone, Debug, Default)]
pub struct CheckSummary {
    /// Files inspected.
    pub total: usize,

    /// Files that parsed and re-parse to the same tree after rendering.
    pub stable: usize,

    /// Files that failed to parse or whose round-trip diverged, with detail.
    pub problems: Vec<(PathBuf, String)>,
}

impl CheckSummary {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

impl fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) checked, {} stable, {} problem(s)",
            self.total,
            self.stable,
            self.problems.len()
        )
    }
}

/// Parse every `.{extension}` file under `root` and verify it survives a
/// parse → render → parse round trip without structural change. No writes.
///
/// # Errors
/// Only directory traversal failures; per-file problems are collected.
pub fn check_tree(root: &Path, extension: &str) -> Result<CheckSummary, ForgeError> {
    let mut summary = CheckSummary::default();
    let mut files = Vec::new();
    collect_files(root, extension, &mut files)?;
    files.sort();

    for path in files {
        summary.total += 1;
        let text = fs::read_to_string(&path).map_err(|e| ForgeError::io("read", &path, e))?;
        match parse_unit(&text) {
            Ok(unit) => {
                let rendered = render_unit(&unit);
                match parse_unit(&rendered) {
                    Ok(reparsed) if reparsed == unit => summary.stable += 1,
                    Ok(_) => summary
                        .problems
                        .push((path, "round trip changes the tree".to_owned())),
                    Err(err) => summary
                        .problems
                        .push((path, format!("rendered output does not parse: {err}"))),
                }
            }
            Err(err) => summary.problems.push((path, format!("{err}"))),
        }
    }
    Ok(summary)
}

fn collect_files(
    dir: &Path,
    extension: &str,
    out: &mut Vec<PathBuf>,
) -> Result<(), ForgeError> {
    if !dir.exists() {
        return Ok(());
    }
    let entries = fs::read_dir(dir).map_err(|e| ForgeError::io("read directory", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ForgeError::io("read directory", dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, extension, out)?;
        } else if path.extension().is_some_and(|e| e == extension) {
            out.push(path);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
