use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use modelforge::batch::{BuiltinSource, GenerationRun, check_tree};
use modelforge::config::ForgeConfig;
use modelforge::entity::load_entities;
use modelforge::telemetry;

/// Regeneration-safe source-code generator
///
/// modelforge turns a declarative entity model into a tree of source
/// declarations, then reconciles each freshly generated file with whatever
/// a developer has hand-edited in the previously generated output — so
/// re-running the generator never silently destroys manual work.
///
/// Hand edits always win structurally; everything the regeneration wanted
/// to change instead is itemized in a per-run conflict log for review.
/// Entities are emitted parents-first; cyclic models still terminate with
/// a warning and best-effort references.
///
/// QUICK START:
///
///   modelforge generate entities.json
///
///   # Review conflicts from the run:
///   cat generated/merge-logs/<project>-<date>.log
///
///   # Verify the output tree still parses cleanly:
///   modelforge check
#[derive(Parser)]
#[command(name = "modelforge")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(
    after_help = "See 'modelforge <command> --help' for more information on a specific command."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, env = "MODELFORGE_CONFIG", default_value = "modelforge.toml")]
    config: PathBuf,

    /// Emit log events as JSON instead of human-readable text.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and merge output for an entity model
    ///
    /// Reads the JSON entity list, schedules entities parents-first, merges
    /// each generated file against the existing one under the source roots,
    /// backs up files before overwriting, and writes the conflict log.
    Generate {
        /// Path to the JSON entity list.
        entities: PathBuf,
    },

    /// Verify existing output parses and round-trips cleanly
    ///
    /// Read-only: parses every generated file under the output root (or the
    /// given directory) and reports files that fail to parse or that change
    /// structurally across a parse/render round trip.
    Check {
        /// Directory to check instead of the configured output root.
        root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json);

    let config = ForgeConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Commands::Generate { entities } => generate(config, &entities),
        Commands::Check { root } => check(&config, root),
    }
}

fn generate(config: ForgeConfig, entities_path: &PathBuf) -> Result<()> {
    let entities = load_entities(entities_path)
        .with_context(|| format!("loading {}", entities_path.display()))?;
    let run = GenerationRun::new(config);
    let summary = run.run(entities, &BuiltinSource)?;
    println!("{summary}");
    if summary.is_success() {
        Ok(())
    } else {
        bail!("{} entity(ies) failed; see the log for details", summary.failed.len());
    }
}

fn check(config: &ForgeConfig, root: Option<PathBuf>) -> Result<()> {
    let root = root.unwrap_or_else(|| config.paths.output_root.clone());
    let summary = check_tree(&root, &config.project.extension)
        .with_context(|| format!("checking {}", root.display()))?;
    println!("{summary}");
    for (path, detail) in &summary.problems {
        eprintln!("  {}: {detail}", path.display());
    }
    if summary.is_clean() {
        Ok(())
    } else {
        bail!("{} file(s) need attention", summary.problems.len());
    }
}
