//! Generator configuration (`modelforge.toml`).
//!
//! Typed configuration for one generation project: the project identifier,
//! the roots the generator reads and writes under, and reporting options.
//! Missing file → all defaults (no error); unknown fields are rejected with
//! line-level detail.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ForgeError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level modelforge configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
#[derive(Default)]
pub struct ForgeConfig {
    /// Project identity.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Filesystem roots.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Conflict reporting options.
    #[serde(default)]
    pub report: ReportConfig,
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

/// Project identity settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project identifier, used in conflict log names (default: `"modelforge"`).
    #[serde(default = "default_project_name")]
    pub name: String,

    /// File extension of generated source files, without the dot
    /// (default: `"mf"`).
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            extension: default_extension(),
        }
    }
}

fn default_project_name() -> String {
    "modelforge".to_owned()
}

fn default_extension() -> String {
    "mf".to_owned()
}

// ---------------------------------------------------------------------------
// PathsConfig
// ---------------------------------------------------------------------------

/// Filesystem roots for output, merging, and backups.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Where merged output is written (default: `"generated"`).
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Roots searched for existing files to merge against. Empty means the
    /// output root alone.
    #[serde(default)]
    pub source_roots: Vec<PathBuf>,

    /// Where pre-overwrite snapshots are stored
    /// (default: `".modelforge/backup"`).
    #[serde(default = "default_backup_root")]
    pub backup_root: PathBuf,

    /// Where conflict logs are written. Defaults to `<output_root>/merge-logs`.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            source_roots: Vec::new(),
            backup_root: default_backup_root(),
            log_dir: None,
        }
    }
}

impl PathsConfig {
    /// The source roots to search, falling back to the output root.
    #[must_use]
    pub fn effective_source_roots(&self) -> Vec<PathBuf> {
        if self.source_roots.is_empty() {
            vec![self.output_root.clone()]
        } else {
            self.source_roots.clone()
        }
    }

    /// The conflict log directory, defaulting next to the output root.
    #[must_use]
    pub fn effective_log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| crate::report::default_log_dir(&self.output_root))
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("generated")
}

fn default_backup_root() -> PathBuf {
    PathBuf::from(".modelforge/backup")
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

/// Conflict reporting options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Also write a machine-readable JSON conflict dump next to the log.
    #[serde(default)]
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ForgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML or unknown fields,
    ///   returns a [`ForgeError::Config`] with line-level detail.
    ///
    /// # Errors
    /// Returns `ForgeError::Config` on I/O errors (other than not-found) or
    /// parse errors.
    pub fn load(path: &Path) -> Result<Self, ForgeError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ForgeError::Config {
                    path: path.to_owned(),
                    detail: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|detail| ForgeError::Config {
            path: path.to_owned(),
            detail,
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns the parse message, with a line number when available.
    pub fn parse(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            message
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_all_fields() {
        let cfg = ForgeConfig::default();
        assert_eq!(cfg.project.name, "modelforge");
        assert_eq!(cfg.project.extension, "mf");
        assert_eq!(cfg.paths.output_root, PathBuf::from("generated"));
        assert!(cfg.paths.source_roots.is_empty());
        assert_eq!(cfg.paths.backup_root, PathBuf::from(".modelforge/backup"));
        assert!(!cfg.report.json);
    }

    #[test]
    fn parse_empty_string() {
        let cfg = ForgeConfig::parse("").unwrap();
        assert_eq!(cfg, ForgeConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "crm"
extension = "kt"

[paths]
output_root = "out/src"
source_roots = ["out/src", "handwritten"]
backup_root = "out/backup"
log_dir = "out/logs"

[report]
json = true
"#;
        let cfg = ForgeConfig::parse(toml).unwrap();
        assert_eq!(cfg.project.name, "crm");
        assert_eq!(cfg.project.extension, "kt");
        assert_eq!(cfg.paths.output_root, PathBuf::from("out/src"));
        assert_eq!(cfg.paths.source_roots.len(), 2);
        assert_eq!(cfg.paths.effective_log_dir(), PathBuf::from("out/logs"));
        assert!(cfg.report.json);
    }

    #[test]
    fn parse_partial_config_uses_defaults() {
        let cfg = ForgeConfig::parse("[project]\nname = \"billing\"\n").unwrap();
        assert_eq!(cfg.project.name, "billing");
        assert_eq!(cfg.project.extension, "mf");
        assert_eq!(cfg.paths.output_root, PathBuf::from("generated"));
    }

    #[test]
    fn effective_source_roots_fall_back_to_output_root() {
        let cfg = ForgeConfig::default();
        assert_eq!(
            cfg.paths.effective_source_roots(),
            vec![PathBuf::from("generated")]
        );

        let cfg = ForgeConfig::parse("[paths]\nsource_roots = [\"a\", \"b\"]\n").unwrap();
        assert_eq!(
            cfg.paths.effective_source_roots(),
            vec![PathBuf::from("a"), PathBuf::from("b")]
        );
    }

    #[test]
    fn effective_log_dir_defaults_under_output_root() {
        let cfg = ForgeConfig::default();
        assert_eq!(
            cfg.paths.effective_log_dir(),
            PathBuf::from("generated/merge-logs")
        );
    }

    #[test]
    fn parse_rejects_unknown_top_level_field() {
        let err = ForgeConfig::parse("unknown_field = true\n").unwrap_err();
        assert!(err.contains("unknown field"), "got: {err}");
    }

    #[test]
    fn parse_rejects_unknown_nested_field() {
        let err = ForgeConfig::parse("[project]\nname = \"x\"\nextra = 1\n").unwrap_err();
        assert!(err.contains("unknown field"), "got: {err}");
    }

    #[test]
    fn parse_includes_line_number_on_error() {
        let err = ForgeConfig::parse("good = 1\n[project]\nname = 42\n").unwrap_err();
        assert!(err.contains("line"), "got: {err}");
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let cfg = ForgeConfig::load(Path::new("/nonexistent/modelforge.toml")).unwrap();
        assert_eq!(cfg, ForgeConfig::default());
    }

    #[test]
    fn load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modelforge.toml");
        std::fs::write(&path, "[project]\nname = \"loaded\"\n").unwrap();
        let cfg = ForgeConfig::load(&path).unwrap();
        assert_eq!(cfg.project.name, "loaded");
    }

    #[test]
    fn load_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid [[[toml").unwrap();
        let err = ForgeConfig::load(&path).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("bad.toml"));
    }
}
