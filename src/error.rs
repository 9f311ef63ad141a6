//! Unified error type for modelforge operations.
//!
//! Each variant is self-contained: the message describes what went wrong and
//! what to do about it, without requiring extra context from the caller.
//! Structural conflicts are deliberately *not* errors — they are data,
//! collected by the merge engine and reported at the end of the run.

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ForgeError
// ---------------------------------------------------------------------------

/// Unified error type for generation, parsing, and filesystem operations.
#[derive(Debug)]
pub enum ForgeError {
    /// An existing file contained no recognizable top-level declaration.
    ///
    /// Recoverable at batch scope: the merge is skipped for that file and
    /// the generated tree wins outright.
    Parse {
        /// Path of the file that failed to parse, if known.
        path: Option<PathBuf>,
        /// What the parser was unable to find.
        detail: String,
    },

    /// An I/O operation failed.
    Io {
        /// What was being attempted (e.g. `"read"`, `"write"`, `"copy"`).
        op: &'static str,
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The configuration file could not be loaded or parsed.
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// An entity description is unusable (empty name, self-parent, ...).
    InvalidEntity {
        /// The entity name as provided.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A domain generator failed to produce a tree for an entity.
    Generate {
        /// The entity being generated.
        entity: String,
        /// Description of the failure.
        detail: String,
    },
}

impl ForgeError {
    /// Convenience constructor for I/O failures with path context.
    #[must_use]
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Convenience constructor for parse failures.
    #[must_use]
    pub fn parse(path: Option<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Parse {
            path,
            detail: detail.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for ForgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { path, detail } => {
                match path {
                    Some(p) => write!(f, "cannot parse '{}': {detail}", p.display())?,
                    None => write!(f, "cannot parse source text: {detail}")?,
                }
                write!(
                    f,
                    "\n  The file is skipped for merging; regenerated output replaces it wholesale."
                )
            }
            Self::Io { op, path, source } => {
                write!(
                    f,
                    "{op} failed for '{}': {source}\n  To fix: check the path, permissions, and disk space.",
                    path.display()
                )
            }
            Self::Config { path, detail } => {
                write!(
                    f,
                    "configuration error in '{}': {detail}\n  To fix: edit the config file and correct the issue.",
                    path.display()
                )
            }
            Self::InvalidEntity { name, reason } => {
                write!(
                    f,
                    "invalid entity '{name}': {reason}\n  To fix: correct the entity model and re-run."
                )
            }
            Self::Generate { entity, detail } => {
                write!(f, "generation failed for entity '{entity}': {detail}")
            }
        }
    }
}

impl std::error::Error for ForgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_with_path() {
        let err = ForgeError::parse(Some(PathBuf::from("src/Customer.mf")), "no declaration found");
        let msg = format!("{err}");
        assert!(msg.contains("src/Customer.mf"));
        assert!(msg.contains("no declaration found"));
        assert!(msg.contains("skipped for merging"));
    }

    #[test]
    fn display_parse_without_path() {
        let err = ForgeError::parse(None, "empty input");
        assert!(format!("{err}").contains("source text"));
    }

    #[test]
    fn display_io_includes_operation_and_path() {
        let err = ForgeError::io(
            "write",
            "out/Customer.mf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = format!("{err}");
        assert!(msg.contains("write failed"));
        assert!(msg.contains("out/Customer.mf"));
        assert!(msg.contains("permissions"));
    }

    #[test]
    fn display_config() {
        let err = ForgeError::Config {
            path: PathBuf::from("modelforge.toml"),
            detail: "unknown field 'foo'".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("modelforge.toml"));
        assert!(msg.contains("unknown field 'foo'"));
    }

    #[test]
    fn display_invalid_entity() {
        let err = ForgeError::InvalidEntity {
            name: "Customer".to_owned(),
            reason: "lists itself as a parent".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Customer"));
        assert!(msg.contains("lists itself"));
    }

    #[test]
    fn io_error_exposes_source() {
        let err = ForgeError::io(
            "read",
            "x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn non_io_has_no_source() {
        let err = ForgeError::parse(None, "x");
        assert!(std::error::Error::source(&err).is_none());
    }
}
