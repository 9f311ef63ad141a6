//! Pre-overwrite backup snapshots.
//!
//! A [`BackupSet`] lives for one generation run. Every file is backed up at
//! most once per run, keyed by absolute path, so a file touched by several
//! writers still yields a single snapshot. The copy mirrors the file's
//! relative path under whichever source root contains it; files outside
//! every known root land in an `other/` bucket with a logged warning.
//!
//! The seen-set is behind a mutex: entities within one scheduler wave may
//! be processed concurrently.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::ForgeError;

// ---------------------------------------------------------------------------
// BackupSet
// ---------------------------------------------------------------------------

/// Per-run backup state: the target root, the source roots that anchor
/// relative paths, and the set of paths already copied.
#[derive(Debug)]
pub struct BackupSet {
    backup_root: PathBuf,
    source_roots: Vec<PathBuf>,
    seen: Mutex<HashSet<PathBuf>>,
}

impl BackupSet {
    #[must_use]
    pub fn new(backup_root: impl Into<PathBuf>, source_roots: Vec<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
            source_roots,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Snapshot `path` before it is overwritten, unless this run already
    /// did. Returns `true` when a copy was actually made.
    pub fn backup(&self, path: &Path) -> Result<bool, ForgeError> {
        let absolute = fs::canonicalize(path).map_err(|e| ForgeError::io("resolve", path, e))?;

        {
            let mut seen = self
                .seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !seen.insert(absolute.clone()) {
                debug!(path = %absolute.display(), "already backed up this run");
                return Ok(false);
            }
        }

        let target = self.target_for(&absolute);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ForgeError::io("create directory", parent, e))?;
        }
        fs::copy(&absolute, &target).map_err(|e| ForgeError::io("copy", &absolute, e))?;
        debug!(from = %absolute.display(), to = %target.display(), "backup written");
        Ok(true)
    }

    /// Mirror of the relative path under the containing source root, or the
    /// `other/` fallback bucket.
    fn target_for(&self, absolute: &Path) -> PathBuf {
        for root in &self.source_roots {
            let anchored = fs::canonicalize(root).unwrap_or_else(|_| root.clone());
            if let Ok(relative) = absolute.strip_prefix(&anchored) {
                return self.backup_root.join(relative);
            }
        }
        warn!(
            path = %absolute.display(),
            "file is not under any source root; backing up into the 'other' bucket"
        );
        let name = absolute.file_name().unwrap_or_default();
        self.backup_root.join("other").join(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
