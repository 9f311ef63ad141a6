//! Dependency-ordered emission scheduling.
//!
//! Entities are emitted in waves: a wave holds every not-yet-emitted entity
//! whose parents all have a [`Reference`] already, either supplied up front
//! or produced by an earlier wave. When no entity is ready but some are
//! still pending, the graph is cyclic or depends on something outside the
//! batch; the scheduler warns and force-emits the remainder with whatever
//! partial parent references exist, so a run always terminates and every
//! entity is emitted exactly once.
//!
//! Resolved references accumulate by folding each wave's output into a fresh
//! snapshot; emission within one wave only ever reads the snapshot taken at
//! the wave boundary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::ForgeError;

// ---------------------------------------------------------------------------
// Reference / ScheduleNode
// ---------------------------------------------------------------------------

/// A resolved reference to an emitted entity's declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Fully qualified declaration name, e.g. `crm.model.Customer`.
    pub qualified_name: String,

    /// Path of the written output file.
    pub path: PathBuf,
}

impl Reference {
    #[must_use]
    pub fn new(qualified_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            path: path.into(),
        }
    }
}

/// Anything the scheduler can order: an identity plus parent identities.
pub trait ScheduleNode {
    fn id(&self) -> &str;
    fn parent_ids(&self) -> &[String];
}

// ---------------------------------------------------------------------------
// ScheduleResult
// ---------------------------------------------------------------------------

/// Outcome of one scheduling run.
#[derive(Clone, Debug, Default)]
pub struct ScheduleResult {
    /// Reference per successfully emitted entity, ordered by id.
    pub resolved: BTreeMap<String, Reference>,

    /// Entities whose emission failed; they stay absent from `resolved` and
    /// their children may have been emitted with partial parent references.
    pub failed: Vec<String>,

    waves: Vec<Vec<String>>,
}

impl ScheduleResult {
    /// Entity ids grouped by the wave they were emitted in.
    #[must_use]
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    /// The wave index an entity was emitted in, if it was part of the batch.
    #[must_use]
    pub fn wave_of(&self, id: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|w| w == id))
    }
}

// ---------------------------------------------------------------------------
// schedule
// ---------------------------------------------------------------------------

/// Emit `entities` in dependency order.
///
/// `prior` seeds the resolved map with references produced outside this
/// batch. `emit` is called exactly once per entity, with the references
/// resolved before the entity's wave began; an emission error marks only
/// that entity failed and the batch continues.
pub fn schedule<T, F>(
    entities: Vec<T>,
    prior: &BTreeMap<String, Reference>,
    mut emit: F,
) -> ScheduleResult
where
    T: ScheduleNode,
    F: FnMut(&T, &BTreeMap<String, Reference>) -> Result<Reference, ForgeError>,
{
    let mut pending = entities;
    pending.sort_by(|a, b| a.id().cmp(b.id()));

    let mut known = prior.clone();
    let mut result = ScheduleResult::default();

    while !pending.is_empty() {
        let (ready, blocked): (Vec<T>, Vec<T>) = pending
            .into_iter()
            .partition(|e| e.parent_ids().iter().all(|p| known.contains_key(p)));

        let (wave, rest) = if ready.is_empty() {
            for entity in &blocked {
                let missing: Vec<&str> = entity
                    .parent_ids()
                    .iter()
                    .filter(|p| !known.contains_key(*p))
                    .map(String::as_str)
                    .collect();
                warn!(
                    entity = entity.id(),
                    unresolved = ?missing,
                    "dependency cycle or unresolvable parent; force-emitting with partial references"
                );
            }
            (blocked, Vec::new())
        } else {
            (ready, blocked)
        };

        // Snapshot for this wave: emissions within the wave never observe
        // each other's references.
        let snapshot = known.clone();
        let mut wave_ids = Vec::with_capacity(wave.len());
        for entity in &wave {
            wave_ids.push(entity.id().to_owned());
            match emit(entity, &snapshot) {
                Ok(reference) => {
                    known.insert(entity.id().to_owned(), reference.clone());
                    result.resolved.insert(entity.id().to_owned(), reference);
                }
                Err(err) => {
                    error!(entity = entity.id(), %err, "emission failed; entity skipped");
                    result.failed.push(entity.id().to_owned());
                }
            }
        }
        result.waves.push(wave_ids);
        pending = rest;
    }

    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
