//! Small merge combinators shared by every node type.
//!
//! The per-field rules ("first non-empty wins", "union with existing
//! precedence", "append generated lines not already present") live here as
//! standalone functions so they stay auditable and independently testable,
//! instead of being inlined at each field site.

use std::collections::HashSet;

use tracing::warn;

use crate::model::Identified;

// ---------------------------------------------------------------------------
// Field combinators
// ---------------------------------------------------------------------------

/// First non-empty of (existing, generated).
#[must_use]
pub fn prefer_non_empty(existing: Option<String>, generated: Option<String>) -> Option<String> {
    let existing_filled = existing.as_deref().is_some_and(|s| !s.trim().is_empty());
    let generated_filled = generated.as_deref().is_some_and(|s| !s.trim().is_empty());
    if existing_filled {
        existing
    } else if generated_filled {
        generated
    } else {
        existing.or(generated)
    }
}

/// Existing lines first, then generated lines not already present verbatim.
///
/// Idempotent: appending the same generated lines to the result of a
/// previous append changes nothing.
#[must_use]
pub fn append_missing_lines(existing: Vec<String>, generated: Vec<String>) -> Vec<String> {
    let present: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let additions: Vec<String> = generated
        .into_iter()
        .filter(|line| !present.contains(line.as_str()))
        .collect();
    let mut out = existing;
    out.extend(additions);
    out
}

/// Union keyed by `key`, existing entries first and winning on duplicates,
/// generated-only entries appended in their own order.
#[must_use]
pub fn union_by<T, K, F>(existing: Vec<T>, generated: Vec<T>, key: F) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut out = existing;
    for item in generated {
        if !out.iter().any(|e| key(e) == key(&item)) {
            out.push(item);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Keyed tree-zip
// ---------------------------------------------------------------------------

/// Collapse duplicate identities within one side: the last sibling with a
/// given key wins. A well-formed generator never produces duplicates, so a
/// collapse is logged as a defect rather than silently absorbed.
#[must_use]
pub fn dedup_by_identity<T: Identified>(items: Vec<T>, side: &str) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let key = item.identity();
        if let Some(slot) = out.iter_mut().find(|e| e.identity() == key) {
            warn!(%key, side, "duplicate identity within one scope; last write wins");
            *slot = item;
        } else {
            out.push(item);
        }
    }
    out
}

/// The generic identity-keyed reconciliation used for nested declarations,
/// attributes, and callables alike.
///
/// Identities present on both sides are merged via `merge_pair`; identities
/// only on the generated side are added as-is; identities only on the
/// existing side are kept as-is (hand-written additions survive
/// regeneration). Output order is generated-side order followed by
/// existing-only items in their original order.
#[must_use]
pub fn merge_keyed<T, F>(generated: Vec<T>, existing: Vec<T>, mut merge_pair: F) -> Vec<T>
where
    T: Identified,
    F: FnMut(T, T) -> T,
{
    let generated = dedup_by_identity(generated, "generated");
    let existing = dedup_by_identity(existing, "existing");

    let mut remaining: Vec<Option<T>> = existing.into_iter().map(Some).collect();
    let mut out = Vec::new();

    for item in generated {
        let key = item.identity();
        let matched = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|e| e.identity() == key))
            .and_then(Option::take);
        match matched {
            Some(theirs) => out.push(merge_pair(item, theirs)),
            None => out.push(item),
        }
    }
    out.extend(remaining.into_iter().flatten());
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
