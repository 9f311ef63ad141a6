//! The structural conflict record.
//!
//! A [`Conflict`] captures one disagreement between freshly generated code
//! and the existing, possibly hand-edited code at the same identity. It
//! carries both snippets and a free-text description. Conflicts never block
//! a merge — they accumulate for the duration of a run and are flushed to
//! the conflict log at the end.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Conflict
// ---------------------------------------------------------------------------

/// A recorded disagreement between generated and existing code.
///
/// Immutable once constructed. The merge engine resolves every conflict
/// deterministically (existing wins); the record exists so a human can
/// review what the regeneration wanted to change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Dotted path to the conflicted item, e.g. `Customer.ageAt(Instant)`.
    pub location: String,

    /// The snippet as found in the existing file (the version that was kept).
    pub existing: String,

    /// The snippet the generator wanted to write.
    pub generated: String,

    /// Free-text description of what disagrees.
    pub description: String,
}

impl Conflict {
    #[must_use]
    pub fn new(
        location: impl Into<String>,
        existing: impl Into<String>,
        generated: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            existing: existing.into(),
            generated: generated.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.description)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_location_and_description() {
        let c = Conflict::new("Customer.name", "val name", "var name", "attribute header differs");
        assert_eq!(format!("{c}"), "Customer.name: attribute header differs");
    }

    #[test]
    fn serde_roundtrip() {
        let c = Conflict::new("A.b()", "old body", "new body", "method body differs");
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"location\":\"A.b()\""));
        let back: Conflict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
