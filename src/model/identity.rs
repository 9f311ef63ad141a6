//! Identity keys for merge matching.
//!
//! An [`IdentityKey`] uniquely identifies a declaration, attribute, or
//! callable within one enclosing scope. Declarations and attributes match by
//! plain name; callables match by name plus the ordered list of parameter
//! base-type tokens, so overloads with the same name stay distinct.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// IdentityKey
// ---------------------------------------------------------------------------

/// The value used to match an item across two trees being merged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityKey {
    /// Plain-name identity (declarations, attributes).
    Name(String),

    /// Overload-aware identity (callables).
    Signature {
        name: String,
        param_types: Vec<String>,
    },
}

impl IdentityKey {
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    #[must_use]
    pub fn signature(name: impl Into<String>, param_types: Vec<String>) -> Self {
        Self::Signature {
            name: name.into(),
            param_types,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Signature { name, param_types } => {
                write!(f, "{name}({})", param_types.join(", "))
            }
        }
    }
}

/// Anything that can be matched across two trees by identity.
pub trait Identified {
    fn identity(&self) -> IdentityKey;
}

// ---------------------------------------------------------------------------
// Base-type tokens
// ---------------------------------------------------------------------------

/// Reduce a type expression to its base token for identity purposes.
///
/// Strips generic arguments, nullability markers, and surrounding
/// whitespace: `List<Customer>?` → `List`. Overload matching deliberately
/// ignores generic arguments — `List<A>` and `List<B>` occupy the same
/// identity slot.
#[must_use]
pub fn base_type_token(ty: &str) -> String {
    let trimmed = ty.trim();
    let no_generics = trimmed.split('<').next().unwrap_or(trimmed);
    no_generics.trim_end_matches('?').trim().to_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_token_plain() {
        assert_eq!(base_type_token("String"), "String");
    }

    #[test]
    fn base_token_strips_generics() {
        assert_eq!(base_type_token("Map<String, List<Int>>"), "Map");
    }

    #[test]
    fn base_token_strips_nullability_and_space() {
        assert_eq!(base_type_token(" Instant? "), "Instant");
        assert_eq!(base_type_token("List<Foo>?"), "List");
    }

    #[test]
    fn name_keys_compare_by_name() {
        assert_eq!(IdentityKey::name("x"), IdentityKey::name("x"));
        assert_ne!(IdentityKey::name("x"), IdentityKey::name("y"));
    }

    #[test]
    fn signature_keys_include_param_types() {
        let a = IdentityKey::signature("f", vec!["Int".to_owned()]);
        let b = IdentityKey::signature("f", vec!["String".to_owned()]);
        assert_ne!(a, b);
        assert_ne!(a, IdentityKey::name("f"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(format!("{}", IdentityKey::name("total")), "total");
        assert_eq!(
            format!(
                "{}",
                IdentityKey::signature("of", vec!["Long".to_owned(), "Int".to_owned()])
            ),
            "of(Long, Int)"
        );
    }

    #[test]
    fn keys_order_deterministically() {
        let mut keys = vec![
            IdentityKey::signature("b", vec![]),
            IdentityKey::name("a"),
            IdentityKey::name("c"),
        ];
        keys.sort();
        let rendered: Vec<_> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a", "c", "b()"]);
    }
}
