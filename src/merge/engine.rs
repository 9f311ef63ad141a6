//! Recursive identity-based reconciliation of two declaration trees.
//!
//! `merge(generated, existing)` is total over well-formed trees sharing the
//! same top-level identity: it never fails, it only accumulates conflicts.
//! The bias is fixed and intentional, and the two directions differ:
//!
//! - On any disagreement at a matched identity (headers, leaf code), the
//!   **existing** side wins — hand edits to generated output are assumed
//!   intentional, and the generated version is surfaced only inside the
//!   conflict record.
//! - Identities present on one side only pass through: existing-only items
//!   survive regeneration, generated-only items are added silently.
//!
//! Conflict entries are appended in traversal order: header, parents, then
//! member identities in generated-side order with existing-only additions
//! last, so repeated runs report identically.

use tracing::warn;

use crate::emit::{attribute_signature, callable_signature, decl_signature};
use crate::model::{
    Attribute, Callable, Conflict, Contract, DeclBody, Declaration, DocBlock, Identified, Record,
    Singleton, SourceUnit, SupertypeRef, TypeAlias,
};

use super::combine::{append_missing_lines, merge_keyed, prefer_non_empty, union_by};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of merging one declaration pair.
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    pub merged: Declaration,
    pub conflicts: Vec<Conflict>,
}

/// Result of merging a whole source unit against its existing file.
#[derive(Clone, Debug)]
pub struct UnitMergeOutcome {
    pub merged: SourceUnit,
    pub conflicts: Vec<Conflict>,
}

/// Merge a freshly generated declaration against the existing (parsed) one
/// with the same identity key.
#[must_use]
pub fn merge(generated: Declaration, existing: Declaration) -> MergeOutcome {
    let mut merger = Merger::default();
    let merged = merger.merge_decl(generated, existing);
    MergeOutcome {
        merged,
        conflicts: merger.conflicts,
    }
}

/// Merge a generated source unit against the existing file's unit.
///
/// Imports and stray top-level text are unioned (existing order first);
/// top-level declarations are reconciled by identity like any other scope.
#[must_use]
pub fn merge_unit(generated: SourceUnit, existing: SourceUnit) -> UnitMergeOutcome {
    let mut merger = Merger::default();
    let imports = append_missing_lines(existing.imports, generated.imports);
    let declarations = merge_keyed(generated.declarations, existing.declarations, |g, e| {
        merger.merge_decl(g, e)
    });
    UnitMergeOutcome {
        merged: SourceUnit {
            imports,
            declarations,
            free_code: append_missing_lines(existing.free_code, generated.free_code),
        },
        conflicts: merger.conflicts,
    }
}

// ---------------------------------------------------------------------------
// Merger — conflict accumulation and path tracking
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Merger {
    conflicts: Vec<Conflict>,
    path: Vec<String>,
}

impl Merger {
    fn location(&self) -> String {
        self.path.join(".")
    }

    fn conflict(&mut self, existing: &str, generated: &str, description: &str) {
        self.conflicts.push(Conflict::new(
            self.location(),
            existing,
            generated,
            description,
        ));
    }

    // -- declarations --

    fn merge_decl(&mut self, generated: Declaration, existing: Declaration) -> Declaration {
        self.path.push(existing.name().to_owned());

        let generated_sig = decl_signature(&generated);
        let existing_sig = decl_signature(&existing);
        if generated_sig != existing_sig {
            self.conflict(
                &existing_sig,
                &generated_sig,
                "declaration header differs; existing kept",
            );
        }

        let merged = match (generated, existing) {
            (Declaration::Alias(g), Declaration::Alias(e)) => {
                Declaration::Alias(self.merge_alias(g, e))
            }
            (Declaration::Record(g), Declaration::Record(e)) => {
                Declaration::Record(self.merge_record(g, e))
            }
            (Declaration::Singleton(g), Declaration::Singleton(e)) => {
                Declaration::Singleton(self.merge_singleton(g, e))
            }
            (Declaration::Contract(g), Declaration::Contract(e)) => {
                Declaration::Contract(self.merge_contract(g, e))
            }
            (generated, existing) => self.merge_mismatched_kinds(generated, existing),
        };

        self.path.pop();
        merged
    }

    fn merge_alias(&mut self, generated: TypeAlias, existing: TypeAlias) -> TypeAlias {
        if generated.target != existing.target {
            self.conflict(
                &existing.target,
                &generated.target,
                "alias target differs; existing kept",
            );
        }
        TypeAlias {
            name: existing.name,
            generics: union_by(existing.generics, generated.generics, Clone::clone),
            target: existing.target,
            visibility: existing.visibility,
            doc: merge_doc(existing.doc, generated.doc),
        }
    }

    fn merge_record(&mut self, generated: Record, existing: Record) -> Record {
        Record {
            name: existing.name,
            generics: union_by(existing.generics, generated.generics, Clone::clone),
            ctor_params: existing.ctor_params,
            supertypes: self.merge_supertypes(generated.supertypes, existing.supertypes),
            init_code: append_missing_lines(existing.init_code, generated.init_code),
            visibility: existing.visibility,
            doc: merge_doc(existing.doc, generated.doc),
            body: self.merge_body(generated.body, existing.body),
        }
    }

    fn merge_singleton(&mut self, generated: Singleton, existing: Singleton) -> Singleton {
        Singleton {
            name: existing.name,
            supertypes: self.merge_supertypes(generated.supertypes, existing.supertypes),
            init_code: append_missing_lines(existing.init_code, generated.init_code),
            visibility: existing.visibility,
            doc: merge_doc(existing.doc, generated.doc),
            body: self.merge_body(generated.body, existing.body),
        }
    }

    fn merge_contract(&mut self, generated: Contract, existing: Contract) -> Contract {
        Contract {
            name: existing.name,
            generics: union_by(existing.generics, generated.generics, Clone::clone),
            supertypes: self.merge_supertypes(generated.supertypes, existing.supertypes),
            visibility: existing.visibility,
            doc: merge_doc(existing.doc, generated.doc),
            body: self.merge_body(generated.body, existing.body),
        }
    }

    /// The two sides disagree on the declaration kind itself. The header
    /// conflict is already recorded; the existing node wins structurally,
    /// with documentation and (where both sides have one) member bodies
    /// still merged.
    fn merge_mismatched_kinds(
        &mut self,
        mut generated: Declaration,
        mut existing: Declaration,
    ) -> Declaration {
        if !generated.init_code().is_empty() && !existing.supports_init_code() {
            // Structural incompatibility, not a value disagreement: logged,
            // not recorded as a conflict.
            warn!(
                location = %self.location(),
                "initialization code dropped: target declaration kind cannot hold an init block"
            );
        }

        let generated_doc = generated.doc().clone();
        let merged_doc = merge_doc(existing.doc().clone(), generated_doc);
        *existing.doc_mut() = merged_doc;

        if let Some(generated_body) = generated.body_mut().map(std::mem::take) {
            if let Some(existing_body) = existing.body_mut() {
                let taken = std::mem::take(existing_body);
                *existing_body = self.merge_body(generated_body, taken);
            }
        }
        existing
    }

    // -- supertypes --

    /// Primary parent: conflict when both sides name a different one,
    /// otherwise whichever side specifies it. Non-primary supertypes are
    /// unioned; a generated-side addition is included but flagged for human
    /// review as a new extension.
    fn merge_supertypes(
        &mut self,
        generated: Vec<SupertypeRef>,
        existing: Vec<SupertypeRef>,
    ) -> Vec<SupertypeRef> {
        let generated_primary = generated.iter().find(|s| s.is_primary()).cloned();
        let existing_primary = existing.iter().find(|s| s.is_primary()).cloned();

        let primary = match (generated_primary, existing_primary) {
            (Some(g), Some(e)) => {
                if g != e {
                    self.conflict(
                        &e.to_string(),
                        &g.to_string(),
                        "primary parent differs; existing kept",
                    );
                }
                Some(e)
            }
            (Some(g), None) => Some(g),
            (None, e) => e,
        };

        let mut out: Vec<SupertypeRef> = primary.into_iter().collect();
        for s in existing.into_iter().filter(|s| !s.is_primary()) {
            if !out.iter().any(|o| o.target == s.target) {
                out.push(s);
            }
        }
        for s in generated.into_iter().filter(|s| !s.is_primary()) {
            if !out.iter().any(|o| o.target == s.target) {
                self.conflict(
                    "",
                    &s.to_string(),
                    "new supertype extension introduced by regeneration; review required",
                );
                out.push(s);
            }
        }
        out
    }

    // -- members --

    fn merge_body(&mut self, generated: DeclBody, existing: DeclBody) -> DeclBody {
        let attributes = merge_keyed(generated.attributes, existing.attributes, |g, e| {
            self.merge_attribute(g, e)
        });
        let callables = merge_keyed(generated.callables, existing.callables, |g, e| {
            self.merge_callable(g, e)
        });
        let nested = merge_keyed(generated.nested, existing.nested, |g, e| {
            self.merge_decl(g, e)
        });
        DeclBody {
            attributes,
            callables,
            nested,
            free_code: append_missing_lines(existing.free_code, generated.free_code),
        }
    }

    fn merge_attribute(&mut self, generated: Attribute, existing: Attribute) -> Attribute {
        self.path.push(existing.name.clone());

        let generated_sig = attribute_signature(&generated);
        let existing_sig = attribute_signature(&existing);
        if generated_sig != existing_sig {
            self.conflict(
                &existing_sig,
                &generated_sig,
                "attribute header differs; existing kept",
            );
        }
        if generated.initializer != existing.initializer {
            self.conflict(
                existing.initializer.as_deref().unwrap_or_default(),
                generated.initializer.as_deref().unwrap_or_default(),
                "attribute initializer differs; existing kept",
            );
        }
        if generated.body != existing.body {
            self.conflict(
                &existing.body.join("\n"),
                &generated.body.join("\n"),
                "attribute accessor body differs; existing kept",
            );
        }

        let mut merged = existing;
        let existing_doc = std::mem::take(&mut merged.doc);
        merged.doc = merge_doc(existing_doc, generated.doc);
        merged.interface_impl = merged.interface_impl || generated.interface_impl;

        self.path.pop();
        merged
    }

    fn merge_callable(&mut self, generated: Callable, existing: Callable) -> Callable {
        self.path.push(existing.identity().to_string());

        let generated_sig = callable_signature(&generated);
        let existing_sig = callable_signature(&existing);
        if generated_sig != existing_sig {
            self.conflict(
                &existing_sig,
                &generated_sig,
                "callable header differs; existing kept",
            );
        }
        if generated.body != existing.body {
            self.conflict(
                &existing.body.join("\n"),
                &generated.body.join("\n"),
                "method body differs; existing kept",
            );
        }

        let mut merged = existing;
        let existing_doc = std::mem::take(&mut merged.doc);
        merged.doc = merge_doc(existing_doc, generated.doc);
        merged.interface_impl = merged.interface_impl || generated.interface_impl;

        self.path.pop();
        merged
    }
}

// ---------------------------------------------------------------------------
// Documentation merge — first non-empty wins, independently per field
// ---------------------------------------------------------------------------

fn merge_doc(existing: DocBlock, generated: DocBlock) -> DocBlock {
    DocBlock {
        summary: if existing.summary.is_empty() {
            generated.summary
        } else {
            existing.summary
        },
        params: union_by(existing.params, generated.params, |(name, _)| name.clone()),
        author: prefer_non_empty(existing.author, generated.author),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
