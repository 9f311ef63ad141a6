//! In-memory model of a generated code unit.
//!
//! A [`SourceUnit`] is the tree the rest of the pipeline operates on: the
//! parser produces one from existing file text, the entity generators produce
//! one from the entity model, the merge engine reconciles two of them, and
//! the emitter serializes the result back to text.

pub mod conflict;
pub mod decl;
pub mod identity;

pub use conflict::Conflict;
pub use decl::{
    Attribute, Callable, Contract, DeclBody, Declaration, DocBlock, Parameter, Record, Singleton,
    SourceUnit, SupertypeRef, TypeAlias, Visibility,
};
pub use identity::{Identified, IdentityKey};
