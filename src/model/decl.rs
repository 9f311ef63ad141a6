//! Declaration tree types.
//!
//! The sealed set of declaration variants is a tagged union rather than a
//! trait hierarchy: the merge engine pattern-matches variant-specific rules
//! exhaustively (initialization code is legal only for records and
//! singletons, contracts may carry unimplemented members, and so on).
//!
//! All types serialize as tagged snake_case JSON so conflict dumps and test
//! fixtures stay readable.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::identity::{Identified, IdentityKey, base_type_token};

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Declared visibility of a declaration or member.
///
/// `Public` is the default and is omitted when rendering, so a file that
/// never spells out `public` round-trips byte-identically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

impl Visibility {
    /// The source keyword for this visibility, if one is emitted.
    #[must_use]
    pub const fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Public => None,
            Self::Internal => Some("internal"),
            Self::Protected => Some("protected"),
            Self::Private => Some("private"),
        }
    }

    /// Parse a visibility keyword. `None` input means the default.
    #[must_use]
    pub fn from_keyword(word: Option<&str>) -> Self {
        match word {
            Some("internal") => Self::Internal,
            Some("protected") => Self::Protected,
            Some("private") => Self::Private,
            _ => Self::Public,
        }
    }

    /// Rendered prefix including a trailing space, empty for `Public`.
    #[must_use]
    pub fn prefix(self) -> String {
        self.keyword().map_or_else(String::new, |k| format!("{k} "))
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword().unwrap_or("public"))
    }
}

// ---------------------------------------------------------------------------
// DocBlock
// ---------------------------------------------------------------------------

/// Structured documentation attached to a declaration or member.
///
/// Built from the contiguous `///` run immediately preceding the item.
/// `@param` and `@author` tags are parsed out of the run and stored here
/// instead of being duplicated in the opaque body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocBlock {
    /// Free-form summary lines, without the `///` prefix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<String>,

    /// `@param <name> <description>` tags, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<(String, String)>,

    /// `@author <name>` tag, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl DocBlock {
    /// Returns `true` if no documentation was captured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.params.is_empty() && self.author.is_none()
    }

    /// Description text for a named parameter, if documented.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parameter / SupertypeRef
// ---------------------------------------------------------------------------

/// A single `name: Type` parameter of a constructor or callable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: String,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// The base-type token used for identity matching (generics stripped).
    #[must_use]
    pub fn base_type(&self) -> String {
        base_type_token(&self.ty)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// A supertype reference: a target type plus optional constructor arguments.
///
/// At most one supertype per declaration may carry constructor arguments —
/// that one is the primary parent. `ctor_args: Some(vec![])` means the
/// reference was written with empty parentheses (`Base()`), which still
/// marks it primary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupertypeRef {
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctor_args: Option<Vec<String>>,
}

impl SupertypeRef {
    /// A plain (non-primary) supertype reference.
    #[must_use]
    pub fn plain(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ctor_args: None,
        }
    }

    /// A primary-parent reference carrying constructor arguments.
    #[must_use]
    pub fn primary(target: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            target: target.into(),
            ctor_args: Some(args),
        }
    }

    /// Whether this reference supplies constructor arguments.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.ctor_args.is_some()
    }
}

impl fmt::Display for SupertypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ctor_args {
            Some(args) => write!(f, "{}({})", self.target, args.join(", ")),
            None => write!(f, "{}", self.target),
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// A value member (`val`/`var`) of a declaration.
///
/// `initializer` holds the `= expr` text of a plain attribute. `body` holds
/// the block of a computed attribute; both may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub ty: String,

    /// `var` if `true`, `val` otherwise.
    #[serde(default)]
    pub mutable: bool,

    /// The `= expr` initializer text, without the `=`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<String>,

    /// Computed-accessor block lines. Non-empty marks the attribute computed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,

    #[serde(default)]
    pub visibility: Visibility,

    /// Carries the `override` prefix.
    #[serde(default)]
    pub overridden: bool,

    /// Set by generators when this member implements a contract member.
    /// Not recoverable from source text alone.
    #[serde(default)]
    pub interface_impl: bool,

    #[serde(default, skip_serializing_if = "DocBlock::is_empty")]
    pub doc: DocBlock,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ..Self::default()
        }
    }

    /// A computed attribute has an accessor body instead of an initializer.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        !self.body.is_empty()
    }
}

impl Identified for Attribute {
    fn identity(&self) -> IdentityKey {
        IdentityKey::name(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Callable
// ---------------------------------------------------------------------------

/// A callable member (`fun`).
///
/// An empty body marks the callable abstract/unimplemented. Body lines are
/// stored dedented relative to the member header; the emitter re-indents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callable {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Parameter>,

    /// Return type, `None` for unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ret: Option<String>,

    /// Opaque body lines; empty marks the member abstract.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,

    #[serde(default)]
    pub visibility: Visibility,

    /// Carries the `override` prefix.
    #[serde(default)]
    pub overridden: bool,

    /// Set by generators when this member implements a contract member.
    #[serde(default)]
    pub interface_impl: bool,

    #[serde(default, skip_serializing_if = "DocBlock::is_empty")]
    pub doc: DocBlock,
}

impl Callable {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An abstract callable has no body to emit.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.body.is_empty()
    }
}

impl Identified for Callable {
    fn identity(&self) -> IdentityKey {
        IdentityKey::signature(
            &self.name,
            self.params.iter().map(Parameter::base_type).collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// DeclBody — shared payload of record / singleton / contract
// ---------------------------------------------------------------------------

/// The member payload shared by all block-bodied declaration variants.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclBody {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callables: Vec<Callable>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<Declaration>,

    /// Lines inside the block the parser could not structure. Preserved
    /// verbatim so the file round-trips as closely as possible.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub free_code: Vec<String>,
}

impl DeclBody {
    /// Returns `true` if the body holds nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.callables.is_empty()
            && self.nested.is_empty()
            && self.free_code.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Declaration variants
// ---------------------------------------------------------------------------

/// `type Name<G> = Target` — a transparent alias, no members.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,

    pub target: String,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default, skip_serializing_if = "DocBlock::is_empty")]
    pub doc: DocBlock,
}

/// `record Name<G>(params) : Parent(args), Iface { ... }` — the only variant
/// with a constructor parameter list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ctor_params: Vec<Parameter>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<SupertypeRef>,

    /// `init { ... }` block lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_code: Vec<String>,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default, skip_serializing_if = "DocBlock::is_empty")]
    pub doc: DocBlock,

    #[serde(default, skip_serializing_if = "DeclBody::is_empty")]
    pub body: DeclBody,
}

/// `object Name : Iface { ... }` — at most one logical instance, no
/// constructor parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Singleton {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<SupertypeRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_code: Vec<String>,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default, skip_serializing_if = "DocBlock::is_empty")]
    pub doc: DocBlock,

    #[serde(default, skip_serializing_if = "DeclBody::is_empty")]
    pub body: DeclBody,
}

/// `interface Name<G> : Super { ... }` — cannot hold initialization code;
/// members may be unimplemented.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<SupertypeRef>,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default, skip_serializing_if = "DocBlock::is_empty")]
    pub doc: DocBlock,

    #[serde(default, skip_serializing_if = "DeclBody::is_empty")]
    pub body: DeclBody,
}

/// One node of the structured code-unit tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Alias(TypeAlias),
    Record(Record),
    Singleton(Singleton),
    Contract(Contract),
}

impl Declaration {
    /// The declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Alias(d) => &d.name,
            Self::Record(d) => &d.name,
            Self::Singleton(d) => &d.name,
            Self::Contract(d) => &d.name,
        }
    }

    /// The declaration keyword as written in source.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Alias(_) => "type",
            Self::Record(_) => "record",
            Self::Singleton(_) => "object",
            Self::Contract(_) => "interface",
        }
    }

    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        match self {
            Self::Alias(d) => d.visibility,
            Self::Record(d) => d.visibility,
            Self::Singleton(d) => d.visibility,
            Self::Contract(d) => d.visibility,
        }
    }

    #[must_use]
    pub const fn doc(&self) -> &DocBlock {
        match self {
            Self::Alias(d) => &d.doc,
            Self::Record(d) => &d.doc,
            Self::Singleton(d) => &d.doc,
            Self::Contract(d) => &d.doc,
        }
    }

    pub const fn doc_mut(&mut self) -> &mut DocBlock {
        match self {
            Self::Alias(d) => &mut d.doc,
            Self::Record(d) => &mut d.doc,
            Self::Singleton(d) => &mut d.doc,
            Self::Contract(d) => &mut d.doc,
        }
    }

    /// The member payload, `None` for aliases.
    #[must_use]
    pub const fn body(&self) -> Option<&DeclBody> {
        match self {
            Self::Alias(_) => None,
            Self::Record(d) => Some(&d.body),
            Self::Singleton(d) => Some(&d.body),
            Self::Contract(d) => Some(&d.body),
        }
    }

    pub const fn body_mut(&mut self) -> Option<&mut DeclBody> {
        match self {
            Self::Alias(_) => None,
            Self::Record(d) => Some(&mut d.body),
            Self::Singleton(d) => Some(&mut d.body),
            Self::Contract(d) => Some(&mut d.body),
        }
    }

    /// Supertype references, empty for aliases.
    #[must_use]
    pub fn supertypes(&self) -> &[SupertypeRef] {
        match self {
            Self::Alias(_) => &[],
            Self::Record(d) => &d.supertypes,
            Self::Singleton(d) => &d.supertypes,
            Self::Contract(d) => &d.supertypes,
        }
    }

    /// The primary parent — the supertype reference carrying constructor
    /// arguments — if one is declared.
    #[must_use]
    pub fn primary_parent(&self) -> Option<&SupertypeRef> {
        self.supertypes().iter().find(|s| s.is_primary())
    }

    /// Whether this variant can represent `init { ... }` code.
    #[must_use]
    pub const fn supports_init_code(&self) -> bool {
        matches!(self, Self::Record(_) | Self::Singleton(_))
    }

    /// Initialization code lines, empty where unsupported.
    #[must_use]
    pub fn init_code(&self) -> &[String] {
        match self {
            Self::Record(d) => &d.init_code,
            Self::Singleton(d) => &d.init_code,
            Self::Alias(_) | Self::Contract(_) => &[],
        }
    }
}

impl Identified for Declaration {
    fn identity(&self) -> IdentityKey {
        IdentityKey::name(self.name())
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword(), self.name())
    }
}

// ---------------------------------------------------------------------------
// SourceUnit
// ---------------------------------------------------------------------------

/// A whole code unit: file-level imports plus top-level declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// `use a.b.c` import paths, without the keyword.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    pub declarations: Vec<Declaration>,

    /// Top-level lines outside any declaration that the parser could not
    /// structure. Preserved verbatim so a mis-parse never loses code.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub free_code: Vec<String>,
}

impl SourceUnit {
    #[must_use]
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self {
            imports: Vec::new(),
            declarations,
            free_code: Vec::new(),
        }
    }

    /// Find a top-level declaration by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
