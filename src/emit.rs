//! Deterministic serialization of the declaration tree.
//!
//! Emission order inside a declaration body is fixed: documentation, nested
//! type aliases, plain attributes, initialization code, abstract members,
//! computed attributes (public then non-public), contract-implementing
//! members, remaining methods, preserved free code, and finally nested
//! declarations. Repeated runs over an unchanged tree produce byte-identical
//! output.
//!
//! The signature renderers in this module are also the comparison basis for
//! the merge engine's "compared as rendered text" header rule.

use std::fmt::Write as _;

use crate::model::{Attribute, Callable, DeclBody, Declaration, DocBlock, SourceUnit, TypeAlias};

const INDENT: &str = "    ";

// ---------------------------------------------------------------------------
// Signatures — rendered headers used for merge comparison
// ---------------------------------------------------------------------------

/// Render the comparable header of a declaration: visibility, keyword, name,
/// and the constructor parameter list where applicable.
///
/// Generics and supertypes are excluded — they merge under their own rules.
#[must_use]
pub fn decl_signature(decl: &Declaration) -> String {
    let mut out = format!(
        "{}{} {}",
        decl.visibility().prefix(),
        decl.keyword(),
        decl.name()
    );
    if let Declaration::Record(rec) = decl {
        let params: Vec<String> = rec.ctor_params.iter().map(ToString::to_string).collect();
        let _ = write!(out, "({})", params.join(", "));
    }
    out
}

/// Render the comparable header of an attribute.
#[must_use]
pub fn attribute_signature(attr: &Attribute) -> String {
    format!(
        "{}{}{} {}: {}",
        attr.visibility.prefix(),
        if attr.overridden { "override " } else { "" },
        if attr.mutable { "var" } else { "val" },
        attr.name,
        attr.ty
    )
}

/// Render the comparable header of a callable, including the return type.
#[must_use]
pub fn callable_signature(call: &Callable) -> String {
    let params: Vec<String> = call.params.iter().map(ToString::to_string).collect();
    let mut out = format!(
        "{}{}fun {}({})",
        call.visibility.prefix(),
        if call.overridden { "override " } else { "" },
        call.name,
        params.join(", ")
    );
    if let Some(ret) = &call.ret {
        let _ = write!(out, ": {ret}");
    }
    out
}

// ---------------------------------------------------------------------------
// Unit rendering
// ---------------------------------------------------------------------------

/// Serialize a whole source unit back to text.
#[must_use]
pub fn render_unit(unit: &SourceUnit) -> String {
    let mut out = String::new();
    for import in &unit.imports {
        let _ = writeln!(out, "use {import}");
    }
    if !unit.imports.is_empty() && !unit.declarations.is_empty() {
        out.push('\n');
    }
    for (i, decl) in unit.declarations.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_declaration(&mut out, decl, 0);
    }
    if !unit.free_code.is_empty() {
        if !unit.imports.is_empty() || !unit.declarations.is_empty() {
            out.push('\n');
        }
        for line in &unit.free_code {
            let _ = writeln!(out, "{line}");
        }
    }
    out
}

/// Serialize a single declaration at nesting depth zero.
#[must_use]
pub fn render_declaration(decl: &Declaration) -> String {
    let mut out = String::new();
    write_declaration(&mut out, decl, 0);
    out
}

// ---------------------------------------------------------------------------
// Declaration rendering
// ---------------------------------------------------------------------------

fn pad(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_line(out: &mut String, depth: usize, text: &str) {
    if text.is_empty() {
        out.push('\n');
    } else {
        pad(out, depth);
        out.push_str(text);
        out.push('\n');
    }
}

fn write_doc(out: &mut String, doc: &DocBlock, depth: usize) {
    for line in &doc.summary {
        write_line(out, depth, &format!("/// {line}"));
    }
    for (name, desc) in &doc.params {
        write_line(out, depth, &format!("/// @param {name} {desc}"));
    }
    if let Some(author) = &doc.author {
        write_line(out, depth, &format!("/// @author {author}"));
    }
}

fn generics_suffix(generics: &[String]) -> String {
    if generics.is_empty() {
        String::new()
    } else {
        format!("<{}>", generics.join(", "))
    }
}

fn write_alias(out: &mut String, alias: &TypeAlias, depth: usize) {
    write_doc(out, &alias.doc, depth);
    write_line(
        out,
        depth,
        &format!(
            "{}type {}{} = {}",
            alias.visibility.prefix(),
            alias.name,
            generics_suffix(&alias.generics),
            alias.target
        ),
    );
}

fn write_declaration(out: &mut String, decl: &Declaration, depth: usize) {
    match decl {
        Declaration::Alias(alias) => write_alias(out, alias, depth),
        Declaration::Record(rec) => {
            write_doc(out, &rec.doc, depth);
            let params: Vec<String> = rec.ctor_params.iter().map(ToString::to_string).collect();
            let header = format!(
                "{}record {}{}({}){} {{",
                rec.visibility.prefix(),
                rec.name,
                generics_suffix(&rec.generics),
                params.join(", "),
                supertypes_suffix(decl),
            );
            write_line(out, depth, &header);
            write_body(out, &rec.body, &rec.init_code, depth + 1);
            write_line(out, depth, "}");
        }
        Declaration::Singleton(sing) => {
            write_doc(out, &sing.doc, depth);
            let header = format!(
                "{}object {}{} {{",
                sing.visibility.prefix(),
                sing.name,
                supertypes_suffix(decl),
            );
            write_line(out, depth, &header);
            write_body(out, &sing.body, &sing.init_code, depth + 1);
            write_line(out, depth, "}");
        }
        Declaration::Contract(con) => {
            write_doc(out, &con.doc, depth);
            let header = format!(
                "{}interface {}{}{} {{",
                con.visibility.prefix(),
                con.name,
                generics_suffix(&con.generics),
                supertypes_suffix(decl),
            );
            write_line(out, depth, &header);
            write_body(out, &con.body, &[], depth + 1);
            write_line(out, depth, "}");
        }
    }
}

/// Render the supertype list, primary parent first, as ` : A(x), B`.
fn supertypes_suffix(decl: &Declaration) -> String {
    let supers = decl.supertypes();
    if supers.is_empty() {
        return String::new();
    }
    let mut ordered: Vec<String> = Vec::with_capacity(supers.len());
    for s in supers.iter().filter(|s| s.is_primary()) {
        ordered.push(s.to_string());
    }
    for s in supers.iter().filter(|s| !s.is_primary()) {
        ordered.push(s.to_string());
    }
    format!(" : {}", ordered.join(", "))
}

// ---------------------------------------------------------------------------
// Body rendering — fixed section order
// ---------------------------------------------------------------------------

struct SectionWriter {
    any_written: bool,
}

impl SectionWriter {
    const fn new() -> Self {
        Self { any_written: false }
    }

    /// Blank line between sections, none before the first.
    fn separate(&mut self, out: &mut String) {
        if self.any_written {
            out.push('\n');
        }
        self.any_written = true;
    }
}

fn write_body(out: &mut String, body: &DeclBody, init_code: &[String], depth: usize) {
    let mut sections = SectionWriter::new();

    // 1. Nested type aliases.
    let aliases: Vec<&Declaration> = body
        .nested
        .iter()
        .filter(|d| matches!(d, Declaration::Alias(_)))
        .collect();
    if !aliases.is_empty() {
        sections.separate(out);
        for decl in aliases {
            write_declaration(out, decl, depth);
        }
    }

    // 2. Plain attributes.
    let plain: Vec<&Attribute> = body.attributes.iter().filter(|a| !a.is_computed()).collect();
    if !plain.is_empty() {
        sections.separate(out);
        for attr in plain {
            write_plain_attribute(out, attr, depth);
        }
    }

    // 3. Initialization code.
    if !init_code.is_empty() {
        sections.separate(out);
        write_line(out, depth, "init {");
        for line in init_code {
            write_code_line(out, line, depth + 1);
        }
        write_line(out, depth, "}");
    }

    // 4. Abstract / unimplemented members.
    write_callable_section(out, body, &mut sections, depth, |c| c.is_abstract());

    // 5. Computed attributes, public then non-public.
    let computed_public: Vec<&Attribute> = body
        .attributes
        .iter()
        .filter(|a| a.is_computed() && a.visibility == crate::model::Visibility::Public)
        .collect();
    let computed_rest: Vec<&Attribute> = body
        .attributes
        .iter()
        .filter(|a| a.is_computed() && a.visibility != crate::model::Visibility::Public)
        .collect();
    for group in [computed_public, computed_rest] {
        if !group.is_empty() {
            sections.separate(out);
            for attr in group {
                write_computed_attribute(out, attr, depth);
            }
        }
    }

    // 6. Contract-implementing members.
    write_callable_section(out, body, &mut sections, depth, |c| {
        !c.is_abstract() && c.interface_impl
    });

    // 7. Remaining methods.
    write_callable_section(out, body, &mut sections, depth, |c| {
        !c.is_abstract() && !c.interface_impl
    });

    // 8. Preserved free code, verbatim.
    if !body.free_code.is_empty() {
        sections.separate(out);
        for line in &body.free_code {
            write_code_line(out, line, depth);
        }
    }

    // 9. Nested declarations (everything but aliases).
    let nested: Vec<&Declaration> = body
        .nested
        .iter()
        .filter(|d| !matches!(d, Declaration::Alias(_)))
        .collect();
    for decl in nested {
        sections.separate(out);
        write_declaration(out, decl, depth);
    }
}

fn write_callable_section(
    out: &mut String,
    body: &DeclBody,
    sections: &mut SectionWriter,
    depth: usize,
    select: impl Fn(&Callable) -> bool,
) {
    let group: Vec<&Callable> = body.callables.iter().filter(|c| select(c)).collect();
    if group.is_empty() {
        return;
    }
    sections.separate(out);
    for (i, call) in group.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_callable(out, call, depth);
    }
}

fn write_plain_attribute(out: &mut String, attr: &Attribute, depth: usize) {
    write_doc(out, &attr.doc, depth);
    let mut line = attribute_signature(attr);
    if let Some(init) = &attr.initializer {
        let _ = write!(line, " = {init}");
    }
    write_line(out, depth, &line);
}

fn write_computed_attribute(out: &mut String, attr: &Attribute, depth: usize) {
    write_doc(out, &attr.doc, depth);
    write_line(out, depth, &format!("{} {{", attribute_signature(attr)));
    for line in &attr.body {
        write_code_line(out, line, depth + 1);
    }
    write_line(out, depth, "}");
}

fn write_callable(out: &mut String, call: &Callable, depth: usize) {
    write_doc(out, &call.doc, depth);
    if call.is_abstract() {
        write_line(out, depth, &callable_signature(call));
        return;
    }
    write_line(out, depth, &format!("{} {{", callable_signature(call)));
    for line in &call.body {
        write_code_line(out, line, depth + 1);
    }
    write_line(out, depth, "}");
}

/// Body lines are stored dedented; re-indent unless the line is blank.
fn write_code_line(out: &mut String, line: &str, depth: usize) {
    if line.trim().is_empty() {
        out.push('\n');
    } else {
        write_line(out, depth, line);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
