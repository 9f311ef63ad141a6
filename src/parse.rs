//! Source parser for previously generated (and hand-edited) files.
//!
//! Scans lines sequentially, tracking block nesting by brace depth. A line
//! that matches the signature grammar
//! `<visibility?><prefixes?><keyword><name><generics?><params?>` opens a
//! declaration; recognized members and nested declarations inside the block
//! are structured, everything else is retained verbatim as opaque free code
//! so the file round-trips as closely as possible.
//!
//! A contiguous run of `///` lines immediately preceding an item becomes its
//! documentation; `@param` and `@author` tags are lifted into structured
//! metadata. The only hard failure is a file with no recognizable top-level
//! declaration at all.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ForgeError;
use crate::model::{
    Attribute, Callable, Contract, DeclBody, Declaration, DocBlock, Parameter, Record, Singleton,
    SourceUnit, SupertypeRef, TypeAlias, Visibility,
};

const INDENT_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Signature grammar
// ---------------------------------------------------------------------------

static DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(public|internal|protected|private)\s+)?(?:abstract\s+)?(record|object|interface|type)\s+([A-Za-z_][A-Za-z0-9_]*)(?:<([^>]+)>)?\s*(.*)$",
    )
    .expect("declaration header regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(public|internal|protected|private)\s+)?(?:(override)\s+)?(val|var)\s+([A-Za-z_][A-Za-z0-9_]*)\s*:\s*([^={]+?)\s*(?:=\s*(.+?))?\s*(\{)?\s*$",
    )
    .expect("attribute regex")
});

static FUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(public|internal|protected|private)\s+)?(?:(abstract)\s+)?(?:(override)\s+)?fun\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*(?::\s*([^{]+?))?\s*(\{)?\s*$",
    )
    .expect("callable regex")
});

static INIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^init\s*\{\s*$").expect("init regex"));

static USE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^use\s+(\S+)\s*$").expect("use regex"));

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parse the full text of one source file into a [`SourceUnit`].
///
/// # Errors
///
/// Fails only when no recognizable top-level declaration start is found.
pub fn parse_unit(text: &str) -> Result<SourceUnit, ForgeError> {
    let mut parser = Parser::new(text);
    parser.parse_top_level()
}

// ---------------------------------------------------------------------------
// Doc collector
// ---------------------------------------------------------------------------

/// Accumulates a contiguous `///` run until the next item claims it.
#[derive(Default)]
struct DocCollector {
    block: DocBlock,
    /// The original lines, kept so an interrupted run can be preserved
    /// verbatim as free code instead of being dropped.
    raw: Vec<String>,
}

impl DocCollector {
    fn push(&mut self, text: &str) {
        self.raw.push(format!("/// {text}"));
        if let Some(rest) = text.strip_prefix("@param ") {
            let mut split = rest.splitn(2, ' ');
            let name = split.next().unwrap_or_default().to_owned();
            let desc = split.next().unwrap_or_default().to_owned();
            self.block.params.push((name, desc));
        } else if let Some(rest) = text.strip_prefix("@author ") {
            self.block.author = Some(rest.trim().to_owned());
        } else {
            self.block.summary.push(text.to_owned());
        }
    }

    fn take(&mut self) -> DocBlock {
        self.raw.clear();
        std::mem::take(&mut self.block)
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.block = DocBlock::default();
    }

    /// Surrender the pending run verbatim (used when free code interrupts it).
    fn drain_raw(&mut self) -> Vec<String> {
        self.block = DocBlock::default();
        std::mem::take(&mut self.raw)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

/// A validated declaration header line, before its body is consumed.
struct DeclHeader {
    visibility: Visibility,
    keyword: String,
    name: String,
    generics: Vec<String>,
    /// Everything after the name/generics: parameter list, supertypes,
    /// opening brace, or alias target.
    rest: String,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    fn parse_top_level(&mut self) -> Result<SourceUnit, ForgeError> {
        let mut unit = SourceUnit::default();
        let mut doc = DocCollector::default();

        while self.pos < self.lines.len() {
            let raw = self.lines[self.pos];
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                unit.free_code.extend(doc.drain_raw());
                self.pos += 1;
            } else if let Some(text) = doc_text(trimmed) {
                doc.push(text);
                self.pos += 1;
            } else if let Some(caps) = USE_RE.captures(trimmed) {
                unit.imports.push(caps[1].to_owned());
                unit.free_code.extend(doc.drain_raw());
                self.pos += 1;
            } else if let Some(header) = decl_header(trimmed) {
                let decl = self.parse_declaration(header, doc.take(), 0);
                unit.declarations.push(decl);
            } else {
                // Stray top-level text: keep it, and any doc run it
                // interrupted.
                unit.free_code.extend(doc.drain_raw());
                unit.free_code.push(raw.to_owned());
                self.pos += 1;
            }
        }
        unit.free_code.extend(doc.drain_raw());

        if unit.declarations.is_empty() {
            return Err(ForgeError::parse(
                None,
                "no recognizable top-level declaration start",
            ));
        }
        Ok(unit)
    }

    /// Consume a declaration starting at the current line.
    fn parse_declaration(&mut self, header: DeclHeader, doc: DocBlock, depth: usize) -> Declaration {
        match header.keyword.as_str() {
            "type" => {
                self.pos += 1;
                let target = header
                    .rest
                    .strip_prefix('=')
                    .map_or(header.rest.as_str(), str::trim_start)
                    .trim()
                    .to_owned();
                Declaration::Alias(TypeAlias {
                    name: header.name,
                    generics: header.generics,
                    target,
                    visibility: header.visibility,
                    doc,
                })
            }
            "record" => {
                let (ctor_params, after) = split_ctor_params(&header.rest);
                let supertypes = parse_supertypes(&after);
                let (body, init_code) = self.parse_block(depth, true);
                Declaration::Record(Record {
                    name: header.name,
                    generics: header.generics,
                    ctor_params,
                    supertypes,
                    init_code,
                    visibility: header.visibility,
                    doc,
                    body,
                })
            }
            "object" => {
                let supertypes = parse_supertypes(&header.rest);
                let (body, init_code) = self.parse_block(depth, true);
                Declaration::Singleton(Singleton {
                    name: header.name,
                    supertypes,
                    init_code,
                    visibility: header.visibility,
                    doc,
                    body,
                })
            }
            _ => {
                let supertypes = parse_supertypes(&header.rest);
                let (body, _) = self.parse_block(depth, false);
                Declaration::Contract(Contract {
                    name: header.name,
                    generics: header.generics,
                    supertypes,
                    visibility: header.visibility,
                    doc,
                    body,
                })
            }
        }
    }

    /// Consume the block body of the declaration whose header is at the
    /// current line. Returns the structured body and any `init { }` lines.
    ///
    /// When `allow_init` is false (contracts), an `init` block is preserved
    /// verbatim as free code — the variant cannot represent it.
    fn parse_block(&mut self, depth: usize, allow_init: bool) -> (DeclBody, Vec<String>) {
        self.pos += 1; // past the header line
        let mut body = DeclBody::default();
        let mut init_code = Vec::new();
        let mut doc = DocCollector::default();
        let member_depth = depth + 1;

        while self.pos < self.lines.len() {
            let raw = self.lines[self.pos];
            let trimmed = raw.trim();

            if trimmed == "}" {
                self.pos += 1;
                break;
            }
            if trimmed.is_empty() {
                doc.reset();
                self.pos += 1;
                continue;
            }
            if let Some(text) = doc_text(trimmed) {
                doc.push(text);
                self.pos += 1;
                continue;
            }
            if INIT_RE.is_match(trimmed) {
                let lines = self.read_block_lines(member_depth + 1);
                if allow_init {
                    init_code.extend(lines);
                } else {
                    body.free_code.push("init {".to_owned());
                    body.free_code.extend(lines);
                    body.free_code.push("}".to_owned());
                }
                doc.reset();
                continue;
            }
            if let Some(header) = decl_header(trimmed) {
                let nested = self.parse_declaration(header, doc.take(), member_depth);
                body.nested.push(nested);
                continue;
            }
            if let Some(attr) = self.try_attribute(trimmed, &mut doc, member_depth) {
                body.attributes.push(attr);
                continue;
            }
            if let Some(call) = self.try_callable(trimmed, &mut doc, member_depth) {
                body.callables.push(call);
                continue;
            }

            // Unrecognized content: keep it, and any doc run it interrupted.
            body.free_code.extend(doc.drain_raw());
            body.free_code.push(dedent(raw, member_depth));
            self.pos += 1;
        }

        (body, init_code)
    }

    fn try_attribute(
        &mut self,
        trimmed: &str,
        doc: &mut DocCollector,
        member_depth: usize,
    ) -> Option<Attribute> {
        let caps = ATTR_RE.captures(trimmed)?;
        let has_block = caps.get(7).is_some();
        let mut attr = Attribute {
            name: caps[4].to_owned(),
            ty: caps[5].trim().to_owned(),
            mutable: &caps[3] == "var",
            initializer: caps.get(6).map(|m| m.as_str().trim().to_owned()),
            visibility: Visibility::from_keyword(caps.get(1).map(|m| m.as_str())),
            overridden: caps.get(2).is_some(),
            doc: doc.take(),
            ..Attribute::default()
        };
        if has_block {
            attr.body = self.read_block_lines(member_depth + 1);
        } else {
            self.pos += 1;
        }
        Some(attr)
    }

    fn try_callable(
        &mut self,
        trimmed: &str,
        doc: &mut DocCollector,
        member_depth: usize,
    ) -> Option<Callable> {
        let caps = FUN_RE.captures(trimmed)?;
        let has_block = caps.get(7).is_some();
        let params = split_top_level(&caps[5], ',')
            .into_iter()
            .filter_map(|p| {
                let mut split = p.splitn(2, ':');
                let name = split.next()?.trim().to_owned();
                let ty = split.next()?.trim().to_owned();
                Some(Parameter { name, ty })
            })
            .collect();
        let mut call = Callable {
            name: caps[4].to_owned(),
            params,
            ret: caps.get(6).map(|m| m.as_str().trim().to_owned()),
            visibility: Visibility::from_keyword(caps.get(1).map(|m| m.as_str())),
            overridden: caps.get(3).is_some(),
            doc: doc.take(),
            ..Callable::default()
        };
        if has_block {
            call.body = self.read_block_lines(member_depth + 1);
        } else {
            self.pos += 1;
        }
        Some(call)
    }

    /// Consume a block opened on the current line, returning its content
    /// lines dedented to `content_depth`. The closing line is consumed but
    /// not returned. Unterminated blocks run to end of input.
    fn read_block_lines(&mut self, content_depth: usize) -> Vec<String> {
        let mut depth = brace_delta(self.lines[self.pos]);
        self.pos += 1;
        let mut lines = Vec::new();
        while self.pos < self.lines.len() {
            let raw = self.lines[self.pos];
            depth += brace_delta(raw);
            self.pos += 1;
            if depth <= 0 {
                break;
            }
            lines.push(dedent(raw, content_depth));
        }
        lines
    }
}

// ---------------------------------------------------------------------------
// Line-level helpers
// ---------------------------------------------------------------------------

fn doc_text(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix("///")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Validate a declaration header line. Block-bodied keywords must end with
/// an opening brace; aliases must carry an `=` target.
fn decl_header(trimmed: &str) -> Option<DeclHeader> {
    let caps = DECL_RE.captures(trimmed)?;
    let keyword = caps[2].to_owned();
    let rest = caps.get(5).map_or("", |m| m.as_str()).trim().to_owned();
    if keyword == "type" {
        if !rest.starts_with('=') {
            return None;
        }
    } else if !rest.ends_with('{') {
        return None;
    }
    let generics = caps
        .get(4)
        .map(|m| split_top_level(m.as_str(), ','))
        .unwrap_or_default();
    Some(DeclHeader {
        visibility: Visibility::from_keyword(caps.get(1).map(|m| m.as_str())),
        keyword,
        name: caps[3].to_owned(),
        generics,
        rest,
    })
}

/// Net brace depth change contributed by one line. Braces inside string
/// literals do not count; `\"` inside a literal does not close it.
fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut in_string = false;
    let mut escaped = false;
    for ch in line.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

/// Strip up to `levels` indentation steps of leading spaces.
fn dedent(line: &str, levels: usize) -> String {
    let expected = levels * INDENT_WIDTH;
    let strip = line
        .bytes()
        .take(expected)
        .take_while(|&b| b == b' ')
        .count();
    line[strip..].to_owned()
}

/// Split on `separator` at nesting depth zero (tracking `<>` and `()`).
fn split_top_level(s: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in s.chars() {
        match ch {
            '<' | '(' => {
                depth += 1;
                current.push(ch);
            }
            '>' | ')' => {
                depth -= 1;
                current.push(ch);
            }
            c if c == separator && depth == 0 => {
                parts.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_owned());
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Split the constructor parameter list off a record header remainder.
/// Returns the parsed parameters and everything after the closing paren.
fn split_ctor_params(rest: &str) -> (Vec<Parameter>, String) {
    let Some(open) = rest.find('(') else {
        return (Vec::new(), rest.to_owned());
    };
    let mut depth = 0i32;
    for (i, ch) in rest.char_indices().skip(open) {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let inner = &rest[open + 1..i];
                    let after = rest[i + 1..].to_owned();
                    let params = split_top_level(inner, ',')
                        .into_iter()
                        .filter_map(|p| {
                            let mut split = p.splitn(2, ':');
                            let name = split.next()?.trim().to_owned();
                            let ty = split.next()?.trim().to_owned();
                            Some(Parameter { name, ty })
                        })
                        .collect();
                    return (params, after);
                }
            }
            _ => {}
        }
    }
    (Vec::new(), rest.to_owned())
}

/// Parse the supertype list out of a header remainder like
/// `: Party(id), Auditable {`.
fn parse_supertypes(rest: &str) -> Vec<SupertypeRef> {
    let trimmed = rest.trim().trim_end_matches('{').trim();
    let Some(list) = trimmed.strip_prefix(':') else {
        return Vec::new();
    };
    split_top_level(list, ',')
        .into_iter()
        .map(|item| {
            if let Some(open) = item.find('(') {
                let inner = item[open + 1..].trim_end_matches(')');
                let args = split_top_level(inner, ',');
                SupertypeRef::primary(item[..open].trim(), args)
            } else {
                SupertypeRef::plain(item)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identified, IdentityKey};

    const SAMPLE: &str = r"use core.time.Instant

/// A customer of the store.
/// @param id unique identifier
/// @author generator
record Customer(id: String, name: String) : Party(id), Auditable {
    val displayName: String = name

    init {
        require(id)
    }

    fun describe(): String

    /// Greets the customer.
    fun greet(prefix: String): String {
        return prefix + name
    }

    record Address(street: String) {
    }
}

interface Auditable {
    fun auditTag(): String
}
";

    #[test]
    fn parses_imports() {
        let unit = parse_unit(SAMPLE).expect("parse");
        assert_eq!(unit.imports, vec!["core.time.Instant".to_owned()]);
    }

    #[test]
    fn parses_top_level_declarations() {
        let unit = parse_unit(SAMPLE).expect("parse");
        assert_eq!(unit.declarations.len(), 2);
        assert_eq!(unit.declarations[0].name(), "Customer");
        assert_eq!(unit.declarations[1].name(), "Auditable");
    }

    #[test]
    fn record_header_fields() {
        let unit = parse_unit(SAMPLE).expect("parse");
        let Declaration::Record(rec) = &unit.declarations[0] else {
            panic!("expected record");
        };
        assert_eq!(rec.ctor_params.len(), 2);
        assert_eq!(rec.ctor_params[0].name, "id");
        assert_eq!(rec.supertypes.len(), 2);
        assert!(rec.supertypes[0].is_primary());
        assert_eq!(rec.supertypes[0].target, "Party");
        assert_eq!(rec.supertypes[0].ctor_args, Some(vec!["id".to_owned()]));
        assert!(!rec.supertypes[1].is_primary());
    }

    #[test]
    fn doc_block_structured() {
        let unit = parse_unit(SAMPLE).expect("parse");
        let doc = unit.declarations[0].doc();
        assert_eq!(doc.summary, vec!["A customer of the store.".to_owned()]);
        assert_eq!(doc.param("id"), Some("unique identifier"));
        assert_eq!(doc.author.as_deref(), Some("generator"));
    }

    #[test]
    fn init_block_captured() {
        let unit = parse_unit(SAMPLE).expect("parse");
        let Declaration::Record(rec) = &unit.declarations[0] else {
            panic!("expected record");
        };
        assert_eq!(rec.init_code, vec!["require(id)".to_owned()]);
    }

    #[test]
    fn abstract_and_implemented_members() {
        let unit = parse_unit(SAMPLE).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(body.callables.len(), 2);
        assert!(body.callables[0].is_abstract());
        assert_eq!(body.callables[0].name, "describe");
        assert!(!body.callables[1].is_abstract());
        assert_eq!(body.callables[1].body, vec!["return prefix + name".to_owned()]);
        assert_eq!(
            body.callables[1].doc.summary,
            vec!["Greets the customer.".to_owned()]
        );
    }

    #[test]
    fn nested_declaration_parsed() {
        let unit = parse_unit(SAMPLE).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(body.nested.len(), 1);
        assert_eq!(body.nested[0].name(), "Address");
    }

    #[test]
    fn callable_identity_from_parse() {
        let unit = parse_unit(SAMPLE).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(
            body.callables[1].identity(),
            IdentityKey::signature("greet", vec!["String".to_owned()])
        );
    }

    #[test]
    fn attribute_with_initializer() {
        let unit = parse_unit(SAMPLE).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(body.attributes.len(), 1);
        let attr = &body.attributes[0];
        assert_eq!(attr.name, "displayName");
        assert_eq!(attr.ty, "String");
        assert_eq!(attr.initializer.as_deref(), Some("name"));
        assert!(!attr.mutable);
    }

    #[test]
    fn computed_attribute_block() {
        let text = "object Registry {\n    private val tag: String {\n        return \"r\"\n    }\n}\n";
        let unit = parse_unit(text).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        let attr = &body.attributes[0];
        assert!(attr.is_computed());
        assert_eq!(attr.visibility, Visibility::Private);
        assert_eq!(attr.body, vec!["return \"r\"".to_owned()]);
    }

    #[test]
    fn unrecognized_lines_preserved_as_free_code() {
        let text = "record Holder(x: Int) {\n    companion helper = wire(x)\n}\n";
        let unit = parse_unit(text).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(body.free_code, vec!["companion helper = wire(x)".to_owned()]);
    }

    #[test]
    fn interrupted_doc_run_preserved() {
        let text = "record Holder(x: Int) {\n    /// stray note\n    companion helper\n}\n";
        let unit = parse_unit(text).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(
            body.free_code,
            vec!["/// stray note".to_owned(), "companion helper".to_owned()]
        );
    }

    #[test]
    fn init_in_contract_preserved_verbatim() {
        let text = "interface Weird {\n    init {\n        boom()\n    }\n}\n";
        let unit = parse_unit(text).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(
            body.free_code,
            vec!["init {".to_owned(), "boom()".to_owned(), "}".to_owned()]
        );
        assert!(unit.declarations[0].init_code().is_empty());
    }

    #[test]
    fn multiline_member_bodies_keep_inner_braces() {
        let text = "record Holder(x: Int) {\n    fun pick(): Int {\n        if (x > 0) {\n            return x\n        }\n        return 0\n    }\n}\n";
        let unit = parse_unit(text).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(
            body.callables[0].body,
            vec![
                "if (x > 0) {".to_owned(),
                "    return x".to_owned(),
                "}".to_owned(),
                "return 0".to_owned(),
            ]
        );
    }

    #[test]
    fn brace_inside_string_does_not_close_block() {
        let text = "record Holder(x: Int) {\n    fun close(): String {\n        return \"}\"\n    }\n\n    fun after(): Int {\n        return x\n    }\n}\n";
        let unit = parse_unit(text).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(body.callables.len(), 2);
        assert_eq!(body.callables[0].body, vec!["return \"}\"".to_owned()]);
        assert_eq!(body.callables[1].name, "after");

        let reparsed = parse_unit(&crate::emit::render_unit(&unit)).expect("reparse");
        assert_eq!(reparsed, unit);
    }

    #[test]
    fn escaped_quote_keeps_string_state() {
        let text = "record Holder(x: Int) {\n    fun q(): String {\n        return \"\\\"{\"\n    }\n}\n";
        let unit = parse_unit(text).expect("parse");
        let body = unit.declarations[0].body().expect("body");
        assert_eq!(body.callables.len(), 1);
        assert_eq!(body.callables[0].body, vec!["return \"\\\"{\"".to_owned()]);
    }

    #[test]
    fn stray_top_level_text_preserved() {
        let text = "record Holder(x: Int) {\n}\n\nloose directive\n";
        let unit = parse_unit(text).expect("parse");
        assert_eq!(unit.free_code, vec!["loose directive".to_owned()]);

        let reparsed = parse_unit(&crate::emit::render_unit(&unit)).expect("reparse");
        assert_eq!(reparsed, unit);
    }

    #[test]
    fn dangling_doc_run_kept_as_top_level_free_text() {
        let text = "object Registry {\n}\n\n/// orphan note\n";
        let unit = parse_unit(text).expect("parse");
        assert_eq!(unit.free_code, vec!["/// orphan note".to_owned()]);
    }

    #[test]
    fn type_alias_top_level() {
        let unit = parse_unit("type Names = List<String>\n").expect("parse");
        let Declaration::Alias(alias) = &unit.declarations[0] else {
            panic!("expected alias");
        };
        assert_eq!(alias.name, "Names");
        assert_eq!(alias.target, "List<String>");
    }

    #[test]
    fn type_alias_with_generics() {
        let unit = parse_unit("internal type Bag<T> = Map<T, Int>\n").expect("parse");
        let Declaration::Alias(alias) = &unit.declarations[0] else {
            panic!("expected alias");
        };
        assert_eq!(alias.generics, vec!["T".to_owned()]);
        assert_eq!(alias.target, "Map<T, Int>");
        assert_eq!(alias.visibility, Visibility::Internal);
    }

    #[test]
    fn no_declaration_is_an_error() {
        let err = parse_unit("just some prose\nand more\n").expect_err("should fail");
        assert!(matches!(err, ForgeError::Parse { .. }));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_unit("").is_err());
    }

    #[test]
    fn explicit_public_normalizes_to_default() {
        let unit = parse_unit("public object Registry {\n}\n").expect("parse");
        assert_eq!(unit.declarations[0].visibility(), Visibility::Public);
    }

    #[test]
    fn generic_params_split_respects_nesting() {
        assert_eq!(
            split_top_level("Map<String, Int>, List<Pair<A, B>>", ','),
            vec!["Map<String, Int>".to_owned(), "List<Pair<A, B>>".to_owned()]
        );
    }

    #[test]
    fn supertype_with_empty_parens_is_primary() {
        let supers = parse_supertypes(": Base(), Extra {");
        assert_eq!(supers.len(), 2);
        assert!(supers[0].is_primary());
        assert_eq!(supers[0].ctor_args, Some(vec![]));
        assert!(!supers[1].is_primary());
    }

    #[test]
    fn roundtrip_through_emitter() {
        let unit = parse_unit(SAMPLE).expect("parse");
        let rendered = crate::emit::render_unit(&unit);
        let reparsed = parse_unit(&rendered).expect("reparse");
        assert_eq!(reparsed, unit);
    }
}
