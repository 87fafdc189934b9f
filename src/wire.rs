//! The wire codec: the custom text format shared across languages.
//!
//! A container serializes to a single line of ASCII-safe text:
//!
//! ```text
//! @header={{[target_id,T];[target_sub_id,TS];[source_id,S];[source_sub_id,SS];[message_type,M];[version,V];}}@data={{[name,TYPE,value];...}};
//! ```
//!
//! The data section is a *flat* stream of `[name,TYPE,value];` entries.
//! Nesting is not expressed with brackets: a `Container` or `Array` entry
//! carries its child count as its value and is followed inline by that many
//! entries (each possibly composite itself). The decoder reconstructs the
//! tree by consuming exactly the declared number of entries per composite,
//! threading a single cursor through the recursion.
//!
//! Inside names, header values, and value text, a literal `\` is written
//! `\\` and the field terminator `];` is written `\];`. Unescaping resolves
//! `\];` before collapsing `\\`. Names and type tags must not contain `,`
//! (the first two commas of an entry split its fields); value text may.
//! Braces need no escaping: entries delimit themselves with `];`, so the
//! decoder recognizes a section's closing `}}` only between entries, never
//! inside one.
//!
//! ## Examples
//!
//! ```rust
//! use valuepack::{from_wire, to_wire, Container, Value};
//!
//! let mut container = Container::with_message_type("db_result");
//! container.add(Value::int("row_count", 150));
//! container.add(Value::array(
//!     "tags",
//!     vec![Value::string("", "a"), Value::string("", "b")],
//! ));
//!
//! let text = to_wire(&container);
//! assert!(text.contains("[row_count,INT,150];"));
//! assert!(text.contains("[tags,ARRAY,2];[,STRING,a];[,STRING,b];"));
//!
//! let back = from_wire(&text).unwrap();
//! assert_eq!(back, container);
//! ```

use crate::{Container, Error, Result, Value, ValueData, ValueKind, MAX_DEPTH};
use std::borrow::Cow;
use std::fmt::Write as _;

const HEADER_MARK: &str = "@header={{";
const DATA_MARK: &str = "@data={{";

/// Serializes a container to wire text.
///
/// Header fields are written in the fixed order `target_id, target_sub_id,
/// source_id, source_sub_id, message_type, version`; all six always appear.
/// Data entries follow in preorder. Encoding a well-formed tree cannot fail.
#[must_use]
pub fn to_wire(container: &Container) -> String {
    let mut out = String::with_capacity(96 + 32 * container.len());
    out.push_str(HEADER_MARK);
    write_header_entry(&mut out, "target_id", container.target_id());
    write_header_entry(&mut out, "target_sub_id", container.target_sub_id());
    write_header_entry(&mut out, "source_id", container.source_id());
    write_header_entry(&mut out, "source_sub_id", container.source_sub_id());
    write_header_entry(&mut out, "message_type", container.message_type());
    write_header_entry(&mut out, "version", container.version());
    out.push_str("}}");
    out.push_str(DATA_MARK);
    for value in container.values() {
        write_value(&mut out, value);
    }
    out.push_str("}};");
    out
}

/// Parses wire text into a container, header and values.
///
/// The header fields may appear in any order; unknown header keys are
/// ignored, and an absent `message_type` or `version` falls back to the
/// defaults. Type fields accept both the uppercase tags and the decimal
/// codes legacy producers emit.
///
/// # Examples
///
/// ```rust
/// use valuepack::from_wire;
///
/// let text = "@header={{[message_type,db_result];[source_id,cpp_server];}}\
///             @data={{[row_count,INT,150];[status,STRING,success];}};";
/// let container = from_wire(text).unwrap();
/// assert_eq!(container.message_type(), "db_result");
/// assert_eq!(container.get("row_count").unwrap().to_int().unwrap(), 150);
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] for missing or unterminated sections, malformed
/// entries, child counts that overrun the entry stream, and nesting beyond
/// [`MAX_DEPTH`]; [`Error::UnknownType`] for a type token outside the table.
/// The first error aborts the decode; no partial container is returned.
pub fn from_wire(input: &str) -> Result<Container> {
    let (mut container, header_end) = parse_header(input)?;
    let (data_start, data_end) = data_section(input, header_end)?;
    let tokens = tokenize(input, data_start, data_end)?;
    let mut cursor = 0;
    while cursor < tokens.len() {
        let value = consume_value(&tokens, &mut cursor, 0)?;
        container.add(value);
    }
    Ok(container)
}

/// Parses only the header fields of wire text, leaving the value list
/// empty.
///
/// Useful for routing decisions on large payloads; the data section is not
/// inspected and may be absent.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the header section is missing, unterminated,
/// or malformed.
pub fn from_wire_header(input: &str) -> Result<Container> {
    let (container, _) = parse_header(input)?;
    Ok(container)
}

fn write_header_entry(out: &mut String, key: &str, value: &str) {
    // header keys are fixed identifiers, only the value needs escaping
    let _ = write!(out, "[{},{}];", key, escape(value));
}

fn write_value(out: &mut String, value: &Value) {
    match value.data() {
        ValueData::Container(children) | ValueData::Array(children) => {
            let _ = write!(
                out,
                "[{},{},{}];",
                escape(value.name()),
                value.kind().tag(),
                children.len()
            );
            for child in children {
                write_value(out, child);
            }
        }
        _ => {
            let _ = write!(
                out,
                "[{},{},{}];",
                escape(value.name()),
                value.kind().tag(),
                escape(&value.to_string())
            );
        }
    }
}

fn escape(text: &str) -> Cow<'_, str> {
    if text.contains('\\') || text.contains("];") {
        Cow::Owned(text.replace('\\', "\\\\").replace("];", "\\];"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Reverses [`escape`]: `\];` is resolved before `\\` collapses, so an
/// escaped terminator is never mistaken for an escaped backslash followed
/// by a bare terminator.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('\\') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx + 1..];
        if let Some(stripped) = tail.strip_prefix("];") {
            out.push_str("];");
            rest = stripped;
        } else if let Some(stripped) = tail.strip_prefix('\\') {
            out.push('\\');
            rest = stripped;
        } else {
            // lone backslash from a producer that does not escape
            out.push('\\');
            rest = tail;
        }
    }
    out.push_str(rest);
    out
}

/// Parses the header section from its `@header={{` marker, returning the
/// populated header and the offset just past the closing `}}`.
///
/// Entries delimit themselves with their `];` terminators; the closing
/// braces are recognized only between entries, so `}}` inside a field value
/// is ordinary content.
fn parse_header(input: &str) -> Result<(Container, usize)> {
    let mark = input
        .find(HEADER_MARK)
        .ok_or_else(|| Error::parse(0, "missing @header section"))?;
    let bytes = input.as_bytes();
    let mut container = Container::new();
    let mut pos = mark + HEADER_MARK.len();
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(Error::parse(pos, "unterminated @header section"));
        }
        if bytes[pos] == b'}' && bytes.get(pos + 1) == Some(&b'}') {
            return Ok((container, pos + 2));
        }
        if bytes[pos] != b'[' {
            return Err(Error::parse(pos, "expected '[' at start of header entry"));
        }
        let entry = pos;
        let term = find_terminator(bytes, pos + 1)
            .ok_or_else(|| Error::parse(entry, "unterminated header entry"))?;
        let body = &input[entry + 1..term];
        let comma = body
            .find(',')
            .ok_or_else(|| Error::parse(entry, "header entry is missing ','"))?;
        let value = unescape(&body[comma + 1..]);
        match &body[..comma] {
            "source_id" => container.source_id = value,
            "source_sub_id" => container.source_sub_id = value,
            "target_id" => container.target_id = value,
            "target_sub_id" => container.target_sub_id = value,
            "message_type" => container.message_type = value,
            "version" => container.version = value,
            _ => {}
        }
        pos = term + 2;
    }
}

/// Byte offsets of the data section's content, searched from `from` (just
/// past the header's closing braces).
fn data_section(input: &str, from: usize) -> Result<(usize, usize)> {
    let rel = input[from..]
        .find(DATA_MARK)
        .ok_or_else(|| Error::parse(from, "missing @data section"))?;
    let gap = &input[from..from + rel];
    if !gap.chars().all(|c| c.is_whitespace() || c == ';') {
        return Err(Error::parse(from, "unexpected text between @header and @data"));
    }
    let start = from + rel + DATA_MARK.len();
    let end = input.trim_end().len();
    if end < start + 3 || !input[..end].ends_with("}};") {
        return Err(Error::parse(start, "unterminated @data section"));
    }
    Ok((start, end - 3))
}

/// One `[name,TYPE,value];` entry with its fields unescaped and its type
/// resolved.
struct Token {
    name: String,
    kind: ValueKind,
    text: String,
    /// Byte offset of the entry's `[` in the original input, for errors.
    position: usize,
}

fn tokenize(input: &str, start: usize, end: usize) -> Result<Vec<Token>> {
    let section = &input[start..end];
    let bytes = section.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos].is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        if bytes[pos] != b'[' {
            return Err(Error::parse(start + pos, "expected '[' at start of data entry"));
        }
        let entry = pos;
        let term = find_terminator(bytes, pos + 1)
            .ok_or_else(|| Error::parse(start + entry, "unterminated data entry"))?;
        let body = &section[pos + 1..term];
        let comma1 = body
            .find(',')
            .ok_or_else(|| Error::parse(start + entry, "data entry is missing its type field"))?;
        let rest = &body[comma1 + 1..];
        let comma2 = rest
            .find(',')
            .ok_or_else(|| Error::parse(start + entry, "data entry is missing its value field"))?;
        let tag = rest[..comma2].trim();
        let kind = ValueKind::from_tag(tag).ok_or_else(|| Error::unknown_type(tag))?;
        tokens.push(Token {
            name: unescape(&body[..comma1]),
            kind,
            text: unescape(&rest[comma2 + 1..]),
            position: start + entry,
        });
        pos = term + 2;
    }
    Ok(tokens)
}

/// Position of the first unescaped `];` at or after `pos`. A backslash
/// always escapes the byte after it.
fn find_terminator(bytes: &[u8], mut pos: usize) -> Option<usize> {
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b']' if bytes.get(pos + 1) == Some(&b';') => return Some(pos),
            _ => pos += 1,
        }
    }
    None
}

/// Consumes the entry at the cursor, recursing into the following entries
/// for composite kinds. The cursor is shared across the whole recursion so
/// sibling composites continue where the previous subtree ended.
fn consume_value(tokens: &[Token], cursor: &mut usize, depth: usize) -> Result<Value> {
    let token = &tokens[*cursor];
    if depth >= MAX_DEPTH {
        return Err(Error::parse(token.position, "nesting exceeds maximum depth"));
    }
    *cursor += 1;
    if token.kind.is_composite() {
        let declared = token.text.trim().parse::<usize>().map_err(|_| {
            Error::parse(token.position, "composite entry carries a non-numeric child count")
        })?;
        let remaining = tokens.len() - *cursor;
        let mut children = Vec::with_capacity(declared.min(remaining));
        for _ in 0..declared {
            if *cursor >= tokens.len() {
                return Err(Error::parse(
                    token.position,
                    &format!("child count {} overruns the entry stream", declared),
                ));
            }
            children.push(consume_value(tokens, cursor, depth + 1)?);
        }
        Ok(match token.kind {
            ValueKind::Container => Value::container(token.name.clone(), children),
            _ => Value::array(token.name.clone(), children),
        })
    } else {
        Value::from_text(token.name.clone(), token.kind, &token.text).map_err(|e| match e {
            Error::Range { .. } => e,
            _ => Error::parse(
                token.position,
                &format!("malformed {} literal", token.kind.type_name()),
            ),
        })
    }
}
