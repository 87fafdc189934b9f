//! The JSON dialect adapter: one value model, three wire shapes.
//!
//! Three generations of producers write JSON for the same containers:
//!
//! - **v2.0**: the current envelope, `{"container": {"version": "2.0",
//!   "metadata": {..}, "values": [..]}}` with native JSON scalars, base64
//!   `Bytes` flagged by an `"encoding"` field, and composites nesting their
//!   children inside `data`.
//! - **nested**: the legacy C++ shape, a `header` object plus a `values`
//!   object keyed by value name, every scalar rendered as text. Duplicate
//!   sibling names cannot be represented; the last one wins on encode.
//! - **flat**: the legacy Python shape, header fields at the top level and
//!   a `values` array of `{name, type, data}` objects with the type as a
//!   decimal code string.
//!
//! [`detect_format`] classifies a document without erroring, and
//! [`convert_format`] rewrites any recognized dialect into any other by
//! round-tripping through [`Container`].
//!
//! Readers are liberal where the dialects overlap: `type` may be a JSON
//! number, a decimal string, or an uppercase tag, and scalar `data` is
//! accepted both as a native JSON value and as its text form.
//!
//! ## Examples
//!
//! ```rust
//! use valuepack::json::{convert_format, detect_format, Detection, Dialect};
//! use valuepack::{json, Container, Value};
//!
//! let mut container = Container::with_message_type("telemetry");
//! container.add(Value::int("reading", 42));
//!
//! let flat = json::to_flat(&container);
//! assert_eq!(detect_format(&flat), Detection::Flat);
//!
//! let v2 = convert_format(&flat, Dialect::V2).unwrap();
//! assert_eq!(json::from_v2(&v2).unwrap(), container);
//! ```

use crate::value::integer_data;
use crate::{Container, Error, Result, Value, ValueData, ValueKind, MAX_DEPTH};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value as Json};
use std::fmt;

/// Envelope version written and required by the v2.0 dialect.
pub const V2_VERSION: &str = "2.0";

/// The three JSON shapes a container can be written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Current enveloped shape with native JSON scalars.
    V2,
    /// Legacy name-keyed shape with stringly scalars.
    Nested,
    /// Legacy flat-header shape with stringly scalars.
    Flat,
}

impl Dialect {
    /// Returns the dialect's label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Dialect::V2 => "v2.0",
            Dialect::Nested => "nested",
            Dialect::Flat => "flat",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`detect_format`]: one of the three dialects, a JSON document
/// of some other shape, or text that is not JSON at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Detection {
    V2,
    Nested,
    Flat,
    /// Well-formed JSON that matches none of the dialects.
    Unknown,
    /// Not parseable as JSON.
    Invalid,
}

impl Detection {
    /// Returns the detection label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Detection::V2 => "v2.0",
            Detection::Nested => "nested",
            Detection::Flat => "flat",
            Detection::Unknown => "unknown",
            Detection::Invalid => "invalid",
        }
    }

    /// Returns the matching convertible dialect, if the document matched one.
    #[must_use]
    pub const fn dialect(self) -> Option<Dialect> {
        match self {
            Detection::V2 => Some(Dialect::V2),
            Detection::Nested => Some(Dialect::Nested),
            Detection::Flat => Some(Dialect::Flat),
            Detection::Unknown | Detection::Invalid => None,
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a JSON document by dialect. Total: any input maps to one of
/// the five outcomes, never an error.
///
/// A document is **v2.0** when `container.version` is `"2.0"`, **nested**
/// when it has a `header` object and a `values` object, and **flat** when
/// it has a `message_type` key and a `values` array.
///
/// ## Examples
///
/// ```rust
/// use valuepack::json::{detect_format, Detection};
///
/// assert_eq!(detect_format("][ not json"), Detection::Invalid);
/// assert_eq!(detect_format("{}"), Detection::Unknown);
/// assert_eq!(
///     detect_format(r#"{"container":{"version":"2.0","values":[]}}"#),
///     Detection::V2,
/// );
/// ```
#[must_use]
pub fn detect_format(text: &str) -> Detection {
    let parsed: Json = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Detection::Invalid,
    };
    let root = match parsed.as_object() {
        Some(map) => map,
        None => return Detection::Unknown,
    };
    if let Some(envelope) = root.get("container").and_then(Json::as_object) {
        if envelope.get("version").and_then(Json::as_str) == Some(V2_VERSION) {
            return Detection::V2;
        }
    }
    if root.get("header").map_or(false, Json::is_object)
        && root.get("values").map_or(false, Json::is_object)
    {
        return Detection::Nested;
    }
    if root.contains_key("message_type") && root.get("values").map_or(false, Json::is_array) {
        return Detection::Flat;
    }
    Detection::Unknown
}

/// Serializes a container to a compact v2.0 document.
///
/// ## Examples
///
/// ```rust
/// use valuepack::{json, Container, Value};
///
/// let mut container = Container::with_message_type("telemetry");
/// container.add(Value::int("reading", 42));
///
/// let text = json::to_v2(&container);
/// assert!(text.contains(r#""version":"2.0""#));
/// assert!(text.contains(r#""data":42"#));
/// ```
#[must_use]
pub fn to_v2(container: &Container) -> String {
    v2_document(container).to_string()
}

/// Serializes a container to an indented v2.0 document.
#[must_use]
pub fn to_v2_pretty(container: &Container) -> String {
    serde_json::to_string_pretty(&v2_document(container)).unwrap_or_default()
}

/// Parses a v2.0 document into a container.
///
/// Metadata is read liberally: missing `metadata`, endpoints, or `values`
/// fall back to the defaults and an empty value list. The envelope itself
/// is required, as is `version == "2.0"`.
///
/// # Errors
///
/// Returns [`Error::Parse`] for text that is not JSON, [`Error::Format`]
/// for a missing envelope or wrong envelope version, [`Error::UnknownType`]
/// for a value whose type cannot be resolved, and [`Error::Range`] for
/// integer data outside its declared kind.
pub fn from_v2(text: &str) -> Result<Container> {
    container_from_v2(&parse_json(text)?)
}

/// Serializes a container to a compact nested-dialect document.
///
/// Sibling values sharing a name collapse to the last one; the nested shape
/// keys values by name and cannot carry duplicates.
#[must_use]
pub fn to_nested(container: &Container) -> String {
    nested_document(container).to_string()
}

/// Serializes a container to an indented nested-dialect document.
#[must_use]
pub fn to_nested_pretty(container: &Container) -> String {
    serde_json::to_string_pretty(&nested_document(container)).unwrap_or_default()
}

/// Parses a nested-dialect document into a container.
///
/// A missing `header` object leaves the defaults in place; a missing
/// `values` object yields an empty container.
///
/// # Errors
///
/// Returns [`Error::Parse`] for text that is not JSON and the same value
/// errors as [`from_v2`].
pub fn from_nested(text: &str) -> Result<Container> {
    container_from_nested(&parse_json(text)?)
}

/// Serializes a container to a compact flat-dialect document.
#[must_use]
pub fn to_flat(container: &Container) -> String {
    flat_document(container).to_string()
}

/// Serializes a container to an indented flat-dialect document.
#[must_use]
pub fn to_flat_pretty(container: &Container) -> String {
    serde_json::to_string_pretty(&flat_document(container)).unwrap_or_default()
}

/// Parses a flat-dialect document into a container.
///
/// Header fields are read from the top level; any that are missing keep
/// their defaults. A missing `values` array yields an empty container.
///
/// # Errors
///
/// Returns [`Error::Parse`] for text that is not JSON and the same value
/// errors as [`from_v2`].
pub fn from_flat(text: &str) -> Result<Container> {
    container_from_flat(&parse_json(text)?)
}

/// Rewrites a JSON document from its detected dialect into `target`.
///
/// The input is detected, parsed through the value model, and re-serialized
/// compactly. Converting a document to its own dialect reproduces it.
///
/// ## Examples
///
/// ```rust
/// use valuepack::json::{convert_format, detect_format, Detection, Dialect};
///
/// let flat = r#"{"message_type":"m","values":[{"name":"n","type":"4","data":"7"}]}"#;
/// let v2 = convert_format(flat, Dialect::V2).unwrap();
/// assert_eq!(detect_format(&v2), Detection::V2);
/// ```
///
/// # Errors
///
/// Returns [`Error::Format`] when detection yields `Unknown` or `Invalid`,
/// plus any error the dialect reader produces.
pub fn convert_format(text: &str, target: Dialect) -> Result<String> {
    let container = parse_detected(text)?;
    Ok(match target {
        Dialect::V2 => to_v2(&container),
        Dialect::Nested => to_nested(&container),
        Dialect::Flat => to_flat(&container),
    })
}

/// [`convert_format`] with indented output.
///
/// # Errors
///
/// Same as [`convert_format`].
pub fn convert_format_pretty(text: &str, target: Dialect) -> Result<String> {
    let container = parse_detected(text)?;
    Ok(match target {
        Dialect::V2 => to_v2_pretty(&container),
        Dialect::Nested => to_nested_pretty(&container),
        Dialect::Flat => to_flat_pretty(&container),
    })
}

fn parse_detected(text: &str) -> Result<Container> {
    match detect_format(text) {
        Detection::V2 => from_v2(text),
        Detection::Nested => from_nested(text),
        Detection::Flat => from_flat(text),
        other => Err(Error::format(&format!("cannot convert from {} input", other))),
    }
}

fn parse_json(text: &str) -> Result<Json> {
    serde_json::from_str(text).map_err(|e| Error::parse(0, &format!("invalid JSON: {}", e)))
}

fn str_field<'a>(map: &'a Map<String, Json>, key: &str) -> &'a str {
    map.get(key).and_then(Json::as_str).unwrap_or_default()
}

fn compose(name: &str, kind: ValueKind, children: Vec<Value>) -> Value {
    match kind {
        ValueKind::Container => Value::container(name, children),
        _ => Value::array(name, children),
    }
}

// ---------------------------------------------------------------- v2.0

fn v2_document(container: &Container) -> Json {
    let mut source = Map::new();
    source.insert("id".into(), Json::String(container.source_id().into()));
    source.insert("sub_id".into(), Json::String(container.source_sub_id().into()));
    let mut target = Map::new();
    target.insert("id".into(), Json::String(container.target_id().into()));
    target.insert("sub_id".into(), Json::String(container.target_sub_id().into()));

    let mut metadata = Map::new();
    metadata.insert("message_type".into(), Json::String(container.message_type().into()));
    metadata.insert("protocol_version".into(), Json::String(container.version().into()));
    metadata.insert("source".into(), Json::Object(source));
    metadata.insert("target".into(), Json::Object(target));

    let values: Vec<Json> = container.values().iter().map(v2_value).collect();

    let mut envelope = Map::new();
    envelope.insert("version".into(), Json::String(V2_VERSION.into()));
    envelope.insert("metadata".into(), Json::Object(metadata));
    envelope.insert("values".into(), Json::Array(values));

    let mut root = Map::new();
    root.insert("container".into(), Json::Object(envelope));
    Json::Object(root)
}

fn v2_value(value: &Value) -> Json {
    let mut obj = Map::new();
    obj.insert("name".into(), Json::String(value.name().into()));
    obj.insert("type".into(), Json::from(value.kind().code()));
    obj.insert("type_name".into(), Json::String(value.kind().type_name().into()));
    match value.data() {
        ValueData::Null => {
            obj.insert("data".into(), Json::Null);
        }
        ValueData::Bool(flag) => {
            obj.insert("data".into(), Json::Bool(*flag));
        }
        ValueData::Short(n) => {
            obj.insert("data".into(), Json::from(*n));
        }
        ValueData::UShort(n) => {
            obj.insert("data".into(), Json::from(*n));
        }
        ValueData::Int(n) => {
            obj.insert("data".into(), Json::from(*n));
        }
        ValueData::UInt(n) => {
            obj.insert("data".into(), Json::from(*n));
        }
        ValueData::Long(n) => {
            obj.insert("data".into(), Json::from(*n));
        }
        ValueData::ULong(n) => {
            obj.insert("data".into(), Json::from(*n));
        }
        ValueData::LLong(n) => {
            obj.insert("data".into(), Json::from(*n));
        }
        ValueData::ULLong(n) => {
            obj.insert("data".into(), Json::from(*n));
        }
        ValueData::Float(number) => {
            obj.insert("data".into(), float_json(f64::from(*number), || number.to_string()));
        }
        ValueData::Double(number) => {
            obj.insert("data".into(), float_json(*number, || number.to_string()));
        }
        ValueData::Bytes(_) => {
            obj.insert("data".into(), Json::String(value.to_string()));
            obj.insert("encoding".into(), Json::String("base64".into()));
        }
        ValueData::String(text) => {
            obj.insert("data".into(), Json::String(text.clone()));
        }
        ValueData::Container(children) | ValueData::Array(children) => {
            obj.insert("data".into(), Json::Array(children.iter().map(v2_value).collect()));
            obj.insert("child_count".into(), Json::from(children.len()));
        }
    }
    Json::Object(obj)
}

/// JSON has no literals for NaN or the infinities; those fall back to the
/// text form, which the readers accept for any scalar.
fn float_json(number: f64, text: impl FnOnce() -> String) -> Json {
    match serde_json::Number::from_f64(number) {
        Some(n) => Json::Number(n),
        None => Json::String(text()),
    }
}

fn container_from_v2(doc: &Json) -> Result<Container> {
    let envelope = doc
        .get("container")
        .and_then(Json::as_object)
        .ok_or_else(|| Error::format("document has no v2.0 container envelope"))?;
    match envelope.get("version").and_then(Json::as_str) {
        Some(V2_VERSION) => {}
        Some(other) => {
            return Err(Error::format(&format!("unsupported envelope version {:?}", other)))
        }
        None => return Err(Error::format("v2.0 envelope is missing its version")),
    }
    let mut container = Container::new();
    if let Some(metadata) = envelope.get("metadata").and_then(Json::as_object) {
        if let Some(text) = metadata.get("message_type").and_then(Json::as_str) {
            container.set_message_type(text);
        }
        if let Some(text) = metadata.get("protocol_version").and_then(Json::as_str) {
            container.set_version(text);
        }
        if let Some(endpoint) = metadata.get("source").and_then(Json::as_object) {
            container.set_source(str_field(endpoint, "id"), str_field(endpoint, "sub_id"));
        }
        if let Some(endpoint) = metadata.get("target").and_then(Json::as_object) {
            container.set_target(str_field(endpoint, "id"), str_field(endpoint, "sub_id"));
        }
    }
    if let Some(values) = envelope.get("values").and_then(Json::as_array) {
        for entry in values {
            let value = value_from_v2(entry, 0)?;
            container.add(value);
        }
    }
    Ok(container)
}

fn value_from_v2(entry: &Json, depth: usize) -> Result<Value> {
    if depth >= MAX_DEPTH {
        return Err(Error::parse(0, "nesting exceeds maximum depth"));
    }
    let obj = entry
        .as_object()
        .ok_or_else(|| Error::format("value entry is not a JSON object"))?;
    let name = str_field(obj, "name");
    let kind = entry_kind(obj)?;
    if kind.is_composite() {
        let children = children_from_array(obj.get("data"), depth, value_from_v2)?;
        return Ok(compose(name, kind, children));
    }
    if kind == ValueKind::Bytes {
        return bytes_from_v2(name, obj);
    }
    scalar_from_json(name, kind, obj.get("data").unwrap_or(&Json::Null))
}

/// The declared `child_count` is advisory; the `data` array is authoritative.
fn children_from_array(
    data: Option<&Json>,
    depth: usize,
    read: fn(&Json, usize) -> Result<Value>,
) -> Result<Vec<Value>> {
    match data {
        Some(Json::Array(items)) => items.iter().map(|item| read(item, depth + 1)).collect(),
        Some(Json::Null) | None => Ok(Vec::new()),
        Some(_) => Err(Error::format("composite value carries non-array data")),
    }
}

/// v2.0 bytes honor the `encoding` field: `"base64"` decodes, anything else
/// (or no field) takes the text's bytes verbatim.
fn bytes_from_v2(name: &str, obj: &Map<String, Json>) -> Result<Value> {
    let text = match obj.get("data") {
        Some(Json::String(s)) => s.as_str(),
        Some(Json::Null) | None => "",
        Some(_) => return Err(Error::format("bytes value carries non-string data")),
    };
    match obj.get("encoding").and_then(Json::as_str) {
        Some("base64") => Value::bytes_from_base64(name, text),
        _ => Ok(Value::bytes(name, text.as_bytes())),
    }
}

/// Resolves a value entry's kind. The numeric `type` is authoritative; a
/// string `type` (decimal code, tag, or name) is accepted; `type_name` is
/// the last resort.
fn entry_kind(obj: &Map<String, Json>) -> Result<ValueKind> {
    if let Some(kind) = obj
        .get("type")
        .and_then(Json::as_u64)
        .and_then(|code| u8::try_from(code).ok())
        .and_then(ValueKind::from_code)
    {
        return Ok(kind);
    }
    if let Some(token) = obj.get("type").and_then(Json::as_str) {
        if let Some(kind) = ValueKind::from_tag(token).or_else(|| ValueKind::from_type_name(token)) {
            return Ok(kind);
        }
    }
    if let Some(label) = obj.get("type_name").and_then(Json::as_str) {
        if let Some(kind) = ValueKind::from_type_name(label).or_else(|| ValueKind::from_tag(label)) {
            return Ok(kind);
        }
    }
    Err(Error::unknown_type(&match obj.get("type") {
        Some(token) => token.to_string(),
        None => String::from("<missing>"),
    }))
}

/// Builds a scalar from the `data` slot. String data carries the same
/// literal forms as the wire format; native JSON data is taken directly.
fn scalar_from_json(name: &str, kind: ValueKind, data: &Json) -> Result<Value> {
    match data {
        Json::String(text) => Value::from_text(name, kind, text),
        Json::Null => match kind {
            ValueKind::Null => Ok(Value::null(name)),
            ValueKind::String => Ok(Value::string(name, "")),
            ValueKind::Bytes => Ok(Value::bytes(name, Vec::new())),
            _ => Err(Error::format(&format!("{} value entry has no data", kind.type_name()))),
        },
        Json::Bool(flag) => match kind {
            ValueKind::Bool => Ok(Value::boolean(name, *flag)),
            _ => Err(Error::format(&format!(
                "{} value carries boolean data",
                kind.type_name()
            ))),
        },
        Json::Number(_) if kind.is_integer() => {
            let raw = integer_from_json(data).ok_or_else(|| {
                Error::format(&format!("{} value carries a fractional number", kind.type_name()))
            })?;
            Ok(Value::new(name, integer_data(kind, raw)?))
        }
        Json::Number(_) if kind.is_floating() => {
            let number = data.as_f64().ok_or_else(|| {
                Error::format(&format!("{} value carries an unreadable number", kind.type_name()))
            })?;
            Ok(match kind {
                ValueKind::Float => Value::float(name, number as f32),
                _ => Value::double(name, number),
            })
        }
        _ => Err(Error::format(&format!(
            "{} value carries unsupported data",
            kind.type_name()
        ))),
    }
}

fn integer_from_json(data: &Json) -> Option<i128> {
    if let Some(n) = data.as_i64() {
        return Some(i128::from(n));
    }
    if let Some(n) = data.as_u64() {
        return Some(i128::from(n));
    }
    // a writer that renders whole numbers with a fraction part
    match data.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i128),
        _ => None,
    }
}

// --------------------------------------------------------------- nested

fn nested_document(container: &Container) -> Json {
    let mut header = Map::new();
    header.insert("target_id".into(), Json::String(container.target_id().into()));
    header.insert("target_sub_id".into(), Json::String(container.target_sub_id().into()));
    header.insert("source_id".into(), Json::String(container.source_id().into()));
    header.insert("source_sub_id".into(), Json::String(container.source_sub_id().into()));
    header.insert("message_type".into(), Json::String(container.message_type().into()));
    header.insert("version".into(), Json::String(container.version().into()));

    let mut values = Map::new();
    for value in container.values() {
        values.insert(value.name().to_string(), nested_value(value));
    }

    let mut root = Map::new();
    root.insert("header".into(), Json::Object(header));
    root.insert("values".into(), Json::Object(values));
    Json::Object(root)
}

fn nested_value(value: &Value) -> Json {
    let mut obj = Map::new();
    obj.insert("type".into(), Json::from(value.kind().code()));
    match value.data() {
        ValueData::Container(children) | ValueData::Array(children) => {
            let mut nested = Map::new();
            for child in children {
                nested.insert(child.name().to_string(), nested_value(child));
            }
            obj.insert("data".into(), Json::Object(nested));
        }
        _ => {
            obj.insert("data".into(), Json::String(value.to_string()));
        }
    }
    Json::Object(obj)
}

fn container_from_nested(doc: &Json) -> Result<Container> {
    let root = doc
        .as_object()
        .ok_or_else(|| Error::format("nested document is not a JSON object"))?;
    let mut container = Container::new();
    if let Some(header) = root.get("header").and_then(Json::as_object) {
        read_header_fields(&mut container, header);
    }
    match root.get("values") {
        Some(Json::Object(values)) => {
            for (name, entry) in values {
                let value = value_from_nested(name, entry, 0)?;
                container.add(value);
            }
        }
        Some(Json::Null) | None => {}
        Some(_) => return Err(Error::format("nested document values is not an object")),
    }
    Ok(container)
}

fn value_from_nested(name: &str, entry: &Json, depth: usize) -> Result<Value> {
    if depth >= MAX_DEPTH {
        return Err(Error::parse(0, "nesting exceeds maximum depth"));
    }
    let obj = entry
        .as_object()
        .ok_or_else(|| Error::format("value entry is not a JSON object"))?;
    let kind = entry_kind(obj)?;
    if kind.is_composite() {
        let children = match obj.get("data") {
            Some(Json::Object(map)) => map
                .iter()
                .map(|(child_name, child)| value_from_nested(child_name, child, depth + 1))
                .collect::<Result<Vec<_>>>()?,
            Some(Json::Null) | None => Vec::new(),
            Some(_) => return Err(Error::format("composite value carries non-object data")),
        };
        return Ok(compose(name, kind, children));
    }
    scalar_from_json(name, kind, obj.get("data").unwrap_or(&Json::Null))
}

// ----------------------------------------------------------------- flat

fn flat_document(container: &Container) -> Json {
    let mut root = Map::new();
    root.insert("source_id".into(), Json::String(container.source_id().into()));
    root.insert("source_sub_id".into(), Json::String(container.source_sub_id().into()));
    root.insert("target_id".into(), Json::String(container.target_id().into()));
    root.insert("target_sub_id".into(), Json::String(container.target_sub_id().into()));
    root.insert("message_type".into(), Json::String(container.message_type().into()));
    root.insert("version".into(), Json::String(container.version().into()));
    root.insert(
        "values".into(),
        Json::Array(container.values().iter().map(flat_value).collect()),
    );
    Json::Object(root)
}

fn flat_value(value: &Value) -> Json {
    let mut obj = Map::new();
    obj.insert("name".into(), Json::String(value.name().into()));
    obj.insert("type".into(), Json::String(value.kind().code().to_string()));
    match value.data() {
        ValueData::Container(children) | ValueData::Array(children) => {
            obj.insert("data".into(), Json::Array(children.iter().map(flat_value).collect()));
        }
        _ => {
            obj.insert("data".into(), Json::String(value.to_string()));
        }
    }
    Json::Object(obj)
}

fn container_from_flat(doc: &Json) -> Result<Container> {
    let root = doc
        .as_object()
        .ok_or_else(|| Error::format("flat document is not a JSON object"))?;
    let mut container = Container::new();
    read_header_fields(&mut container, root);
    match root.get("values") {
        Some(Json::Array(entries)) => {
            for entry in entries {
                let value = value_from_flat(entry, 0)?;
                container.add(value);
            }
        }
        Some(Json::Null) | None => {}
        Some(_) => return Err(Error::format("flat document values is not an array")),
    }
    Ok(container)
}

fn value_from_flat(entry: &Json, depth: usize) -> Result<Value> {
    if depth >= MAX_DEPTH {
        return Err(Error::parse(0, "nesting exceeds maximum depth"));
    }
    let obj = entry
        .as_object()
        .ok_or_else(|| Error::format("value entry is not a JSON object"))?;
    let name = str_field(obj, "name");
    let kind = entry_kind(obj)?;
    if kind.is_composite() {
        let children = children_from_array(obj.get("data"), depth, value_from_flat)?;
        return Ok(compose(name, kind, children));
    }
    scalar_from_json(name, kind, obj.get("data").unwrap_or(&Json::Null))
}

fn read_header_fields(container: &mut Container, map: &Map<String, Json>) {
    if let Some(text) = map.get("source_id").and_then(Json::as_str) {
        container.source_id = text.to_string();
    }
    if let Some(text) = map.get("source_sub_id").and_then(Json::as_str) {
        container.source_sub_id = text.to_string();
    }
    if let Some(text) = map.get("target_id").and_then(Json::as_str) {
        container.target_id = text.to_string();
    }
    if let Some(text) = map.get("target_sub_id").and_then(Json::as_str) {
        container.target_sub_id = text.to_string();
    }
    if let Some(text) = map.get("message_type").and_then(Json::as_str) {
        container.message_type = text.to_string();
    }
    if let Some(text) = map.get("version").and_then(Json::as_str) {
        container.version = text.to_string();
    }
}

// Containers and values embed in application serde structures using the
// flat-dialect shapes.

impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        flat_document(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Container {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let doc = Json::deserialize(deserializer)?;
        container_from_flat(&doc).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        flat_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let doc = Json::deserialize(deserializer)?;
        value_from_flat(&doc, 0).map_err(serde::de::Error::custom)
    }
}
