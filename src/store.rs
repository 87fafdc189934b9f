//! Keyed store for scalar values with JSON and binary persistence.
//!
//! A [`ValueStore`] maps string keys to scalar [`Value`]s in insertion
//! order. It is the flat companion to [`Container`](crate::Container):
//! instead of a routed tree it holds loose key/value state (settings,
//! cached readings) that survives a process through one of two on-disk
//! forms.
//!
//! The JSON form is one object keyed by entry key. Each entry records the
//! value's name, its decimal type code, and its text content:
//!
//! ```json
//! {"row_count": {"name": "row_count", "type": "4", "data": "150"}}
//! ```
//!
//! The reader also accepts older spellings (`value` for `data`, uppercase
//! tags or lowercase names for `type`) and bare JSON scalars, which map
//! onto the natural kinds: `BOOL`, `INT` (or `LLONG` when 32 bits are not
//! enough), `DOUBLE`, `STRING`, and `NULL`.
//!
//! The binary form opens with a version byte and a little-endian `u32`
//! entry count. Each entry is its key (length-prefixed UTF-8), one
//! type-code byte, and a length-prefixed payload. Numeric payloads are
//! fixed-width little-endian; `BYTES` and `STRING` payloads are raw.
//!
//! Composite values have no place in a flat store. [`ValueStore::insert`]
//! refuses them, so every stored entry serializes in both forms.

use crate::{Error, Result, Value, ValueData, ValueKind};
use serde_json::{Map, Value as Json};
use std::fmt;
use std::fs;
use std::path::Path;

/// Version byte at the head of the binary form.
const BINARY_VERSION: u8 = 1;

/// Insertion-ordered map from string keys to scalar values.
///
/// # Examples
///
/// ```rust
/// use valuepack::{Value, ValueStore};
///
/// let mut store = ValueStore::new();
/// store.insert("row_count", Value::int("row_count", 150)).unwrap();
/// store.insert("status", Value::string("status", "success")).unwrap();
///
/// let restored = ValueStore::from_json(&store.to_json()).unwrap();
/// assert_eq!(restored.get("row_count").unwrap().to_int().unwrap(), 150);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueStore {
    entries: Vec<(String, Value)>,
}

impl ValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        ValueStore {
            entries: Vec::new(),
        }
    }

    /// Inserts `value` under `key`, returning the entry it replaced.
    ///
    /// A replaced entry keeps its position in the store's ordering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] for `CONTAINER` and `ARRAY` values;
    /// the store holds scalars only.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        if value.is_composite() {
            return Err(Error::conversion(value.kind().type_name(), "store entry"));
        }
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            return Ok(Some(std::mem::replace(&mut slot.1, value)));
        }
        self.entries.push((key, value));
        Ok(None)
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.as_str() == key)
            .map(|(_, value)| value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(existing, _)| existing.as_str() == key)
            .map(|(_, value)| value)
    }

    /// Returns `true` if the store has an entry under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes and returns the entry under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let at = self
            .entries
            .iter()
            .position(|(existing, _)| existing.as_str() == key)?;
        Some(self.entries.remove(at).1)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, Value)> {
        self.entries.iter()
    }

    /// Renders the store as a compact JSON object.
    #[must_use]
    pub fn to_json(&self) -> String {
        Json::Object(self.json_object()).to_string()
    }

    /// Renders the store as an indented JSON object.
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&Json::Object(self.json_object())).unwrap_or_default()
    }

    fn json_object(&self) -> Map<String, Json> {
        let mut root = Map::new();
        for (key, value) in &self.entries {
            let mut entry = Map::new();
            entry.insert("name".to_string(), Json::String(value.name().to_string()));
            entry.insert(
                "type".to_string(),
                Json::String(value.kind().code().to_string()),
            );
            entry.insert("data".to_string(), Json::String(value.to_string()));
            root.insert(key.clone(), Json::Object(entry));
        }
        root
    }

    /// Reads a store back from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for text that is not JSON, [`Error::Format`]
    /// when the document or an entry has the wrong shape,
    /// [`Error::UnknownType`] for a type outside the sixteen-kind table, and
    /// [`Error::Conversion`] for a composite type.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: Json = serde_json::from_str(text)
            .map_err(|e| Error::parse(0, &format!("invalid JSON: {}", e)))?;
        let root = doc
            .as_object()
            .ok_or_else(|| Error::format("store document is not a JSON object"))?;
        let mut store = ValueStore::new();
        for (key, entry) in root {
            let value = entry_value(key, entry)?;
            store.insert(key.clone(), value)?;
        }
        Ok(store)
    }

    /// Encodes the store in the binary form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] when an entry count, key, or payload
    /// exceeds the `u32` length prefix.
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        let count = u32::try_from(self.entries.len())
            .map_err(|_| Error::format("store exceeds the binary entry limit"))?;
        let mut out = Vec::with_capacity(5 + 16 * self.entries.len());
        out.push(BINARY_VERSION);
        out.extend_from_slice(&count.to_le_bytes());
        for (key, value) in &self.entries {
            let key_len = u32::try_from(key.len())
                .map_err(|_| Error::format("store key exceeds the binary length limit"))?;
            out.extend_from_slice(&key_len.to_le_bytes());
            out.extend_from_slice(key.as_bytes());
            out.push(value.kind().code());
            let payload = binary_payload(value);
            let payload_len = u32::try_from(payload.len())
                .map_err(|_| Error::format("store payload exceeds the binary length limit"))?;
            out.extend_from_slice(&payload_len.to_le_bytes());
            out.extend_from_slice(&payload);
        }
        Ok(out)
    }

    /// Decodes a store from its binary form.
    ///
    /// Every entry is named after its key; the binary form does not carry
    /// value names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for a wrong version byte, truncation, a
    /// payload whose width does not fit its type, invalid UTF-8, or
    /// trailing bytes; [`Error::UnknownType`] for a type code outside the
    /// table; [`Error::Conversion`] for a composite type code.
    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        let version = *bytes
            .first()
            .ok_or_else(|| Error::parse(0, "empty binary store"))?;
        if version != BINARY_VERSION {
            return Err(Error::parse(
                0,
                &format!("unsupported store version {}", version),
            ));
        }
        let mut pos = 1;
        let count = read_u32(bytes, &mut pos)?;
        let mut store = ValueStore::new();
        for _ in 0..count {
            let key_at = pos;
            let key_len = read_u32(bytes, &mut pos)? as usize;
            let key = std::str::from_utf8(take_bytes(bytes, &mut pos, key_len)?)
                .map_err(|_| Error::parse(key_at, "store key is not valid UTF-8"))?
                .to_string();
            let code_at = pos;
            let code = *bytes
                .get(pos)
                .ok_or_else(|| Error::parse(pos, "truncated store entry"))?;
            pos += 1;
            let kind = ValueKind::from_code(code)
                .ok_or_else(|| Error::unknown_type(&code.to_string()))?;
            let payload_len = read_u32(bytes, &mut pos)? as usize;
            let payload = take_bytes(bytes, &mut pos, payload_len)?;
            let value = decode_payload(&key, kind, payload, code_at)?;
            store.insert(key, value)?;
        }
        if pos != bytes.len() {
            return Err(Error::parse(pos, "trailing bytes after the last entry"));
        }
        Ok(store)
    }

    /// Writes the JSON form to a file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be written.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json())?;
        Ok(())
    }

    /// Reads a store from a file in the JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read, or a
    /// decode error if its contents are not a valid store document.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        ValueStore::from_json(&text)
    }

    /// Writes the binary form to a file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be written, or
    /// [`Error::Format`] if an entry exceeds the binary length limits.
    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_binary()?)?;
        Ok(())
    }

    /// Reads a store from a file in the binary form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read, or a
    /// decode error if its contents are not a valid binary image.
    pub fn load_binary(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        ValueStore::from_binary(&bytes)
    }
}

impl fmt::Display for ValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueStore(entries={})", self.entries.len())
    }
}

/// Rebuilds one store entry from its JSON form. Bare scalars are handed to
/// [`scalar_value`]; objects must carry a usable `type`.
fn entry_value(key: &str, entry: &Json) -> Result<Value> {
    let object = match entry {
        Json::Object(map) => map,
        scalar => return scalar_value(key, scalar),
    };
    let kind = match object.get("type") {
        Some(Json::String(token)) => ValueKind::from_tag(token)
            .or_else(|| ValueKind::from_type_name(token))
            .ok_or_else(|| Error::unknown_type(token))?,
        Some(Json::Number(code)) => code
            .as_u64()
            .and_then(|wide| u8::try_from(wide).ok())
            .and_then(ValueKind::from_code)
            .ok_or_else(|| Error::unknown_type(&code.to_string()))?,
        Some(_) | None => {
            return Err(Error::format(&format!(
                "store entry '{}' has no usable type",
                key
            )))
        }
    };
    if kind.is_composite() {
        return Err(Error::conversion(kind.type_name(), "store entry"));
    }
    let name = match object.get("name") {
        Some(Json::String(name)) => name.as_str(),
        _ => key,
    };
    let text = match object.get("data").or_else(|| object.get("value")) {
        None | Some(Json::Null) => String::new(),
        Some(Json::String(text)) => text.clone(),
        Some(Json::Bool(flag)) => flag.to_string(),
        Some(Json::Number(number)) => number.to_string(),
        Some(_) => {
            return Err(Error::format(&format!(
                "store entry '{}' has non-scalar data",
                key
            )))
        }
    };
    Value::from_text(name, kind, &text)
}

/// Maps a bare JSON scalar onto its natural kind.
fn scalar_value(key: &str, entry: &Json) -> Result<Value> {
    match entry {
        Json::Null => Ok(Value::null(key)),
        Json::Bool(flag) => Ok(Value::boolean(key, *flag)),
        Json::Number(number) => {
            if let Some(narrow) = number.as_i64().and_then(|wide| i32::try_from(wide).ok()) {
                Ok(Value::int(key, narrow))
            } else if let Some(wide) = number.as_i64() {
                Ok(Value::llong(key, wide))
            } else if let Some(wide) = number.as_u64() {
                Ok(Value::ullong(key, wide))
            } else if let Some(real) = number.as_f64() {
                Ok(Value::double(key, real))
            } else {
                Err(Error::format(&format!(
                    "store entry '{}' has an unreadable number",
                    key
                )))
            }
        }
        Json::String(text) => Ok(Value::string(key, text.as_str())),
        Json::Array(_) | Json::Object(_) => Err(Error::format(&format!(
            "store entry '{}' is not a scalar",
            key
        ))),
    }
}

fn binary_payload(value: &Value) -> Vec<u8> {
    match value.data() {
        ValueData::Null => Vec::new(),
        ValueData::Bool(flag) => vec![u8::from(*flag)],
        ValueData::Short(v) => v.to_le_bytes().to_vec(),
        ValueData::UShort(v) => v.to_le_bytes().to_vec(),
        ValueData::Int(v) | ValueData::Long(v) => v.to_le_bytes().to_vec(),
        ValueData::UInt(v) | ValueData::ULong(v) => v.to_le_bytes().to_vec(),
        ValueData::LLong(v) => v.to_le_bytes().to_vec(),
        ValueData::ULLong(v) => v.to_le_bytes().to_vec(),
        ValueData::Float(v) => v.to_le_bytes().to_vec(),
        ValueData::Double(v) => v.to_le_bytes().to_vec(),
        ValueData::Bytes(raw) => raw.clone(),
        ValueData::String(text) => text.as_bytes().to_vec(),
        // insert refuses composites
        ValueData::Container(_) | ValueData::Array(_) => Vec::new(),
    }
}

fn decode_payload(name: &str, kind: ValueKind, payload: &[u8], at: usize) -> Result<Value> {
    let value = match kind {
        ValueKind::Null => {
            if !payload.is_empty() {
                return Err(width_error(kind, payload, at));
            }
            Value::null(name)
        }
        ValueKind::Bool => match fixed::<1>(kind, payload, at)?[0] {
            0 => Value::boolean(name, false),
            1 => Value::boolean(name, true),
            other => return Err(Error::parse(at, &format!("bool payload holds {}", other))),
        },
        ValueKind::Short => Value::short(name, i16::from_le_bytes(fixed(kind, payload, at)?)),
        ValueKind::UShort => Value::ushort(name, u16::from_le_bytes(fixed(kind, payload, at)?)),
        ValueKind::Int => Value::int(name, i32::from_le_bytes(fixed(kind, payload, at)?)),
        ValueKind::UInt => Value::uint(name, u32::from_le_bytes(fixed(kind, payload, at)?)),
        ValueKind::Long => {
            Value::long(name, i64::from(i32::from_le_bytes(fixed(kind, payload, at)?)))?
        }
        ValueKind::ULong => {
            Value::ulong(name, u64::from(u32::from_le_bytes(fixed(kind, payload, at)?)))?
        }
        ValueKind::LLong => Value::llong(name, i64::from_le_bytes(fixed(kind, payload, at)?)),
        ValueKind::ULLong => Value::ullong(name, u64::from_le_bytes(fixed(kind, payload, at)?)),
        ValueKind::Float => Value::float(name, f32::from_le_bytes(fixed(kind, payload, at)?)),
        ValueKind::Double => Value::double(name, f64::from_le_bytes(fixed(kind, payload, at)?)),
        ValueKind::Bytes => Value::bytes(name, payload),
        ValueKind::String => {
            let text = std::str::from_utf8(payload)
                .map_err(|_| Error::parse(at, "string payload is not valid UTF-8"))?;
            Value::string(name, text)
        }
        ValueKind::Container | ValueKind::Array => {
            return Err(Error::conversion(kind.type_name(), "store entry"))
        }
    };
    Ok(value)
}

fn fixed<const N: usize>(kind: ValueKind, payload: &[u8], at: usize) -> Result<[u8; N]> {
    payload
        .try_into()
        .map_err(|_| width_error(kind, payload, at))
}

fn width_error(kind: ValueKind, payload: &[u8], at: usize) -> Error {
    Error::parse(
        at,
        &format!(
            "{} byte payload does not fit a {} value",
            payload.len(),
            kind.type_name()
        ),
    )
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Result<u32> {
    let raw: [u8; 4] = bytes
        .get(*pos..*pos + 4)
        .and_then(|field| field.try_into().ok())
        .ok_or_else(|| Error::parse(*pos, "truncated length field"))?;
    *pos += 4;
    Ok(u32::from_le_bytes(raw))
}

fn take_bytes<'a>(bytes: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    match pos.checked_add(len).filter(|&end| end <= bytes.len()) {
        Some(end) => {
            let field = &bytes[*pos..end];
            *pos = end;
            Ok(field)
        }
        None => Err(Error::parse(*pos, "truncated store entry")),
    }
}
