//! The tagged value model shared by every codec.
//!
//! This module provides [`Value`], a named payload of exactly one of sixteen
//! kinds, and [`ValueKind`], the closed table of numeric type codes those
//! kinds use on the wire. The codes are a cross-language contract: they must
//! match the peer implementations bit for bit and never change.
//!
//! ## Core Types
//!
//! - [`Value`]: a name plus one of sixteen payload kinds
//! - [`ValueData`]: the payload union itself
//! - [`ValueKind`]: the numeric code table (0 = null .. 15 = array)
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use valuepack::{Value, ValueKind};
//!
//! let count = Value::int("count", 42);
//! let label = Value::string("label", "hello");
//! let blob = Value::bytes("blob", vec![0xAA, 0xBB]);
//!
//! assert_eq!(count.kind(), ValueKind::Int);
//! assert_eq!(label.kind(), ValueKind::String);
//! ```
//!
//! ### Range-checked kinds
//!
//! `Long` and `ULong` are 32-bit on every platform, even where a host `long`
//! would be wider. Construction outside that window fails:
//!
//! ```rust
//! use valuepack::Value;
//!
//! assert!(Value::long("n", 2_147_483_647).is_ok());
//! assert!(Value::long("n", 2_147_483_648).is_err());
//! ```
//!
//! ### Converting
//!
//! ```rust
//! use valuepack::Value;
//!
//! let v = Value::string("port", "8080");
//! assert_eq!(v.to_int().unwrap(), 8080);
//!
//! // Null refuses every conversion.
//! let n = Value::null("nothing");
//! assert!(n.to_int().is_err());
//! ```

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;
use std::fmt::Write as _;

/// Maximum nesting depth any codec will reconstruct.
///
/// Decoding input nested deeper than this fails with a parse error instead
/// of risking stack exhaustion.
pub const MAX_DEPTH: usize = 128;

/// The sixteen value kinds and their fixed numeric codes.
///
/// The numeric codes (0..=15) appear in every serialized form and are shared
/// with the peer implementations in other languages, so they are part of the
/// wire contract.
///
/// # Examples
///
/// ```rust
/// use valuepack::ValueKind;
///
/// assert_eq!(ValueKind::Int.code(), 4);
/// assert_eq!(ValueKind::from_code(13), Some(ValueKind::String));
/// assert_eq!(ValueKind::Container.tag(), "CONTAINER");
/// assert_eq!(ValueKind::from_tag("INT"), Some(ValueKind::Int));
/// // Legacy producers write the decimal code instead of the tag.
/// assert_eq!(ValueKind::from_tag("4"), Some(ValueKind::Int));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LLong,
    ULLong,
    Float,
    Double,
    Bytes,
    String,
    Container,
    Array,
}

impl ValueKind {
    /// Returns the numeric type code used on the wire.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            ValueKind::Null => 0,
            ValueKind::Bool => 1,
            ValueKind::Short => 2,
            ValueKind::UShort => 3,
            ValueKind::Int => 4,
            ValueKind::UInt => 5,
            ValueKind::Long => 6,
            ValueKind::ULong => 7,
            ValueKind::LLong => 8,
            ValueKind::ULLong => 9,
            ValueKind::Float => 10,
            ValueKind::Double => 11,
            ValueKind::Bytes => 12,
            ValueKind::String => 13,
            ValueKind::Container => 14,
            ValueKind::Array => 15,
        }
    }

    /// Looks up a kind by its numeric code. Returns `None` for codes outside
    /// the table.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ValueKind::Null),
            1 => Some(ValueKind::Bool),
            2 => Some(ValueKind::Short),
            3 => Some(ValueKind::UShort),
            4 => Some(ValueKind::Int),
            5 => Some(ValueKind::UInt),
            6 => Some(ValueKind::Long),
            7 => Some(ValueKind::ULong),
            8 => Some(ValueKind::LLong),
            9 => Some(ValueKind::ULLong),
            10 => Some(ValueKind::Float),
            11 => Some(ValueKind::Double),
            12 => Some(ValueKind::Bytes),
            13 => Some(ValueKind::String),
            14 => Some(ValueKind::Container),
            15 => Some(ValueKind::Array),
            _ => None,
        }
    }

    /// Returns the uppercase tag written in the wire format.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            ValueKind::Null => "NULL",
            ValueKind::Bool => "BOOL",
            ValueKind::Short => "SHORT",
            ValueKind::UShort => "USHORT",
            ValueKind::Int => "INT",
            ValueKind::UInt => "UINT",
            ValueKind::Long => "LONG",
            ValueKind::ULong => "ULONG",
            ValueKind::LLong => "LLONG",
            ValueKind::ULLong => "ULLONG",
            ValueKind::Float => "FLOAT",
            ValueKind::Double => "DOUBLE",
            ValueKind::Bytes => "BYTES",
            ValueKind::String => "STRING",
            ValueKind::Container => "CONTAINER",
            ValueKind::Array => "ARRAY",
        }
    }

    /// Looks up a kind from a wire token: either the uppercase tag or the
    /// decimal code legacy producers emit.
    #[must_use]
    pub fn from_tag(token: &str) -> Option<Self> {
        match token {
            "NULL" => Some(ValueKind::Null),
            "BOOL" => Some(ValueKind::Bool),
            "SHORT" => Some(ValueKind::Short),
            "USHORT" => Some(ValueKind::UShort),
            "INT" => Some(ValueKind::Int),
            "UINT" => Some(ValueKind::UInt),
            "LONG" => Some(ValueKind::Long),
            "ULONG" => Some(ValueKind::ULong),
            "LLONG" => Some(ValueKind::LLong),
            "ULLONG" => Some(ValueKind::ULLong),
            "FLOAT" => Some(ValueKind::Float),
            "DOUBLE" => Some(ValueKind::Double),
            "BYTES" => Some(ValueKind::Bytes),
            "STRING" => Some(ValueKind::String),
            "CONTAINER" => Some(ValueKind::Container),
            "ARRAY" => Some(ValueKind::Array),
            _ => token.parse::<u8>().ok().and_then(Self::from_code),
        }
    }

    /// Returns the lowercase type name used in the JSON v2.0 dialect.
    #[inline]
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Short => "short",
            ValueKind::UShort => "ushort",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Long => "long",
            ValueKind::ULong => "ulong",
            ValueKind::LLong => "llong",
            ValueKind::ULLong => "ullong",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Bytes => "bytes",
            ValueKind::String => "string",
            ValueKind::Container => "container",
            ValueKind::Array => "array",
        }
    }

    /// Looks up a kind by its lowercase type name.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(ValueKind::Null),
            "bool" => Some(ValueKind::Bool),
            "short" => Some(ValueKind::Short),
            "ushort" => Some(ValueKind::UShort),
            "int" => Some(ValueKind::Int),
            "uint" => Some(ValueKind::UInt),
            "long" => Some(ValueKind::Long),
            "ulong" => Some(ValueKind::ULong),
            "llong" => Some(ValueKind::LLong),
            "ullong" => Some(ValueKind::ULLong),
            "float" => Some(ValueKind::Float),
            "double" => Some(ValueKind::Double),
            "bytes" => Some(ValueKind::Bytes),
            "string" => Some(ValueKind::String),
            "container" => Some(ValueKind::Container),
            "array" => Some(ValueKind::Array),
            _ => None,
        }
    }

    /// Returns `true` for the numeric kinds (integer and floating).
    #[inline]
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_floating()
    }

    /// Returns `true` for the eight integer kinds.
    #[inline]
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            ValueKind::Short
                | ValueKind::UShort
                | ValueKind::Int
                | ValueKind::UInt
                | ValueKind::Long
                | ValueKind::ULong
                | ValueKind::LLong
                | ValueKind::ULLong
        )
    }

    /// Returns `true` for `Float` and `Double`.
    #[inline]
    #[must_use]
    pub const fn is_floating(self) -> bool {
        matches!(self, ValueKind::Float | ValueKind::Double)
    }

    /// Returns `true` for the child-bearing kinds (`Container` and `Array`).
    #[inline]
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, ValueKind::Container | ValueKind::Array)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// The payload union behind a [`Value`].
///
/// `Long` and `ULong` store 32-bit integers so the cross-language range
/// constraint is carried by the type itself; the widening constructors on
/// [`Value`] perform the range check.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ValueData {
    #[default]
    Null,
    Bool(bool),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i32),
    ULong(u32),
    LLong(i64),
    ULLong(u64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Container(Vec<Value>),
    Array(Vec<Value>),
}

impl ValueData {
    /// Returns the kind of this payload.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            ValueData::Null => ValueKind::Null,
            ValueData::Bool(_) => ValueKind::Bool,
            ValueData::Short(_) => ValueKind::Short,
            ValueData::UShort(_) => ValueKind::UShort,
            ValueData::Int(_) => ValueKind::Int,
            ValueData::UInt(_) => ValueKind::UInt,
            ValueData::Long(_) => ValueKind::Long,
            ValueData::ULong(_) => ValueKind::ULong,
            ValueData::LLong(_) => ValueKind::LLong,
            ValueData::ULLong(_) => ValueKind::ULLong,
            ValueData::Float(_) => ValueKind::Float,
            ValueData::Double(_) => ValueKind::Double,
            ValueData::Bytes(_) => ValueKind::Bytes,
            ValueData::String(_) => ValueKind::String,
            ValueData::Container(_) => ValueKind::Container,
            ValueData::Array(_) => ValueKind::Array,
        }
    }
}

/// A named, typed value: one node of a container's value tree.
///
/// Composite values (`Container`, `Array`) exclusively own their children;
/// sibling names may repeat and order is preserved.
///
/// # Examples
///
/// ```rust
/// use valuepack::Value;
///
/// let mut group = Value::container("group", vec![Value::int("a", 1)]);
/// group.push_child(Value::string("b", "two")).unwrap();
/// assert_eq!(group.child_count(), 2);
/// assert_eq!(group.child_at(1).unwrap().name(), "b");
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Value {
    pub(crate) name: String,
    pub(crate) data: ValueData,
}

impl Value {
    /// Creates a value from anything with an unambiguous payload mapping.
    ///
    /// The mapping follows Rust's own types: `i32` becomes `Int`, `i64`
    /// becomes `LLong`, `&str` becomes `String`, `Vec<u8>` becomes `Bytes`,
    /// `Vec<Value>` becomes `Container`. `Long`/`ULong` have no `From`
    /// mapping; use the range-checked [`Value::long`] / [`Value::ulong`].
    pub fn new<T: Into<ValueData>>(name: impl Into<String>, data: T) -> Self {
        Value {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Creates a `Null` value.
    pub fn null(name: impl Into<String>) -> Self {
        Value::new(name, ValueData::Null)
    }

    /// Creates a `Bool` value.
    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Value::new(name, ValueData::Bool(value))
    }

    /// Creates a `Short` value (16-bit signed).
    pub fn short(name: impl Into<String>, value: i16) -> Self {
        Value::new(name, ValueData::Short(value))
    }

    /// Creates a `UShort` value (16-bit unsigned).
    pub fn ushort(name: impl Into<String>, value: u16) -> Self {
        Value::new(name, ValueData::UShort(value))
    }

    /// Creates an `Int` value (32-bit signed).
    pub fn int(name: impl Into<String>, value: i32) -> Self {
        Value::new(name, ValueData::Int(value))
    }

    /// Creates a `UInt` value (32-bit unsigned).
    pub fn uint(name: impl Into<String>, value: u32) -> Self {
        Value::new(name, ValueData::UInt(value))
    }

    /// Creates a `Long` value.
    ///
    /// `Long` is constrained to the 32-bit signed range on every platform
    /// for cross-language parity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if `value` lies outside
    /// `-2147483648..=2147483647`.
    pub fn long(name: impl Into<String>, value: i64) -> Result<Self> {
        let narrowed =
            i32::try_from(value).map_err(|_| Error::range("long", i128::from(value)))?;
        Ok(Value::new(name, ValueData::Long(narrowed)))
    }

    /// Creates a `ULong` value, constrained to the 32-bit unsigned range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if `value` exceeds `4294967295`.
    pub fn ulong(name: impl Into<String>, value: u64) -> Result<Self> {
        let narrowed =
            u32::try_from(value).map_err(|_| Error::range("ulong", i128::from(value)))?;
        Ok(Value::new(name, ValueData::ULong(narrowed)))
    }

    /// Creates an `LLong` value (64-bit signed).
    pub fn llong(name: impl Into<String>, value: i64) -> Self {
        Value::new(name, ValueData::LLong(value))
    }

    /// Creates a `ULLong` value (64-bit unsigned).
    pub fn ullong(name: impl Into<String>, value: u64) -> Self {
        Value::new(name, ValueData::ULLong(value))
    }

    /// Creates a `Float` value (32-bit IEEE).
    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Value::new(name, ValueData::Float(value))
    }

    /// Creates a `Double` value (64-bit IEEE).
    pub fn double(name: impl Into<String>, value: f64) -> Self {
        Value::new(name, ValueData::Double(value))
    }

    /// Creates a `Bytes` value from raw bytes.
    pub fn bytes(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Value::new(name, ValueData::Bytes(value.into()))
    }

    /// Creates a `Bytes` value from base64 text.
    ///
    /// # Errors
    ///
    /// Fails if `encoded` is not valid standard base64.
    pub fn bytes_from_base64(name: impl Into<String>, encoded: &str) -> Result<Self> {
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| Error::custom(format!("invalid base64 data: {}", e)))?;
        Ok(Value::new(name, ValueData::Bytes(data)))
    }

    /// Creates a `Bytes` value from a hex string.
    ///
    /// # Errors
    ///
    /// Fails on odd length or non-hex digits.
    pub fn bytes_from_hex(name: impl Into<String>, hex: &str) -> Result<Self> {
        if hex.len() % 2 != 0 {
            return Err(Error::custom("invalid hex data: odd length"));
        }
        let mut data = Vec::with_capacity(hex.len() / 2);
        for chunk in hex.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| Error::custom("invalid hex data: not ASCII"))?;
            let byte = u8::from_str_radix(pair, 16)
                .map_err(|e| Error::custom(format!("invalid hex data: {}", e)))?;
            data.push(byte);
        }
        Ok(Value::new(name, ValueData::Bytes(data)))
    }

    /// Creates a `String` value.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Value::new(name, ValueData::String(value.into()))
    }

    /// Creates a `Container` value owning the given children.
    pub fn container(name: impl Into<String>, children: Vec<Value>) -> Self {
        Value::new(name, ValueData::Container(children))
    }

    /// Creates an `Array` value owning the given elements.
    ///
    /// Elements are intended to share a kind but this is not enforced.
    pub fn array(name: impl Into<String>, elements: Vec<Value>) -> Self {
        Value::new(name, ValueData::Array(elements))
    }

    /// Parses the scalar text form (the `Display` rendering) back into a
    /// typed value of the given kind.
    ///
    /// This is what the text codecs use when rebuilding scalars: numbers
    /// parse from decimal text, `Bool` from `true`/`false`/`1`/`0`, `Bytes`
    /// from base64, `Null` from empty text. Composite kinds carry no text
    /// form and are refused.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use valuepack::{Value, ValueKind};
    ///
    /// let v = Value::from_text("count", ValueKind::Int, "150").unwrap();
    /// assert_eq!(v.to_int().unwrap(), 150);
    /// assert!(Value::from_text("count", ValueKind::Int, "abc").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] for unparsable text or composite kinds,
    /// and [`Error::Range`] when an integer literal does not fit the kind.
    pub fn from_text(name: impl Into<String>, kind: ValueKind, text: &str) -> Result<Self> {
        let data = match kind {
            ValueKind::Null => {
                if text.trim().is_empty() {
                    ValueData::Null
                } else {
                    return Err(Error::conversion("text", "null"));
                }
            }
            ValueKind::Bool => match text.trim() {
                "true" | "1" => ValueData::Bool(true),
                "false" | "0" => ValueData::Bool(false),
                _ => return Err(Error::conversion("text", "bool")),
            },
            ValueKind::Short
            | ValueKind::UShort
            | ValueKind::Int
            | ValueKind::UInt
            | ValueKind::Long
            | ValueKind::ULong
            | ValueKind::LLong
            | ValueKind::ULLong => {
                let raw = text
                    .trim()
                    .parse::<i128>()
                    .map_err(|_| Error::conversion("text", kind.type_name()))?;
                integer_data(kind, raw)?
            }
            ValueKind::Float => ValueData::Float(
                text.trim()
                    .parse::<f32>()
                    .map_err(|_| Error::conversion("text", "float"))?,
            ),
            ValueKind::Double => ValueData::Double(
                text.trim()
                    .parse::<f64>()
                    .map_err(|_| Error::conversion("text", "double"))?,
            ),
            ValueKind::Bytes => ValueData::Bytes(
                STANDARD
                    .decode(text.trim())
                    .map_err(|e| Error::custom(format!("invalid base64 data: {}", e)))?,
            ),
            ValueKind::String => ValueData::String(text.to_string()),
            ValueKind::Container | ValueKind::Array => {
                return Err(Error::conversion("text", kind.type_name()))
            }
        };
        Ok(Value {
            name: name.into(),
            data,
        })
    }

    /// Returns the value's name. Names may be empty and need not be unique
    /// among siblings.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the value's name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the kind of this value.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.data.kind()
    }

    /// Returns a reference to the payload.
    #[inline]
    #[must_use]
    pub const fn data(&self) -> &ValueData {
        &self.data
    }

    /// Consumes the value, returning its payload.
    #[inline]
    #[must_use]
    pub fn into_data(self) -> ValueData {
        self.data
    }

    /// Returns `true` if the value is `Null`.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    /// Returns `true` if the value is a `Container` or `Array`.
    #[inline]
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        self.kind().is_composite()
    }

    /// If the value is a `String`, returns the text. Otherwise `None`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            ValueData::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is `Bytes`, returns the raw bytes. Otherwise `None`.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            ValueData::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// If the value is composite, returns its children. Otherwise `None`.
    #[inline]
    #[must_use]
    pub fn children(&self) -> Option<&[Value]> {
        match &self.data {
            ValueData::Container(c) | ValueData::Array(c) => Some(c),
            _ => None,
        }
    }

    /// If the value is composite, returns its children mutably.
    #[inline]
    pub fn children_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.data {
            ValueData::Container(c) | ValueData::Array(c) => Some(c),
            _ => None,
        }
    }

    /// Number of children; zero for non-composite values.
    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children().map_or(0, <[Value]>::len)
    }

    /// Returns the child at `index`, if this is a composite value.
    #[must_use]
    pub fn child_at(&self, index: usize) -> Option<&Value> {
        self.children().and_then(|c| c.get(index))
    }

    /// Appends a child to a composite value.
    ///
    /// # Errors
    ///
    /// Fails unless the value is a `Container` or `Array`.
    pub fn push_child(&mut self, child: Value) -> Result<()> {
        match self.children_mut() {
            Some(children) => {
                children.push(child);
                Ok(())
            }
            None => Err(Error::custom(format!(
                "cannot append child to {} value",
                self.kind()
            ))),
        }
    }

    fn conversion_err(&self, target: &str) -> Error {
        Error::conversion(self.kind().type_name(), target)
    }

    /// Integer payload widened to i128, for the integer kinds only.
    fn integer_payload(&self) -> Option<i128> {
        match self.data {
            ValueData::Short(v) => Some(i128::from(v)),
            ValueData::UShort(v) => Some(i128::from(v)),
            ValueData::Int(v) => Some(i128::from(v)),
            ValueData::UInt(v) => Some(i128::from(v)),
            ValueData::Long(v) => Some(i128::from(v)),
            ValueData::ULong(v) => Some(i128::from(v)),
            ValueData::LLong(v) => Some(i128::from(v)),
            ValueData::ULLong(v) => Some(i128::from(v)),
            _ => None,
        }
    }

    /// Common integer coercion: integer kinds pass through, floats truncate
    /// toward zero, strings parse. Everything else is a conversion error.
    fn coerce_integer(&self, target: &str) -> Result<i128> {
        if let Some(v) = self.integer_payload() {
            return Ok(v);
        }
        match &self.data {
            ValueData::Float(v) => truncate_to_i128(f64::from(*v)),
            ValueData::Double(v) => truncate_to_i128(*v),
            ValueData::String(s) => s.trim().parse::<i128>().ok(),
            _ => None,
        }
        .ok_or_else(|| self.conversion_err(target))
    }

    /// Converts to `bool`.
    ///
    /// Defined for `Bool` and for `String` payloads of `true`/`false`/`1`/`0`.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] for every other kind, including `Null`.
    pub fn to_bool(&self) -> Result<bool> {
        match &self.data {
            ValueData::Bool(v) => Ok(*v),
            ValueData::String(s) => match s.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(self.conversion_err("bool")),
            },
            _ => Err(self.conversion_err("bool")),
        }
    }

    /// Converts to a 16-bit signed integer.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] on non-numeric kinds, unparsable strings, or
    /// values outside the target range.
    pub fn to_short(&self) -> Result<i16> {
        let v = self.coerce_integer("short")?;
        i16::try_from(v).map_err(|_| self.conversion_err("short"))
    }

    /// Converts to a 16-bit unsigned integer.
    ///
    /// # Errors
    ///
    /// See [`Value::to_short`].
    pub fn to_ushort(&self) -> Result<u16> {
        let v = self.coerce_integer("ushort")?;
        u16::try_from(v).map_err(|_| self.conversion_err("ushort"))
    }

    /// Converts to a 32-bit signed integer.
    ///
    /// # Errors
    ///
    /// See [`Value::to_short`].
    pub fn to_int(&self) -> Result<i32> {
        let v = self.coerce_integer("int")?;
        i32::try_from(v).map_err(|_| self.conversion_err("int"))
    }

    /// Converts to a 32-bit unsigned integer.
    ///
    /// # Errors
    ///
    /// See [`Value::to_short`].
    pub fn to_uint(&self) -> Result<u32> {
        let v = self.coerce_integer("uint")?;
        u32::try_from(v).map_err(|_| self.conversion_err("uint"))
    }

    /// Converts to a long, honoring the 32-bit window `Long` values carry.
    ///
    /// # Errors
    ///
    /// See [`Value::to_short`].
    pub fn to_long(&self) -> Result<i64> {
        let v = self.coerce_integer("long")?;
        i32::try_from(v)
            .map(i64::from)
            .map_err(|_| self.conversion_err("long"))
    }

    /// Converts to an unsigned long, honoring the 32-bit window.
    ///
    /// # Errors
    ///
    /// See [`Value::to_short`].
    pub fn to_ulong(&self) -> Result<u64> {
        let v = self.coerce_integer("ulong")?;
        u32::try_from(v)
            .map(u64::from)
            .map_err(|_| self.conversion_err("ulong"))
    }

    /// Converts to a 64-bit signed integer.
    ///
    /// # Errors
    ///
    /// See [`Value::to_short`].
    pub fn to_llong(&self) -> Result<i64> {
        let v = self.coerce_integer("llong")?;
        i64::try_from(v).map_err(|_| self.conversion_err("llong"))
    }

    /// Converts to a 64-bit unsigned integer.
    ///
    /// # Errors
    ///
    /// See [`Value::to_short`].
    pub fn to_ullong(&self) -> Result<u64> {
        let v = self.coerce_integer("ullong")?;
        u64::try_from(v).map_err(|_| self.conversion_err("ullong"))
    }

    /// Converts to `f32`. Numeric kinds cast; strings parse.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] on every other kind.
    pub fn to_float(&self) -> Result<f32> {
        match &self.data {
            ValueData::Float(v) => Ok(*v),
            ValueData::Double(v) => Ok(*v as f32),
            ValueData::String(s) => s
                .trim()
                .parse::<f32>()
                .map_err(|_| self.conversion_err("float")),
            _ => self
                .integer_payload()
                .map(|v| v as f32)
                .ok_or_else(|| self.conversion_err("float")),
        }
    }

    /// Converts to `f64`. Numeric kinds cast; strings parse.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] on every other kind.
    pub fn to_double(&self) -> Result<f64> {
        match &self.data {
            ValueData::Float(v) => Ok(f64::from(*v)),
            ValueData::Double(v) => Ok(*v),
            ValueData::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.conversion_err("double")),
            _ => self
                .integer_payload()
                .map(|v| v as f64)
                .ok_or_else(|| self.conversion_err("double")),
        }
    }

    /// Converts to owned text.
    ///
    /// Defined for `String`, `Bool`, and the numeric kinds. `Bytes` refuses;
    /// use the explicit [`Value::to_base64`] or [`Value::to_hex`] accessors.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] on `Null`, `Bytes`, and composite kinds.
    pub fn to_text(&self) -> Result<String> {
        match &self.data {
            ValueData::Bool(v) => Ok(if *v { "true" } else { "false" }.to_string()),
            ValueData::Short(v) => Ok(v.to_string()),
            ValueData::UShort(v) => Ok(v.to_string()),
            ValueData::Int(v) => Ok(v.to_string()),
            ValueData::UInt(v) => Ok(v.to_string()),
            ValueData::Long(v) => Ok(v.to_string()),
            ValueData::ULong(v) => Ok(v.to_string()),
            ValueData::LLong(v) => Ok(v.to_string()),
            ValueData::ULLong(v) => Ok(v.to_string()),
            ValueData::Float(v) => Ok(v.to_string()),
            ValueData::Double(v) => Ok(v.to_string()),
            ValueData::String(s) => Ok(s.clone()),
            _ => Err(self.conversion_err("string")),
        }
    }

    /// Converts to raw bytes. Defined for `Bytes` only.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] on every other kind.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match &self.data {
            ValueData::Bytes(b) => Ok(b.clone()),
            _ => Err(self.conversion_err("bytes")),
        }
    }

    /// Returns the `Bytes` payload as standard base64 text.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] unless the value is `Bytes`.
    pub fn to_base64(&self) -> Result<String> {
        match &self.data {
            ValueData::Bytes(b) => Ok(STANDARD.encode(b)),
            _ => Err(self.conversion_err("base64")),
        }
    }

    /// Returns the `Bytes` payload as lowercase hex.
    ///
    /// # Errors
    ///
    /// [`Error::Conversion`] unless the value is `Bytes`.
    pub fn to_hex(&self) -> Result<String> {
        match &self.data {
            ValueData::Bytes(b) => {
                let mut out = String::with_capacity(b.len() * 2);
                for byte in b {
                    // write! to a String cannot fail
                    let _ = write!(out, "{:02x}", byte);
                }
                Ok(out)
            }
            _ => Err(self.conversion_err("hex")),
        }
    }
}

fn truncate_to_i128(v: f64) -> Option<i128> {
    let t = v.trunc();
    if t.is_finite() {
        // out-of-range casts saturate, which try_from on the target rejects
        Some(t as i128)
    } else {
        None
    }
}

/// Narrows a widened integer into the payload for an integer kind.
pub(crate) fn integer_data(kind: ValueKind, raw: i128) -> Result<ValueData> {
    let out_of_range = || Error::range(kind.type_name(), raw);
    let data = match kind {
        ValueKind::Short => ValueData::Short(i16::try_from(raw).map_err(|_| out_of_range())?),
        ValueKind::UShort => ValueData::UShort(u16::try_from(raw).map_err(|_| out_of_range())?),
        ValueKind::Int => ValueData::Int(i32::try_from(raw).map_err(|_| out_of_range())?),
        ValueKind::UInt => ValueData::UInt(u32::try_from(raw).map_err(|_| out_of_range())?),
        ValueKind::Long => ValueData::Long(i32::try_from(raw).map_err(|_| out_of_range())?),
        ValueKind::ULong => ValueData::ULong(u32::try_from(raw).map_err(|_| out_of_range())?),
        ValueKind::LLong => ValueData::LLong(i64::try_from(raw).map_err(|_| out_of_range())?),
        ValueKind::ULLong => ValueData::ULLong(u64::try_from(raw).map_err(|_| out_of_range())?),
        _ => return Err(Error::conversion("integer", kind.type_name())),
    };
    Ok(data)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ValueData::Null => Ok(()),
            ValueData::Bool(v) => write!(f, "{}", v),
            ValueData::Short(v) => write!(f, "{}", v),
            ValueData::UShort(v) => write!(f, "{}", v),
            ValueData::Int(v) => write!(f, "{}", v),
            ValueData::UInt(v) => write!(f, "{}", v),
            ValueData::Long(v) => write!(f, "{}", v),
            ValueData::ULong(v) => write!(f, "{}", v),
            ValueData::LLong(v) => write!(f, "{}", v),
            ValueData::ULLong(v) => write!(f, "{}", v),
            ValueData::Float(v) => write!(f, "{}", v),
            ValueData::Double(v) => write!(f, "{}", v),
            ValueData::Bytes(b) => write!(f, "{}", STANDARD.encode(b)),
            ValueData::String(s) => write!(f, "{}", s),
            ValueData::Container(c) => write!(f, "container({})", c.len()),
            ValueData::Array(a) => write!(f, "array({})", a.len()),
        }
    }
}

impl From<bool> for ValueData {
    fn from(value: bool) -> Self {
        ValueData::Bool(value)
    }
}

impl From<i8> for ValueData {
    fn from(value: i8) -> Self {
        ValueData::Short(i16::from(value))
    }
}

impl From<u8> for ValueData {
    fn from(value: u8) -> Self {
        ValueData::UShort(u16::from(value))
    }
}

impl From<i16> for ValueData {
    fn from(value: i16) -> Self {
        ValueData::Short(value)
    }
}

impl From<u16> for ValueData {
    fn from(value: u16) -> Self {
        ValueData::UShort(value)
    }
}

impl From<i32> for ValueData {
    fn from(value: i32) -> Self {
        ValueData::Int(value)
    }
}

impl From<u32> for ValueData {
    fn from(value: u32) -> Self {
        ValueData::UInt(value)
    }
}

impl From<i64> for ValueData {
    fn from(value: i64) -> Self {
        ValueData::LLong(value)
    }
}

impl From<u64> for ValueData {
    fn from(value: u64) -> Self {
        ValueData::ULLong(value)
    }
}

impl From<f32> for ValueData {
    fn from(value: f32) -> Self {
        ValueData::Float(value)
    }
}

impl From<f64> for ValueData {
    fn from(value: f64) -> Self {
        ValueData::Double(value)
    }
}

impl From<&str> for ValueData {
    fn from(value: &str) -> Self {
        ValueData::String(value.to_string())
    }
}

impl From<String> for ValueData {
    fn from(value: String) -> Self {
        ValueData::String(value)
    }
}

impl From<Vec<u8>> for ValueData {
    fn from(value: Vec<u8>) -> Self {
        ValueData::Bytes(value)
    }
}

impl From<&[u8]> for ValueData {
    fn from(value: &[u8]) -> Self {
        ValueData::Bytes(value.to_vec())
    }
}

impl From<Vec<Value>> for ValueData {
    fn from(value: Vec<Value>) -> Self {
        ValueData::Container(value)
    }
}
