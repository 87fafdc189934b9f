//! # valuepack
//!
//! A data-interchange library for exchanging typed values between services
//! written in different languages.
//!
//! ## What is valuepack?
//!
//! valuepack models a message as a [`Container`]: six routing/header fields
//! plus an ordered list of named, typed [`Value`]s drawn from a closed set
//! of sixteen kinds (null, bool, eight integer widths, two float widths,
//! bytes, string, and two composite kinds that nest). The same container
//! moves over three interchangeable encodings:
//!
//! - a compact single-line **wire format** (`@header={{..}}@data={{..}};`)
//!   whose composites declare a child count instead of using brackets
//! - three **JSON dialects** (the current `v2.0` envelope plus the legacy
//!   `nested` and `flat` shapes), with automatic detection and conversion
//! - **MessagePack** in canonical minimal form, so equal containers always
//!   produce identical bytes
//!
//! ## Key Features
//!
//! - **Closed type system**: sixteen kinds with fixed numeric codes shared
//!   by every peer; `Long`/`ULong` carry their cross-language 32-bit range
//!   in the type itself
//! - **Checked conversions**: every `to_*()` accessor returns a `Result`,
//!   with range checking on integer narrowing
//! - **Dialect detection**: [`detect_format`] classifies any text without
//!   erroring, and [`convert_format`] rewrites between dialects
//! - **Keyed persistence**: [`ValueStore`] holds loose scalar state and
//!   saves it as JSON or a compact binary image
//! - **Thread-safe option**: [`SharedContainer`] wraps a container in a
//!   mutex when one message is shared across threads
//! - **No unsafe code**: written entirely in safe Rust
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! valuepack = "0.1"
//! ```
//!
//! ### Encoding and decoding the wire format
//!
//! ```rust
//! use valuepack::{from_wire, to_wire, Container, Value};
//!
//! let mut container = Container::with_message_type("db_result");
//! container.set_source("cpp_server", "");
//! container.set_target("python_app", "");
//! container.add(Value::int("row_count", 150));
//! container.add(Value::string("status", "success"));
//!
//! let text = to_wire(&container);
//! // @header={{[target_id,python_app];..}}@data={{[row_count,INT,150];..}};
//!
//! let back = from_wire(&text).unwrap();
//! assert_eq!(back.get("row_count").unwrap().to_int().unwrap(), 150);
//! ```
//!
//! ### Building containers fluently
//!
//! ```rust
//! use valuepack::{values, ContainerBuilder};
//!
//! let container = ContainerBuilder::new()
//!     .message_type("sensor_frame")
//!     .values(values! { "celsius" => 21.5, "channel" => 3 })
//!     .build();
//! assert_eq!(container.len(), 2);
//! ```
//!
//! ### Converting between JSON dialects
//!
//! ```rust
//! use valuepack::{convert_format, detect_format, Detection, Dialect};
//!
//! let flat = r#"{"message_type":"telemetry","values":[{"name":"reading","type":"4","data":"42"}]}"#;
//! assert_eq!(detect_format(flat), Detection::Flat);
//!
//! let v2 = convert_format(flat, Dialect::V2).unwrap();
//! assert_eq!(detect_format(&v2), Detection::V2);
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - All decoding is bounds-checked with a shared nesting limit
//!   ([`MAX_DEPTH`])
//! - Proper error propagation with `Result` types; decoders fail fast and
//!   never return a partially populated container

pub mod builder;
pub mod container;
pub mod error;
pub mod json;
pub mod macros;
pub mod msgpack;
pub mod store;
pub mod value;
pub mod wire;

pub use builder::ContainerBuilder;
pub use container::{Container, SharedContainer, DEFAULT_MESSAGE_TYPE, DEFAULT_VERSION};
pub use error::{Error, Result};
pub use json::{Detection, Dialect};
pub use store::ValueStore;
pub use value::{Value, ValueData, ValueKind, MAX_DEPTH};

use std::io;

/// Serializes a container to its wire-format text.
///
/// # Examples
///
/// ```rust
/// use valuepack::{to_wire, Container, Value};
///
/// let mut container = Container::with_message_type("status");
/// container.add(Value::boolean("ok", true));
///
/// let text = to_wire(&container);
/// assert!(text.contains("[ok,BOOL,true];"));
/// ```
#[must_use]
pub fn to_wire(container: &Container) -> String {
    wire::to_wire(container)
}

/// Deserializes wire-format text into a container.
///
/// # Examples
///
/// ```rust
/// use valuepack::from_wire;
///
/// let text = "@header={{[message_type,status];}}@data={{[ok,BOOL,true];}};";
/// let container = from_wire(text).unwrap();
/// assert!(container.get("ok").unwrap().to_bool().unwrap());
/// ```
///
/// # Errors
///
/// Returns an error if the text is malformed; see [`wire::from_wire`] for
/// the failure modes.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_wire(text: &str) -> Result<Container> {
    wire::from_wire(text)
}

/// Deserializes only the header fields of wire-format text, skipping the
/// data section entirely.
///
/// # Examples
///
/// ```rust
/// use valuepack::from_wire_header;
///
/// let text = "@header={{[message_type,handshake];}}@data={{[big,BYTES,AAAA];}};";
/// let container = from_wire_header(text).unwrap();
/// assert_eq!(container.message_type(), "handshake");
/// assert!(container.is_empty());
/// ```
///
/// # Errors
///
/// Returns an error if the header section is missing or malformed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_wire_header(text: &str) -> Result<Container> {
    wire::from_wire_header(text)
}

/// Writes a container's wire-format text to a writer.
///
/// # Examples
///
/// ```rust
/// use valuepack::{to_writer, Container, Value};
///
/// let mut container = Container::new();
/// container.add(Value::int("n", 1));
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &container).unwrap();
/// assert!(!buffer.is_empty());
/// ```
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(mut writer: W, container: &Container) -> Result<()>
where
    W: io::Write,
{
    writer.write_all(wire::to_wire(container).as_bytes())?;
    Ok(())
}

/// Reads wire-format text from a reader and deserializes it.
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use valuepack::from_reader;
///
/// let cursor = Cursor::new("@header={{[message_type,m];}}@data={{[n,INT,1];}};");
/// let container = from_reader(cursor).unwrap();
/// assert_eq!(container.len(), 1);
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, the bytes are not UTF-8, or the text
/// is malformed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R) -> Result<Container>
where
    R: io::Read,
{
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    wire::from_wire(&text)
}

/// Serializes a container to a compact v2.0 JSON document.
///
/// See [`json`] for the other dialects and the pretty-printing variants.
///
/// # Examples
///
/// ```rust
/// use valuepack::{to_v2_json, Container};
///
/// let text = to_v2_json(&Container::with_message_type("m"));
/// assert!(text.starts_with(r#"{"container":{"version":"2.0""#));
/// ```
#[must_use]
pub fn to_v2_json(container: &Container) -> String {
    json::to_v2(container)
}

/// Parses a v2.0 JSON document into a container.
///
/// # Examples
///
/// ```rust
/// use valuepack::{from_v2_json, to_v2_json, Container, Value};
///
/// let mut container = Container::new();
/// container.add(Value::string("status", "ok"));
///
/// let back = from_v2_json(&to_v2_json(&container)).unwrap();
/// assert_eq!(back, container);
/// ```
///
/// # Errors
///
/// Returns an error for text that is not JSON, a missing or wrong-version
/// envelope, or value entries that do not decode; see [`json::from_v2`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_v2_json(text: &str) -> Result<Container> {
    json::from_v2(text)
}

/// Encodes a container to canonical MessagePack bytes.
///
/// # Examples
///
/// ```rust
/// use valuepack::{to_msgpack, Container};
///
/// let bytes = to_msgpack(&Container::new()).unwrap();
/// assert_eq!(bytes[0], 0x82); // two-entry map: header, values
/// ```
///
/// # Errors
///
/// Returns an error if a length exceeds the format's limits; see
/// [`msgpack::to_msgpack`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_msgpack(container: &Container) -> Result<Vec<u8>> {
    msgpack::to_msgpack(container)
}

/// Decodes MessagePack bytes into a container, header and full value tree.
///
/// # Examples
///
/// ```rust
/// use valuepack::{from_msgpack, to_msgpack, Container, Value};
///
/// let mut container = Container::new();
/// container.add(Value::bytes("frame", vec![0xFF, 0xD8]));
///
/// let back = from_msgpack(&to_msgpack(&container).unwrap()).unwrap();
/// assert_eq!(back, container);
/// ```
///
/// # Errors
///
/// Returns an error for truncated or trailing bytes, mismatched data, or
/// unknown type codes; see [`msgpack::from_msgpack`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_msgpack(bytes: &[u8]) -> Result<Container> {
    msgpack::from_msgpack(bytes)
}

/// Classifies a JSON document by dialect without erroring.
///
/// # Examples
///
/// ```rust
/// use valuepack::{detect_format, Detection};
///
/// assert_eq!(detect_format("not json"), Detection::Invalid);
/// assert_eq!(detect_format("{}"), Detection::Unknown);
/// ```
#[must_use]
pub fn detect_format(text: &str) -> Detection {
    json::detect_format(text)
}

/// Rewrites a JSON document from its detected dialect into `target`.
///
/// # Examples
///
/// ```rust
/// use valuepack::{convert_format, Dialect};
///
/// let nested = r#"{"header":{},"values":{"n":{"type":4,"data":"1"}}}"#;
/// let flat = convert_format(nested, Dialect::Flat).unwrap();
/// assert!(flat.contains(r#""type":"4""#));
/// ```
///
/// # Errors
///
/// Returns an error when the input's dialect is unknown or invalid, or when
/// its values do not decode; see [`json::convert_format`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn convert_format(text: &str, target: Dialect) -> Result<String> {
    json::convert_format(text, target)
}
