//! The message container: six header fields plus an ordered value list.
//!
//! [`Container`] is the root object every codec serializes and
//! reconstructs. The header carries routing metadata (`source_id`,
//! `source_sub_id`, `target_id`, `target_sub_id`, `message_type`,
//! `version`); the body is an ordered sequence of [`Value`]s in which
//! duplicate names are permitted and insertion order is meaningful.
//!
//! ## Examples
//!
//! ```rust
//! use valuepack::{Container, Value};
//!
//! let mut container = Container::with_message_type("db_result");
//! container.set_source("cpp_server", "main");
//! container.set_target("python_app", "");
//! container.add(Value::int("row_count", 150));
//! container.add(Value::string("status", "success"));
//!
//! assert_eq!(container.len(), 2);
//! assert_eq!(container.get("row_count").unwrap().to_int().unwrap(), 150);
//! ```
//!
//! `Container` itself carries no synchronization; wrap it in
//! [`SharedContainer`] when several threads need the same instance.

use crate::{wire, Result, Value, ValueData};
use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Message type assigned when none is given.
pub const DEFAULT_MESSAGE_TYPE: &str = "data_container";

/// Protocol version assigned when none is given.
pub const DEFAULT_VERSION: &str = "1.0.0.0";

/// A routing header plus an ordered list of typed values.
///
/// Values are stored in insertion order and names may repeat;
/// [`Container::get`] returns the first match and [`Container::get_at`]
/// the nth.
#[derive(Clone, Debug, PartialEq)]
pub struct Container {
    pub(crate) source_id: String,
    pub(crate) source_sub_id: String,
    pub(crate) target_id: String,
    pub(crate) target_sub_id: String,
    pub(crate) message_type: String,
    pub(crate) version: String,
    pub(crate) values: Vec<Value>,
}

impl Container {
    /// Creates an empty container with default header fields.
    #[must_use]
    pub fn new() -> Self {
        Container {
            source_id: String::new(),
            source_sub_id: String::new(),
            target_id: String::new(),
            target_sub_id: String::new(),
            message_type: DEFAULT_MESSAGE_TYPE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            values: Vec::new(),
        }
    }

    /// Creates an empty container with the given message type.
    #[must_use]
    pub fn with_message_type(message_type: impl Into<String>) -> Self {
        let mut container = Container::new();
        container.message_type = message_type.into();
        container
    }

    /// Returns the source identifier.
    #[inline]
    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Returns the source sub-identifier.
    #[inline]
    #[must_use]
    pub fn source_sub_id(&self) -> &str {
        &self.source_sub_id
    }

    /// Returns the target identifier.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Returns the target sub-identifier.
    #[inline]
    #[must_use]
    pub fn target_sub_id(&self) -> &str {
        &self.target_sub_id
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Returns the protocol version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sets both source identifiers.
    pub fn set_source(&mut self, id: impl Into<String>, sub_id: impl Into<String>) {
        self.source_id = id.into();
        self.source_sub_id = sub_id.into();
    }

    /// Sets both target identifiers.
    pub fn set_target(&mut self, id: impl Into<String>, sub_id: impl Into<String>) {
        self.target_id = id.into();
        self.target_sub_id = sub_id.into();
    }

    /// Replaces the message type.
    pub fn set_message_type(&mut self, message_type: impl Into<String>) {
        self.message_type = message_type.into();
    }

    /// Replaces the protocol version.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Exchanges the source and target id/sub_id pairs, turning a request
    /// header into a reply header.
    pub fn swap_header(&mut self) {
        std::mem::swap(&mut self.source_id, &mut self.target_id);
        std::mem::swap(&mut self.source_sub_id, &mut self.target_sub_id);
    }

    /// Appends a value.
    pub fn add(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Removes every value with the given name, returning how many were
    /// removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|v| v.name() != name);
        before - self.values.len()
    }

    /// Removes all values, keeping the header.
    pub fn clear_values(&mut self) {
        self.values.clear();
    }

    /// Returns the first value with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.name() == name)
    }

    /// Returns the nth value with the given name, counting matches only.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use valuepack::{Container, Value};
    ///
    /// let mut c = Container::new();
    /// c.add(Value::int("n", 1));
    /// c.add(Value::string("other", "x"));
    /// c.add(Value::int("n", 2));
    ///
    /// assert_eq!(c.get_at("n", 1).unwrap().to_int().unwrap(), 2);
    /// assert!(c.get_at("n", 2).is_none());
    /// ```
    #[must_use]
    pub fn get_at(&self, name: &str, index: usize) -> Option<&Value> {
        self.values.iter().filter(|v| v.name() == name).nth(index)
    }

    /// Returns every value with the given name, in insertion order.
    #[must_use]
    pub fn value_array(&self, name: &str) -> Vec<&Value> {
        self.values.iter().filter(|v| v.name() == name).collect()
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no values are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the values in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Returns the values as a slice.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value list mutably.
    #[inline]
    pub fn values_mut(&mut self) -> &mut Vec<Value> {
        &mut self.values
    }

    /// Clones the header into a new container with no values.
    #[must_use]
    pub fn copy_header(&self) -> Self {
        Container {
            source_id: self.source_id.clone(),
            source_sub_id: self.source_sub_id.clone(),
            target_id: self.target_id.clone(),
            target_sub_id: self.target_sub_id.clone(),
            message_type: self.message_type.clone(),
            version: self.version.clone(),
            values: Vec::new(),
        }
    }

    /// Renders the container as an XML document, for logging and export.
    ///
    /// The root `<container>` element carries `message_type` and `version`
    /// attributes, followed by `<source>` and `<target>` routing elements
    /// and a `<values>` element with one node per value: scalars as
    /// `<value name=".." type="..">text</value>` with the decimal type
    /// code, nulls self-closed with `type="null"`, and composites as
    /// `<container>` and `<array>` elements nesting their children. The
    /// view is emit-only; there is no XML decoder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use valuepack::{Container, Value};
    ///
    /// let mut c = Container::with_message_type("db_result");
    /// c.add(Value::int("row_count", 150));
    ///
    /// let xml = c.to_xml();
    /// assert!(xml.contains(r#"<value name="row_count" type="4">150</value>"#));
    /// ```
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(160 + 48 * self.values.len());
        let _ = write!(
            out,
            r#"<container message_type="{}" version="{}">"#,
            xml_escape_attr(&self.message_type),
            xml_escape_attr(&self.version)
        );
        let _ = write!(
            out,
            r#"<source id="{}" sub_id="{}"/>"#,
            xml_escape_attr(&self.source_id),
            xml_escape_attr(&self.source_sub_id)
        );
        let _ = write!(
            out,
            r#"<target id="{}" sub_id="{}"/>"#,
            xml_escape_attr(&self.target_id),
            xml_escape_attr(&self.target_sub_id)
        );
        out.push_str("<values>");
        for value in &self.values {
            write_xml_value(&mut out, value);
        }
        out.push_str("</values></container>");
        out
    }

    /// Writes the container to a file in the wire format.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be written.
    pub fn save_packet(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, wire::to_wire(self))?;
        Ok(())
    }

    /// Reads a container from a file in the wire format.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read, or a parse
    /// error if its contents are not valid wire text.
    pub fn load_packet(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        wire::from_wire(&text)
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Container({}, values={})",
            self.message_type,
            self.values.len()
        )
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// A [`Container`] behind a mutex, for sharing across threads.
///
/// The plain `Container` has zero synchronization overhead; this wrapper is
/// the opt-in alternative. Hold the guard returned by
/// [`SharedContainer::lock`] across an entire encode call to serialize a
/// consistent snapshot; per-operation locking via
/// [`SharedContainer::with`] does not extend across calls.
///
/// # Examples
///
/// ```rust
/// use valuepack::{Container, SharedContainer, Value};
///
/// let shared = SharedContainer::new(Container::new());
/// shared.with(|c| c.add(Value::int("count", 1)));
///
/// let guard = shared.lock();
/// let wire = valuepack::to_wire(&guard);
/// assert!(wire.contains("[count,INT,1];"));
/// ```
#[derive(Debug, Default)]
pub struct SharedContainer {
    inner: Mutex<Container>,
}

impl SharedContainer {
    /// Wraps a container in a mutex.
    #[must_use]
    pub fn new(container: Container) -> Self {
        SharedContainer {
            inner: Mutex::new(container),
        }
    }

    /// Locks the container, recovering the data if a previous holder
    /// panicked.
    pub fn lock(&self) -> MutexGuard<'_, Container> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a closure with the container locked.
    pub fn with<T>(&self, f: impl FnOnce(&mut Container) -> T) -> T {
        f(&mut self.lock())
    }

    /// Unwraps the mutex, returning the container.
    #[must_use]
    pub fn into_inner(self) -> Container {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Container> for SharedContainer {
    fn from(container: Container) -> Self {
        SharedContainer::new(container)
    }
}

fn write_xml_value(out: &mut String, value: &Value) {
    match value.data() {
        ValueData::Null => {
            let _ = write!(
                out,
                r#"<value name="{}" type="null"/>"#,
                xml_escape_attr(value.name())
            );
        }
        ValueData::Container(children) => {
            let _ = write!(out, r#"<container name="{}">"#, xml_escape_attr(value.name()));
            for child in children {
                write_xml_value(out, child);
            }
            out.push_str("</container>");
        }
        ValueData::Array(elements) => {
            let _ = write!(
                out,
                r#"<array name="{}" count="{}">"#,
                xml_escape_attr(value.name()),
                elements.len()
            );
            for element in elements {
                write_xml_value(out, element);
            }
            out.push_str("</array>");
        }
        _ => {
            let text = value.to_string();
            if text.is_empty() {
                let _ = write!(
                    out,
                    r#"<value name="{}" type="{}"/>"#,
                    xml_escape_attr(value.name()),
                    value.kind().code()
                );
            } else {
                let _ = write!(
                    out,
                    r#"<value name="{}" type="{}">{}</value>"#,
                    xml_escape_attr(value.name()),
                    value.kind().code(),
                    xml_escape_text(&text)
                );
            }
        }
    }
}

fn xml_escape_text(text: &str) -> Cow<'_, str> {
    if text.contains('&') || text.contains('<') || text.contains('>') {
        let mut out = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(c),
            }
        }
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

fn xml_escape_attr(text: &str) -> Cow<'_, str> {
    if text.contains('&') || text.contains('<') || text.contains('>') || text.contains('"') {
        let mut out = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                _ => out.push(c),
            }
        }
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_header_fields() {
        let c = Container::new();
        assert_eq!(c.message_type(), "data_container");
        assert_eq!(c.version(), "1.0.0.0");
        assert_eq!(c.source_id(), "");
        assert_eq!(c.target_id(), "");
        assert!(c.is_empty());
        assert_eq!(Container::default(), c);
    }

    #[test]
    fn test_duplicate_names_keep_order() {
        let mut c = Container::new();
        c.add(Value::int("n", 1));
        c.add(Value::int("n", 2));
        c.add(Value::string("other", "x"));
        c.add(Value::int("n", 3));

        assert_eq!(c.len(), 4);
        assert_eq!(c.get("n").unwrap().to_int().unwrap(), 1);
        assert_eq!(c.get_at("n", 2).unwrap().to_int().unwrap(), 3);
        assert!(c.get_at("n", 3).is_none());
        assert_eq!(c.value_array("n").len(), 3);
        assert!(c.get("missing").is_none());
    }

    #[test]
    fn test_remove_takes_all_matches() {
        let mut c = Container::new();
        c.add(Value::int("n", 1));
        c.add(Value::int("n", 2));
        c.add(Value::string("keep", "x"));

        assert_eq!(c.remove("n"), 2);
        assert_eq!(c.remove("n"), 0);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("keep").unwrap().as_str(), Some("x"));

        c.clear_values();
        assert!(c.is_empty());
    }

    #[test]
    fn test_swap_header() {
        let mut c = Container::new();
        c.set_source("client", "session-1");
        c.set_target("server", "handler-7");
        c.swap_header();

        assert_eq!(c.source_id(), "server");
        assert_eq!(c.source_sub_id(), "handler-7");
        assert_eq!(c.target_id(), "client");
        assert_eq!(c.target_sub_id(), "session-1");
    }

    #[test]
    fn test_copy_header_drops_values() {
        let mut c = Container::with_message_type("event");
        c.set_source("a", "b");
        c.add(Value::int("n", 1));

        let copy = c.copy_header();
        assert_eq!(copy.message_type(), "event");
        assert_eq!(copy.source_id(), "a");
        assert!(copy.is_empty());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_display() {
        let mut c = Container::with_message_type("event");
        c.add(Value::int("n", 1));
        assert_eq!(c.to_string(), "Container(event, values=1)");
    }

    #[test]
    fn test_to_xml_layout() {
        let mut c = Container::with_message_type("db_result");
        c.set_source("cpp_server", "worker-3");
        c.set_target("python_app", "");
        c.add(Value::int("row_count", 150));
        c.add(Value::null("missing"));
        c.add(Value::container("row", vec![Value::string("label", "ok")]));
        c.add(Value::array("flags", vec![Value::boolean("", true)]));

        let xml = c.to_xml();
        assert!(xml.starts_with(r#"<container message_type="db_result" version="1.0.0.0">"#));
        assert!(xml.contains(r#"<source id="cpp_server" sub_id="worker-3"/>"#));
        assert!(xml.contains(r#"<target id="python_app" sub_id=""/>"#));
        assert!(xml.contains(r#"<value name="row_count" type="4">150</value>"#));
        assert!(xml.contains(r#"<value name="missing" type="null"/>"#));
        assert!(xml.contains(
            r#"<container name="row"><value name="label" type="13">ok</value></container>"#
        ));
        assert!(xml.contains(
            r#"<array name="flags" count="1"><value name="" type="1">true</value></array>"#
        ));
        assert!(xml.ends_with("</values></container>"));
    }

    #[test]
    fn test_to_xml_escapes_markup() {
        let mut c = Container::with_message_type(r#"a"b&c"#);
        c.add(Value::string("s", "1 < 2 & 3 > 2"));
        c.add(Value::string("", ""));

        let xml = c.to_xml();
        assert!(xml.contains(r#"message_type="a&quot;b&amp;c""#));
        assert!(xml.contains(r#"<value name="s" type="13">1 &lt; 2 &amp; 3 &gt; 2</value>"#));
        // empty text self-closes like a null
        assert!(xml.contains(r#"<value name="" type="13"/>"#));
    }

    #[test]
    fn test_save_and_load_packet() {
        let mut c = Container::with_message_type("snapshot");
        c.set_source("writer", "");
        c.add(Value::int("row_count", 150));
        c.add(Value::string("status", "success"));

        let path = std::env::temp_dir().join(format!(
            "valuepack_packet_{}_{:?}.dat",
            std::process::id(),
            std::thread::current().id()
        ));
        c.save_packet(&path).unwrap();
        let loaded = Container::load_packet(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, c);
    }

    #[test]
    fn test_load_packet_missing_file() {
        let path = std::env::temp_dir().join("valuepack_no_such_packet.dat");
        assert!(matches!(
            Container::load_packet(&path),
            Err(crate::Error::Io(_))
        ));
    }

    #[test]
    fn test_shared_container_across_threads() {
        let shared = Arc::new(SharedContainer::new(Container::new()));
        let mut handles = Vec::new();
        for i in 0..4 {
            let shared = Arc::clone(&shared);
            handles.push(std::thread::spawn(move || {
                shared.with(|c| c.add(Value::int("n", i)));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.lock().len(), 4);

        let container = Arc::try_unwrap(shared).unwrap().into_inner();
        assert_eq!(container.value_array("n").len(), 4);
    }
}
