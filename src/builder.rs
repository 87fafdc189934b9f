//! Fluent construction of containers.
//!
//! [`ContainerBuilder`] assembles header fields and values in one chained
//! expression, for the common case of building a complete message in one
//! place.
//!
//! ## Examples
//!
//! ```rust
//! use valuepack::{ContainerBuilder, Value};
//!
//! let container = ContainerBuilder::new()
//!     .message_type("db_result")
//!     .source("cpp_server", "worker-3")
//!     .target("python_app", "")
//!     .value(Value::int("row_count", 150))
//!     .value(Value::string("status", "success"))
//!     .build();
//!
//! assert_eq!(container.message_type(), "db_result");
//! assert_eq!(container.len(), 2);
//! ```

use crate::{Container, Value};

/// Builds a [`Container`] through chained calls.
#[derive(Clone, Debug, Default)]
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    /// Creates a builder over a container with default header fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source id and sub id.
    #[must_use]
    pub fn source(mut self, id: impl Into<String>, sub_id: impl Into<String>) -> Self {
        self.container.set_source(id, sub_id);
        self
    }

    /// Sets the target id and sub id.
    #[must_use]
    pub fn target(mut self, id: impl Into<String>, sub_id: impl Into<String>) -> Self {
        self.container.set_target(id, sub_id);
        self
    }

    /// Sets the message type.
    #[must_use]
    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.container.set_message_type(message_type);
        self
    }

    /// Sets the protocol version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.container.set_version(version);
        self
    }

    /// Appends one value.
    #[must_use]
    pub fn value(mut self, value: Value) -> Self {
        self.container.add(value);
        self
    }

    /// Appends every value the iterator yields, preserving order.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use valuepack::{values, ContainerBuilder};
    ///
    /// let container = ContainerBuilder::new()
    ///     .values(values! { "a" => 1, "b" => 2 })
    ///     .build();
    /// assert_eq!(container.len(), 2);
    /// ```
    #[must_use]
    pub fn values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        for value in values {
            self.container.add(value);
        }
        self
    }

    /// Finishes the build, returning the container.
    #[must_use]
    pub fn build(self) -> Container {
        self.container
    }
}

impl From<ContainerBuilder> for Container {
    fn from(builder: ContainerBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_header_and_values() {
        let container = ContainerBuilder::new()
            .message_type("status_report")
            .version("2.1.0.0")
            .source("svc", "a")
            .target("hub", "b")
            .value(Value::int("code", 200))
            .values(vec![Value::string("detail", "ok"), Value::boolean("done", true)])
            .build();

        assert_eq!(container.message_type(), "status_report");
        assert_eq!(container.version(), "2.1.0.0");
        assert_eq!(container.source_id(), "svc");
        assert_eq!(container.source_sub_id(), "a");
        assert_eq!(container.target_id(), "hub");
        assert_eq!(container.target_sub_id(), "b");
        assert_eq!(container.len(), 3);
        assert!(container.get("done").unwrap().to_bool().unwrap());
    }

    #[test]
    fn test_builder_defaults_match_container_new() {
        assert_eq!(ContainerBuilder::new().build(), Container::new());
    }

    #[test]
    fn test_builder_into_container() {
        let container: Container = ContainerBuilder::new().message_type("m").into();
        assert_eq!(container.message_type(), "m");
    }
}
