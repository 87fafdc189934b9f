//! Error types for encoding, decoding, and value conversion.
//!
//! This module provides the crate-wide error taxonomy. Every decode and
//! convert entry point fails fast with one of these variants; a partially
//! populated [`crate::Container`] is never returned.
//!
//! ## Error Categories
//!
//! - **Parse**: malformed wire text, truncated token streams, child-count
//!   mismatches, nesting deeper than [`crate::MAX_DEPTH`]
//! - **UnknownType**: a type tag or numeric code outside the sixteen-kind table
//! - **Conversion**: an incompatible `to_*()` call, in particular on `Null`
//! - **Range**: `Long`/`ULong` construction outside the 32-bit window
//! - **Format**: converting from a JSON document whose dialect could not be
//!   detected
//!
//! ## Examples
//!
//! ```rust
//! use valuepack::{from_wire, Error};
//!
//! let result = from_wire("@header={{[message_type,x];}}@data={{[n,WAT,1];}};");
//! assert!(matches!(result, Err(Error::UnknownType(_))));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by the codecs and the value model.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed input encountered while decoding
    #[error("Parse error at position {position}: {msg}")]
    Parse { position: usize, msg: String },

    /// Type tag or numeric code not present in the sixteen-kind table
    #[error("Unknown value type: {0}")]
    UnknownType(String),

    /// A `to_*()` conversion with no defined coercion for the value's kind
    #[error("Cannot convert {kind} value to {target}")]
    Conversion { kind: String, target: String },

    /// Numeric value outside the range its kind can carry
    #[error("Value {value} out of range for {kind}")]
    Range { kind: String, value: i128 },

    /// JSON input whose dialect is unknown or invalid
    #[error("Format error: {0}")]
    Format(String),

    /// Generic message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates a parse error at a byte position in the input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use valuepack::Error;
    ///
    /// let err = Error::parse(12, "unterminated data section");
    /// assert!(err.to_string().contains("position 12"));
    /// ```
    pub fn parse(position: usize, msg: &str) -> Self {
        Error::Parse {
            position,
            msg: msg.to_string(),
        }
    }

    /// Creates an unknown-type error from the offending tag or code.
    pub fn unknown_type(token: &str) -> Self {
        Error::UnknownType(token.to_string())
    }

    /// Creates a conversion error for an undefined `to_*()` coercion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use valuepack::Error;
    ///
    /// let err = Error::conversion("null", "int");
    /// assert_eq!(err.to_string(), "Cannot convert null value to int");
    /// ```
    pub fn conversion(kind: &str, target: &str) -> Self {
        Error::Conversion {
            kind: kind.to_string(),
            target: target.to_string(),
        }
    }

    /// Creates a range error for a value that does not fit its kind.
    pub fn range(kind: &str, value: i128) -> Self {
        Error::Range {
            kind: kind.to_string(),
            value,
        }
    }

    /// Creates a format error for an unconvertible JSON dialect.
    pub fn format(msg: &str) -> Self {
        Error::Format(msg.to_string())
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates an error with a custom display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    /// Stores the display string so the error stays `Clone`.
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
