//! Module for writing JSON tokens
//!
//! [`JsonWriter`] is the push side of the token stream which all serializers of this crate
//! produce into. [`JsonTextWriter`] is an implementation of it which writes the JSON document
//! into a `String`.

use std::fmt::Debug;

use thiserror::Error;

use crate::reader::{JsonPosition, ReaderError};

mod text_writer;
// Re-export in-memory implementation under `writer` module
pub use text_writer::*;

/// A trait for JSON token writers
///
/// The methods of this writer can be divided into the following categories:
///
/// - Writing values
///     - [`begin_array`](Self::begin_array), [`end_array`](Self::end_array): Starting and ending a JSON array
///     - [`begin_object`](Self::begin_object), [`end_object`](Self::end_object): Starting and ending a JSON object
///     - [`name`](Self::name), [`cancel_name`](Self::cancel_name): Writing or retracting a JSON object member name
///     - [`string_value`](Self::string_value): Writing a JSON string value
///     - [`integer_value`](Self::integer_value), [`unsigned_value`](Self::unsigned_value),
///       [`float_value`](Self::float_value), [`number_value_from_string`](Self::number_value_from_string): Writing a JSON number value
///     - [`bool_value`](Self::bool_value): Writing a JSON boolean value
///     - [`null_value`](Self::null_value): Writing a JSON null value
///     - [`raw_value`](Self::raw_value): Writing an already serialized JSON value
///  - Other:
///     - [`current_position`](Self::current_position): Location information for errors
///
/// Member names are not written immediately; they are held back until the value of the member
/// is written. This allows a serializer to decide after calling [`name`](Self::name) that the
/// member should be omitted, and to retract the name with [`cancel_name`](Self::cancel_name).
///
/// The trait is object safe; serializers receive it as `&mut dyn JsonWriter`.
///
/// # Examples
/// ```
/// # use beanson::writer::*;
/// let mut json_writer = JsonTextWriter::new();
///
/// json_writer.begin_object()?;
/// json_writer.name("a")?;
///
/// json_writer.begin_array()?;
/// json_writer.integer_value(1)?;
/// json_writer.bool_value(true)?;
/// json_writer.end_array()?;
///
/// json_writer.name("b")?;
/// // Decided to not write member "b" after all
/// assert!(json_writer.cancel_name());
///
/// json_writer.end_object()?;
///
/// let json = json_writer.finish_document();
/// assert_eq!(json, r#"{"a":[1,true]}"#);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Panics
/// Methods of this writer panic when used in an incorrect way, for example when trying to call
/// [`end_object`](Self::end_object) while currently writing a JSON array. All these cases are
/// related to incorrect usage by the code driving the writer, not to the data being written.
pub trait JsonWriter {
    /// Begins writing a JSON object
    ///
    /// # Panics
    /// Panics when called on a JSON writer which currently expects a member name, or
    /// when called after the top-level value has already been written.
    fn begin_object(&mut self) -> Result<(), WriterError>;

    /// Writes the closing bracket `}` of the current JSON object
    ///
    /// # Panics
    /// Panics when called on a JSON writer which is currently not inside a JSON object,
    /// or when the value of a member is currently expected.
    fn end_object(&mut self) -> Result<(), WriterError>;

    /// Begins writing a JSON array
    ///
    /// # Panics
    /// Panics when called on a JSON writer which currently expects a member name, or
    /// when called after the top-level value has already been written.
    fn begin_array(&mut self) -> Result<(), WriterError>;

    /// Writes the closing bracket `]` of the current JSON array
    ///
    /// # Panics
    /// Panics when called on a JSON writer which is currently not inside a JSON array.
    fn end_array(&mut self) -> Result<(), WriterError>;

    /// Writes the name of the next JSON object member
    ///
    /// The name only appears in the output once the member value is written.
    ///
    /// # Panics
    /// Panics when called on a JSON writer which currently does not expect a member name.
    fn name(&mut self, name: &str) -> Result<(), WriterError>;

    /// Retracts the member name written by the last [`name`](Self::name) call
    ///
    /// Returns `true` if a name was pending and has been discarded, `false` if no name was
    /// pending (for example because the writer is at the top-level or inside an array).
    fn cancel_name(&mut self) -> bool;

    /// Whether a member name has been written whose value has not been written yet
    fn has_pending_name(&self) -> bool;

    /// Writes a JSON null value
    fn null_value(&mut self) -> Result<(), WriterError>;

    /// Writes a JSON boolean value
    fn bool_value(&mut self, value: bool) -> Result<(), WriterError>;

    /// Writes a JSON string value
    ///
    /// Characters are automatically escaped in the JSON output if necessary.
    fn string_value(&mut self, value: &str) -> Result<(), WriterError>;

    /// Writes a signed integer as JSON number
    fn integer_value(&mut self, value: i128) -> Result<(), WriterError>;

    /// Writes an unsigned integer as JSON number
    fn unsigned_value(&mut self, value: u128) -> Result<(), WriterError>;

    /// Writes a floating point number as JSON number
    ///
    /// # Errors
    /// NaN and Infinity are not valid JSON numbers; for them [`WriterError::NonFiniteNumber`]
    /// is returned.
    fn float_value(&mut self, value: f64) -> Result<(), WriterError>;

    /// Writes the string representation of a number as JSON number
    ///
    /// # Errors
    /// Returns [`WriterError::InvalidNumber`] if the string is not a valid JSON number.
    fn number_value_from_string(&mut self, value: &str) -> Result<(), WriterError>;

    /// Writes an already serialized JSON value
    ///
    /// Leading and trailing whitespace is removed; the value itself is written as is.
    ///
    /// # Errors
    /// Returns [`WriterError::InvalidRawValue`] if the string is not exactly one valid JSON value.
    fn raw_value(&mut self, value: &str) -> Result<(), WriterError>;

    /// Gets the current position of this writer within the JSON data
    fn current_position(&self) -> JsonPosition;
}

/// Error which occurred while writing to a JSON writer
#[non_exhaustive]
#[derive(Error, Clone, PartialEq, Debug)]
pub enum WriterError {
    /// A floating point number was NaN or Infinity
    #[error("non-finite number {value} cannot be written as JSON number at {location}")]
    NonFiniteNumber {
        /// String representation of the number
        value: String,
        /// Location where the number would have been written
        location: JsonPosition,
    },
    /// A number string is not a valid JSON number
    #[error("invalid JSON number '{number}' at {location}")]
    InvalidNumber {
        /// The number string
        number: String,
        /// Location where the number would have been written
        location: JsonPosition,
    },
    /// A raw value is not exactly one valid JSON value
    #[error("invalid raw JSON value at {location}: {source}")]
    InvalidRawValue {
        /// Error which occurred while validating the raw value
        #[source]
        source: ReaderError,
        /// Location where the value would have been written
        location: JsonPosition,
    },
}

impl WriterError {
    /// Location where the error occurred
    pub fn location(&self) -> &JsonPosition {
        match self {
            WriterError::NonFiniteNumber { location, .. }
            | WriterError::InvalidNumber { location, .. }
            | WriterError::InvalidRawValue { location, .. } => location,
        }
    }
}
