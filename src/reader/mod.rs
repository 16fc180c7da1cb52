//! Module for reading JSON tokens
//!
//! [`JsonReader`] is the pull side of the token stream which all deserializers of this crate
//! consume. [`JsonTextReader`] is an implementation of it which reads a JSON document held
//! completely in memory.

/// Module for JSON path
///
/// A JSON path consists of zero or more [`JsonPathPiece`] elements which either represent the index of a
/// JSON array item or the name of a JSON object member. These elements combined form the _path_ to a value
/// in a JSON document. Paths are used for reporting the location of errors, for example `$.pets[2].name`.
pub mod json_path {
    /// A piece of a JSON path
    ///
    /// A piece can either represent the index of a JSON array item or the name of a JSON object member.
    #[derive(PartialEq, Eq, Clone, Debug)]
    pub enum JsonPathPiece {
        /// Index (starting at 0) of a JSON array item
        ArrayItem(u32),
        /// Name of a JSON object member
        ObjectMember(String),
    }

    /// Creates a [`JsonPathPiece::ArrayItem`] with the number as index
    impl From<u32> for JsonPathPiece {
        fn from(v: u32) -> Self {
            JsonPathPiece::ArrayItem(v)
        }
    }

    /// Creates a [`JsonPathPiece::ObjectMember`] with the string as member name
    impl From<&str> for JsonPathPiece {
        fn from(v: &str) -> Self {
            JsonPathPiece::ObjectMember(v.to_owned())
        }
    }

    /// A JSON path
    pub type JsonPath = [JsonPathPiece];

    pub(crate) fn format_abs_json_path(json_path: &JsonPath) -> String {
        "$".to_string()
            + json_path
                .iter()
                .map(|p| match p {
                    JsonPathPiece::ArrayItem(index) => format!("[{index}]"),
                    JsonPathPiece::ObjectMember(name) => format!(".{name}"),
                })
                .collect::<String>()
                .as_str()
    }

    /// Creates a JSON path from path pieces
    ///
    /// Numbers of type `u32` are converted to [`JsonPathPiece::ArrayItem`], strings are
    /// converted to [`JsonPathPiece::ObjectMember`].
    ///
    /// # Examples
    /// ```
    /// # use beanson::reader::json_path::*;
    /// let json_path = json_path!["pets", 3, "name"];
    /// assert_eq!(
    ///     json_path,
    ///     [
    ///         JsonPathPiece::ObjectMember("pets".to_owned()),
    ///         JsonPathPiece::ArrayItem(3),
    ///         JsonPathPiece::ObjectMember("name".to_owned()),
    ///     ]
    /// );
    /// ```
    #[macro_export]
    macro_rules! json_path {
        ( $( $piece:expr ),+ ) => {
            {
                [
                    $(
                        $crate::reader::json_path::JsonPathPiece::from($piece),
                    )*
                ]
            }
        };
    }

    // Re-export the macro to be available under the `beanson::reader::json_path` module path
    #[doc(inline)]
    pub use json_path;

}

use std::fmt::{Debug, Display, Formatter};

use thiserror::Error;

use self::json_path::{format_abs_json_path, JsonPathPiece};

mod text_reader;
// Re-export in-memory implementation under `reader` module
pub use text_reader::*;

/// Kind of the next token in a JSON document
///
/// Returned by [`JsonReader::peek`].
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum TokenKind {
    /// Start of a JSON object: `{`
    BeginObject,
    /// End of a JSON object: `}`
    EndObject,
    /// Start of a JSON array: `[`
    BeginArray,
    /// End of a JSON array: `]`
    EndArray,
    /// Name of a JSON object member
    Name,
    /// JSON string value
    String,
    /// JSON number value
    Number,
    /// JSON boolean value: `true` or `false`
    Boolean,
    /// JSON `null`
    Null,
    /// The top-level value has been consumed completely
    EndDocument,
}

impl TokenKind {
    /// Whether this token starts a scalar value (string, number, boolean or `null`)
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenKind::String | TokenKind::Number | TokenKind::Boolean | TokenKind::Null
        )
    }
}

/// Line and column position
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct LinePosition {
    /// Line number, starting at 0
    pub line: u64,
    /// Character column within the line, starting at 0
    pub column: u64,
}

impl Display for LinePosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Position of a JSON reader or writer within the JSON document
///
/// Each piece of information is optional; a writer for example has no line position
/// because it might pretty print the output.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct JsonPosition {
    /// JSON path of the current value, `None` if path tracking is disabled
    pub path: Option<Vec<JsonPathPiece>>,
    /// Line position
    pub line_pos: Option<LinePosition>,
    /// Byte offset within the document, starting at 0
    pub data_pos: Option<u64>,
}

impl JsonPosition {
    /// Position for which no information is available
    pub fn unknown() -> Self {
        JsonPosition {
            path: None,
            line_pos: None,
            data_pos: None,
        }
    }
}

impl Display for JsonPosition {
    // Create display string depending on which of the Option values are present
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "path '{}'", format_abs_json_path(path))?;

            if let Some(line_pos) = &self.line_pos {
                write!(f, ", {line_pos}")?;

                if let Some(data_pos) = &self.data_pos {
                    write!(f, " (data pos {data_pos})")?;
                }
            } else if let Some(data_pos) = &self.data_pos {
                write!(f, ", data pos {data_pos}")?;
            }
        } else if let Some(line_pos) = &self.line_pos {
            write!(f, "{line_pos}")?;

            if let Some(data_pos) = &self.data_pos {
                write!(f, " (data pos {data_pos})")?;
            }
        } else if let Some(data_pos) = &self.data_pos {
            write!(f, "data pos {data_pos}")?;
        } else {
            write!(f, "<location unavailable>")?;
        }

        Ok(())
    }
}

/// JSON syntax error
#[derive(Error, PartialEq, Eq, Clone, Debug)]
#[error("JSON syntax error {kind} at {location}")]
pub struct JsonSyntaxError {
    /// Kind of the error
    pub kind: SyntaxErrorKind,
    /// Location where the error occurred
    pub location: JsonPosition,
}

/// Describes why a syntax error occurred
#[non_exhaustive]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum SyntaxErrorKind {
    /// A comment was encountered but comments are not enabled in the [`ReaderSettings`]
    CommentsNotEnabled,
    /// A comment is incomplete, e.g. only a single `/`
    IncompleteComment,
    /// A block comment is missing its closing `*/`
    BlockCommentNotClosed,
    /// A malformed literal, e.g. `truE`
    InvalidLiteral,
    /// A closing bracket which does not match the enclosing container
    UnexpectedClosingBracket,
    /// A comma at an unexpected position
    UnexpectedComma,
    /// A comma is missing between two values
    MissingComma,
    /// A trailing comma, but trailing commas are not enabled in the [`ReaderSettings`]
    TrailingCommaNotEnabled,
    /// A colon at an unexpected position
    UnexpectedColon,
    /// A colon is missing after a member name
    MissingColon,
    /// A malformed number, e.g. `01`
    MalformedNumber,
    /// Neither a member name nor the end of the object was found
    ExpectingMemberNameOrObjectEnd,
    /// A character which cannot start any JSON value
    MalformedJson,
    /// A control character inside a string which is not escaped
    NotEscapedControlCharacter,
    /// An unknown escape sequence, e.g. `\x`
    UnknownEscapeSequence,
    /// A malformed `\u` escape sequence
    MalformedEscapeSequence,
    /// A `\u` escape of an unpaired surrogate
    UnpairedSurrogatePairEscapeSequence,
    /// The string is missing its closing quote
    UnterminatedString,
    /// The document ended before the top-level value was complete
    IncompleteDocument,
    /// Non-whitespace data after the top-level value
    TrailingData,
}

/// Error which occurred while reading from a JSON reader
#[non_exhaustive]
#[derive(Error, Clone, PartialEq, Debug)]
pub enum ReaderError {
    /// The JSON text is malformed
    #[error("syntax error: {0}")]
    SyntaxError(#[from] JsonSyntaxError),
    /// The next token has a different kind than the one the caller tried to consume
    #[error("expected JSON token {expected} but got {actual} at {location}")]
    UnexpectedToken {
        /// Kind the caller tried to consume
        expected: TokenKind,
        /// Actual kind of the next token
        actual: TokenKind,
        /// Location of the token
        location: JsonPosition,
    },
    /// A string value could not be coerced to a number in lenient mode
    #[error("invalid number '{number}' at {location}")]
    InvalidNumber {
        /// The string value
        number: String,
        /// Location of the value
        location: JsonPosition,
    },
    /// A value was expected, but the next token is a member name, the end of a container or
    /// the end of the document
    #[error("expected a JSON value but got {actual} at {location}")]
    ExpectedValue {
        /// Actual kind of the next token
        actual: TokenKind,
        /// Location of the token
        location: JsonPosition,
    },
    /// Nesting of arrays and objects is deeper than allowed by the [`ReaderSettings`]
    #[error("maximum nesting depth {max_depth} exceeded at {location}")]
    MaxNestingDepthExceeded {
        /// The configured maximum depth
        max_depth: u32,
        /// Location of the array or object start which exceeded the depth
        location: JsonPosition,
    },
}

impl ReaderError {
    /// Location where the error occurred
    pub fn location(&self) -> &JsonPosition {
        match self {
            ReaderError::SyntaxError(e) => &e.location,
            ReaderError::UnexpectedToken { location, .. }
            | ReaderError::InvalidNumber { location, .. }
            | ReaderError::ExpectedValue { location, .. }
            | ReaderError::MaxNestingDepthExceeded { location, .. } => location,
        }
    }
}

/// A trait for JSON token readers
///
/// The methods of this trait consume one token (or one complete value for
/// [`skip_value`](Self::skip_value) and [`next_raw_value`](Self::next_raw_value)) at a time.
/// If the next token does not have the kind a method expects, the method fails with
/// [`ReaderError::UnexpectedToken`] and does not consume anything.
///
/// The trait is object safe; deserializers receive it as `&mut dyn JsonReader` so that
/// buffered values can be replayed through a different reader.
pub trait JsonReader {
    /// Peeks at the kind of the next token without consuming it
    fn peek(&mut self) -> Result<TokenKind, ReaderError>;

    /// Begins consuming a JSON object
    fn begin_object(&mut self) -> Result<(), ReaderError>;

    /// Consumes the closing bracket of the current JSON object
    fn end_object(&mut self) -> Result<(), ReaderError>;

    /// Begins consuming a JSON array
    fn begin_array(&mut self) -> Result<(), ReaderError>;

    /// Consumes the closing bracket of the current JSON array
    fn end_array(&mut self) -> Result<(), ReaderError>;

    /// Checks if the current array or object has a next item or member
    fn has_next(&mut self) -> Result<bool, ReaderError> {
        Ok(!matches!(
            self.peek()?,
            TokenKind::EndArray | TokenKind::EndObject | TokenKind::EndDocument
        ))
    }

    /// Consumes the name of the next object member
    fn next_name(&mut self) -> Result<String, ReaderError>;

    /// Consumes a string value
    ///
    /// Number values are accepted as well and returned in their textual form.
    fn next_string(&mut self) -> Result<String, ReaderError>;

    /// Consumes a boolean value
    ///
    /// In lenient mode the strings `"true"` and `"false"` are accepted as well.
    fn next_bool(&mut self) -> Result<bool, ReaderError>;

    /// Consumes a number value and returns its textual form
    ///
    /// In lenient mode a string value containing a valid JSON number is accepted as well.
    fn next_number_str(&mut self) -> Result<String, ReaderError>;

    /// Consumes a `null` value
    fn next_null(&mut self) -> Result<(), ReaderError>;

    /// Consumes the next complete value and returns its JSON source text
    fn next_raw_value(&mut self) -> Result<String, ReaderError>;

    /// Skips the next complete value, including nested arrays and objects
    fn skip_value(&mut self) -> Result<(), ReaderError>;

    /// Whether lenient coercion of strings to numbers and booleans is enabled
    fn is_lenient(&self) -> bool;

    /// Gets the current position of this reader within the JSON data
    fn current_position(&self, include_path: bool) -> JsonPosition;
}
