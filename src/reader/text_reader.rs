//! In-memory implementation of [`JsonReader`]

use super::{json_path::JsonPathPiece, *};
use crate::json_number::{is_valid_json_number, scan_json_number};

#[derive(PartialEq, Clone, Copy, Debug)]
enum PeekedValue {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    // Reader position is at the opening "
    NameStart,
    StringStart,
    NumberStart,
    Null,
    BooleanTrue,
    BooleanFalse,
    EndDocument,
}

impl PeekedValue {
    fn token_kind(self) -> TokenKind {
        match self {
            PeekedValue::ObjectStart => TokenKind::BeginObject,
            PeekedValue::ObjectEnd => TokenKind::EndObject,
            PeekedValue::ArrayStart => TokenKind::BeginArray,
            PeekedValue::ArrayEnd => TokenKind::EndArray,
            PeekedValue::NameStart => TokenKind::Name,
            PeekedValue::StringStart => TokenKind::String,
            PeekedValue::NumberStart => TokenKind::Number,
            PeekedValue::Null => TokenKind::Null,
            PeekedValue::BooleanTrue | PeekedValue::BooleanFalse => TokenKind::Boolean,
            PeekedValue::EndDocument => TokenKind::EndDocument,
        }
    }
}

#[derive(PartialEq, Debug)]
enum StackValue {
    Array,
    Object,
}

/// Settings to customize the JSON reader behavior
///
/// These settings are used by [`JsonTextReader::new_custom`]. To avoid repeating the
/// default values for unchanged settings `..Default::default()` can be used:
/// ```
/// # use beanson::reader::ReaderSettings;
/// ReaderSettings {
///     allow_comments: true,
///     // For all other settings use the default
///     ..Default::default()
/// }
/// # ;
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct ReaderSettings {
    /// Whether to allow comments in the JSON document
    ///
    /// Both block comments (`/* ... */`) and line comments (`// ...`) are supported.
    pub allow_comments: bool,

    /// Whether to allow a trailing comma after the last array item or object member
    pub allow_trailing_comma: bool,

    /// Whether strings may be read as numbers and booleans
    ///
    /// When enabled [`JsonReader::next_number_str`] accepts a string such as `"12"` and
    /// [`JsonReader::next_bool`] accepts `"true"` and `"false"`.
    pub lenient: bool,

    /// Whether to keep track of the JSON path while reading
    ///
    /// The path is included in the location of errors.
    pub track_path: bool,

    /// Maximum nesting depth of arrays and objects
    ///
    /// Values nested deeper cause [`ReaderError::MaxNestingDepthExceeded`]. Deserializers
    /// recurse once per nesting level, so this also bounds their stack usage.
    pub max_nesting_depth: u32,
}

/// Default nesting limit
///
/// Deserializers recurse once or more per nesting level. At this depth reading stays well
/// within the 2 MiB stack of spawned threads, also in unoptimized builds. Raising the limit
/// may require running the deserialization on a thread with a larger stack.
pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 128;

impl Default for ReaderSettings {
    /// Creates the default JSON reader settings
    ///
    /// - comments: disallowed
    /// - trailing comma: disallowed
    /// - lenient: false
    /// - track path: true
    /// - max nesting depth: [`DEFAULT_MAX_NESTING_DEPTH`]
    fn default() -> Self {
        ReaderSettings {
            allow_comments: false,
            allow_trailing_comma: false,
            lenient: false,
            track_path: true,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// A JSON reader over a complete in-memory JSON document
///
/// Member names and strings are unescaped eagerly; raw values returned by
/// [`next_raw_value`](JsonReader::next_raw_value) are slices of the original text.
///
/// # Examples
/// ```
/// # use beanson::reader::*;
/// let mut json_reader = JsonTextReader::new(r#"{"a": [1, true]}"#);
///
/// json_reader.begin_object()?;
/// assert_eq!("a", json_reader.next_name()?);
///
/// json_reader.begin_array()?;
/// assert_eq!("1", json_reader.next_number_str()?);
/// assert_eq!(true, json_reader.next_bool()?);
/// json_reader.end_array()?;
///
/// json_reader.end_object()?;
/// // Ensures that there is no trailing data
/// json_reader.consume_trailing_whitespace()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JsonTextReader<'a> {
    input: &'a str,
    pos: usize,

    peeked: Option<PeekedValue>,
    is_empty: bool,
    expects_member_name: bool,
    stack: Vec<StackValue>,
    json_path: Option<Vec<JsonPathPiece>>,
    // Position of `input` within an enclosing document
    origin: Option<JsonPosition>,

    reader_settings: ReaderSettings,
}

impl Debug for JsonTextReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let remaining = &self.input[self.pos..];
        let remaining = match remaining.char_indices().nth(45) {
            None => remaining.to_owned(),
            Some((index, _)) => format!("{}...", &remaining[..index]),
        };

        f.debug_struct("JsonTextReader")
            .field("pos", &self.pos)
            .field("remaining", &remaining)
            .field("peeked", &self.peeked)
            .field("is_empty", &self.is_empty)
            .field("expects_member_name", &self.expects_member_name)
            .field("stack", &self.stack)
            .field("json_path", &self.json_path)
            .field("origin", &self.origin)
            .field("reader_settings", &self.reader_settings)
            .finish()
    }
}

// Implementation with public constructor methods
impl<'a> JsonTextReader<'a> {
    /// Creates a JSON reader with [default settings](ReaderSettings::default)
    pub fn new(input: &'a str) -> Self {
        JsonTextReader::new_custom(input, ReaderSettings::default())
    }

    /// Creates a JSON reader with custom settings
    pub fn new_custom(input: &'a str, reader_settings: ReaderSettings) -> Self {
        let initial_nesting_capacity = 16;
        JsonTextReader {
            input,
            pos: 0,
            peeked: None,
            is_empty: true,
            expects_member_name: false,
            stack: Vec::with_capacity(initial_nesting_capacity),
            json_path: if reader_settings.track_path {
                Some(Vec::with_capacity(initial_nesting_capacity))
            } else {
                None
            },
            origin: None,
            reader_settings,
        }
    }

    /// Creates a JSON reader for a value which was extracted from an enclosing document
    ///
    /// `origin` is the position of the value within that document. Positions reported by
    /// this reader, including those of errors, are relative to the enclosing document.
    pub fn new_embedded(input: &'a str, reader_settings: ReaderSettings, origin: JsonPosition) -> Self {
        let mut json_reader = JsonTextReader::new_custom(input, reader_settings);
        json_reader.origin = Some(origin);
        json_reader
    }

    /// Consumes trailing whitespace (and comments, if enabled) at the end of the document
    ///
    /// Fails if the top-level value has not been consumed completely yet, or if there is
    /// trailing data after it.
    pub fn consume_trailing_whitespace(mut self) -> Result<(), ReaderError> {
        if !self.is_behind_top_level() {
            return self.syntax_error(SyntaxErrorKind::IncompleteDocument);
        }
        match self.skip_whitespace()? {
            None => Ok(()),
            Some(_) => self.syntax_error(SyntaxErrorKind::TrailingData),
        }
    }
}

// Implementation with error utility methods, and methods for inspecting JSON structure state
impl JsonTextReader<'_> {
    fn syntax_error<T>(&self, kind: SyntaxErrorKind) -> Result<T, ReaderError> {
        self.syntax_error_at(kind, self.pos)
    }

    fn syntax_error_at<T>(&self, kind: SyntaxErrorKind, pos: usize) -> Result<T, ReaderError> {
        Err(ReaderError::SyntaxError(JsonSyntaxError {
            kind,
            location: self.position_at(pos, true),
        }))
    }

    fn position_at(&self, pos: usize, include_path: bool) -> JsonPosition {
        let mut line = 0;
        let mut column = 0;
        let mut has_cr = false;
        for c in self.input[..pos].chars() {
            match c {
                // Count \r\n (Windows line break) as only one line break
                '\n' if has_cr => {}
                '\n' | '\r' => {
                    line += 1;
                    column = 0;
                }
                _ => column += 1,
            }
            has_cr = c == '\r';
        }

        let position = JsonPosition {
            path: if include_path {
                self.json_path.clone()
            } else {
                None
            },
            line_pos: Some(LinePosition { line, column }),
            data_pos: Some(pos as u64),
        };
        match &self.origin {
            None => position,
            Some(origin) => relative_to(origin, position),
        }
    }

    fn is_behind_top_level(&self) -> bool {
        !self.is_empty && self.stack.is_empty()
    }

    fn is_in_array(&self) -> bool {
        self.stack.last() == Some(&StackValue::Array)
    }

    fn is_in_object(&self) -> bool {
        self.stack.last() == Some(&StackValue::Object)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }
}

/// Converts a position within an embedded value to a position within the enclosing document
fn relative_to(origin: &JsonPosition, position: JsonPosition) -> JsonPosition {
    let path = match (&origin.path, position.path) {
        (Some(prefix), Some(path)) => Some(prefix.iter().cloned().chain(path).collect()),
        (_, path) => path,
    };
    let line_pos = match (&origin.line_pos, position.line_pos) {
        (Some(start), Some(line_pos)) => Some(LinePosition {
            line: start.line + line_pos.line,
            // Only the first line of the value is preceded by the start column
            column: if line_pos.line == 0 {
                start.column + line_pos.column
            } else {
                line_pos.column
            },
        }),
        _ => None,
    };
    let data_pos = match (origin.data_pos, position.data_pos) {
        (Some(start), Some(data_pos)) => Some(start + data_pos),
        _ => None,
    };
    JsonPosition {
        path,
        line_pos,
        data_pos,
    }
}

fn is_value_separator(byte: u8) -> bool {
    // Note: Also includes ':' even though that is not a valid value separator to get more accurate errors
    matches!(
        byte,
        b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r' | b'/' | b':'
    )
}

// Implementation with whitespace skipping and peeking logic
impl JsonTextReader<'_> {
    fn skip_whitespace(&mut self) -> Result<Option<u8>, ReaderError> {
        let bytes = self.input.as_bytes();
        // Run this in loop because when comment is skipped have to skip whitespace (and comments) again
        loop {
            while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek_byte() {
                self.pos += 1;
            }

            let byte = match self.peek_byte() {
                None => return Ok(None),
                Some(byte) => byte,
            };
            if byte != b'/' {
                return Ok(Some(byte));
            }

            if !self.reader_settings.allow_comments {
                return self.syntax_error(SyntaxErrorKind::CommentsNotEnabled);
            }
            match bytes.get(self.pos + 1) {
                Some(b'*') => {
                    let content_start = self.pos + 2;
                    match self.input[content_start..].find("*/") {
                        None => return self.syntax_error(SyntaxErrorKind::BlockCommentNotClosed),
                        Some(index) => self.pos = content_start + index + 2,
                    }
                }
                Some(b'/') => {
                    self.pos += 2;
                    // Don't consume LF or CR, whitespace skipping handles it
                    while !matches!(self.peek_byte(), None | Some(b'\n' | b'\r')) {
                        self.pos += 1;
                    }
                }
                _ => return self.syntax_error(SyntaxErrorKind::IncompleteComment),
            }
        }
    }

    fn check_literal(&self, literal: &str) -> Result<(), ReaderError> {
        let end = self.pos + literal.len();
        if !self.input.as_bytes()[self.pos..].starts_with(literal.as_bytes()) {
            return self.syntax_error(SyntaxErrorKind::InvalidLiteral);
        }
        // Make sure there are no misleading chars directly afterwards, e.g. "truey"
        match self.input.as_bytes().get(end) {
            Some(&byte) if !is_value_separator(byte) => {
                self.syntax_error(SyntaxErrorKind::InvalidLiteral)
            }
            _ => Ok(()),
        }
    }

    fn peek_internal(&mut self) -> Result<PeekedValue, ReaderError> {
        if let Some(peeked) = self.peeked {
            return Ok(peeked);
        }
        if self.is_behind_top_level() {
            self.peeked = Some(PeekedValue::EndDocument);
            return Ok(PeekedValue::EndDocument);
        }

        let mut byte = match self.skip_whitespace()? {
            None => return self.syntax_error(SyntaxErrorKind::IncompleteDocument),
            Some(byte) => byte,
        };

        let mut comma_pos = None;
        let can_have_comma = !self.is_empty && (self.is_in_array() || self.expects_member_name);

        if byte == b',' {
            if !can_have_comma {
                return self.syntax_error(SyntaxErrorKind::UnexpectedComma);
            }
            comma_pos = Some(self.pos);
            self.pos += 1;

            byte = match self.skip_whitespace()? {
                None => return self.syntax_error(SyntaxErrorKind::IncompleteDocument),
                Some(byte) => byte,
            };
        }

        let peeked = if self.expects_member_name {
            match byte {
                b'}' => PeekedValue::ObjectEnd,
                b'"' => PeekedValue::NameStart,
                _ => return self.syntax_error(SyntaxErrorKind::ExpectingMemberNameOrObjectEnd),
            }
        } else {
            match byte {
                b'[' => PeekedValue::ArrayStart,
                b']' if self.is_in_array() => PeekedValue::ArrayEnd,
                b']' | b'}' => {
                    return self.syntax_error(SyntaxErrorKind::UnexpectedClosingBracket)
                }
                b'{' => PeekedValue::ObjectStart,
                b'"' => PeekedValue::StringStart,
                b'-' | b'0'..=b'9' => PeekedValue::NumberStart,
                b'n' => {
                    self.check_literal("null")?;
                    PeekedValue::Null
                }
                b't' => {
                    self.check_literal("true")?;
                    PeekedValue::BooleanTrue
                }
                b'f' => {
                    self.check_literal("false")?;
                    PeekedValue::BooleanFalse
                }
                // Comma has already been handled above
                b',' => return self.syntax_error(SyntaxErrorKind::UnexpectedComma),
                b':' => return self.syntax_error(SyntaxErrorKind::UnexpectedColon),
                _ => return self.syntax_error(SyntaxErrorKind::MalformedJson),
            }
        };

        if peeked == PeekedValue::ArrayEnd || peeked == PeekedValue::ObjectEnd {
            if let Some(comma_pos) = comma_pos {
                if !self.reader_settings.allow_trailing_comma {
                    // Report location of comma
                    return self
                        .syntax_error_at(SyntaxErrorKind::TrailingCommaNotEnabled, comma_pos);
                }
            }
        } else if can_have_comma && comma_pos.is_none() {
            return self.syntax_error(SyntaxErrorKind::MissingComma);
        }

        self.peeked = Some(peeked);
        Ok(peeked)
    }

    fn unexpected_token<T>(&self, expected: TokenKind, actual: PeekedValue) -> Result<T, ReaderError> {
        Err(ReaderError::UnexpectedToken {
            expected,
            actual: actual.token_kind(),
            location: self.position_at(self.pos, true),
        })
    }

    /// Peeks and verifies that the next token is a value, returning the peeked value
    fn peek_value(&mut self) -> Result<PeekedValue, ReaderError> {
        let peeked = self.peek_internal()?;
        match peeked {
            PeekedValue::NameStart
            | PeekedValue::ObjectEnd
            | PeekedValue::ArrayEnd
            | PeekedValue::EndDocument => Err(ReaderError::ExpectedValue {
                actual: peeked.token_kind(),
                location: self.position_at(self.pos, true),
            }),
            _ => Ok(peeked),
        }
    }
}

// Implementation with value consumption methods
impl JsonTextReader<'_> {
    fn on_value_end(&mut self) {
        self.peeked = None;
        // Update array path
        if self.is_in_array() {
            if let Some(JsonPathPiece::ArrayItem(index)) =
                self.json_path.as_mut().and_then(|path| path.last_mut())
            {
                *index += 1;
            }
        }

        // After value was consumed indicate that object member name is expected next
        if self.is_in_object() {
            self.expects_member_name = true;
        }

        // Enclosing container is not empty since this method call here is processing its child
        self.is_empty = false;
    }

    fn on_container_start(&mut self, value: StackValue) -> Result<(), ReaderError> {
        let max_depth = self.reader_settings.max_nesting_depth;
        if self.stack.len() >= max_depth as usize {
            return Err(ReaderError::MaxNestingDepthExceeded {
                max_depth,
                location: self.position_at(self.pos, true),
            });
        }

        self.peeked = None;
        self.pos += 1;
        self.is_empty = true;
        self.expects_member_name = value == StackValue::Object;
        if let Some(ref mut json_path) = self.json_path {
            json_path.push(match value {
                StackValue::Array => JsonPathPiece::ArrayItem(0),
                // Placeholder until the first member name has been read
                StackValue::Object => JsonPathPiece::ObjectMember(String::new()),
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn on_container_end(&mut self) {
        self.pos += 1;
        self.stack.pop();
        if let Some(ref mut json_path) = self.json_path {
            json_path.pop();
        }
        self.expects_member_name = false;
        self.on_value_end();
    }

    /// Parses the string whose opening quote is at `start`; returns the unescaped
    /// string and the position after the closing quote
    fn parse_string(&self, start: usize) -> Result<(String, usize), ReaderError> {
        let bytes = self.input.as_bytes();
        let mut value = String::new();
        let mut pos = start + 1;
        let mut run_start = pos;

        loop {
            let byte = match bytes.get(pos) {
                None => return self.syntax_error_at(SyntaxErrorKind::UnterminatedString, pos),
                Some(&byte) => byte,
            };
            match byte {
                b'"' => {
                    value.push_str(&self.input[run_start..pos]);
                    return Ok((value, pos + 1));
                }
                b'\\' => {
                    value.push_str(&self.input[run_start..pos]);
                    let escape_pos = pos;
                    let escaped = match bytes.get(pos + 1) {
                        None => {
                            return self.syntax_error_at(SyntaxErrorKind::UnterminatedString, pos)
                        }
                        Some(&escaped) => escaped,
                    };
                    pos += 2;
                    let c = match escaped {
                        b'"' => '"',
                        b'\\' => '\\',
                        b'/' => '/',
                        b'b' => '\u{0008}',
                        b'f' => '\u{000C}',
                        b'n' => '\n',
                        b'r' => '\r',
                        b't' => '\t',
                        b'u' => {
                            let first = self.parse_unicode_escape(pos)?;
                            pos += 4;
                            match first {
                                0xD800..=0xDBFF => {
                                    if !self.input[pos..].starts_with("\\u") {
                                        return self.syntax_error_at(
                                            SyntaxErrorKind::UnpairedSurrogatePairEscapeSequence,
                                            escape_pos,
                                        );
                                    }
                                    let second = self.parse_unicode_escape(pos + 2)?;
                                    if !(0xDC00..=0xDFFF).contains(&second) {
                                        return self.syntax_error_at(
                                            SyntaxErrorKind::UnpairedSurrogatePairEscapeSequence,
                                            escape_pos,
                                        );
                                    }
                                    pos += 6;
                                    let code_point =
                                        0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                                    match char::from_u32(code_point) {
                                        Some(c) => c,
                                        None => {
                                            return self.syntax_error_at(
                                                SyntaxErrorKind::MalformedEscapeSequence,
                                                escape_pos,
                                            )
                                        }
                                    }
                                }
                                0xDC00..=0xDFFF => {
                                    return self.syntax_error_at(
                                        SyntaxErrorKind::UnpairedSurrogatePairEscapeSequence,
                                        escape_pos,
                                    )
                                }
                                _ => match char::from_u32(first) {
                                    Some(c) => c,
                                    None => {
                                        return self.syntax_error_at(
                                            SyntaxErrorKind::MalformedEscapeSequence,
                                            escape_pos,
                                        )
                                    }
                                },
                            }
                        }
                        _ => {
                            return self
                                .syntax_error_at(SyntaxErrorKind::UnknownEscapeSequence, escape_pos)
                        }
                    };
                    value.push(c);
                    run_start = pos;
                }
                0x00..=0x1F => {
                    return self.syntax_error_at(SyntaxErrorKind::NotEscapedControlCharacter, pos)
                }
                _ => pos += 1,
            }
        }
    }

    fn parse_unicode_escape(&self, start: usize) -> Result<u32, ReaderError> {
        let hex = self.input.get(start..start + 4).filter(|hex| {
            hex.bytes().all(|b| b.is_ascii_hexdigit())
        });
        match hex.and_then(|hex| u32::from_str_radix(hex, 16).ok()) {
            Some(value) => Ok(value),
            None => self.syntax_error_at(SyntaxErrorKind::MalformedEscapeSequence, start),
        }
    }

    fn consume_string(&mut self) -> Result<String, ReaderError> {
        let (value, end) = self.parse_string(self.pos)?;
        self.pos = end;
        self.on_value_end();
        Ok(value)
    }

    fn number_end(&self) -> Result<usize, ReaderError> {
        match scan_json_number(self.input.as_bytes(), self.pos) {
            Some(end)
                if self
                    .input
                    .as_bytes()
                    .get(end)
                    .map_or(true, |&b| is_value_separator(b)) =>
            {
                Ok(end)
            }
            _ => self.syntax_error(SyntaxErrorKind::MalformedNumber),
        }
    }

    fn consume_number(&mut self) -> Result<String, ReaderError> {
        let end = self.number_end()?;
        let number = self.input[self.pos..end].to_owned();
        self.pos = end;
        self.on_value_end();
        Ok(number)
    }

    fn consume_literal(&mut self, length: usize) {
        self.pos += length;
        self.on_value_end();
    }

    /// Consumes the peeked scalar value, whichever kind it has
    fn consume_scalar(&mut self, peeked: PeekedValue) -> Result<(), ReaderError> {
        match peeked {
            PeekedValue::StringStart => {
                self.consume_string()?;
            }
            PeekedValue::NumberStart => {
                self.consume_number()?;
            }
            PeekedValue::Null | PeekedValue::BooleanTrue => self.consume_literal(4),
            PeekedValue::BooleanFalse => self.consume_literal(5),
            _ => unreachable!("not a scalar value: {peeked:?}"),
        }
        Ok(())
    }
}

impl JsonReader for JsonTextReader<'_> {
    fn peek(&mut self) -> Result<TokenKind, ReaderError> {
        Ok(self.peek_internal()?.token_kind())
    }

    fn begin_object(&mut self) -> Result<(), ReaderError> {
        match self.peek_internal()? {
            PeekedValue::ObjectStart => self.on_container_start(StackValue::Object),
            peeked => self.unexpected_token(TokenKind::BeginObject, peeked),
        }
    }

    fn end_object(&mut self) -> Result<(), ReaderError> {
        match self.peek_internal()? {
            PeekedValue::ObjectEnd => {
                self.on_container_end();
                Ok(())
            }
            peeked => self.unexpected_token(TokenKind::EndObject, peeked),
        }
    }

    fn begin_array(&mut self) -> Result<(), ReaderError> {
        match self.peek_internal()? {
            PeekedValue::ArrayStart => self.on_container_start(StackValue::Array),
            peeked => self.unexpected_token(TokenKind::BeginArray, peeked),
        }
    }

    fn end_array(&mut self) -> Result<(), ReaderError> {
        match self.peek_internal()? {
            PeekedValue::ArrayEnd => {
                self.on_container_end();
                Ok(())
            }
            peeked => self.unexpected_token(TokenKind::EndArray, peeked),
        }
    }

    fn next_name(&mut self) -> Result<String, ReaderError> {
        match self.peek_internal()? {
            PeekedValue::NameStart => {}
            peeked => return self.unexpected_token(TokenKind::Name, peeked),
        }
        let (name, end) = self.parse_string(self.pos)?;
        self.pos = end;
        match self.skip_whitespace()? {
            Some(b':') => self.pos += 1,
            _ => return self.syntax_error(SyntaxErrorKind::MissingColon),
        }

        self.peeked = None;
        self.expects_member_name = false;
        if let Some(JsonPathPiece::ObjectMember(path_name)) =
            self.json_path.as_mut().and_then(|path| path.last_mut())
        {
            path_name.clone_from(&name);
        }
        Ok(name)
    }

    fn next_string(&mut self) -> Result<String, ReaderError> {
        match self.peek_internal()? {
            PeekedValue::StringStart => self.consume_string(),
            PeekedValue::NumberStart => self.consume_number(),
            peeked => self.unexpected_token(TokenKind::String, peeked),
        }
    }

    fn next_bool(&mut self) -> Result<bool, ReaderError> {
        match self.peek_internal()? {
            PeekedValue::BooleanTrue => {
                self.consume_literal(4);
                Ok(true)
            }
            PeekedValue::BooleanFalse => {
                self.consume_literal(5);
                Ok(false)
            }
            PeekedValue::StringStart if self.reader_settings.lenient => {
                let (value, end) = self.parse_string(self.pos)?;
                let value = match value.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => return self.unexpected_token(TokenKind::Boolean, PeekedValue::StringStart),
                };
                self.pos = end;
                self.on_value_end();
                Ok(value)
            }
            peeked => self.unexpected_token(TokenKind::Boolean, peeked),
        }
    }

    fn next_number_str(&mut self) -> Result<String, ReaderError> {
        match self.peek_internal()? {
            PeekedValue::NumberStart => self.consume_number(),
            PeekedValue::StringStart if self.reader_settings.lenient => {
                let (value, end) = self.parse_string(self.pos)?;
                let number = value.trim();
                if !is_valid_json_number(number) {
                    return Err(ReaderError::InvalidNumber {
                        number: value,
                        location: self.position_at(self.pos, true),
                    });
                }
                let number = number.to_owned();
                self.pos = end;
                self.on_value_end();
                Ok(number)
            }
            peeked => self.unexpected_token(TokenKind::Number, peeked),
        }
    }

    fn next_null(&mut self) -> Result<(), ReaderError> {
        match self.peek_internal()? {
            PeekedValue::Null => {
                self.consume_literal(4);
                Ok(())
            }
            peeked => self.unexpected_token(TokenKind::Null, peeked),
        }
    }

    fn next_raw_value(&mut self) -> Result<String, ReaderError> {
        self.peek_value()?;
        let start = self.pos;
        self.skip_value()?;
        // `pos` is directly behind the last consumed token
        Ok(self.input[start..self.pos].to_owned())
    }

    fn skip_value(&mut self) -> Result<(), ReaderError> {
        // Iterative to avoid deep recursion for deeply nested values
        let mut depth = 0_u32;
        loop {
            let peeked = if depth == 0 {
                self.peek_value()?
            } else {
                self.peek_internal()?
            };
            match peeked {
                PeekedValue::ArrayStart => {
                    self.on_container_start(StackValue::Array)?;
                    depth += 1;
                }
                PeekedValue::ObjectStart => {
                    self.on_container_start(StackValue::Object)?;
                    depth += 1;
                }
                PeekedValue::ArrayEnd | PeekedValue::ObjectEnd => {
                    self.on_container_end();
                    depth -= 1;
                }
                PeekedValue::NameStart => {
                    self.next_name()?;
                }
                PeekedValue::EndDocument => {
                    unreachable!("end of document cannot be reached while inside a value")
                }
                scalar => self.consume_scalar(scalar)?,
            }

            if depth == 0 && peeked != PeekedValue::NameStart {
                return Ok(());
            }
        }
    }

    fn is_lenient(&self) -> bool {
        self.reader_settings.lenient
    }

    fn current_position(&self, include_path: bool) -> JsonPosition {
        self.position_at(self.pos, include_path)
    }
}
