//! In-memory implementation of [`JsonWriter`]

use super::*;
use crate::json_number::is_valid_json_number;
use crate::reader::{json_path::JsonPathPiece, JsonReader, JsonTextReader};

/// Settings to customize the JSON writer behavior
///
/// These settings are used by [`JsonTextWriter::new_custom`]. To avoid repeating the
/// default values for unchanged settings `..Default::default()` can be used:
/// ```
/// # use beanson::writer::WriterSettings;
/// WriterSettings {
///     pretty_print: true,
///     // For all other settings use the default
///     ..Default::default()
/// }
/// # ;
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct WriterSettings {
    /// Whether the JSON output should be pretty printed
    ///
    /// If `true` the JSON output will be pretty printed, i.e. have line breaks
    /// and indentation of two spaces.
    pub pretty_print: bool,

    /// Whether to escape all non-ASCII characters
    ///
    /// If `false` only `"`, `\` and the control characters `0x00` to `0x1F` are escaped.
    /// If `true` additionally all non-ASCII characters are escaped as `\uXXXX`, characters
    /// outside the Basic Multilingual Plane as surrogate pair.
    pub escape_all_non_ascii: bool,
}

impl Default for WriterSettings {
    /// Creates the default JSON writer settings
    ///
    /// - pretty print: false (= compact JSON output)
    /// - escape all non-ASCII: false
    fn default() -> Self {
        WriterSettings {
            pretty_print: false,
            escape_all_non_ascii: false,
        }
    }
}

#[derive(PartialEq, Debug)]
enum StackValue {
    Array,
    Object,
}

/// A JSON writer implementation which writes the document into a `String`
///
/// Once the top-level value is complete, [`finish_document`](Self::finish_document)
/// returns the written JSON text.
#[derive(Debug)]
pub struct JsonTextWriter {
    out: String,
    /// Whether the current array or object is empty, or at top-level whether
    /// a value has been written already
    is_empty: bool,
    expects_member_name: bool,
    /// Name of the member whose value has not been written yet
    pending_name: Option<String>,
    stack: Vec<StackValue>,
    json_path: Vec<JsonPathPiece>,
    indentation_level: u32,

    writer_settings: WriterSettings,
}

impl Default for JsonTextWriter {
    fn default() -> Self {
        JsonTextWriter::new()
    }
}

// Implementation with public constructor methods
impl JsonTextWriter {
    /// Creates a JSON writer with [default settings](WriterSettings::default)
    pub fn new() -> Self {
        JsonTextWriter::new_custom(WriterSettings::default())
    }

    /// Creates a JSON writer with custom settings
    pub fn new_custom(writer_settings: WriterSettings) -> Self {
        JsonTextWriter {
            out: String::new(),
            is_empty: true,
            expects_member_name: false,
            pending_name: None,
            stack: Vec::with_capacity(16),
            json_path: Vec::with_capacity(16),
            indentation_level: 0,
            writer_settings,
        }
    }

    /// Verifies that the JSON document is complete and returns it
    ///
    /// # Panics
    /// Panics when no value has been written yet or when the top-level value is not
    /// finished yet.
    pub fn finish_document(self) -> String {
        if !self.stack.is_empty() {
            panic!("Incorrect writer usage: Cannot finish document when top-level value is not finished");
        }
        if self.is_empty {
            panic!("Incorrect writer usage: Cannot finish document when no value has been written yet");
        }
        self.out
    }

    /// Whether exactly one complete top-level value has been written
    pub fn is_complete(&self) -> bool {
        self.stack.is_empty() && !self.is_empty
    }
}

// Implementation with JSON structure state inspection methods, and general value methods
impl JsonTextWriter {
    fn is_in_array(&self) -> bool {
        self.stack.last() == Some(&StackValue::Array)
    }

    fn is_in_object(&self) -> bool {
        self.stack.last() == Some(&StackValue::Object)
    }

    fn write_indentation(&mut self) {
        for _ in 0..self.indentation_level {
            self.out.push_str("  ");
        }
    }

    fn before_container_element(&mut self) {
        if self.is_empty {
            if self.writer_settings.pretty_print {
                // Convert "[" (respectively "{") to "[\n..."
                self.out.push('\n');
                self.indentation_level += 1;
                self.write_indentation();
            }
        } else if self.writer_settings.pretty_print {
            self.out.push_str(",\n");
            self.write_indentation();
        } else {
            self.out.push(',');
        }
    }

    fn before_value(&mut self) {
        if self.is_in_object() {
            let name = match self.pending_name.take() {
                None => panic!("Incorrect writer usage: Cannot write value when name is expected"),
                Some(name) => name,
            };
            self.before_container_element();
            self.write_string_value(&name);
            self.out
                .push_str(if self.writer_settings.pretty_print { ": " } else { ":" });
            // After this value a name will be expected
            self.expects_member_name = true;
        } else if self.is_in_array() {
            self.before_container_element();
        } else if !self.is_empty {
            panic!("Incorrect writer usage: Cannot write multiple top-level values");
        }
        self.is_empty = false;
    }

    fn on_value_end(&mut self) {
        if self.is_in_array() {
            if let Some(JsonPathPiece::ArrayItem(index)) = self.json_path.last_mut() {
                *index += 1;
            }
        }
    }

    fn on_container_start(&mut self, value: StackValue, bracket: char) {
        self.before_value();
        self.json_path.push(match value {
            StackValue::Array => JsonPathPiece::ArrayItem(0),
            StackValue::Object => JsonPathPiece::ObjectMember(String::new()),
        });
        self.expects_member_name = value == StackValue::Object;
        self.stack.push(value);
        self.is_empty = true;
        self.out.push(bracket);
    }

    fn on_container_end(&mut self, bracket: char) {
        self.stack.pop();
        self.json_path.pop();

        if !self.is_empty && self.writer_settings.pretty_print {
            self.out.push('\n');
            self.indentation_level -= 1;
            self.write_indentation();
        }
        self.out.push(bracket);

        // Enclosing container is not empty since this method call here is processing its child
        self.is_empty = false;
        // If after pop() call above currently in object, then expecting a member name
        self.expects_member_name = self.is_in_object();
        self.on_value_end();
    }

    fn write_scalar(&mut self, json: &str) -> Result<(), WriterError> {
        self.before_value();
        self.out.push_str(json);
        self.on_value_end();
        Ok(())
    }
}

// Implementation with string writing methods
impl JsonTextWriter {
    fn should_escape(&self, c: char) -> bool {
        matches!(c, '"' | '\\')
            // Control characters which must be escaped per JSON specification
            || matches!(c, '\u{0}'..='\u{1F}')
            || (self.writer_settings.escape_all_non_ascii && !c.is_ascii())
    }

    fn write_escaped_char(&mut self, c: char) {
        fn push_unicode_escape(out: &mut String, value: u32) {
            // For convenience `value` is u32, but it is actually u16
            debug_assert!(value <= u16::MAX as u32);
            out.push_str(&format!("\\u{value:04X}"));
        }

        let escape = match c {
            '"' => "\\\"",
            '\\' => "\\\\",
            '\u{0008}' => "\\b",
            '\u{000C}' => "\\f",
            '\n' => "\\n",
            '\r' => "\\r",
            '\t' => "\\t",
            '\0'..='\u{FFFF}' => {
                push_unicode_escape(&mut self.out, c as u32);
                return;
            }
            _ => {
                // Encode as surrogate pair
                let temp = (c as u32) - 0x10000;
                let high = (temp >> 10) + 0xD800;
                let low = (temp & ((1 << 10) - 1)) + 0xDC00;

                push_unicode_escape(&mut self.out, high);
                push_unicode_escape(&mut self.out, low);
                return;
            }
        };
        self.out.push_str(escape);
    }

    fn write_string_value(&mut self, value: &str) {
        self.out.push('"');
        let mut next_to_write_index = 0;

        for (index, char) in value.char_indices() {
            if self.should_escape(char) {
                if index > next_to_write_index {
                    self.out.push_str(&value[next_to_write_index..index]);
                }
                self.write_escaped_char(char);
                next_to_write_index = index + char.len_utf8();
            }
        }
        // Write remaining part
        self.out.push_str(&value[next_to_write_index..]);
        self.out.push('"');
    }
}

impl JsonWriter for JsonTextWriter {
    fn begin_object(&mut self) -> Result<(), WriterError> {
        self.on_container_start(StackValue::Object, '{');
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), WriterError> {
        if !self.is_in_object() {
            panic!("Incorrect writer usage: Cannot end object when not inside object");
        }
        if self.pending_name.is_some() {
            panic!("Incorrect writer usage: Cannot end object when member value is expected");
        }
        self.on_container_end('}');
        Ok(())
    }

    fn begin_array(&mut self) -> Result<(), WriterError> {
        self.on_container_start(StackValue::Array, '[');
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), WriterError> {
        if !self.is_in_array() {
            panic!("Incorrect writer usage: Cannot end array when not inside array");
        }
        self.on_container_end(']');
        Ok(())
    }

    fn name(&mut self, name: &str) -> Result<(), WriterError> {
        if !self.expects_member_name {
            panic!("Incorrect writer usage: Cannot write name when name is not expected");
        }
        if let Some(JsonPathPiece::ObjectMember(path_name)) = self.json_path.last_mut() {
            name.clone_into(path_name);
        }
        self.pending_name = Some(name.to_owned());
        self.expects_member_name = false;
        Ok(())
    }

    fn cancel_name(&mut self) -> bool {
        if self.pending_name.take().is_some() {
            self.expects_member_name = true;
            true
        } else {
            false
        }
    }

    fn has_pending_name(&self) -> bool {
        self.pending_name.is_some()
    }

    fn null_value(&mut self) -> Result<(), WriterError> {
        self.write_scalar("null")
    }

    fn bool_value(&mut self, value: bool) -> Result<(), WriterError> {
        self.write_scalar(if value { "true" } else { "false" })
    }

    fn string_value(&mut self, value: &str) -> Result<(), WriterError> {
        self.before_value();
        self.write_string_value(value);
        self.on_value_end();
        Ok(())
    }

    fn integer_value(&mut self, value: i128) -> Result<(), WriterError> {
        self.write_scalar(&value.to_string())
    }

    fn unsigned_value(&mut self, value: u128) -> Result<(), WriterError> {
        self.write_scalar(&value.to_string())
    }

    fn float_value(&mut self, value: f64) -> Result<(), WriterError> {
        if !value.is_finite() {
            return Err(WriterError::NonFiniteNumber {
                value: value.to_string(),
                location: self.current_position(),
            });
        }
        let string = value.to_string();
        debug_assert!(
            is_valid_json_number(&string),
            "Unexpected: Not a valid JSON number: {string}"
        );
        self.write_scalar(&string)
    }

    fn number_value_from_string(&mut self, value: &str) -> Result<(), WriterError> {
        if !is_valid_json_number(value) {
            return Err(WriterError::InvalidNumber {
                number: value.to_owned(),
                location: self.current_position(),
            });
        }
        self.write_scalar(value)
    }

    fn raw_value(&mut self, value: &str) -> Result<(), WriterError> {
        let value = value.trim();
        let mut json_reader = JsonTextReader::new(value);
        let validation = json_reader
            .skip_value()
            .and_then(|_| json_reader.consume_trailing_whitespace());
        if let Err(source) = validation {
            return Err(WriterError::InvalidRawValue {
                source,
                location: self.current_position(),
            });
        }
        self.write_scalar(value)
    }

    fn current_position(&self) -> JsonPosition {
        JsonPosition {
            path: Some(self.json_path.clone()),
            line_pos: None,
            data_pos: Some(self.out.len() as u64),
        }
    }
}
