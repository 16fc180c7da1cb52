//! Codecs of scalar values: booleans, numbers, characters, strings, enums, UUIDs and raw JSON
//!
//! All scalar codecs are stateless unit-like structs, so a single instance can be shared by
//! every property of the type.

use std::{marker::PhantomData, str::FromStr};

use duplicate::duplicate_item;
use uuid::Uuid;

use super::*;
use crate::json_number::is_valid_json_number;

/// Handles a `null` read into a scalar type which cannot represent it
///
/// Returns `Some(default)` if the next value is `null` and
/// [`null_as_default`](crate::context::DeserializerSettings::null_as_default) is enabled,
/// `None` if the next value is not `null`.
pub(crate) fn read_null_as_default<T: Default>(
    reader: &mut dyn JsonReader,
    ctx: &DeserializationContext<'_>,
    target: &'static str,
) -> Result<Option<T>, DeserializationError> {
    if reader.peek()? != TokenKind::Null {
        return Ok(None);
    }
    if !ctx.settings().null_as_default {
        return Err(DeserializationError::value(
            reader,
            target,
            "null",
            "null is not allowed for a non-optional value",
        ));
    }
    reader.next_null()?;
    Ok(Some(T::default()))
}

/// Reads a number, or in lenient mode also a string containing a number
pub(crate) fn read_number_str(
    reader: &mut dyn JsonReader,
    params: &DeserializerParameters,
    target: &'static str,
) -> Result<String, DeserializationError> {
    if params.lenient == Some(true) && reader.peek()? == TokenKind::String {
        let value = reader.next_string()?;
        let number = value.trim();
        if !is_valid_json_number(number) {
            return Err(DeserializationError::value(
                reader,
                target,
                format!("\"{value}\""),
                "string does not contain a number",
            ));
        }
        return Ok(number.to_owned());
    }
    if params.lenient == Some(false) && reader.peek()? == TokenKind::String {
        return Err(DeserializationError::value(
            reader,
            target,
            "string",
            "expected a number",
        ));
    }
    Ok(reader.next_number_str()?)
}

/// Codec of `bool`
///
/// Besides `true` and `false`, in lenient mode also the strings `"true"` and `"false"` are read.
#[derive(Clone, Copy, Default, Debug)]
pub struct BoolCodec;

impl JsonSerializer<bool> for BoolCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &bool,
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        Ok(writer.bool_value(*value)?)
    }
}

impl JsonDeserializer<bool> for BoolCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<bool, DeserializationError> {
        if let Some(value) = read_null_as_default(reader, ctx, "bool")? {
            return Ok(value);
        }
        if reader.peek()? == TokenKind::String && is_lenient(reader, params) {
            let value = reader.next_string()?;
            return match value.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(DeserializationError::value(
                    reader,
                    "bool",
                    format!("\"{value}\""),
                    "expected \"true\" or \"false\"",
                )),
            };
        }
        Ok(reader.next_bool()?)
    }
}

/// Codec of all integer and floating point types
///
/// Zero counts as empty value. NaN and Infinity fail to serialize unless
/// [`write_non_finite_as_string`](crate::context::SerializerSettings::write_non_finite_as_string)
/// is enabled; the strings `"NaN"`, `"Infinity"` and `"-Infinity"` are always read back.
#[derive(Clone, Copy, Default, Debug)]
pub struct NumberSerializer;

/// Deserializer counterpart of [`NumberSerializer`]
#[derive(Clone, Copy, Default, Debug)]
pub struct NumberDeserializer;

// Use `duplicate` crate to avoid repeating code for all supported types, see https://stackoverflow.com/a/61467564
#[duplicate_item(
    number_type write_method json_type;
    [i8] [integer_value] [i128];
    [i16] [integer_value] [i128];
    [i32] [integer_value] [i128];
    [i64] [integer_value] [i128];
    [i128] [integer_value] [i128];
    [isize] [integer_value] [i128];
    [u8] [unsigned_value] [u128];
    [u16] [unsigned_value] [u128];
    [u32] [unsigned_value] [u128];
    [u64] [unsigned_value] [u128];
    [u128] [unsigned_value] [u128];
    [usize] [unsigned_value] [u128];
)]
impl JsonSerializer<number_type> for NumberSerializer {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &number_type,
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        #[allow(clippy::unnecessary_cast)] // for i128 -> i128 and u128 -> u128
        let value = *value as json_type;
        Ok(writer.write_method(value)?)
    }

    fn is_empty(&self, value: &number_type) -> bool {
        *value == 0
    }
}

#[duplicate_item(
    number_type;
    [i8]; [i16]; [i32]; [i64]; [i128]; [isize];
    [u8]; [u16]; [u32]; [u64]; [u128]; [usize];
)]
impl JsonDeserializer<number_type> for NumberDeserializer {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<number_type, DeserializationError> {
        let target = stringify!(number_type);
        if let Some(value) = read_null_as_default(reader, ctx, target)? {
            return Ok(value);
        }
        let number = read_number_str(reader, params, target)?;
        number
            .parse::<number_type>()
            .map_err(|e| DeserializationError::value(&*reader, target, number.clone(), e.to_string()))
    }
}

fn write_non_finite(
    writer: &mut dyn JsonWriter,
    value: f64,
    ctx: &SerializationContext<'_>,
) -> Result<(), SerializationError> {
    if !ctx.settings().write_non_finite_as_string {
        // Fails with `NonFiniteNumber`
        return Ok(writer.float_value(value)?);
    }
    let string = if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    };
    Ok(writer.string_value(string)?)
}

impl JsonSerializer<f64> for NumberSerializer {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &f64,
        ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        if value.is_finite() {
            Ok(writer.float_value(*value)?)
        } else {
            write_non_finite(writer, *value, ctx)
        }
    }

    fn is_empty(&self, value: &f64) -> bool {
        *value == 0.0
    }
}

impl JsonSerializer<f32> for NumberSerializer {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &f32,
        ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        if value.is_finite() {
            // Use the `f32` representation, widening to `f64` would add spurious digits
            Ok(writer.number_value_from_string(&value.to_string())?)
        } else {
            write_non_finite(writer, f64::from(*value), ctx)
        }
    }

    fn is_empty(&self, value: &f32) -> bool {
        *value == 0.0
    }
}

#[duplicate_item(number_type; [f32]; [f64])]
impl JsonDeserializer<number_type> for NumberDeserializer {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<number_type, DeserializationError> {
        let target = stringify!(number_type);
        if let Some(value) = read_null_as_default(reader, ctx, target)? {
            return Ok(value);
        }
        let number = if reader.peek()? == TokenKind::String {
            let value = reader.next_string()?;
            match value.as_str() {
                "NaN" => return Ok(number_type::NAN),
                "Infinity" => return Ok(number_type::INFINITY),
                "-Infinity" => return Ok(number_type::NEG_INFINITY),
                _ if is_lenient(reader, params) && is_valid_json_number(value.trim()) => {
                    value.trim().to_owned()
                }
                _ => {
                    return Err(DeserializationError::value(
                        reader,
                        target,
                        format!("\"{value}\""),
                        "expected a number",
                    ))
                }
            }
        } else {
            reader.next_number_str()?
        };
        number
            .parse::<number_type>()
            .map_err(|e| DeserializationError::value(&*reader, target, number.clone(), e.to_string()))
    }
}

/// Codec of `char`
///
/// Written as a string of one character. Read from such a string, or from a number which
/// is interpreted as Unicode code point.
#[derive(Clone, Copy, Default, Debug)]
pub struct CharCodec;

impl JsonSerializer<char> for CharCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &char,
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        let mut buf = [0_u8; 4];
        Ok(writer.string_value(value.encode_utf8(&mut buf))?)
    }
}

impl CharCodec {
    pub(crate) fn read_char(reader: &mut dyn JsonReader) -> Result<char, DeserializationError> {
        if reader.peek()? == TokenKind::Number {
            let number = reader.next_number_str()?;
            return number
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| {
                    DeserializationError::value(&*reader, "char", number.clone(), "not a valid code point")
                });
        }
        let value = reader.next_string()?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(DeserializationError::value(
                reader,
                "char",
                format!("\"{value}\""),
                "expected exactly one character",
            )),
        }
    }
}

impl JsonDeserializer<char> for CharCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        _params: &DeserializerParameters,
    ) -> Result<char, DeserializationError> {
        if let Some(value) = read_null_as_default(reader, ctx, "char")? {
            return Ok(value);
        }
        CharCodec::read_char(reader)
    }
}

/// Codec of `String`
///
/// The empty string counts as empty value. Numbers and booleans are read as their JSON text.
#[derive(Clone, Copy, Default, Debug)]
pub struct StringCodec;

impl JsonSerializer<String> for StringCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &String,
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        Ok(writer.string_value(value)?)
    }

    fn is_empty(&self, value: &String) -> bool {
        value.is_empty()
    }
}

impl JsonSerializer<str> for StringCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &str,
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        Ok(writer.string_value(value)?)
    }

    fn is_empty(&self, value: &str) -> bool {
        value.is_empty()
    }
}

impl JsonDeserializer<String> for StringCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        _params: &DeserializerParameters,
    ) -> Result<String, DeserializationError> {
        if let Some(value) = read_null_as_default(reader, ctx, "String")? {
            return Ok(value);
        }
        if reader.peek()? == TokenKind::Boolean {
            return Ok(reader.next_bool()?.to_string());
        }
        Ok(reader.next_string()?)
    }
}

/// Codec of `()`, which is always written as `null`
///
/// Any value is accepted and skipped when reading.
#[derive(Clone, Copy, Default, Debug)]
pub struct UnitCodec;

impl JsonSerializer<()> for UnitCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        _value: &(),
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        Ok(writer.null_value()?)
    }

    fn is_null(&self, _value: &()) -> bool {
        true
    }
}

impl JsonDeserializer<()> for UnitCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        _ctx: &mut DeserializationContext<'_>,
        _params: &DeserializerParameters,
    ) -> Result<(), DeserializationError> {
        Ok(reader.skip_value()?)
    }
}

/// Codec of a fieldless enum, written as the name of the variant
///
/// Works with enums deriving `strum::AsRefStr` and `strum::EnumString`:
/// ```
/// # use beanson::codec::scalar::EnumCodec;
/// #[derive(strum::AsRefStr, strum::EnumString)]
/// enum Color {
///     Red,
///     Green,
/// }
///
/// let _codec = EnumCodec::<Color>::new();
/// ```
pub struct EnumCodec<E> {
    _marker: PhantomData<fn(E) -> E>,
}

impl<E> EnumCodec<E> {
    /// Creates the codec
    pub fn new() -> Self {
        EnumCodec {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for EnumCodec<E> {
    fn default() -> Self {
        EnumCodec::new()
    }
}

impl<E: AsRef<str>> JsonSerializer<E> for EnumCodec<E> {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &E,
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        Ok(writer.string_value(value.as_ref())?)
    }
}

impl<E: FromStr> JsonDeserializer<E> for EnumCodec<E> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        _ctx: &mut DeserializationContext<'_>,
        _params: &DeserializerParameters,
    ) -> Result<E, DeserializationError> {
        let name = reader.next_string()?;
        E::from_str(&name).map_err(|_| {
            DeserializationError::value(
                &*reader,
                std::any::type_name::<E>(),
                format!("\"{name}\""),
                "no variant with this name",
            )
        })
    }
}

/// Codec of [`Uuid`], written in hyphenated form
#[derive(Clone, Copy, Default, Debug)]
pub struct UuidCodec;

impl JsonSerializer<Uuid> for UuidCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &Uuid,
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        Ok(writer.string_value(&value.hyphenated().to_string())?)
    }
}

impl JsonDeserializer<Uuid> for UuidCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        _ctx: &mut DeserializationContext<'_>,
        _params: &DeserializerParameters,
    ) -> Result<Uuid, DeserializationError> {
        let value = reader.next_string()?;
        Uuid::parse_str(&value).map_err(|e| {
            DeserializationError::value(&*reader, "Uuid", format!("\"{value}\""), e.to_string())
        })
    }
}

/// An already serialized JSON value which is passed through unchanged
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct RawJson(String);

impl RawJson {
    /// Wraps JSON text
    ///
    /// The text is validated when it is written.
    pub fn new(json: impl Into<String>) -> Self {
        RawJson(json.into())
    }

    /// The JSON text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Codec of [`RawJson`]
#[derive(Clone, Copy, Default, Debug)]
pub struct RawJsonCodec;

impl JsonSerializer<RawJson> for RawJsonCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &RawJson,
        _ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        Ok(writer.raw_value(&value.0)?)
    }

    fn is_null(&self, value: &RawJson) -> bool {
        value.0.trim() == "null"
    }
}

impl JsonDeserializer<RawJson> for RawJsonCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        _ctx: &mut DeserializationContext<'_>,
        _params: &DeserializerParameters,
    ) -> Result<RawJson, DeserializationError> {
        Ok(RawJson(reader.next_raw_value()?))
    }
}
