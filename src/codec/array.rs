//! Codecs of arrays, including 2-D arrays and the special forms of byte and char arrays
//!
//! One-dimensional arrays are `Box<[T]>` handled by the generic sequence codecs of the
//! [`collection`](super::collection) module. This module adds what is specific to arrays:
//!
//! - primitive arrays, which read `null` elements as the default value of the element type
//! - byte arrays, written as a base64 string
//! - char arrays, written as a single string
//! - 2-D arrays, which are jagged for reference element types, but rectangular for primitive
//!   element types: the row length is taken from the first row, shorter rows are filled up with
//!   default values and longer rows are truncated

use std::iter;

use base64::{engine::general_purpose::STANDARD, Engine};
use duplicate::duplicate_item;

use super::{
    collection::{omit_empty_array, SequenceDeserializer, SequenceSerializer},
    scalar::{CharCodec, NumberDeserializer},
    *,
};

/// Serializer of `Box<[T]>`
pub type ArraySerializer<T> = SequenceSerializer<T, Box<[T]>>;
/// Deserializer of `Box<[T]>`
pub type ArrayDeserializer<T> = SequenceDeserializer<T, Box<[T]>>;

/// Deserializer which reads `null` as the default value of `T`
///
/// Used for elements of primitive arrays.
pub struct NullAsDefaultDeserializer<T: 'static> {
    inner: SharedDeserializer<T>,
}

impl<T: Default + 'static> NullAsDefaultDeserializer<T> {
    /// Wraps `inner`, which reads all non-`null` elements
    pub fn new(inner: SharedDeserializer<T>) -> Self {
        NullAsDefaultDeserializer { inner }
    }
}

impl<T: Default + 'static> JsonDeserializer<T> for NullAsDefaultDeserializer<T> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<T, DeserializationError> {
        if reader.peek()? == TokenKind::Null {
            reader.next_null()?;
            return Ok(T::default());
        }
        self.inner.deserialize(reader, ctx, params)
    }
}

/// Creates the deserializer of an array of a primitive type, such as `Box<[i64]>`
pub fn primitive_array_deserializer<T: Default + 'static>(
    element: SharedDeserializer<T>,
) -> ArrayDeserializer<T> {
    SequenceDeserializer::new(Arc::new(NullAsDefaultDeserializer::new(element)))
}

/// Codec of byte arrays, written as base64 string
///
/// Reads either a base64 string or an array of numbers.
#[derive(Clone, Copy, Default, Debug)]
pub struct ByteArrayCodec;

impl ByteArrayCodec {
    fn read_bytes(
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<Vec<u8>, DeserializationError> {
        if reader.peek()? == TokenKind::BeginArray {
            let mut bytes: Vec<u8> = Vec::new();
            reader.begin_array()?;
            while reader.has_next()? {
                if reader.peek()? == TokenKind::Null {
                    reader.next_null()?;
                    bytes.push(0);
                } else {
                    bytes.push(JsonDeserializer::<u8>::deserialize(&NumberDeserializer, reader, ctx, params)?);
                }
            }
            reader.end_array()?;
            return Ok(bytes);
        }

        let encoded = reader.next_string()?;
        STANDARD.decode(&encoded).map_err(|e| {
            DeserializationError::value(&*reader, "byte array", format!("\"{encoded}\""), e.to_string())
        })
    }
}

#[duplicate_item(bytes_type; [Box<[u8]>]; [Vec<u8>])]
impl JsonSerializer<bytes_type> for ByteArrayCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &bytes_type,
        ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        if value.is_empty() && omit_empty_array(writer, ctx) {
            return Ok(());
        }
        Ok(writer.string_value(&STANDARD.encode(value))?)
    }

    fn is_empty(&self, value: &bytes_type) -> bool {
        value.is_empty()
    }
}

#[duplicate_item(bytes_type; [Box<[u8]>]; [Vec<u8>])]
impl JsonDeserializer<bytes_type> for ByteArrayCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<bytes_type, DeserializationError> {
        ByteArrayCodec::read_bytes(reader, ctx, params).map(Into::into)
    }
}

/// Codec of char arrays, written as one string
///
/// With [`write_char_arrays_as_json_arrays`](crate::context::SerializerSettings::write_char_arrays_as_json_arrays)
/// written as array of single-character strings instead. Both forms are read.
#[derive(Clone, Copy, Default, Debug)]
pub struct CharArrayCodec;

impl JsonSerializer<Box<[char]>> for CharArrayCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &Box<[char]>,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        if value.is_empty() && omit_empty_array(writer, ctx) {
            return Ok(());
        }
        if ctx.settings().write_char_arrays_as_json_arrays {
            writer.begin_array()?;
            for c in value.iter() {
                CharCodec.serialize(writer, c, ctx, params)?;
            }
            Ok(writer.end_array()?)
        } else {
            Ok(writer.string_value(&value.iter().collect::<String>())?)
        }
    }

    fn is_empty(&self, value: &Box<[char]>) -> bool {
        value.is_empty()
    }
}

impl JsonDeserializer<Box<[char]>> for CharArrayCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        _ctx: &mut DeserializationContext<'_>,
        _params: &DeserializerParameters,
    ) -> Result<Box<[char]>, DeserializationError> {
        if reader.peek()? != TokenKind::BeginArray {
            return Ok(reader.next_string()?.chars().collect());
        }

        let mut chars = Vec::new();
        reader.begin_array()?;
        while reader.has_next()? {
            if reader.peek()? == TokenKind::Null {
                reader.next_null()?;
                chars.push('\0');
            } else {
                chars.push(CharCodec::read_char(reader)?);
            }
        }
        reader.end_array()?;
        Ok(chars.into())
    }
}

/// Serializer of 2-D arrays
///
/// Single-element arrays are never unwrapped, neither the outer array nor the rows.
pub struct Array2dSerializer<T: 'static> {
    element: SharedSerializer<T>,
}

impl<T: 'static> Array2dSerializer<T> {
    /// Creates a serializer writing the elements with `element`
    pub fn new(element: SharedSerializer<T>) -> Self {
        Array2dSerializer { element }
    }
}

impl<T: 'static> JsonSerializer<Box<[Box<[T]>]>> for Array2dSerializer<T> {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &Box<[Box<[T]>]>,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        if value.is_empty() && omit_empty_array(writer, ctx) {
            return Ok(());
        }
        writer.begin_array()?;
        for row in value.iter() {
            writer.begin_array()?;
            for element in row.iter() {
                self.element.serialize(writer, element, ctx, params)?;
            }
            writer.end_array()?;
        }
        Ok(writer.end_array()?)
    }

    fn is_empty(&self, value: &Box<[Box<[T]>]>) -> bool {
        value.is_empty()
    }
}

fn read_rows<T>(
    reader: &mut dyn JsonReader,
    ctx: &mut DeserializationContext<'_>,
    params: &DeserializerParameters,
    element: &dyn JsonDeserializer<T>,
) -> Result<Vec<Vec<T>>, DeserializationError> {
    let mut rows = Vec::new();
    reader.begin_array()?;
    while reader.has_next()? {
        let mut row = Vec::new();
        reader.begin_array()?;
        while reader.has_next()? {
            row.push(element.deserialize(reader, ctx, params)?);
        }
        reader.end_array()?;
        rows.push(row);
    }
    reader.end_array()?;
    Ok(rows)
}

/// Deserializer of 2-D arrays of a reference type, each row keeps its own length
pub struct Array2dDeserializer<T: 'static> {
    element: SharedDeserializer<T>,
}

impl<T: 'static> Array2dDeserializer<T> {
    /// Creates a deserializer reading the elements with `element`
    pub fn new(element: SharedDeserializer<T>) -> Self {
        Array2dDeserializer { element }
    }
}

impl<T: 'static> JsonDeserializer<Box<[Box<[T]>]>> for Array2dDeserializer<T> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<Box<[Box<[T]>]>, DeserializationError> {
        let rows = read_rows(reader, ctx, params, self.element.as_ref())?;
        Ok(rows.into_iter().map(Vec::into_boxed_slice).collect())
    }
}

/// Deserializer of rectangular 2-D arrays of a primitive type
///
/// The result has as many rows as the JSON array, each with the length of the first row:
/// `[[1, 2], [3]]` is read as `[[1, 2], [3, 0]]` and `[[1], [2, 3]]` as `[[1], [2]]`.
/// `null` elements are read as the default value.
pub struct PrimitiveArray2dDeserializer<T: 'static> {
    element: NullAsDefaultDeserializer<T>,
}

impl<T: Default + 'static> PrimitiveArray2dDeserializer<T> {
    /// Creates a deserializer reading the elements with `element`
    pub fn new(element: SharedDeserializer<T>) -> Self {
        PrimitiveArray2dDeserializer {
            element: NullAsDefaultDeserializer::new(element),
        }
    }
}

impl<T: Default + 'static> JsonDeserializer<Box<[Box<[T]>]>> for PrimitiveArray2dDeserializer<T> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<Box<[Box<[T]>]>, DeserializationError> {
        let rows = read_rows(reader, ctx, params, &self.element)?;
        let width = rows.first().map_or(0, Vec::len);

        Ok(rows
            .into_iter()
            .map(|mut row| {
                row.truncate(width);
                let missing = width - row.len();
                row.extend(iter::repeat_with(T::default).take(missing));
                row.into_boxed_slice()
            })
            .collect())
    }
}

/// Codec of 2-D byte arrays, written as array of base64 strings
///
/// Each row is a self-contained string, so rows keep their own length.
#[derive(Clone, Copy, Default, Debug)]
pub struct ByteArray2dCodec;

impl JsonSerializer<Box<[Box<[u8]>]>> for ByteArray2dCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &Box<[Box<[u8]>]>,
        ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        if value.is_empty() && omit_empty_array(writer, ctx) {
            return Ok(());
        }
        writer.begin_array()?;
        for row in value.iter() {
            writer.string_value(&STANDARD.encode(row))?;
        }
        Ok(writer.end_array()?)
    }

    fn is_empty(&self, value: &Box<[Box<[u8]>]>) -> bool {
        value.is_empty()
    }
}

impl JsonDeserializer<Box<[Box<[u8]>]>> for ByteArray2dCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<Box<[Box<[u8]>]>, DeserializationError> {
        let mut rows = Vec::new();
        reader.begin_array()?;
        while reader.has_next()? {
            rows.push(ByteArrayCodec::read_bytes(reader, ctx, params)?.into_boxed_slice());
        }
        reader.end_array()?;
        Ok(rows.into())
    }
}
