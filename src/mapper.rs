//! The [`ObjectMapper`], entry point for reading and writing complete JSON documents

use std::fmt::{Debug, Formatter};

use tracing::debug;

use crate::{
    codec::{DeserializerParameters, SerializerParameters, SharedDeserializer, SharedSerializer},
    context::{DeserializationContext, DeserializerSettings, SerializationContext, SerializerSettings},
    error::{DeserializationError, SerializationError},
    reader::{JsonReader, JsonTextReader, TokenKind},
    writer::{JsonTextWriter, JsonWriter},
};

/// Reads and writes JSON documents whose root value is a `T`
///
/// The mapper ties the root codecs to the text reader and writer and handles root wrapping:
/// with [`SerializerSettings::wrap_root_value`] the value is written as the single member of an
/// object, named by the root name of the mapper, and with
/// [`DeserializerSettings::unwrap_root_value`] such a wrapper object is expected when reading.
///
/// A mapper is immutable and can be shared between threads; every call creates its own
/// reader or writer and context.
///
/// # Examples
/// ```
/// # use std::sync::Arc;
/// # use beanson::codec::scalar::StringCodec;
/// # use beanson::context::DeserializerSettings;
/// # use beanson::mapper::ObjectMapper;
/// let mapper = ObjectMapper::<String>::new("name", Arc::new(StringCodec), Arc::new(StringCodec));
/// assert_eq!("\"text\"", mapper.write(&"text".to_owned())?);
///
/// let settings = DeserializerSettings {
///     unwrap_root_value: true,
///     ..Default::default()
/// };
/// assert_eq!("text", mapper.read_with(r#"{"name": "text"}"#, &settings)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ObjectMapper<T: 'static> {
    root_name: String,
    serializer: SharedSerializer<T>,
    deserializer: SharedDeserializer<T>,
    serializer_settings: SerializerSettings,
    deserializer_settings: DeserializerSettings,
}

impl<T: 'static> ObjectMapper<T> {
    /// Creates a mapper with default settings
    pub fn new(
        root_name: impl Into<String>,
        serializer: SharedSerializer<T>,
        deserializer: SharedDeserializer<T>,
    ) -> Self {
        ObjectMapper {
            root_name: root_name.into(),
            serializer,
            deserializer,
            serializer_settings: SerializerSettings::default(),
            deserializer_settings: DeserializerSettings::default(),
        }
    }

    /// Sets the settings used by [`write`](Self::write)
    pub fn with_serializer_settings(mut self, settings: SerializerSettings) -> Self {
        self.serializer_settings = settings;
        self
    }

    /// Sets the settings used by [`read`](Self::read)
    pub fn with_deserializer_settings(mut self, settings: DeserializerSettings) -> Self {
        self.deserializer_settings = settings;
        self
    }

    /// Name of the wrapper member when root wrapping is enabled
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Reads a JSON document with the settings of this mapper
    pub fn read(&self, json: &str) -> Result<T, DeserializationError> {
        self.read_with(json, &self.deserializer_settings)
    }

    /// Reads a JSON document with custom settings
    ///
    /// The document must consist of exactly one value, only surrounded by whitespace.
    pub fn read_with(&self, json: &str, settings: &DeserializerSettings) -> Result<T, DeserializationError> {
        let mut ctx = DeserializationContext::new(settings);
        let mut json_reader = JsonTextReader::new_custom(json, settings.reader_settings.clone());

        let result = match self.read_root(&mut json_reader, &mut ctx) {
            Ok(value) => json_reader
                .consume_trailing_whitespace()
                .map(|_| value)
                .map_err(DeserializationError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            debug!(root = %self.root_name, error = %e, "failed reading JSON document");
        }
        result
    }

    fn root_wrap_error(json_reader: &dyn JsonReader, message: impl Into<String>) -> DeserializationError {
        DeserializationError::RootWrap {
            message: message.into(),
            location: json_reader.current_position(true),
        }
    }

    fn read_root(
        &self,
        json_reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
    ) -> Result<T, DeserializationError> {
        let params = &DeserializerParameters::DEFAULT;
        if !ctx.settings().unwrap_root_value {
            return self.deserializer.deserialize(json_reader, ctx, params);
        }

        if json_reader.peek()? != TokenKind::BeginObject {
            return Err(Self::root_wrap_error(
                json_reader,
                "Unwrap root value is enabled but the input is not a JSON Object",
            ));
        }
        json_reader.begin_object()?;
        if json_reader.peek()? == TokenKind::EndObject {
            return Err(Self::root_wrap_error(
                json_reader,
                "Unwrap root value is enabled but the JSON Object is empty",
            ));
        }
        let name = json_reader.next_name()?;
        if name != self.root_name {
            return Err(Self::root_wrap_error(
                json_reader,
                format!(
                    "Unwrap root value is enabled but the name '{name}' don't match the expected rootName '{}'",
                    self.root_name
                ),
            ));
        }
        let value = self.deserializer.deserialize(json_reader, ctx, params)?;
        json_reader.end_object()?;
        Ok(value)
    }

    /// Writes `value` as JSON document with the settings of this mapper
    pub fn write(&self, value: &T) -> Result<String, SerializationError> {
        self.write_with(value, &self.serializer_settings)
    }

    /// Writes `value` as JSON document with custom settings
    pub fn write_with(&self, value: &T, settings: &SerializerSettings) -> Result<String, SerializationError> {
        let mut ctx = SerializationContext::new(settings);
        let mut json_writer = JsonTextWriter::new_custom(settings.writer_settings.clone());

        let result = self.write_root(&mut json_writer, value, &mut ctx).and_then(|_| {
            if json_writer.is_complete() {
                Ok(())
            } else {
                Err(SerializationError::custom::<T>(
                    &json_writer,
                    "serializer did not write a complete JSON value",
                ))
            }
        });
        match result {
            Ok(()) => Ok(json_writer.finish_document()),
            Err(e) => {
                debug!(root = %self.root_name, error = %e, "failed writing JSON document");
                Err(e)
            }
        }
    }

    fn write_root(
        &self,
        json_writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), SerializationError> {
        let params = &SerializerParameters::DEFAULT;
        if !ctx.settings().wrap_root_value {
            return self.serializer.serialize(json_writer, value, ctx, params);
        }

        json_writer.begin_object()?;
        json_writer.name(&self.root_name)?;
        self.serializer.serialize(json_writer, value, ctx, params)?;
        Ok(json_writer.end_object()?)
    }
}

impl<T: 'static> Debug for ObjectMapper<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectMapper")
            .field("root_name", &self.root_name)
            .field("serializer_settings", &self.serializer_settings)
            .field("deserializer_settings", &self.deserializer_settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::codec::{
        collection::{SequenceDeserializer, SequenceSerializer},
        scalar::{NumberDeserializer, NumberSerializer},
        JsonSerializer,
    };

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn numbers_mapper() -> ObjectMapper<Vec<i64>> {
        ObjectMapper::new(
            "numbers",
            Arc::new(SequenceSerializer::<i64, Vec<i64>>::new(Arc::new(NumberSerializer))),
            Arc::new(SequenceDeserializer::<i64, Vec<i64>>::new(Arc::new(NumberDeserializer))),
        )
    }

    fn unwrap_settings() -> DeserializerSettings {
        DeserializerSettings {
            unwrap_root_value: true,
            ..Default::default()
        }
    }

    #[test]
    fn read_write() -> TestResult {
        let mapper = numbers_mapper();
        assert_eq!("[1,2]", mapper.write(&vec![1, 2])?);
        assert_eq!(vec![1, 2], mapper.read(" [1, 2]\n")?);

        assert!(matches!(
            mapper.read("[1, 2] 3"),
            Err(DeserializationError::Reader(_))
        ));
        Ok(())
    }

    #[test]
    fn root_wrapping() -> TestResult {
        let settings = SerializerSettings {
            wrap_root_value: true,
            ..Default::default()
        };
        let mapper = numbers_mapper()
            .with_serializer_settings(settings)
            .with_deserializer_settings(unwrap_settings());
        let json = mapper.write(&vec![3])?;
        assert_eq!(r#"{"numbers":[3]}"#, json);
        assert_eq!(vec![3], mapper.read(&json)?);
        Ok(())
    }

    #[test]
    fn root_wrap_errors() {
        let mapper = numbers_mapper();
        let settings = unwrap_settings();
        let assert_root_wrap_error = |json: &str, expected_message: &str| match mapper.read_with(json, &settings) {
            Err(DeserializationError::RootWrap { message, .. }) => assert_eq!(expected_message, message),
            r => panic!("unexpected result for {json}: {r:?}"),
        };

        assert_root_wrap_error(
            "[1]",
            "Unwrap root value is enabled but the input is not a JSON Object",
        );
        assert_root_wrap_error(
            "{}",
            "Unwrap root value is enabled but the JSON Object is empty",
        );
        assert_root_wrap_error(
            r#"{"values": [1]}"#,
            "Unwrap root value is enabled but the name 'values' don't match the expected rootName 'numbers'",
        );
        // Additional members after the root value
        assert!(matches!(
            mapper.read_with(r#"{"numbers": [1], "other": 2}"#, &settings),
            Err(DeserializationError::Reader(_))
        ));
    }

    #[test]
    fn incomplete_value() {
        struct NothingSerializer;
        impl JsonSerializer<u8> for NothingSerializer {
            fn serialize(
                &self,
                _writer: &mut dyn JsonWriter,
                _value: &u8,
                _ctx: &mut SerializationContext<'_>,
                _params: &SerializerParameters,
            ) -> Result<(), SerializationError> {
                Ok(())
            }
        }

        let mapper = ObjectMapper::<u8>::new("n", Arc::new(NothingSerializer), Arc::new(NumberDeserializer));
        match mapper.write(&1) {
            Err(SerializationError::Custom { value_type, .. }) => assert_eq!("u8", value_type),
            r => panic!("unexpected result: {r:?}"),
        }
    }
}
