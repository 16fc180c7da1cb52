//! Codecs of map keys
//!
//! JSON member names are always strings, so key codecs convert between a typed key and a
//! plain string instead of reading and writing tokens. They are used by the
//! [map codecs](super::map) for the key side of each entry.

use std::{marker::PhantomData, str::FromStr};

use duplicate::duplicate_item;
use uuid::Uuid;

use super::{date::DateType, *};

/// Converts a typed map key to a member name
pub trait KeySerializer<K: ?Sized>: Send + Sync {
    /// Converts `key` to the member name
    fn serialize(&self, key: &K, ctx: &SerializationContext<'_>) -> String;
}

/// Converts a member name to a typed map key
pub trait KeyDeserializer<K>: Send + Sync {
    /// Converts `key`, the member name which was just read by `reader`
    ///
    /// Fails with [`DeserializationError::KeyFormat`] if the name does not represent a `K`.
    fn deserialize(
        &self,
        key: &str,
        reader: &dyn JsonReader,
        ctx: &DeserializationContext<'_>,
    ) -> Result<K, DeserializationError>;
}

/// Shared key serializer of `K`
pub type SharedKeySerializer<K> = Arc<dyn KeySerializer<K>>;
/// Shared key deserializer of `K`
pub type SharedKeyDeserializer<K> = Arc<dyn KeyDeserializer<K>>;

fn key_error(
    reader: &dyn JsonReader,
    key: &str,
    target: &'static str,
    message: impl Into<String>,
) -> DeserializationError {
    DeserializationError::KeyFormat {
        key: key.to_owned(),
        target,
        message: message.into(),
        location: reader.current_position(true),
    }
}

/// Key codec of `String`
#[derive(Clone, Copy, Default, Debug)]
pub struct StringKeyCodec;

impl KeySerializer<String> for StringKeyCodec {
    fn serialize(&self, key: &String, _ctx: &SerializationContext<'_>) -> String {
        key.clone()
    }
}

impl KeyDeserializer<String> for StringKeyCodec {
    fn deserialize(
        &self,
        key: &str,
        _reader: &dyn JsonReader,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<String, DeserializationError> {
        Ok(key.to_owned())
    }
}

/// Key codec of `bool`, accepting only `true` and `false`
#[derive(Clone, Copy, Default, Debug)]
pub struct BoolKeyCodec;

impl KeySerializer<bool> for BoolKeyCodec {
    fn serialize(&self, key: &bool, _ctx: &SerializationContext<'_>) -> String {
        key.to_string()
    }
}

impl KeyDeserializer<bool> for BoolKeyCodec {
    fn deserialize(
        &self,
        key: &str,
        reader: &dyn JsonReader,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<bool, DeserializationError> {
        match key {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(key_error(reader, key, "bool", "expected 'true' or 'false'")),
        }
    }
}

/// Key codec of the integer and floating point types
#[derive(Clone, Copy, Default, Debug)]
pub struct NumberKeyCodec;

#[duplicate_item(
    number_type;
    [i8]; [i16]; [i32]; [i64]; [i128]; [isize];
    [u8]; [u16]; [u32]; [u64]; [u128]; [usize];
    [f32]; [f64];
)]
impl KeySerializer<number_type> for NumberKeyCodec {
    fn serialize(&self, key: &number_type, _ctx: &SerializationContext<'_>) -> String {
        key.to_string()
    }
}

#[duplicate_item(
    number_type;
    [i8]; [i16]; [i32]; [i64]; [i128]; [isize];
    [u8]; [u16]; [u32]; [u64]; [u128]; [usize];
    [f32]; [f64];
)]
impl KeyDeserializer<number_type> for NumberKeyCodec {
    fn deserialize(
        &self,
        key: &str,
        reader: &dyn JsonReader,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<number_type, DeserializationError> {
        key.parse::<number_type>()
            .map_err(|e| key_error(reader, key, stringify!(number_type), e.to_string()))
    }
}

/// Key codec of `char`, the member name must consist of exactly one character
#[derive(Clone, Copy, Default, Debug)]
pub struct CharKeyCodec;

impl KeySerializer<char> for CharKeyCodec {
    fn serialize(&self, key: &char, _ctx: &SerializationContext<'_>) -> String {
        key.to_string()
    }
}

impl KeyDeserializer<char> for CharKeyCodec {
    fn deserialize(
        &self,
        key: &str,
        reader: &dyn JsonReader,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<char, DeserializationError> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(key_error(reader, key, "char", "expected exactly one character")),
        }
    }
}

/// Key codec of enums, using the variant names
///
/// See [`EnumCodec`](super::scalar::EnumCodec) for the value counterpart.
pub struct EnumKeyCodec<E> {
    _marker: PhantomData<fn(E) -> E>,
}

impl<E> EnumKeyCodec<E> {
    /// Creates the key codec
    pub fn new() -> Self {
        EnumKeyCodec {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for EnumKeyCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: AsRef<str>> KeySerializer<E> for EnumKeyCodec<E> {
    fn serialize(&self, key: &E, _ctx: &SerializationContext<'_>) -> String {
        key.as_ref().to_owned()
    }
}

impl<E: FromStr> KeyDeserializer<E> for EnumKeyCodec<E> {
    fn deserialize(
        &self,
        key: &str,
        reader: &dyn JsonReader,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<E, DeserializationError> {
        key.parse()
            .map_err(|_| key_error(reader, key, std::any::type_name::<E>(), "no variant with this name"))
    }
}

/// Key codec of `Uuid`, in hyphenated form
#[derive(Clone, Copy, Default, Debug)]
pub struct UuidKeyCodec;

impl KeySerializer<Uuid> for UuidKeyCodec {
    fn serialize(&self, key: &Uuid, _ctx: &SerializationContext<'_>) -> String {
        key.hyphenated().to_string()
    }
}

impl KeyDeserializer<Uuid> for UuidKeyCodec {
    fn deserialize(
        &self,
        key: &str,
        reader: &dyn JsonReader,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<Uuid, DeserializationError> {
        Uuid::parse_str(key).map_err(|e| key_error(reader, key, "Uuid", e.to_string()))
    }
}

/// Key codec of all [`DateType`] implementations
///
/// Writes epoch milliseconds if
/// [`write_date_keys_as_timestamps`](crate::context::SerializerSettings::write_date_keys_as_timestamps)
/// is enabled, otherwise the ISO-8601 form. Both forms are read.
#[derive(Clone, Copy, Default, Debug)]
pub struct DateKeyCodec;

impl<D: DateType> KeySerializer<D> for DateKeyCodec {
    fn serialize(&self, key: &D, ctx: &SerializationContext<'_>) -> String {
        if ctx.settings().write_date_keys_as_timestamps {
            key.to_millis().to_string()
        } else {
            key.to_iso_string()
        }
    }
}

impl<D: DateType> KeyDeserializer<D> for DateKeyCodec {
    fn deserialize(
        &self,
        key: &str,
        reader: &dyn JsonReader,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<D, DeserializationError> {
        if let Ok(millis) = key.parse::<i64>() {
            return D::from_millis(millis)
                .ok_or_else(|| key_error(reader, key, D::NAME, "not a valid timestamp"));
        }
        D::parse_iso(key).map_err(|e| key_error(reader, key, D::NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};

    use super::*;
    use crate::{
        context::{DeserializerSettings, SerializerSettings},
        reader::JsonTextReader,
    };

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn to_key<K>(codec: &dyn KeySerializer<K>, key: &K) -> String {
        let settings = SerializerSettings::default();
        codec.serialize(key, &SerializationContext::new(&settings))
    }

    fn from_key<K>(codec: &dyn KeyDeserializer<K>, key: &str) -> Result<K, DeserializationError> {
        let settings = DeserializerSettings::default();
        let ctx = DeserializationContext::new(&settings);
        codec.deserialize(key, &JsonTextReader::new("{}"), &ctx)
    }

    #[derive(PartialEq, Debug, strum::AsRefStr, strum::EnumString)]
    enum Color {
        Red,
        Green,
    }

    #[test]
    fn scalar_keys() -> TestResult {
        assert_eq!("text", to_key(&StringKeyCodec, &"text".to_owned()));
        assert_eq!("text", from_key::<String>(&StringKeyCodec, "text")?);

        assert_eq!("true", to_key(&BoolKeyCodec, &true));
        assert_eq!(false, from_key(&BoolKeyCodec, "false")?);
        assert!(matches!(
            from_key(&BoolKeyCodec, "yes"),
            Err(DeserializationError::KeyFormat { target: "bool", .. })
        ));

        assert_eq!("-12", to_key::<i32>(&NumberKeyCodec, &-12));
        assert_eq!(-12, from_key::<i32>(&NumberKeyCodec, "-12")?);
        assert_eq!(1.5, from_key::<f64>(&NumberKeyCodec, "1.5")?);
        assert!(matches!(
            from_key::<u8>(&NumberKeyCodec, "300"),
            Err(DeserializationError::KeyFormat { target: "u8", .. })
        ));

        assert_eq!('x', from_key(&CharKeyCodec, "x")?);
        assert!(from_key(&CharKeyCodec, "xy").is_err());
        assert!(from_key(&CharKeyCodec, "").is_err());
        Ok(())
    }

    #[test]
    fn enum_and_uuid_keys() -> TestResult {
        let codec = EnumKeyCodec::<Color>::new();
        assert_eq!("Green", to_key(&codec, &Color::Green));
        assert_eq!(Color::Red, from_key(&codec, "Red")?);
        match from_key(&codec, "Blue") {
            Err(DeserializationError::KeyFormat { key, message, .. }) => {
                assert_eq!("Blue", key);
                assert_eq!("no variant with this name", message);
            }
            r => panic!("unexpected result: {r:?}"),
        }

        let uuid = Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0);
        let key = to_key(&UuidKeyCodec, &uuid);
        assert_eq!("12345678-9abc-def0-1234-56789abcdef0", key);
        assert_eq!(uuid, from_key(&UuidKeyCodec, &key)?);
        Ok(())
    }

    #[test]
    fn date_keys() -> TestResult {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).ok_or("invalid")?;
        assert_eq!("2024-02-29", to_key(&DateKeyCodec, &date));

        let settings = SerializerSettings {
            write_date_keys_as_timestamps: true,
            ..Default::default()
        };
        let ctx = SerializationContext::new(&settings);
        assert_eq!("1709164800000", KeySerializer::<NaiveDate>::serialize(&DateKeyCodec, &date, &ctx));

        assert_eq!(date, from_key::<NaiveDate>(&DateKeyCodec, "2024-02-29")?);
        assert_eq!(date, from_key::<NaiveDate>(&DateKeyCodec, "1709164800000")?);

        let date_time = DateTime::from_timestamp_millis(1_000).ok_or("invalid")?;
        assert_eq!("1970-01-01T00:00:01.000Z", to_key(&DateKeyCodec, &date_time));
        assert_eq!(date_time, from_key::<DateTime<Utc>>(&DateKeyCodec, "1000")?);
        assert!(matches!(
            from_key::<NaiveDate>(&DateKeyCodec, "someday"),
            Err(DeserializationError::KeyFormat { target: "NaiveDate", .. })
        ));
        Ok(())
    }
}
