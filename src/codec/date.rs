//! Codecs of the `chrono` date and time types
//!
//! Dates are written as epoch milliseconds when
//! [`write_dates_as_timestamps`](crate::context::SerializerSettings::write_dates_as_timestamps)
//! is enabled and no pattern is given, otherwise as string formatted with the pattern of the
//! [`SerializerParameters`] or in ISO-8601 form. They are read from either form.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Timelike, Utc};

use super::*;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A date or time type supported by [`DateCodec`] and the date key codec
///
/// Implemented for `DateTime<Utc>`, `NaiveDate`, `NaiveTime` and `NaiveDateTime`.
pub trait DateType: Sized + Send + Sync + 'static {
    /// Name used in error messages
    const NAME: &'static str;

    /// Milliseconds since the Unix epoch; for `NaiveTime` since midnight
    fn to_millis(&self) -> i64;

    /// Inverse of [`to_millis`](Self::to_millis), `None` if out of range
    fn from_millis(millis: i64) -> Option<Self>;

    /// ISO-8601 representation
    fn to_iso_string(&self) -> String;

    /// Parses the ISO-8601 representation
    fn parse_iso(value: &str) -> Result<Self, chrono::ParseError>;

    /// Parses with a strftime pattern
    fn parse_with_pattern(value: &str, pattern: &str) -> Result<Self, chrono::ParseError>;

    /// Formats with a strftime pattern; `None` if the pattern is invalid
    fn format_with_pattern(&self, pattern: &str) -> Option<String>;
}

fn format_checked(item: impl std::fmt::Display) -> Option<String> {
    // Display of chrono's formatter fails instead of panicking only when written this way
    let mut result = String::new();
    write!(result, "{item}").ok()?;
    Some(result)
}

impl DateType for DateTime<Utc> {
    const NAME: &'static str = "DateTime<Utc>";

    fn to_millis(&self) -> i64 {
        self.timestamp_millis()
    }

    fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis)
    }

    fn to_iso_string(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn parse_iso(value: &str) -> Result<Self, chrono::ParseError> {
        value.parse()
    }

    fn parse_with_pattern(value: &str, pattern: &str) -> Result<Self, chrono::ParseError> {
        // Patterns without time zone are interpreted as UTC
        DateTime::parse_from_str(value, pattern)
            .map(|date| date.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(value, pattern).map(|date| date.and_utc()))
    }

    fn format_with_pattern(&self, pattern: &str) -> Option<String> {
        format_checked(self.format(pattern))
    }
}

impl DateType for NaiveDate {
    const NAME: &'static str = "NaiveDate";

    fn to_millis(&self) -> i64 {
        self.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
    }

    fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|date| date.date_naive())
    }

    fn to_iso_string(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }

    fn parse_iso(value: &str) -> Result<Self, chrono::ParseError> {
        value.parse()
    }

    fn parse_with_pattern(value: &str, pattern: &str) -> Result<Self, chrono::ParseError> {
        NaiveDate::parse_from_str(value, pattern)
    }

    fn format_with_pattern(&self, pattern: &str) -> Option<String> {
        format_checked(self.format(pattern))
    }
}

impl DateType for NaiveTime {
    const NAME: &'static str = "NaiveTime";

    fn to_millis(&self) -> i64 {
        i64::from(self.num_seconds_from_midnight()) * 1000 + i64::from(self.nanosecond() / 1_000_000)
    }

    fn from_millis(millis: i64) -> Option<Self> {
        let millis = millis.rem_euclid(MILLIS_PER_DAY);
        NaiveTime::from_num_seconds_from_midnight_opt(
            (millis / 1000) as u32,
            (millis % 1000) as u32 * 1_000_000,
        )
    }

    fn to_iso_string(&self) -> String {
        self.format("%H:%M:%S%.3f").to_string()
    }

    fn parse_iso(value: &str) -> Result<Self, chrono::ParseError> {
        value.parse()
    }

    fn parse_with_pattern(value: &str, pattern: &str) -> Result<Self, chrono::ParseError> {
        NaiveTime::parse_from_str(value, pattern)
    }

    fn format_with_pattern(&self, pattern: &str) -> Option<String> {
        format_checked(self.format(pattern))
    }
}

impl DateType for NaiveDateTime {
    const NAME: &'static str = "NaiveDateTime";

    fn to_millis(&self) -> i64 {
        self.and_utc().timestamp_millis()
    }

    fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|date| date.naive_utc())
    }

    fn to_iso_string(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }

    fn parse_iso(value: &str) -> Result<Self, chrono::ParseError> {
        value.parse()
    }

    fn parse_with_pattern(value: &str, pattern: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value, pattern)
    }

    fn format_with_pattern(&self, pattern: &str) -> Option<String> {
        format_checked(self.format(pattern))
    }
}

/// Codec of all [`DateType`] implementations
#[derive(Clone, Copy, Default, Debug)]
pub struct DateCodec;

impl<D: DateType> JsonSerializer<D> for DateCodec {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &D,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        if let Some(pattern) = &params.pattern {
            return match value.format_with_pattern(pattern) {
                Some(formatted) => Ok(writer.string_value(&formatted)?),
                None => Err(SerializationError::custom::<D>(
                    writer,
                    format!("invalid date pattern '{pattern}'"),
                )),
            };
        }
        if ctx.settings().write_dates_as_timestamps {
            Ok(writer.integer_value(i128::from(value.to_millis()))?)
        } else {
            Ok(writer.string_value(&value.to_iso_string())?)
        }
    }
}

impl<D: DateType> JsonDeserializer<D> for DateCodec {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        _ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<D, DeserializationError> {
        if reader.peek()? == TokenKind::Number {
            let number = reader.next_number_str()?;
            return number
                .parse::<i64>()
                .ok()
                .and_then(D::from_millis)
                .ok_or_else(|| {
                    DeserializationError::value(&*reader, D::NAME, number.clone(), "not a valid timestamp")
                });
        }

        let value = reader.next_string()?;
        let parsed = match &params.pattern {
            Some(pattern) => D::parse_with_pattern(&value, pattern),
            None => D::parse_iso(&value),
        };
        parsed.map_err(|e| {
            DeserializationError::value(&*reader, D::NAME, format!("\"{value}\""), e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        super::testing::{read, read_with, write, write_with},
        *,
    };
    use crate::context::{DeserializerSettings, SerializerSettings};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn iso_settings() -> SerializerSettings {
        SerializerSettings {
            write_dates_as_timestamps: false,
            ..Default::default()
        }
    }

    #[test]
    fn date_time() -> TestResult {
        let date = DateTime::from_timestamp_millis(1_700_000_000_123).ok_or("invalid")?;
        assert_eq!("1700000000123", write(&DateCodec, &date)?);
        assert_eq!(
            "\"2023-11-14T22:13:20.123Z\"",
            write_with(&DateCodec, &date, &iso_settings(), &SerializerParameters::DEFAULT)?
        );

        assert_eq!(date, read::<DateTime<Utc>>(&DateCodec, "1700000000123")?);
        assert_eq!(date, read::<DateTime<Utc>>(&DateCodec, "\"2023-11-14T22:13:20.123Z\"")?);
        assert_eq!(date, read::<DateTime<Utc>>(&DateCodec, "\"2023-11-14T23:13:20.123+01:00\"")?);
        Ok(())
    }

    #[test]
    fn naive_types() -> TestResult {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).ok_or("invalid")?;
        assert_eq!("1709164800000", write(&DateCodec, &date)?);
        assert_eq!(date, read::<NaiveDate>(&DateCodec, "1709164800000")?);
        assert_eq!(
            "\"2024-02-29\"",
            write_with(&DateCodec, &date, &iso_settings(), &SerializerParameters::DEFAULT)?
        );
        assert_eq!(date, read::<NaiveDate>(&DateCodec, "\"2024-02-29\"")?);

        let time = NaiveTime::from_hms_milli_opt(13, 5, 7, 250).ok_or("invalid")?;
        assert_eq!("47107250", write(&DateCodec, &time)?);
        assert_eq!(time, read::<NaiveTime>(&DateCodec, "47107250")?);
        assert_eq!(
            "\"13:05:07.250\"",
            write_with(&DateCodec, &time, &iso_settings(), &SerializerParameters::DEFAULT)?
        );
        assert_eq!(time, read::<NaiveTime>(&DateCodec, "\"13:05:07.250\"")?);

        let date_time = date.and_time(time);
        let json = write_with(&DateCodec, &date_time, &iso_settings(), &SerializerParameters::DEFAULT)?;
        assert_eq!("\"2024-02-29T13:05:07.250\"", json);
        assert_eq!(date_time, read::<NaiveDateTime>(&DateCodec, &json)?);
        assert_eq!(
            date_time,
            read::<NaiveDateTime>(&DateCodec, &write(&DateCodec, &date_time)?)?
        );
        Ok(())
    }

    #[test]
    fn patterns() -> TestResult {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).ok_or("invalid")?;
        let params = SerializerParameters {
            pattern: Some("%d.%m.%Y".to_owned()),
            ..Default::default()
        };
        // Pattern takes precedence over timestamps
        assert_eq!(
            "\"29.02.2024\"",
            write_with(&DateCodec, &date, &SerializerSettings::default(), &params)?
        );

        let params = DeserializerParameters {
            pattern: Some("%d.%m.%Y".to_owned()),
            ..Default::default()
        };
        let settings = DeserializerSettings::default();
        assert_eq!(date, read_with::<NaiveDate>(&DateCodec, "\"29.02.2024\"", &settings, &params)?);
        assert!(matches!(
            read_with::<NaiveDate>(&DateCodec, "\"2024-02-29\"", &settings, &params),
            Err(DeserializationError::Value { .. })
        ));

        let params = SerializerParameters {
            pattern: Some("%Q".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            write_with(&DateCodec, &date, &SerializerSettings::default(), &params),
            Err(SerializationError::Custom { .. })
        ));
        Ok(())
    }

    #[test]
    fn invalid_dates() {
        assert!(matches!(
            read::<NaiveDate>(&DateCodec, "\"2023-02-29\""),
            Err(DeserializationError::Value { target: "NaiveDate", .. })
        ));
        assert!(matches!(
            read::<DateTime<Utc>>(&DateCodec, &i64::MAX.to_string()),
            Err(DeserializationError::Value { .. })
        ));
    }
}
