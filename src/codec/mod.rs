//! Module with the codec traits and all value codecs
//!
//! A codec converts one value of a statically known type between its in-memory representation
//! and the JSON token stream. Codecs are resolved once, shared through [`Arc`] and reused by
//! any number of concurrent top-level calls; they never hold state of a single call. That state
//! lives in the [`SerializationContext`] and [`DeserializationContext`] passed down alongside.
//!
//! [`SerializerParameters`] and [`DeserializerParameters`] are per-call-site overrides, for
//! example the date pattern of one bean property. They are passed next to the codec instead of
//! being stored in it, so one codec instance serves all call sites.

use std::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    sync::{Arc, OnceLock},
};

use crate::{
    context::{DeserializationContext, SerializationContext},
    error::{DeserializationError, SerializationError},
    reader::{JsonReader, TokenKind},
    writer::JsonWriter,
};

pub mod array;
pub mod collection;
pub mod date;
pub mod key;
pub mod map;
pub mod scalar;

/// Converts values of type `T` to JSON tokens
pub trait JsonSerializer<T: ?Sized>: Send + Sync {
    /// Writes exactly one JSON value for `value`
    ///
    /// If the writer has a pending member name the serializer may retract it with
    /// [`JsonWriter::cancel_name`] instead, to omit the member entirely.
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError>;

    /// Whether `value` counts as empty, for [`Include::NonEmpty`]
    fn is_empty(&self, _value: &T) -> bool {
        false
    }

    /// Whether `value` is written as JSON `null`
    fn is_null(&self, _value: &T) -> bool {
        false
    }
}

/// Converts JSON tokens to values of type `T`
pub trait JsonDeserializer<T>: Send + Sync {
    /// Reads exactly one JSON value and converts it
    ///
    /// Must not read past the end of that value.
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<T, DeserializationError>;
}

/// Shared serializer of `T`
pub type SharedSerializer<T> = Arc<dyn JsonSerializer<T>>;
/// Shared deserializer of `T`
pub type SharedDeserializer<T> = Arc<dyn JsonDeserializer<T>>;

/// Which bean members are written
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum Include {
    /// Always write the member; `null` values only if
    /// [`serialize_nulls`](crate::context::SerializerSettings::serialize_nulls) is enabled
    #[default]
    Always,
    /// Omit the member if its value is `null`
    NonNull,
    /// Omit the member if its value is `null` or empty
    NonEmpty,
}

/// Per-call-site options of a serializer
#[derive(Clone, Default, Debug)]
pub struct SerializerParameters {
    /// Pattern for formatting dates, in `chrono` strftime syntax
    pub pattern: Option<String>,
    /// Which bean members are written
    pub include: Include,
}

impl SerializerParameters {
    /// Parameters without any override
    pub const DEFAULT: SerializerParameters = SerializerParameters {
        pattern: None,
        include: Include::Always,
    };
}

/// Per-call-site options of a deserializer
#[derive(Clone, Default, Debug)]
pub struct DeserializerParameters {
    /// Pattern for parsing dates, in `chrono` strftime syntax
    pub pattern: Option<String>,
    /// Whether strings are accepted for numbers and booleans, overriding the reader setting
    pub lenient: Option<bool>,
    /// Whether unknown bean properties are skipped, overriding
    /// [`fail_on_unknown_properties`](crate::context::DeserializerSettings::fail_on_unknown_properties)
    pub ignore_unknown: Option<bool>,
}

impl DeserializerParameters {
    /// Parameters without any override
    pub const DEFAULT: DeserializerParameters = DeserializerParameters {
        pattern: None,
        lenient: None,
        ignore_unknown: None,
    };
}

/// Serializer of `Option<T>`, writing `None` as `null`
pub struct OptionSerializer<T: ?Sized + 'static> {
    inner: SharedSerializer<T>,
}

impl<T: ?Sized + 'static> OptionSerializer<T> {
    /// Creates a serializer writing `Some` values with `inner`
    pub fn new(inner: SharedSerializer<T>) -> Self {
        OptionSerializer { inner }
    }
}

impl<T: 'static> JsonSerializer<Option<T>> for OptionSerializer<T> {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &Option<T>,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        match value {
            Some(value) => self.inner.serialize(writer, value, ctx, params),
            None => {
                // A `null` which is not a member value is always written
                if !ctx.settings().serialize_nulls && writer.cancel_name() {
                    return Ok(());
                }
                Ok(writer.null_value()?)
            }
        }
    }

    fn is_empty(&self, value: &Option<T>) -> bool {
        value.as_ref().map_or(true, |v| self.inner.is_empty(v))
    }

    fn is_null(&self, value: &Option<T>) -> bool {
        value.is_none()
    }
}

/// Deserializer of `Option<T>`, reading `null` as `None`
pub struct OptionDeserializer<T: 'static> {
    inner: SharedDeserializer<T>,
}

impl<T: 'static> OptionDeserializer<T> {
    /// Creates a deserializer reading non-`null` values with `inner`
    pub fn new(inner: SharedDeserializer<T>) -> Self {
        OptionDeserializer { inner }
    }
}

impl<T: 'static> JsonDeserializer<Option<T>> for OptionDeserializer<T> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<Option<T>, DeserializationError> {
        if reader.peek()? == TokenKind::Null {
            reader.next_null()?;
            return Ok(None);
        }
        self.inner.deserialize(reader, ctx, params).map(Some)
    }
}

/// Serializer which constructs its delegate on first use
///
/// Needed for bean types which (indirectly) contain themselves, where the delegate cannot
/// exist yet when the property binding is created.
pub struct LazySerializer<T: ?Sized + 'static> {
    factory: Box<dyn Fn() -> SharedSerializer<T> + Send + Sync>,
    delegate: OnceLock<SharedSerializer<T>>,
}

impl<T: ?Sized + 'static> LazySerializer<T> {
    /// Creates a serializer which calls `factory` on first use
    pub fn new(factory: impl Fn() -> SharedSerializer<T> + Send + Sync + 'static) -> Self {
        LazySerializer {
            factory: Box::new(factory),
            delegate: OnceLock::new(),
        }
    }

    fn delegate(&self) -> &SharedSerializer<T> {
        self.delegate.get_or_init(|| (self.factory)())
    }
}

impl<T: ?Sized + 'static> JsonSerializer<T> for LazySerializer<T> {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        self.delegate().serialize(writer, value, ctx, params)
    }

    fn is_empty(&self, value: &T) -> bool {
        self.delegate().is_empty(value)
    }

    fn is_null(&self, value: &T) -> bool {
        self.delegate().is_null(value)
    }
}

impl<T: ?Sized> Debug for LazySerializer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySerializer")
            .field("initialized", &self.delegate.get().is_some())
            .finish()
    }
}

/// Deserializer which constructs its delegate on first use
pub struct LazyDeserializer<T: 'static> {
    factory: Box<dyn Fn() -> SharedDeserializer<T> + Send + Sync>,
    delegate: OnceLock<SharedDeserializer<T>>,
}

impl<T: 'static> LazyDeserializer<T> {
    /// Creates a deserializer which calls `factory` on first use
    pub fn new(factory: impl Fn() -> SharedDeserializer<T> + Send + Sync + 'static) -> Self {
        LazyDeserializer {
            factory: Box::new(factory),
            delegate: OnceLock::new(),
        }
    }
}

impl<T: 'static> JsonDeserializer<T> for LazyDeserializer<T> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<T, DeserializationError> {
        self.delegate
            .get_or_init(|| (self.factory)())
            .deserialize(reader, ctx, params)
    }
}

/// Serializer which converts the value before delegating
///
/// Used for newtype wrappers and for types which are written in the form of another type.
pub struct MappedSerializer<T: ?Sized, U: ?Sized + 'static, F> {
    inner: SharedSerializer<U>,
    project: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized, U: ?Sized + 'static, F: Fn(&T) -> &U + Send + Sync> MappedSerializer<T, U, F> {
    /// Creates a serializer writing the part selected by `project` with `inner`
    pub fn new(inner: SharedSerializer<U>, project: F) -> Self {
        MappedSerializer {
            inner,
            project,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized, U: ?Sized + 'static, F: Fn(&T) -> &U + Send + Sync> JsonSerializer<T>
    for MappedSerializer<T, U, F>
{
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        self.inner.serialize(writer, (self.project)(value), ctx, params)
    }

    fn is_empty(&self, value: &T) -> bool {
        self.inner.is_empty((self.project)(value))
    }

    fn is_null(&self, value: &T) -> bool {
        self.inner.is_null((self.project)(value))
    }
}

/// Deserializer which converts the value produced by its delegate
pub struct MappedDeserializer<U: 'static, T, F> {
    inner: SharedDeserializer<U>,
    convert: F,
    _marker: PhantomData<fn() -> T>,
}

impl<U: 'static, T, F: Fn(U) -> T + Send + Sync> MappedDeserializer<U, T, F> {
    /// Creates a deserializer reading with `inner` and converting with `convert`
    pub fn new(inner: SharedDeserializer<U>, convert: F) -> Self {
        MappedDeserializer {
            inner,
            convert,
            _marker: PhantomData,
        }
    }
}

impl<U: 'static, T, F: Fn(U) -> T + Send + Sync> JsonDeserializer<T>
    for MappedDeserializer<U, T, F>
{
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<T, DeserializationError> {
        self.inner.deserialize(reader, ctx, params).map(&self.convert)
    }
}

/// Whether strings may be read as numbers and booleans at this call site
pub(crate) fn is_lenient(reader: &dyn JsonReader, params: &DeserializerParameters) -> bool {
    params.lenient.unwrap_or_else(|| reader.is_lenient())
}
