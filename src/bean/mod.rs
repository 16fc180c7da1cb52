//! Codecs of beans: structs written as JSON objects with one member per property
//!
//! A bean codec is assembled once from property bindings, each consisting of the member name,
//! the codec of the property value and an accessor. [`BeanSerializer`] writes the properties
//! in binding order; [`BeanDeserializer`] accepts the members in any order.
//!
//! Two binding strategies are supported for deserialization:
//! - setter-based: the bean type implements [`Default`] and every property has a setter
//!   `Fn(&mut T, V)`, see [`BeanDeserializer::new`]
//! - constructor-based: properties are collected into a builder type which is finally
//!   converted to the immutable bean, see [`BeanDeserializer::with_constructor`]
//!
//! # Examples
//! ```
//! # use std::sync::Arc;
//! # use beanson::bean::{BeanDeserializer, BeanSerializer};
//! # use beanson::codec::{scalar::{NumberDeserializer, NumberSerializer}, SharedDeserializer, SharedSerializer};
//! # use beanson::mapper::ObjectMapper;
//! #[derive(Default, PartialEq, Debug)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let number: SharedSerializer<i32> = Arc::new(NumberSerializer);
//! let serializer = BeanSerializer::<Point>::new("Point")
//!     .property("x", number.clone(), |p: &Point| &p.x)
//!     .property("y", number, |p: &Point| &p.y);
//!
//! let number: SharedDeserializer<i32> = Arc::new(NumberDeserializer);
//! let deserializer = BeanDeserializer::<Point>::new("Point")
//!     .property("x", number.clone(), |p: &mut Point, v| p.x = v)
//!     .property("y", number, |p: &mut Point, v| p.y = v);
//!
//! let mapper = ObjectMapper::<Point>::new("Point", Arc::new(serializer), Arc::new(deserializer));
//! let json = mapper.write(&Point { x: 1, y: 2 })?;
//! assert_eq!(r#"{"x":1,"y":2}"#, json);
//! assert_eq!(Point { x: 1, y: 2 }, mapper.read(r#"{"y": 2, "x": 1}"#)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    collections::{HashMap, HashSet},
    fmt::{Debug, Formatter},
    marker::PhantomData,
};

use tracing::debug;

use crate::{
    codec::{
        DeserializerParameters, Include, JsonDeserializer, JsonSerializer, SerializerParameters,
        SharedDeserializer, SharedSerializer,
    },
    context::{DeserializationContext, ObjectId, SerializationContext},
    error::{DeserializationError, SerializationError},
    reader::{JsonPosition, JsonReader, JsonTextReader},
    writer::JsonWriter,
};

pub mod identity;
pub mod subtype;

use self::identity::{read_object_id, write_id_member, IdentityInfo};

/// A member read before the bean codec was known
#[derive(Clone, Debug)]
pub struct BufferedProperty {
    /// Member name
    pub name: String,
    /// Source text of the member value
    pub raw_value: String,
    /// Position of the member value within the document
    pub location: JsonPosition,
}

/// Members read before the bean codec was known, in document order
///
/// They are replayed into the bean codec once it has been resolved.
pub type BufferedProperties = Vec<BufferedProperty>;

trait PropertySerializer<T: ?Sized>: Send + Sync {
    fn write(
        &self,
        writer: &mut dyn JsonWriter,
        bean: &T,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), SerializationError>;
}

struct BoundSerializerProperty<T: ?Sized, V: ?Sized + 'static, G> {
    name: String,
    codec: SharedSerializer<V>,
    params: SerializerParameters,
    getter: G,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized, V: ?Sized + 'static, G: Fn(&T) -> &V + Send + Sync> PropertySerializer<T>
    for BoundSerializerProperty<T, V, G>
{
    fn write(
        &self,
        writer: &mut dyn JsonWriter,
        bean: &T,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), SerializationError> {
        let value = (self.getter)(bean);
        let include = self.params.include;
        if include == Include::NonEmpty && self.codec.is_empty(value) {
            return Ok(());
        }
        if self.codec.is_null(value) && (include != Include::Always || !ctx.settings().serialize_nulls) {
            return Ok(());
        }

        writer.name(&self.name)?;
        self.codec.serialize(writer, value, ctx, &self.params)
    }
}

/// Serializer of a bean, writing its properties in binding order
pub struct BeanSerializer<T: ?Sized> {
    name: String,
    properties: Vec<Box<dyn PropertySerializer<T>>>,
}

impl<T: ?Sized + 'static> BeanSerializer<T> {
    /// Creates a serializer without properties; `name` is used in error messages
    pub fn new(name: impl Into<String>) -> Self {
        BeanSerializer {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Binds a property
    pub fn property<V: ?Sized + 'static>(
        self,
        name: impl Into<String>,
        codec: SharedSerializer<V>,
        getter: impl Fn(&T) -> &V + Send + Sync + 'static,
    ) -> Self {
        self.property_with(name, codec, SerializerParameters::default(), getter)
    }

    /// Binds a property with call-site parameters, for example [`Include::NonEmpty`]
    pub fn property_with<V: ?Sized + 'static>(
        mut self,
        name: impl Into<String>,
        codec: SharedSerializer<V>,
        params: SerializerParameters,
        getter: impl Fn(&T) -> &V + Send + Sync + 'static,
    ) -> Self {
        self.properties.push(Box::new(BoundSerializerProperty {
            name: name.into(),
            codec,
            params,
            getter,
            _marker: PhantomData,
        }));
        self
    }

    /// Name of the bean
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes the members of `value` into an object which has already been started
    pub fn write_members(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), SerializationError> {
        for property in &self.properties {
            property.write(writer, value, ctx)?;
        }
        Ok(())
    }
}

/// Object-safe view of a serializer which writes values as bean objects
///
/// Used by the [identity](identity) layer, which adds the id member to the object.
pub trait BeanSerializerCore<T: ?Sized>: Send + Sync {
    /// Name of the bean, or of the polymorphic base type
    fn bean_name(&self) -> &str;

    /// Writes `value` as object; if `identity` is given, its id member is written before
    /// the bean properties
    fn write_object(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        identity: Option<(&IdentityInfo, &ObjectId)>,
    ) -> Result<(), SerializationError>;
}

impl<T: ?Sized + 'static> BeanSerializerCore<T> for BeanSerializer<T> {
    fn bean_name(&self) -> &str {
        &self.name
    }

    fn write_object(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        identity: Option<(&IdentityInfo, &ObjectId)>,
    ) -> Result<(), SerializationError> {
        writer.begin_object()?;
        if let Some((info, id)) = identity {
            write_id_member(writer, info, id)?;
        }
        self.write_members(writer, value, ctx)?;
        Ok(writer.end_object()?)
    }
}

impl<T: ?Sized + 'static> JsonSerializer<T> for BeanSerializer<T> {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        self.write_object(writer, value, ctx, None)
    }
}

impl<T: ?Sized> Debug for BeanSerializer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanSerializer")
            .field("name", &self.name)
            .field("properties", &self.properties.len())
            .finish()
    }
}

trait PropertyDeserializer<B>: Send + Sync {
    fn read(
        &self,
        builder: &mut B,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
    ) -> Result<(), DeserializationError>;
}

struct BoundDeserializerProperty<B, V: 'static, S> {
    codec: SharedDeserializer<V>,
    params: DeserializerParameters,
    setter: S,
    _marker: PhantomData<fn(&mut B)>,
}

impl<B, V: 'static, S: Fn(&mut B, V) + Send + Sync> PropertyDeserializer<B>
    for BoundDeserializerProperty<B, V, S>
{
    fn read(
        &self,
        builder: &mut B,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
    ) -> Result<(), DeserializationError> {
        let value = self.codec.deserialize(reader, ctx, &self.params)?;
        (self.setter)(builder, value);
        Ok(())
    }
}

/// Object-safe view of a deserializer which reads values from bean objects
///
/// Used by the [subtype](subtype) and [identity](identity) layers, which read the start of
/// the bean object themselves.
pub trait BeanDeserializerCore<T>: Send + Sync {
    /// Name of the bean, or of the polymorphic base type
    fn bean_name(&self) -> &str;

    /// Reads the members of a bean object whose `begin_object` has already been consumed,
    /// up to and including its `end_object`
    ///
    /// `buffered` members are processed first, as if they had preceded the remaining members.
    /// If `identity` is given, its id property is consumed and returned instead of being
    /// treated as bean property.
    fn read_body(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        buffered: BufferedProperties,
        identity: Option<&IdentityInfo>,
    ) -> Result<(T, Option<ObjectId>), DeserializationError>;
}

/// Deserializer of a bean
///
/// `B` is the type into which properties are collected; for setter-based beans it is the bean
/// type itself.
pub struct BeanDeserializer<T, B = T> {
    name: String,
    properties: HashMap<String, Box<dyn PropertyDeserializer<B>>>,
    ignored_properties: HashSet<String>,
    ignore_unknown: Option<bool>,
    finish: Box<dyn Fn(B) -> Result<T, String> + Send + Sync>,
}

impl<T: Default + 'static> BeanDeserializer<T> {
    /// Creates a deserializer of a setter-based bean
    pub fn new(name: impl Into<String>) -> Self {
        BeanDeserializer::with_constructor(name, Ok)
    }
}

impl<T: 'static, B: Default + 'static> BeanDeserializer<T, B> {
    /// Creates a deserializer of a constructor-based bean
    ///
    /// Properties are set on a default value of the builder `B`, which is converted with
    /// `finish` after the end of the object. An `Err` returned by `finish` fails with
    /// [`DeserializationError::Bean`].
    pub fn with_constructor(
        name: impl Into<String>,
        finish: impl Fn(B) -> Result<T, String> + Send + Sync + 'static,
    ) -> Self {
        BeanDeserializer {
            name: name.into(),
            properties: HashMap::new(),
            ignored_properties: HashSet::new(),
            ignore_unknown: None,
            finish: Box::new(finish),
        }
    }

    /// Binds a property
    pub fn property<V: 'static>(
        self,
        name: impl Into<String>,
        codec: SharedDeserializer<V>,
        setter: impl Fn(&mut B, V) + Send + Sync + 'static,
    ) -> Self {
        self.property_with(name, codec, DeserializerParameters::default(), setter)
    }

    /// Binds a property with call-site parameters, for example a date pattern
    pub fn property_with<V: 'static>(
        mut self,
        name: impl Into<String>,
        codec: SharedDeserializer<V>,
        params: DeserializerParameters,
        setter: impl Fn(&mut B, V) + Send + Sync + 'static,
    ) -> Self {
        self.properties.insert(
            name.into(),
            Box::new(BoundDeserializerProperty {
                codec,
                params,
                setter,
                _marker: PhantomData,
            }),
        );
        self
    }

    /// Adds a member name which is always skipped
    pub fn ignored_property(mut self, name: impl Into<String>) -> Self {
        self.ignored_properties.insert(name.into());
        self
    }

    /// Sets whether unknown members of this bean are skipped, overriding
    /// [`fail_on_unknown_properties`](crate::context::DeserializerSettings::fail_on_unknown_properties)
    pub fn ignore_unknown(mut self, ignore_unknown: bool) -> Self {
        self.ignore_unknown = Some(ignore_unknown);
        self
    }

    #[allow(clippy::too_many_arguments)]
    fn read_member(
        &self,
        name: &str,
        reader: &mut dyn JsonReader,
        builder: &mut B,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        identity: Option<&IdentityInfo>,
        id: &mut Option<ObjectId>,
    ) -> Result<(), DeserializationError> {
        if let Some(identity) = identity.filter(|identity| identity.property == name) {
            let object_id = read_object_id(reader)?;
            if !ctx.begin_identity(&identity.scope, object_id.clone()) {
                return Err(DeserializationError::Bean {
                    bean: self.name.clone(),
                    message: format!("duplicate object id '{object_id}'"),
                    location: reader.current_position(true),
                });
            }
            *id = Some(object_id);
            return Ok(());
        }

        if let Some(property) = self.properties.get(name) {
            return property.read(builder, reader, ctx);
        }
        if self.ignored_properties.contains(name) {
            return Ok(reader.skip_value()?);
        }

        let ignore_unknown = params
            .ignore_unknown
            .or(self.ignore_unknown)
            .unwrap_or(!ctx.settings().fail_on_unknown_properties);
        if ignore_unknown {
            debug!(bean = %self.name, property = name, "skipping unknown property");
            Ok(reader.skip_value()?)
        } else {
            Err(DeserializationError::UnknownProperty {
                name: name.to_owned(),
                bean: self.name.clone(),
                location: reader.current_position(true),
            })
        }
    }
}

impl<T: 'static, B: Default + 'static> BeanDeserializerCore<T> for BeanDeserializer<T, B> {
    fn bean_name(&self) -> &str {
        &self.name
    }

    fn read_body(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        buffered: BufferedProperties,
        identity: Option<&IdentityInfo>,
    ) -> Result<(T, Option<ObjectId>), DeserializationError> {
        let mut builder = B::default();
        let mut id = None;

        for property in buffered {
            let mut replay_reader = JsonTextReader::new_embedded(
                &property.raw_value,
                ctx.settings().reader_settings.clone(),
                property.location,
            );
            self.read_member(&property.name, &mut replay_reader, &mut builder, ctx, params, identity, &mut id)?;
        }
        while reader.has_next()? {
            let name = reader.next_name()?;
            self.read_member(&name, reader, &mut builder, ctx, params, identity, &mut id)?;
        }
        reader.end_object()?;

        let value = (self.finish)(builder).map_err(|message| DeserializationError::Bean {
            bean: self.name.clone(),
            message,
            location: reader.current_position(true),
        })?;
        Ok((value, id))
    }
}

impl<T: 'static, B: Default + 'static> JsonDeserializer<T> for BeanDeserializer<T, B> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<T, DeserializationError> {
        reader.begin_object()?;
        self.read_body(reader, ctx, params, Vec::new(), None)
            .map(|(value, _)| value)
    }
}

impl<T, B> Debug for BeanDeserializer<T, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut properties: Vec<&String> = self.properties.keys().collect();
        properties.sort();
        f.debug_struct("BeanDeserializer")
            .field("name", &self.name)
            .field("properties", &properties)
            .field("ignored_properties", &self.ignored_properties)
            .field("ignore_unknown", &self.ignore_unknown)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        codec::{
            collection::{SequenceDeserializer, SequenceSerializer},
            scalar::{NumberDeserializer, NumberSerializer, StringCodec},
            testing::{read, read_with, write, write_with},
            OptionDeserializer, OptionSerializer,
        },
        context::{DeserializerSettings, SerializerSettings},
    };

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[derive(Default, PartialEq, Debug)]
    struct Person {
        name: String,
        age: Option<u32>,
        tags: Vec<String>,
    }

    fn person_serializer(tags_params: SerializerParameters) -> BeanSerializer<Person> {
        let string: SharedSerializer<String> = Arc::new(StringCodec);
        let age: SharedSerializer<Option<u32>> = Arc::new(OptionSerializer::<u32>::new(Arc::new(NumberSerializer)));
        let tags: SharedSerializer<Vec<String>> = Arc::new(SequenceSerializer::<String, Vec<String>>::new(string.clone()));
        BeanSerializer::new("Person")
            .property("name", string, |p: &Person| &p.name)
            .property("age", age, |p: &Person| &p.age)
            .property_with("tags", tags, tags_params, |p: &Person| &p.tags)
    }

    fn person_deserializer() -> BeanDeserializer<Person> {
        let string: SharedDeserializer<String> = Arc::new(StringCodec);
        let age: SharedDeserializer<Option<u32>> =
            Arc::new(OptionDeserializer::<u32>::new(Arc::new(NumberDeserializer)));
        let tags: SharedDeserializer<Vec<String>> = Arc::new(SequenceDeserializer::<String, Vec<String>>::new(string.clone()));
        BeanDeserializer::new("Person")
            .property("name", string, |p: &mut Person, v| p.name = v)
            .property("age", age, |p: &mut Person, v| p.age = v)
            .property("tags", tags, |p: &mut Person, v| p.tags = v)
            .ignored_property("internal")
    }

    #[test]
    fn setter_bean() -> TestResult {
        let person = Person {
            name: "Ann".to_owned(),
            age: Some(31),
            tags: vec!["a".to_owned()],
        };
        let json = write(&person_serializer(SerializerParameters::default()), &person)?;
        assert_eq!(r#"{"name":"Ann","age":31,"tags":["a"]}"#, json);

        let deserializer = person_deserializer();
        assert_eq!(person, read(&deserializer, &json)?);
        // Member order does not matter, missing members keep their default
        assert_eq!(
            Person {
                name: "Ann".to_owned(),
                ..Default::default()
            },
            read(&deserializer, r#"{"internal": [1, {}], "name": "Ann"}"#)?
        );
        Ok(())
    }

    #[test]
    fn include_and_nulls() -> TestResult {
        let person = Person::default();
        let non_empty = SerializerParameters {
            include: Include::NonEmpty,
            ..Default::default()
        };
        let serializer = person_serializer(non_empty);
        assert_eq!(r#"{"name":"","age":null}"#, write(&serializer, &person)?);

        let settings = SerializerSettings {
            serialize_nulls: false,
            ..Default::default()
        };
        assert_eq!(
            r#"{"name":""}"#,
            write_with(&serializer, &person, &settings, &SerializerParameters::DEFAULT)?
        );

        // Empty collections are cancelled by the collection serializer itself
        let settings = SerializerSettings {
            write_empty_json_arrays: false,
            ..Default::default()
        };
        let serializer = person_serializer(SerializerParameters::default());
        assert_eq!(
            r#"{"name":"","age":null}"#,
            write_with(&serializer, &person, &settings, &SerializerParameters::DEFAULT)?
        );
        assert_eq!(r#"{"name":"","age":null,"tags":[]}"#, write(&serializer, &person)?);
        Ok(())
    }

    #[test]
    fn unknown_properties() -> TestResult {
        let json = r#"{"name": "Ann", "nickname": {"a": [1]}, "age": 3}"#;
        match read(&person_deserializer(), json) {
            Err(DeserializationError::UnknownProperty { name, bean, .. }) => {
                assert_eq!("nickname", name);
                assert_eq!("Person", bean);
            }
            r => panic!("unexpected result: {r:?}"),
        }

        let expected = Person {
            name: "Ann".to_owned(),
            age: Some(3),
            ..Default::default()
        };
        let settings = DeserializerSettings {
            fail_on_unknown_properties: false,
            ..Default::default()
        };
        assert_eq!(
            expected,
            read_with(&person_deserializer(), json, &settings, &DeserializerParameters::DEFAULT)?
        );
        assert_eq!(expected, read(&person_deserializer().ignore_unknown(true), json)?);

        // Call-site parameters take precedence over the bean
        let params = DeserializerParameters {
            ignore_unknown: Some(false),
            ..Default::default()
        };
        assert!(matches!(
            read_with(&person_deserializer().ignore_unknown(true), json, &settings, &params),
            Err(DeserializationError::UnknownProperty { .. })
        ));
        Ok(())
    }

    #[derive(Default)]
    struct RangeBuilder {
        start: i64,
        end: i64,
    }

    #[derive(PartialEq, Debug)]
    struct Range {
        start: i64,
        end: i64,
    }

    fn range_deserializer() -> BeanDeserializer<Range, RangeBuilder> {
        let number: SharedDeserializer<i64> = Arc::new(NumberDeserializer);
        BeanDeserializer::with_constructor("Range", |b: RangeBuilder| {
            if b.start > b.end {
                return Err(format!("start {} is greater than end {}", b.start, b.end));
            }
            Ok(Range {
                start: b.start,
                end: b.end,
            })
        })
        .property("start", number.clone(), |b: &mut RangeBuilder, v| b.start = v)
        .property("end", number, |b: &mut RangeBuilder, v| b.end = v)
    }

    #[test]
    fn constructor_bean() -> TestResult {
        let deserializer = range_deserializer();
        assert_eq!(Range { start: 1, end: 5 }, read(&deserializer, r#"{"end": 5, "start": 1}"#)?);
        match read(&deserializer, r#"{"start": 7, "end": 5}"#) {
            Err(e @ DeserializationError::Bean { .. }) => {
                assert!(
                    e.to_string()
                        .starts_with("cannot create Range: start 7 is greater than end 5 at "),
                    "unexpected message: {e}"
                );
                assert_eq!(Some(22), e.location().data_pos);
            }
            r => panic!("unexpected result: {r:?}"),
        }
        Ok(())
    }

    #[test]
    fn replay_buffered_properties() -> TestResult {
        let deserializer = person_deserializer();
        let settings = DeserializerSettings::default();
        let mut ctx = DeserializationContext::new(&settings);
        let mut json_reader = JsonTextReader::new(r#"{"age": 4}"#);
        json_reader.begin_object()?;
        let buffered = vec![
            BufferedProperty {
                name: "name".to_owned(),
                raw_value: "\"Bo\"".to_owned(),
                location: JsonPosition::unknown(),
            },
            BufferedProperty {
                name: "tags".to_owned(),
                raw_value: r#"["x", "y"]"#.to_owned(),
                location: JsonPosition::unknown(),
            },
        ];
        let (person, id) = deserializer.read_body(
            &mut json_reader,
            &mut ctx,
            &DeserializerParameters::DEFAULT,
            buffered,
            None,
        )?;
        json_reader.consume_trailing_whitespace()?;
        assert_eq!(None, id);
        assert_eq!(
            Person {
                name: "Bo".to_owned(),
                age: Some(4),
                tags: vec!["x".to_owned(), "y".to_owned()],
            },
            person
        );
        assert_eq!("Person", deserializer.bean_name());
        Ok(())
    }
}
