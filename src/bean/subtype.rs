//! Polymorphic values, whose concrete subtype is identified by a type discriminator
//!
//! The base type is typically an enum with one variant per subtype. Two styles of carrying
//! the discriminator are supported, see [`TypeInclusion`]:
//!
//! - inline: `{"type": "Dog", "name": "Rex"}`, the discriminator is a member of the bean
//!   object itself. The discriminator member may appear anywhere within the object; members
//!   preceding it are buffered and replayed once the subtype is known.
//! - wrapped: `{"Dog": {"name": "Rex"}}`, the value is wrapped in an object with a single
//!   member named after the subtype. Works for any subtype, not only for beans.

use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use tracing::debug;

use super::{
    identity::{write_id_member, IdentityInfo},
    BeanDeserializerCore, BeanSerializer, BeanSerializerCore, BufferedProperties, BufferedProperty,
};
use crate::{
    codec::{
        DeserializerParameters, JsonDeserializer, JsonSerializer, SerializerParameters,
        SharedDeserializer, SharedSerializer,
    },
    context::{DeserializationContext, ObjectId, SerializationContext},
    error::{DeserializationError, SerializationError},
    reader::JsonReader,
    writer::JsonWriter,
};

/// How the type discriminator is carried
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum TypeInclusion {
    /// As member with the given name, next to the bean properties
    Inline(String),
    /// As name of the single member of a wrapper object
    Wrapped,
}

/// Describes how the subtype of a polymorphic base type is carried in JSON
#[derive(Clone, Debug)]
pub struct TypeInfo {
    /// How the type discriminator is carried
    pub inclusion: TypeInclusion,
    /// Discriminator of the subtype used when an inline discriminator is missing
    ///
    /// If `None`, a missing discriminator fails with
    /// [`DeserializationError::MissingTypeDiscriminator`].
    pub default_subtype: Option<String>,
}

impl TypeInfo {
    /// Type info with an inline discriminator member named `property`
    pub fn inline(property: impl Into<String>) -> Self {
        TypeInfo {
            inclusion: TypeInclusion::Inline(property.into()),
            default_subtype: None,
        }
    }

    /// Type info with a wrapper object
    pub fn wrapped() -> Self {
        TypeInfo {
            inclusion: TypeInclusion::Wrapped,
            default_subtype: None,
        }
    }

    /// Sets the subtype used when an inline discriminator is missing
    pub fn with_default_subtype(mut self, discriminator: impl Into<String>) -> Self {
        self.default_subtype = Some(discriminator.into());
        self
    }
}

trait SubtypeWriter<T: ?Sized>: Send + Sync {
    /// Writes `value` if it is an instance of this subtype, otherwise returns `None`
    fn try_write(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        inclusion: &TypeInclusion,
        base: &str,
        identity: Option<(&IdentityInfo, &ObjectId)>,
    ) -> Option<Result<(), SerializationError>>;
}

struct BeanSubtypeWriter<T: ?Sized, S: 'static, P> {
    discriminator: String,
    bean: Arc<BeanSerializer<S>>,
    project: P,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized, S: 'static, P: Fn(&T) -> Option<&S> + Send + Sync> SubtypeWriter<T>
    for BeanSubtypeWriter<T, S, P>
{
    fn try_write(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        inclusion: &TypeInclusion,
        _base: &str,
        identity: Option<(&IdentityInfo, &ObjectId)>,
    ) -> Option<Result<(), SerializationError>> {
        let value = (self.project)(value)?;
        let result = (|| -> Result<(), SerializationError> {
            writer.begin_object()?;
            match inclusion {
                TypeInclusion::Inline(property) => {
                    writer.name(property)?;
                    writer.string_value(&self.discriminator)?;
                    if let Some((info, id)) = identity {
                        write_id_member(writer, info, id)?;
                    }
                    self.bean.write_members(writer, value, ctx)?;
                }
                TypeInclusion::Wrapped => {
                    writer.name(&self.discriminator)?;
                    self.bean.write_object(writer, value, ctx, identity)?;
                }
            }
            Ok(writer.end_object()?)
        })();
        Some(result)
    }
}

struct ValueSubtypeWriter<T: ?Sized, S: 'static, P> {
    discriminator: String,
    codec: SharedSerializer<S>,
    project: P,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized, S: 'static, P: Fn(&T) -> Option<&S> + Send + Sync> SubtypeWriter<T>
    for ValueSubtypeWriter<T, S, P>
{
    fn try_write(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        inclusion: &TypeInclusion,
        base: &str,
        identity: Option<(&IdentityInfo, &ObjectId)>,
    ) -> Option<Result<(), SerializationError>> {
        let value = (self.project)(value)?;
        if let TypeInclusion::Inline(_) = inclusion {
            return Some(Err(SerializationError::UnsupportedInlineTarget {
                discriminator: self.discriminator.clone(),
                base: base.to_owned(),
                location: writer.current_position(),
            }));
        }
        if identity.is_some() {
            // There is no object to carry the id member
            return Some(Err(SerializationError::custom::<S>(
                &*writer,
                format!(
                    "cannot write object id of subtype '{}' of '{base}', it is not a bean",
                    self.discriminator
                ),
            )));
        }
        let result = (|| -> Result<(), SerializationError> {
            writer.begin_object()?;
            writer.name(&self.discriminator)?;
            self.codec
                .serialize(writer, value, ctx, &SerializerParameters::DEFAULT)?;
            Ok(writer.end_object()?)
        })();
        Some(result)
    }
}

/// Serializer of a polymorphic base type `T`
///
/// Subtypes are tried in registration order; each has a projection returning the subtype
/// value if the base value is an instance of it.
pub struct SubtypeSerializer<T: ?Sized> {
    base: String,
    type_info: TypeInfo,
    subtypes: Vec<Box<dyn SubtypeWriter<T>>>,
}

impl<T: ?Sized + 'static> SubtypeSerializer<T> {
    /// Creates a serializer without subtypes; `base` is the name of the base type
    pub fn new(base: impl Into<String>, type_info: TypeInfo) -> Self {
        SubtypeSerializer {
            base: base.into(),
            type_info,
            subtypes: Vec::new(),
        }
    }

    /// Registers a bean subtype, usable with both inclusion styles
    pub fn bean_subtype<S: 'static>(
        mut self,
        discriminator: impl Into<String>,
        bean: Arc<BeanSerializer<S>>,
        project: impl Fn(&T) -> Option<&S> + Send + Sync + 'static,
    ) -> Self {
        self.subtypes.push(Box::new(BeanSubtypeWriter {
            discriminator: discriminator.into(),
            bean,
            project,
            _marker: PhantomData,
        }));
        self
    }

    /// Registers a subtype which is not a bean, usable only with [`TypeInclusion::Wrapped`]
    pub fn value_subtype<S: 'static>(
        mut self,
        discriminator: impl Into<String>,
        codec: SharedSerializer<S>,
        project: impl Fn(&T) -> Option<&S> + Send + Sync + 'static,
    ) -> Self {
        self.subtypes.push(Box::new(ValueSubtypeWriter {
            discriminator: discriminator.into(),
            codec,
            project,
            _marker: PhantomData,
        }));
        self
    }
}

impl<T: ?Sized + 'static> BeanSerializerCore<T> for SubtypeSerializer<T> {
    fn bean_name(&self) -> &str {
        &self.base
    }

    fn write_object(
        &self,
        writer: &mut dyn JsonWriter,
        value: &T,
        ctx: &mut SerializationContext<'_>,
        identity: Option<(&IdentityInfo, &ObjectId)>,
    ) -> Result<(), SerializationError> {
        for subtype in &self.subtypes {
            if let Some(result) = subtype.try_write(
                writer,
                value,
                ctx,
                &self.type_info.inclusion,
                &self.base,
                identity,
            ) {
                return result;
            }
        }
        Err(SerializationError::UnknownSubtype {
            base: self.base.clone(),
            location: writer.current_position(),
        })
    }
}

impl<T: ?Sized + 'static> JsonSerializer<T> for SubtypeSerializer<T> {
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

type ReadResult<T> = Result<(T, Option<ObjectId>), DeserializationError>;

trait SubtypeReader<T>: Send + Sync {
    /// Reads the rest of an object with inline discriminator, the discriminator member
    /// itself has already been consumed
    #[allow(clippy::too_many_arguments)]
    fn read_inline(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        buffered: BufferedProperties,
        identity: Option<&IdentityInfo>,
        base: &str,
    ) -> ReadResult<T>;

    /// Reads the complete value inside a wrapper object
    fn read_value(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        identity: Option<&IdentityInfo>,
    ) -> ReadResult<T>;
}

struct BeanSubtypeReader<T, S: 'static, F> {
    bean: Arc<dyn BeanDeserializerCore<S>>,
    convert: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S: 'static, F: Fn(S) -> T + Send + Sync> SubtypeReader<T> for BeanSubtypeReader<T, S, F> {
    fn read_inline(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        buffered: BufferedProperties,
        identity: Option<&IdentityInfo>,
        _base: &str,
    ) -> ReadResult<T> {
        let (value, id) = self.bean.read_body(reader, ctx, params, buffered, identity)?;
        Ok(((self.convert)(value), id))
    }

    fn read_value(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        identity: Option<&IdentityInfo>,
    ) -> ReadResult<T> {
        reader.begin_object()?;
        self.read_inline(reader, ctx, params, Vec::new(), identity, "")
    }
}

struct ValueSubtypeReader<T, S: 'static, F> {
    discriminator: String,
    codec: SharedDeserializer<S>,
    convert: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S: 'static, F: Fn(S) -> T + Send + Sync> SubtypeReader<T> for ValueSubtypeReader<T, S, F> {
    fn read_inline(
        &self,
        reader: &mut dyn JsonReader,
        _ctx: &mut DeserializationContext<'_>,
        _params: &DeserializerParameters,
        _buffered: BufferedProperties,
        _identity: Option<&IdentityInfo>,
        base: &str,
    ) -> ReadResult<T> {
        Err(DeserializationError::UnsupportedInlineTarget {
            discriminator: self.discriminator.clone(),
            base: base.to_owned(),
            location: reader.current_position(true),
        })
    }

    // Values which are not beans carry no id
    fn read_value(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        _identity: Option<&IdentityInfo>,
    ) -> ReadResult<T> {
        let value = self.codec.deserialize(reader, ctx, params)?;
        Ok(((self.convert)(value), None))
    }
}

/// Deserializer of a polymorphic base type `T`
pub struct SubtypeDeserializer<T> {
    base: String,
    type_info: TypeInfo,
    subtypes: HashMap<String, Box<dyn SubtypeReader<T>>>,
}

impl<T: 'static> SubtypeDeserializer<T> {
    /// Creates a deserializer without subtypes; `base` is the name of the base type
    pub fn new(base: impl Into<String>, type_info: TypeInfo) -> Self {
        SubtypeDeserializer {
            base: base.into(),
            type_info,
            subtypes: HashMap::new(),
        }
    }

    /// Registers a bean subtype, usable with both inclusion styles
    pub fn bean_subtype<S: 'static>(
        mut self,
        discriminator: impl Into<String>,
        bean: Arc<dyn BeanDeserializerCore<S>>,
        convert: impl Fn(S) -> T + Send + Sync + 'static,
    ) -> Self {
        self.subtypes.insert(
            discriminator.into(),
            Box::new(BeanSubtypeReader {
                bean,
                convert,
                _marker: PhantomData,
            }),
        );
        self
    }

    /// Registers a subtype which is not a bean, usable only with [`TypeInclusion::Wrapped`]
    pub fn value_subtype<S: 'static>(
        mut self,
        discriminator: impl Into<String>,
        codec: SharedDeserializer<S>,
        convert: impl Fn(S) -> T + Send + Sync + 'static,
    ) -> Self {
        let discriminator = discriminator.into();
        self.subtypes.insert(
            discriminator.clone(),
            Box::new(ValueSubtypeReader {
                discriminator,
                codec,
                convert,
                _marker: PhantomData,
            }),
        );
        self
    }

    fn subtype(
        &self,
        discriminator: &str,
        reader: &dyn JsonReader,
    ) -> Result<&dyn SubtypeReader<T>, DeserializationError> {
        self.subtypes
            .get(discriminator)
            .map(Box::as_ref)
            .ok_or_else(|| DeserializationError::UnknownSubtype {
                discriminator: discriminator.to_owned(),
                base: self.base.clone(),
                location: reader.current_position(true),
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn read_inline(
        &self,
        property: &str,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        mut buffered: BufferedProperties,
        identity: Option<&IdentityInfo>,
    ) -> ReadResult<T> {
        while reader.has_next()? {
            let name = reader.next_name()?;
            if name == property {
                let discriminator = reader.next_string()?;
                let subtype = self.subtype(&discriminator, reader)?;
                return subtype.read_inline(reader, ctx, params, buffered, identity, &self.base);
            }
            // Position of the value itself, behind any whitespace
            reader.peek()?;
            let location = reader.current_position(true);
            let raw_value = reader.next_raw_value()?;
            buffered.push(BufferedProperty {
                name,
                raw_value,
                location,
            });
        }

        match &self.type_info.default_subtype {
            Some(default_subtype) => {
                debug!(
                    base = %self.base,
                    default_subtype = %default_subtype,
                    "type discriminator missing, using default subtype"
                );
                let subtype = self.subtype(default_subtype, reader)?;
                subtype.read_inline(reader, ctx, params, buffered, identity, &self.base)
            }
            None => Err(DeserializationError::MissingTypeDiscriminator {
                property: property.to_owned(),
                base: self.base.clone(),
                location: reader.current_position(true),
            }),
        }
    }

    fn read_wrapped(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        identity: Option<&IdentityInfo>,
    ) -> ReadResult<T> {
        let discriminator = reader.next_name()?;
        let result = self
            .subtype(&discriminator, reader)?
            .read_value(reader, ctx, params, identity)?;
        reader.end_object()?;
        Ok(result)
    }
}

impl<T: 'static> BeanDeserializerCore<T> for SubtypeDeserializer<T> {
    fn bean_name(&self) -> &str {
        &self.base
    }

    /// Reads the body of the inline object or of the wrapper object
    ///
    /// `buffered` members only apply to [`TypeInclusion::Inline`].
    fn read_body(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
        buffered: BufferedProperties,
        identity: Option<&IdentityInfo>,
    ) -> ReadResult<T> {
        match &self.type_info.inclusion {
            TypeInclusion::Inline(property) => {
                self.read_inline(property, reader, ctx, params, buffered, identity)
            }
            TypeInclusion::Wrapped => self.read_wrapped(reader, ctx, params, identity),
        }
    }
}

impl<T: 'static> JsonDeserializer<T> for SubtypeDeserializer<T> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bean::BeanDeserializer,
        codec::{
            scalar::{NumberDeserializer, NumberSerializer, StringCodec},
            testing::{read, write},
        },
    };

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[derive(Default, PartialEq, Debug)]
    struct Dog {
        a: u32,
        b: u32,
    }

    #[derive(Default, PartialEq, Debug)]
    struct Cat {
        lives: u32,
    }

    #[derive(PartialEq, Debug)]
    enum Pet {
        Dog(Dog),
        Cat(Cat),
        Rock(String),
    }

    fn serializer(type_info: TypeInfo) -> SubtypeSerializer<Pet> {
        let number: SharedSerializer<u32> = Arc::new(NumberSerializer);
        let dog = BeanSerializer::<Dog>::new("Dog")
            .property("a", number.clone(), |d: &Dog| &d.a)
            .property("b", number.clone(), |d: &Dog| &d.b);
        let cat = BeanSerializer::<Cat>::new("Cat").property("lives", number, |c: &Cat| &c.lives);
        let string: SharedSerializer<String> = Arc::new(StringCodec);
        SubtypeSerializer::new("Pet", type_info)
            .bean_subtype("Dog", Arc::new(dog), |p: &Pet| match p {
                Pet::Dog(d) => Some(d),
                _ => None,
            })
            .bean_subtype("Cat", Arc::new(cat), |p: &Pet| match p {
                Pet::Cat(c) => Some(c),
                _ => None,
            })
            .value_subtype("Rock", string, |p: &Pet| match p {
                Pet::Rock(r) => Some(r),
                _ => None,
            })
    }

    fn deserializer(type_info: TypeInfo) -> SubtypeDeserializer<Pet> {
        let number: SharedDeserializer<u32> = Arc::new(NumberDeserializer);
        let dog = BeanDeserializer::<Dog>::new("Dog")
            .property("a", number.clone(), |d: &mut Dog, v| d.a = v)
            .property("b", number.clone(), |d: &mut Dog, v| d.b = v);
        let cat = BeanDeserializer::<Cat>::new("Cat").property("lives", number, |c: &mut Cat, v| c.lives = v);
        let string: SharedDeserializer<String> = Arc::new(StringCodec);
        SubtypeDeserializer::new("Pet", type_info)
            .bean_subtype::<Dog>("Dog", Arc::new(dog), Pet::Dog)
            .bean_subtype::<Cat>("Cat", Arc::new(cat), Pet::Cat)
            .value_subtype::<String>("Rock", string, Pet::Rock)
    }

    #[test]
    fn inline_discriminator() -> TestResult {
        let dog = Pet::Dog(Dog { a: 1, b: 2 });
        let json = write(&serializer(TypeInfo::inline("type")), &dog)?;
        assert_eq!(r#"{"type":"Dog","a":1,"b":2}"#, json);

        let deserializer = deserializer(TypeInfo::inline("type"));
        assert_eq!(dog, read(&deserializer, &json)?);
        // Members before the discriminator are buffered and not lost
        assert_eq!(dog, read(&deserializer, r#"{"a":1,"type":"Dog","b":2}"#)?);
        assert_eq!(dog, read(&deserializer, r#"{"a":1,"b":2,"type":"Dog"}"#)?);
        assert_eq!(Pet::Cat(Cat { lives: 7 }), read(&deserializer, r#"{"lives":7,"type":"Cat"}"#)?);
        Ok(())
    }

    #[test]
    fn inline_errors() -> TestResult {
        let deserializer = deserializer(TypeInfo::inline("type"));
        match read(&deserializer, r#"{"a":1,"type":"Parrot"}"#) {
            Err(e @ DeserializationError::UnknownSubtype { .. }) => {
                assert!(e.to_string().contains("'Parrot'"), "unexpected message: {e}");
            }
            r => panic!("unexpected result: {r:?}"),
        }
        assert!(matches!(
            read(&deserializer, r#"{"a":1,"b":2}"#),
            Err(DeserializationError::MissingTypeDiscriminator { .. })
        ));
        assert!(matches!(
            read(&deserializer, r#"{"type":"Rock"}"#),
            Err(DeserializationError::UnsupportedInlineTarget { .. })
        ));

        assert!(matches!(
            write(&serializer(TypeInfo::inline("type")), &Pet::Rock("granite".to_owned())),
            Err(SerializationError::UnsupportedInlineTarget { .. })
        ));

        // Default subtype for a missing discriminator
        let deserializer = self::deserializer(TypeInfo::inline("type").with_default_subtype("Dog"));
        assert_eq!(Pet::Dog(Dog { a: 1, b: 2 }), read(&deserializer, r#"{"a":1,"b":2}"#)?);
        Ok(())
    }

    #[test]
    fn wrapped_discriminator() -> TestResult {
        let serializer = serializer(TypeInfo::wrapped());
        let deserializer = deserializer(TypeInfo::wrapped());

        let cat = Pet::Cat(Cat { lives: 9 });
        let json = write(&serializer, &cat)?;
        assert_eq!(r#"{"Cat":{"lives":9}}"#, json);
        assert_eq!(cat, read(&deserializer, &json)?);

        let rock = Pet::Rock("granite".to_owned());
        let json = write(&serializer, &rock)?;
        assert_eq!(r#"{"Rock":"granite"}"#, json);
        assert_eq!(rock, read(&deserializer, &json)?);

        assert!(matches!(
            read(&deserializer, r#"{"Parrot":{}}"#),
            Err(DeserializationError::UnknownSubtype { .. })
        ));
        assert!(matches!(
            read(&deserializer, r#"{"Cat":{"lives":9},"Dog":{}}"#),
            Err(DeserializationError::Reader(_))
        ));
        Ok(())
    }

    #[test]
    fn identity_of_value_subtype() -> TestResult {
        use crate::bean::identity::{IdGenerator, IdentitySerializer};

        let info = IdentityInfo::new("@id", IdGenerator::IntSequence, "Pet");
        let serializer = IdentitySerializer::<Pet>::new(Arc::new(serializer(TypeInfo::wrapped())), info);

        let cat = Arc::new(Pet::Cat(Cat { lives: 9 }));
        assert_eq!(r#"{"Cat":{"@id":1,"lives":9}}"#, write(&serializer, &cat)?);

        // A plain value has no place for the id
        match write(&serializer, &Arc::new(Pet::Rock("granite".to_owned()))) {
            Err(e @ SerializationError::Custom { .. }) => {
                assert!(e.to_string().contains("'Rock'"), "unexpected message: {e}");
            }
            r => panic!("unexpected result: {r:?}"),
        }
        Ok(())
    }

    #[test]
    fn unregistered_subtype() {
        let serializer = SubtypeSerializer::<Pet>::new("Pet", TypeInfo::wrapped());
        assert!(matches!(
            write(&serializer, &Pet::Cat(Cat::default())),
            Err(SerializationError::UnknownSubtype { .. })
        ));
    }
}
