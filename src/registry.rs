//! Registration table mapping types to codec constructors
//!
//! Generated bean codecs do not look up their property codecs by type name at runtime. Instead
//! a [`CodecRegistry`] is filled once at startup, keyed by [`TypeId`], and codecs are obtained
//! from it while wiring up bean codecs and mappers. [`CodecRegistry::new`] already contains the
//! codecs of the base scalar types; see [`CodecRegistry::with_base_types`].

use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use duplicate::duplicate;
use uuid::Uuid;

use crate::{
    codec::{
        date::DateCodec,
        key::{
            BoolKeyCodec, CharKeyCodec, DateKeyCodec, NumberKeyCodec, SharedKeyDeserializer,
            SharedKeySerializer, StringKeyCodec, UuidKeyCodec,
        },
        scalar::{
            BoolCodec, CharCodec, NumberDeserializer, NumberSerializer, RawJson, RawJsonCodec,
            StringCodec, UnitCodec, UuidCodec,
        },
        SharedDeserializer, SharedSerializer,
    },
    mapper::ObjectMapper,
};

type Constructor<C> = Arc<dyn Fn() -> C + Send + Sync>;
type ErasedConstructor = Box<dyn Any + Send + Sync>;

#[derive(Default)]
struct ConstructorTable {
    constructors: HashMap<TypeId, (&'static str, ErasedConstructor)>,
}

impl ConstructorTable {
    fn insert<T: ?Sized + 'static, C: 'static>(&mut self, constructor: Constructor<C>) {
        let erased: ErasedConstructor = Box::new(constructor);
        self.constructors
            .insert(TypeId::of::<T>(), (type_name::<T>(), erased));
    }

    fn construct<T: ?Sized + 'static, C: 'static>(&self) -> Option<C> {
        let (_, erased) = self.constructors.get(&TypeId::of::<T>())?;
        // Entry for `T` is always inserted with constructor type `Constructor<C>` for the
        // codec type `C` matching `T`
        erased
            .downcast_ref::<Constructor<C>>()
            .map(|constructor| constructor())
    }

    fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.constructors.contains_key(&TypeId::of::<T>())
    }

    fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.constructors.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names
    }
}

/// Table of value and key codec constructors, keyed by the type they handle
///
/// Registering a codec for a type which already has one replaces the previous registration.
///
/// # Examples
/// ```
/// # use beanson::registry::CodecRegistry;
/// let registry = CodecRegistry::new();
/// let mapper = registry.mapper::<Vec<u32>>("numbers");
/// assert!(mapper.is_none());
///
/// let mapper = registry.mapper::<u32>("number").ok_or("u32 is a base type")?;
/// assert_eq!(5, mapper.read("5")?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct CodecRegistry {
    serializers: ConstructorTable,
    deserializers: ConstructorTable,
    key_serializers: ConstructorTable,
    key_deserializers: ConstructorTable,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// Creates a registry containing the codecs of the base types
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.with_base_types();
        registry
    }

    /// Creates a registry without any codecs
    pub fn empty() -> Self {
        CodecRegistry {
            serializers: ConstructorTable::default(),
            deserializers: ConstructorTable::default(),
            key_serializers: ConstructorTable::default(),
            key_deserializers: ConstructorTable::default(),
        }
    }

    /// Registers the codecs of the base types
    ///
    /// Value codecs: `bool`, all integer and floating point types, `char`, `String`, `()`,
    /// [`Uuid`], [`RawJson`] and the `chrono` types `DateTime<Utc>`, `NaiveDate`, `NaiveTime`
    /// and `NaiveDateTime`. Key codecs: the same types except `()` and [`RawJson`].
    pub fn with_base_types(&mut self) -> &mut Self {
        self.register_codec::<bool, _>(|| BoolCodec)
            .register_codec::<char, _>(|| CharCodec)
            .register_codec::<String, _>(|| StringCodec)
            .register_codec::<(), _>(|| UnitCodec)
            .register_codec::<Uuid, _>(|| UuidCodec)
            .register_codec::<RawJson, _>(|| RawJsonCodec);
        self.register_date_codecs();
        self.register_number_codecs();

        self.register_key_codec::<String, _>(|| StringKeyCodec)
            .register_key_codec::<bool, _>(|| BoolKeyCodec)
            .register_key_codec::<char, _>(|| CharKeyCodec)
            .register_key_codec::<Uuid, _>(|| UuidKeyCodec)
            .register_key_codec::<DateTime<Utc>, _>(|| DateKeyCodec)
            .register_key_codec::<NaiveDate, _>(|| DateKeyCodec)
            .register_key_codec::<NaiveTime, _>(|| DateKeyCodec)
            .register_key_codec::<NaiveDateTime, _>(|| DateKeyCodec);
        self
    }

    fn register_date_codecs(&mut self) {
        self.register_codec::<DateTime<Utc>, _>(|| DateCodec)
            .register_codec::<NaiveDate, _>(|| DateCodec)
            .register_codec::<NaiveTime, _>(|| DateCodec)
            .register_codec::<NaiveDateTime, _>(|| DateCodec);
    }

    fn register_number_codecs(&mut self) {
        duplicate! {
            [
                number_type;
                [i8]; [i16]; [i32]; [i64]; [i128]; [isize];
                [u8]; [u16]; [u32]; [u64]; [u128]; [usize];
                [f32]; [f64];
            ]
            self.register_serializer::<number_type>(|| -> SharedSerializer<number_type> { Arc::new(NumberSerializer) })
                .register_deserializer::<number_type>(|| -> SharedDeserializer<number_type> { Arc::new(NumberDeserializer) })
                .register_key_codec::<number_type, _>(|| NumberKeyCodec);
        }
    }

    /// Registers the constructor of the serializer of `T`
    pub fn register_serializer<T: ?Sized + 'static>(
        &mut self,
        constructor: impl Fn() -> SharedSerializer<T> + Send + Sync + 'static,
    ) -> &mut Self {
        let constructor: Constructor<SharedSerializer<T>> = Arc::new(constructor);
        self.serializers.insert::<T, _>(constructor);
        self
    }

    /// Registers the constructor of the deserializer of `T`
    pub fn register_deserializer<T: 'static>(
        &mut self,
        constructor: impl Fn() -> SharedDeserializer<T> + Send + Sync + 'static,
    ) -> &mut Self {
        let constructor: Constructor<SharedDeserializer<T>> = Arc::new(constructor);
        self.deserializers.insert::<T, _>(constructor);
        self
    }

    /// Registers a codec which is both serializer and deserializer of `T`
    pub fn register_codec<T: 'static, C>(&mut self, constructor: impl Fn() -> C + Send + Sync + 'static) -> &mut Self
    where
        C: crate::codec::JsonSerializer<T> + crate::codec::JsonDeserializer<T> + 'static,
    {
        let constructor = Arc::new(constructor);
        let serializer_constructor = constructor.clone();
        self.register_serializer::<T>(move || -> SharedSerializer<T> { Arc::new(serializer_constructor()) })
            .register_deserializer::<T>(move || -> SharedDeserializer<T> { Arc::new(constructor()) })
    }

    /// Registers a key codec which is both key serializer and key deserializer of `K`
    pub fn register_key_codec<K: 'static, C>(&mut self, constructor: impl Fn() -> C + Send + Sync + 'static) -> &mut Self
    where
        C: crate::codec::key::KeySerializer<K> + crate::codec::key::KeyDeserializer<K> + 'static,
    {
        let constructor = Arc::new(constructor);
        let serializer_constructor = constructor.clone();
        let key_serializer: Constructor<SharedKeySerializer<K>> =
            Arc::new(move || -> SharedKeySerializer<K> { Arc::new(serializer_constructor()) });
        let key_deserializer: Constructor<SharedKeyDeserializer<K>> =
            Arc::new(move || -> SharedKeyDeserializer<K> { Arc::new(constructor()) });
        self.key_serializers.insert::<K, _>(key_serializer);
        self.key_deserializers.insert::<K, _>(key_deserializer);
        self
    }

    /// Creates the serializer of `T`, if registered
    pub fn serializer<T: ?Sized + 'static>(&self) -> Option<SharedSerializer<T>> {
        self.serializers.construct::<T, SharedSerializer<T>>()
    }

    /// Creates the deserializer of `T`, if registered
    pub fn deserializer<T: 'static>(&self) -> Option<SharedDeserializer<T>> {
        self.deserializers.construct::<T, SharedDeserializer<T>>()
    }

    /// Creates the key serializer of `K`, if registered
    pub fn key_serializer<K: 'static>(&self) -> Option<SharedKeySerializer<K>> {
        self.key_serializers.construct::<K, SharedKeySerializer<K>>()
    }

    /// Creates the key deserializer of `K`, if registered
    pub fn key_deserializer<K: 'static>(&self) -> Option<SharedKeyDeserializer<K>> {
        self.key_deserializers.construct::<K, SharedKeyDeserializer<K>>()
    }

    /// Whether both a serializer and a deserializer of `T` are registered
    pub fn contains<T: 'static>(&self) -> bool {
        self.serializers.contains::<T>() && self.deserializers.contains::<T>()
    }

    /// Creates a mapper for `T` from the registered codecs
    ///
    /// Returns `None` if the serializer or deserializer of `T` is not registered.
    pub fn mapper<T: 'static>(&self, root_name: impl Into<String>) -> Option<ObjectMapper<T>> {
        Some(ObjectMapper::new(root_name, self.serializer()?, self.deserializer()?))
    }
}

impl Debug for CodecRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("serializers", &self.serializers.type_names())
            .field("deserializers", &self.deserializers.type_names())
            .field("key_serializers", &self.key_serializers.type_names())
            .field("key_deserializers", &self.key_deserializers.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        bean::{BeanDeserializer, BeanSerializer},
        codec::{
            map::{MapDeserializer, MapSerializer},
            testing::{read, write},
        },
    };

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn base_types() -> TestResult {
        let registry = CodecRegistry::new();
        assert!(registry.contains::<bool>());
        assert!(registry.contains::<f32>());
        assert!(registry.contains::<NaiveTime>());
        assert!(!registry.contains::<Vec<u8>>());
        assert!(registry.key_serializer::<RawJson>().is_none());

        let serializer = registry.serializer::<i16>().ok_or("missing serializer")?;
        assert_eq!("-3", write(&*serializer, &-3)?);
        let deserializer = registry.deserializer::<char>().ok_or("missing deserializer")?;
        assert_eq!('x', read(&*deserializer, "\"x\"")?);

        assert!(CodecRegistry::empty().serializer::<bool>().is_none());
        Ok(())
    }

    #[test]
    fn map_from_registered_codecs() -> TestResult {
        let registry = CodecRegistry::new();
        let serializer = MapSerializer::<u8, bool, BTreeMap<u8, bool>>::new(
            registry.key_serializer().ok_or("missing key serializer")?,
            registry.serializer().ok_or("missing serializer")?,
        );
        let deserializer = MapDeserializer::<u8, bool, BTreeMap<u8, bool>>::new(
            registry.key_deserializer().ok_or("missing key deserializer")?,
            registry.deserializer().ok_or("missing deserializer")?,
        );

        let map = BTreeMap::from([(1, true), (2, false)]);
        let json = write(&serializer, &map)?;
        assert_eq!(r#"{"1":true,"2":false}"#, json);
        assert_eq!(map, read(&deserializer, &json)?);
        Ok(())
    }

    #[derive(Default, PartialEq, Debug)]
    struct Tag {
        label: String,
    }

    #[test]
    fn registered_bean() -> TestResult {
        let mut registry = CodecRegistry::new();
        let label_serializer = registry.serializer::<String>().ok_or("missing serializer")?;
        let label_deserializer = registry.deserializer::<String>().ok_or("missing deserializer")?;
        registry
            .register_serializer::<Tag>(move || -> SharedSerializer<Tag> {
                Arc::new(BeanSerializer::<Tag>::new("Tag").property("label", label_serializer.clone(), |t: &Tag| &t.label))
            })
            .register_deserializer::<Tag>(move || -> SharedDeserializer<Tag> {
                Arc::new(BeanDeserializer::<Tag>::new("Tag").property(
                    "label",
                    label_deserializer.clone(),
                    |t: &mut Tag, v| t.label = v,
                ))
            });

        let mapper = registry.mapper::<Tag>("tag").ok_or("missing mapper")?;
        let tag = Tag { label: "new".to_owned() };
        let json = mapper.write(&tag)?;
        assert_eq!(r#"{"label":"new"}"#, json);
        assert_eq!(tag, mapper.read(&json)?);

        // Replacing a registration
        registry.register_serializer::<Tag>(|| -> SharedSerializer<Tag> { Arc::new(BeanSerializer::<Tag>::new("Tag")) });
        let mapper = registry.mapper::<Tag>("tag").ok_or("missing mapper")?;
        assert_eq!("{}", mapper.write(&tag)?);
        Ok(())
    }
}
