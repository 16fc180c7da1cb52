//! Codecs of maps, written as JSON objects
//!
//! Like the sequence codecs, a single pair of generic codecs handles all map types; the
//! concrete map which is materialized is described by its [`MapKind`].

use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
    marker::PhantomData,
};

use duplicate::duplicate_item;

use super::{
    key::{SharedKeyDeserializer, SharedKeySerializer},
    *,
};

/// Kind of map a map codec materializes
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum MapKind {
    /// Unordered map, `HashMap<K, V>`
    HashMap,
    /// Map ordered by the keys, `BTreeMap<K, V>`
    SortedMap,
}

/// A map which can be written as and read from a JSON object
pub trait JsonMap<K, V>: Sized {
    /// Kind of this map
    const KIND: MapKind;

    /// Number of entries
    fn json_len(&self) -> usize;

    /// Entries in the order they are written, unless sorted by the serializer
    fn json_entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_>;

    /// Creates the map from the entries in the order they were read; for duplicate keys the
    /// last entry wins
    fn from_json_entries(entries: Vec<(K, V)>) -> Self;
}

#[duplicate_item(
    map_type key_bounds kind;
    [HashMap<K, V>] [K: Eq + Hash] [HashMap];
    [BTreeMap<K, V>] [K: Ord] [SortedMap];
)]
impl<key_bounds, V> JsonMap<K, V> for map_type {
    const KIND: MapKind = MapKind::kind;

    fn json_len(&self) -> usize {
        self.len()
    }

    fn json_entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }

    fn from_json_entries(entries: Vec<(K, V)>) -> Self {
        entries.into_iter().collect()
    }
}

/// Serializer of any [`JsonMap`]
///
/// - empty maps are omitted unless
///   [`write_empty_json_objects`](crate::context::SerializerSettings::write_empty_json_objects)
///   is enabled
/// - entries whose value is `null` are omitted unless
///   [`write_null_map_values`](crate::context::SerializerSettings::write_null_map_values) is
///   enabled
/// - with [`order_map_entries_by_keys`](crate::context::SerializerSettings::order_map_entries_by_keys)
///   entries are sorted by the member name
pub struct MapSerializer<K: 'static, V: 'static, M> {
    key: SharedKeySerializer<K>,
    value: SharedSerializer<V>,
    _marker: PhantomData<fn(&M)>,
}

impl<K: 'static, V: 'static, M: JsonMap<K, V>> MapSerializer<K, V, M> {
    /// Creates a serializer writing keys with `key` and values with `value`
    pub fn new(key: SharedKeySerializer<K>, value: SharedSerializer<V>) -> Self {
        MapSerializer {
            key,
            value,
            _marker: PhantomData,
        }
    }
}

impl<K: 'static, V: 'static, M: JsonMap<K, V>> JsonSerializer<M> for MapSerializer<K, V, M> {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &M,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        if value.json_len() == 0 && !ctx.settings().write_empty_json_objects && writer.cancel_name() {
            return Ok(());
        }

        let mut entries = Vec::with_capacity(value.json_len());
        for (key, entry_value) in value.json_entries() {
            entries.push((self.key.serialize(key, ctx), entry_value));
        }
        if ctx.settings().order_map_entries_by_keys {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let write_nulls = ctx.settings().write_null_map_values;
        writer.begin_object()?;
        for (name, entry_value) in entries {
            // Written here because the value serializer follows `serialize_nulls`, which
            // only applies to bean properties
            if self.value.is_null(entry_value) {
                if write_nulls {
                    writer.name(&name)?;
                    writer.null_value()?;
                }
                continue;
            }
            writer.name(&name)?;
            self.value.serialize(writer, entry_value, ctx, params)?;
        }
        Ok(writer.end_object()?)
    }

    fn is_empty(&self, value: &M) -> bool {
        value.json_len() == 0
    }
}

/// Deserializer of any [`JsonMap`]
pub struct MapDeserializer<K: 'static, V: 'static, M> {
    key: SharedKeyDeserializer<K>,
    value: SharedDeserializer<V>,
    _marker: PhantomData<fn() -> M>,
}

impl<K: 'static, V: 'static, M: JsonMap<K, V>> MapDeserializer<K, V, M> {
    /// Creates a deserializer reading keys with `key` and values with `value`
    pub fn new(key: SharedKeyDeserializer<K>, value: SharedDeserializer<V>) -> Self {
        MapDeserializer {
            key,
            value,
            _marker: PhantomData,
        }
    }

    /// Kind of the map this deserializer creates
    pub fn kind(&self) -> MapKind {
        M::KIND
    }
}

impl<K: 'static, V: 'static, M: JsonMap<K, V>> JsonDeserializer<M> for MapDeserializer<K, V, M> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<M, DeserializationError> {
        let mut entries = Vec::new();
        reader.begin_object()?;
        while reader.has_next()? {
            let name = reader.next_name()?;
            let key = self.key.deserialize(&name, reader, ctx)?;
            entries.push((key, self.value.deserialize(reader, ctx, params)?));
        }
        reader.end_object()?;
        Ok(M::from_json_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        super::{
            key::{BoolKeyCodec, NumberKeyCodec, StringKeyCodec},
            scalar::{NumberDeserializer, NumberSerializer, StringCodec},
            testing::{read, write, write_with},
        },
        *,
    };
    use crate::{context::SerializerSettings, writer::JsonTextWriter};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn sorted_serializer() -> MapSerializer<u32, String, BTreeMap<u32, String>> {
        MapSerializer::new(Arc::new(NumberKeyCodec), Arc::new(StringCodec))
    }

    #[test]
    fn sorted_map() -> TestResult {
        let map = BTreeMap::from([(10, "b".to_owned()), (2, "a".to_owned())]);
        assert_eq!(r#"{"2":"a","10":"b"}"#, write(&sorted_serializer(), &map)?);

        let deserializer =
            MapDeserializer::<u32, String, BTreeMap<u32, String>>::new(Arc::new(NumberKeyCodec), Arc::new(StringCodec));
        assert_eq!(map, read(&deserializer, r#"{"10": "b", "2": "a"}"#)?);
        assert_eq!(MapKind::SortedMap, deserializer.kind());

        // Ordering by member name compares strings
        let settings = SerializerSettings {
            order_map_entries_by_keys: true,
            ..Default::default()
        };
        assert_eq!(
            r#"{"10":"b","2":"a"}"#,
            write_with(&sorted_serializer(), &map, &settings, &SerializerParameters::DEFAULT)?
        );
        Ok(())
    }

    #[test]
    fn hash_map() -> TestResult {
        let serializer =
            MapSerializer::<bool, u8, HashMap<bool, u8>>::new(Arc::new(BoolKeyCodec), Arc::new(NumberSerializer));
        let settings = SerializerSettings {
            order_map_entries_by_keys: true,
            ..Default::default()
        };
        let map = HashMap::from([(true, 1), (false, 0)]);
        assert_eq!(
            r#"{"false":0,"true":1}"#,
            write_with(&serializer, &map, &settings, &SerializerParameters::DEFAULT)?
        );

        let deserializer =
            MapDeserializer::<bool, u8, HashMap<bool, u8>>::new(Arc::new(BoolKeyCodec), Arc::new(NumberDeserializer));
        assert_eq!(map, read(&deserializer, r#"{"true": 1, "false": 0}"#)?);
        // Last duplicate wins
        assert_eq!(
            HashMap::from([(true, 2)]),
            read(&deserializer, r#"{"true": 1, "true": 2}"#)?
        );
        assert!(matches!(
            read(&deserializer, r#"{"maybe": 1}"#),
            Err(DeserializationError::KeyFormat { .. })
        ));
        Ok(())
    }

    #[test]
    fn null_values_and_empty_maps() -> TestResult {
        let serializer = MapSerializer::<String, Option<u32>, BTreeMap<String, Option<u32>>>::new(
            Arc::new(StringKeyCodec),
            Arc::new(OptionSerializer::<u32>::new(Arc::new(NumberSerializer))),
        );
        let map = BTreeMap::from([("a".to_owned(), Some(1)), ("b".to_owned(), None)]);
        assert_eq!(r#"{"a":1,"b":null}"#, write(&serializer, &map)?);

        let settings = SerializerSettings {
            write_null_map_values: false,
            write_empty_json_objects: false,
            ..Default::default()
        };
        let params = SerializerParameters::DEFAULT;
        assert_eq!(r#"{"a":1}"#, write_with(&serializer, &map, &settings, &params)?);

        // Null map values are independent of the setting for null bean properties
        let settings = SerializerSettings {
            serialize_nulls: false,
            ..Default::default()
        };
        assert_eq!(r#"{"a":1,"b":null}"#, write_with(&serializer, &map, &settings, &params)?);
        let settings = SerializerSettings {
            serialize_nulls: true,
            write_null_map_values: false,
            ..Default::default()
        };
        assert_eq!(r#"{"a":1}"#, write_with(&serializer, &map, &settings, &params)?);

        let settings = SerializerSettings {
            write_null_map_values: false,
            write_empty_json_objects: false,
            ..Default::default()
        };

        // Empty map as member value is omitted, at top level still written
        let mut ctx = SerializationContext::new(&settings);
        let mut json_writer = JsonTextWriter::new();
        json_writer.begin_object()?;
        json_writer.name("m")?;
        serializer.serialize(&mut json_writer, &BTreeMap::new(), &mut ctx, &params)?;
        json_writer.end_object()?;
        assert_eq!("{}", json_writer.finish_document());
        assert_eq!("{}", write_with(&serializer, &BTreeMap::new(), &settings, &params)?);
        Ok(())
    }
}
