//! Configuration and per-call state of serialization and deserialization
//!
//! [`SerializerSettings`] and [`DeserializerSettings`] are plain configuration values, typically
//! created once by the application (or by an external configuration loader when the `serde`
//! feature is enabled). For every top-level read or write call a fresh [`DeserializationContext`]
//! or [`SerializationContext`] is created which borrows the settings and holds the mutable state
//! of that call, such as the identity maps. Codecs themselves hold no per-call state.

use std::{
    any::Any,
    collections::HashMap,
    fmt::{Display, Formatter},
    sync::Arc,
};

use crate::{reader::ReaderSettings, writer::WriterSettings};

/// Settings which customize deserialization
///
/// To avoid repeating the default values for unchanged settings `..Default::default()` can be used:
/// ```
/// # use beanson::context::DeserializerSettings;
/// DeserializerSettings {
///     fail_on_unknown_properties: false,
///     ..Default::default()
/// }
/// # ;
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct DeserializerSettings {
    /// Whether an unknown bean property fails deserialization
    ///
    /// If `false` the value of an unknown property is skipped.
    pub fail_on_unknown_properties: bool,

    /// Whether the root value is wrapped in a single-member object named after the root name
    pub unwrap_root_value: bool,

    /// Whether a single value may stand in for an array or collection with one element
    pub accept_single_value_as_array: bool,

    /// Whether `null` read into a non-optional scalar yields the default value of the type
    ///
    /// If `false` such a `null` fails deserialization.
    pub null_as_default: bool,

    /// Settings of the JSON reader created by the mapper
    pub reader_settings: ReaderSettings,
}

impl Default for DeserializerSettings {
    fn default() -> Self {
        DeserializerSettings {
            fail_on_unknown_properties: true,
            unwrap_root_value: false,
            accept_single_value_as_array: false,
            null_as_default: false,
            reader_settings: ReaderSettings::default(),
        }
    }
}

/// Settings which customize serialization
///
/// To avoid repeating the default values for unchanged settings `..Default::default()` can be used:
/// ```
/// # use beanson::context::SerializerSettings;
/// SerializerSettings {
///     write_empty_json_arrays: false,
///     ..Default::default()
/// }
/// # ;
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct SerializerSettings {
    /// Whether the root value is wrapped in a single-member object named after the root name
    pub wrap_root_value: bool,

    /// Whether bean properties with a `null` value are written
    pub serialize_nulls: bool,

    /// Whether empty arrays and collections are written as `[]`
    ///
    /// If `false` the member holding them is omitted. Empty arrays at the top-level or
    /// inside another array are always written.
    pub write_empty_json_arrays: bool,

    /// Whether empty maps are written as `{}`
    ///
    /// If `false` the member holding them is omitted.
    pub write_empty_json_objects: bool,

    /// Whether arrays and collections with exactly one element are written as that element
    pub write_single_elem_arrays_unwrapped: bool,

    /// Whether map entries with a `null` value are written
    pub write_null_map_values: bool,

    /// Whether map entries are written sorted by their serialized key
    pub order_map_entries_by_keys: bool,

    /// Whether dates are written as epoch milliseconds instead of strings
    pub write_dates_as_timestamps: bool,

    /// Whether dates used as map keys are written as epoch milliseconds instead of strings
    pub write_date_keys_as_timestamps: bool,

    /// Whether `char` arrays are written as array of single-character strings instead of one string
    pub write_char_arrays_as_json_arrays: bool,

    /// Whether NaN and Infinity are written as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`
    ///
    /// If `false` writing them fails.
    pub write_non_finite_as_string: bool,

    /// Settings of the JSON writer created by the mapper
    pub writer_settings: WriterSettings,
}

impl Default for SerializerSettings {
    fn default() -> Self {
        SerializerSettings {
            wrap_root_value: false,
            serialize_nulls: true,
            write_empty_json_arrays: true,
            write_empty_json_objects: true,
            write_single_elem_arrays_unwrapped: false,
            write_null_map_values: true,
            order_map_entries_by_keys: false,
            write_dates_as_timestamps: true,
            write_date_keys_as_timestamps: false,
            write_char_arrays_as_json_arrays: false,
            write_non_finite_as_string: false,
            writer_settings: WriterSettings::default(),
        }
    }
}

/// Identifier of an identity-tracked object within one JSON document
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum ObjectId {
    /// Id generated by an integer sequence
    Int(i64),
    /// Id generated as string, for example a UUID
    Str(String),
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectId::Int(id) => write!(f, "{id}"),
            ObjectId::Str(id) => write!(f, "{id}"),
        }
    }
}

type ScopedId = (String, ObjectId);

/// Per-call state of one top-level deserialization
#[derive(Debug)]
pub struct DeserializationContext<'s> {
    settings: &'s DeserializerSettings,
    /// `None` while the object with that id is still being deserialized
    identities: Option<HashMap<ScopedId, Option<Arc<dyn Any + Send + Sync>>>>,
}

impl<'s> DeserializationContext<'s> {
    /// Creates a context for one top-level deserialization
    pub fn new(settings: &'s DeserializerSettings) -> Self {
        DeserializationContext {
            settings,
            identities: None,
        }
    }

    /// Settings of this deserialization
    pub fn settings(&self) -> &'s DeserializerSettings {
        self.settings
    }

    /// Records that the object with the given id is being deserialized
    ///
    /// Returns `false` if the id has already been used in the scope.
    pub(crate) fn begin_identity(&mut self, scope: &str, id: ObjectId) -> bool {
        let identities = self.identities.get_or_insert_with(HashMap::new);
        let key = (scope.to_owned(), id);
        if identities.contains_key(&key) {
            return false;
        }
        identities.insert(key, None);
        true
    }

    pub(crate) fn complete_identity(
        &mut self,
        scope: &str,
        id: ObjectId,
        instance: Arc<dyn Any + Send + Sync>,
    ) {
        self.identities
            .get_or_insert_with(HashMap::new)
            .insert((scope.to_owned(), id), Some(instance));
    }

    /// Gets the completely deserialized object with the given id, if any
    pub(crate) fn resolve_identity<T: Any + Send + Sync>(
        &self,
        scope: &str,
        id: &ObjectId,
    ) -> Option<Arc<T>> {
        let identities = self.identities.as_ref()?;
        let instance = identities.get(&(scope.to_owned(), id.clone()))?.clone()?;
        instance.downcast::<T>().ok()
    }
}

/// Per-call state of one top-level serialization
#[derive(Debug)]
pub struct SerializationContext<'s> {
    settings: &'s SerializerSettings,
    /// Ids keyed by scope and object address
    identities: Option<HashMap<(String, usize), ObjectId>>,
    sequences: HashMap<String, i64>,
}

impl<'s> SerializationContext<'s> {
    /// Creates a context for one top-level serialization
    pub fn new(settings: &'s SerializerSettings) -> Self {
        SerializationContext {
            settings,
            identities: None,
            sequences: HashMap::new(),
        }
    }

    /// Settings of this serialization
    pub fn settings(&self) -> &'s SerializerSettings {
        self.settings
    }

    /// Gets the id which was assigned to the object at `address` in the scope
    pub(crate) fn assigned_identity(&self, scope: &str, address: usize) -> Option<&ObjectId> {
        self.identities
            .as_ref()?
            .get(&(scope.to_owned(), address))
    }

    pub(crate) fn assign_identity(&mut self, scope: &str, address: usize, id: ObjectId) {
        self.identities
            .get_or_insert_with(HashMap::new)
            .insert((scope.to_owned(), address), id);
    }

    /// Next value of the integer id sequence of the scope, starting at 1
    pub(crate) fn next_sequence_id(&mut self, scope: &str) -> i64 {
        let counter = self.sequences.entry(scope.to_owned()).or_insert(0);
        *counter += 1;
        *counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialization_identities() {
        let settings = DeserializerSettings::default();
        let mut ctx = DeserializationContext::new(&settings);
        let id = ObjectId::Int(1);

        assert!(ctx.begin_identity("a", id.clone()));
        // Still under construction
        assert_eq!(None, ctx.resolve_identity::<String>("a", &id));
        assert_eq!(false, ctx.begin_identity("a", id.clone()));
        // Other scope is independent
        assert!(ctx.begin_identity("b", id.clone()));

        ctx.complete_identity("a", id.clone(), Arc::new("value".to_owned()));
        assert_eq!(
            Some(Arc::new("value".to_owned())),
            ctx.resolve_identity::<String>("a", &id)
        );
        // Wrong type
        assert_eq!(None, ctx.resolve_identity::<u32>("a", &id));
    }

    #[test]
    fn serialization_identities() {
        let settings = SerializerSettings::default();
        let mut ctx = SerializationContext::new(&settings);

        assert_eq!(1, ctx.next_sequence_id("a"));
        assert_eq!(2, ctx.next_sequence_id("a"));
        assert_eq!(1, ctx.next_sequence_id("b"));

        assert_eq!(None, ctx.assigned_identity("a", 16));
        ctx.assign_identity("a", 16, ObjectId::Int(1));
        assert_eq!(Some(&ObjectId::Int(1)), ctx.assigned_identity("a", 16));
        assert_eq!(None, ctx.assigned_identity("b", 16));
    }

    #[test]
    fn object_id_display() {
        assert_eq!("12", ObjectId::Int(12).to_string());
        assert_eq!("abc", ObjectId::Str("abc".to_owned()).to_string());
    }
}
