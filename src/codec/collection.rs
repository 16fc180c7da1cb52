//! Codecs of arrays and collections
//!
//! A single pair of generic codecs, [`SequenceSerializer`] and [`SequenceDeserializer`], handles
//! all sequence types. The concrete container which is materialized when reading is fixed by
//! the type parameter of the codec and described by its [`CollectionKind`]; it is never inferred
//! from the JSON data.

use std::{
    collections::{BTreeSet, BinaryHeap, HashSet, LinkedList, VecDeque},
    hash::Hash,
    marker::PhantomData,
};

use duplicate::duplicate_item;

use super::*;

/// Kind of container a sequence codec materializes
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum CollectionKind {
    /// Fixed-size array, `Box<[T]>`
    Array,
    /// Insertion-ordered list, `Vec<T>`
    List,
    /// Double-ended queue, `VecDeque<T>`
    Deque,
    /// Doubly linked list, `LinkedList<T>`
    LinkedList,
    /// Unordered set, `HashSet<T>`
    HashSet,
    /// Set ordered by the elements, `BTreeSet<T>`
    SortedSet,
    /// Queue ordered by priority, `BinaryHeap<T>`
    PriorityQueue,
}

/// A container which can be written as and read from a JSON array
pub trait JsonCollection<T>: Sized {
    /// Kind of this container
    const KIND: CollectionKind;

    /// Number of elements
    fn json_len(&self) -> usize;

    /// Elements in the order they are written
    fn json_iter(&self) -> Box<dyn Iterator<Item = &T> + '_>;

    /// Creates the container from the elements in the order they were read
    fn from_json_items(items: Vec<T>) -> Self;
}

// Use `duplicate` crate to avoid repeating code for all supported containers
#[duplicate_item(
    collection_type generics kind;
    [Box<[T]>] [T] [Array];
    [Vec<T>] [T] [List];
    [VecDeque<T>] [T] [Deque];
    [LinkedList<T>] [T] [LinkedList];
    [HashSet<T>] [T: Eq + Hash] [HashSet];
    [BTreeSet<T>] [T: Ord] [SortedSet];
    [BinaryHeap<T>] [T: Ord] [PriorityQueue];
)]
impl<generics> JsonCollection<T> for collection_type {
    const KIND: CollectionKind = CollectionKind::kind;

    fn json_len(&self) -> usize {
        self.len()
    }

    fn json_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn from_json_items(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

/// Writes an empty array, or omits the member holding it
///
/// Returns `true` if the member was omitted.
pub(crate) fn omit_empty_array(writer: &mut dyn JsonWriter, ctx: &SerializationContext<'_>) -> bool {
    !ctx.settings().write_empty_json_arrays && writer.cancel_name()
}

/// Serializer of any [`JsonCollection`]
///
/// Empty collections are omitted unless
/// [`write_empty_json_arrays`](crate::context::SerializerSettings::write_empty_json_arrays)
/// is enabled. With
/// [`write_single_elem_arrays_unwrapped`](crate::context::SerializerSettings::write_single_elem_arrays_unwrapped)
/// a collection with exactly one element is written as that element.
pub struct SequenceSerializer<T: 'static, C> {
    element: SharedSerializer<T>,
    _marker: PhantomData<fn(&C)>,
}

impl<T: 'static, C: JsonCollection<T>> SequenceSerializer<T, C> {
    /// Creates a serializer writing the elements with `element`
    pub fn new(element: SharedSerializer<T>) -> Self {
        SequenceSerializer {
            element,
            _marker: PhantomData,
        }
    }
}

impl<T: 'static, C: JsonCollection<T>> JsonSerializer<C> for SequenceSerializer<T, C> {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &C,
        ctx: &mut SerializationContext<'_>,
        params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        let len = value.json_len();
        if len == 0 && omit_empty_array(writer, ctx) {
            return Ok(());
        }
        if len == 1 && ctx.settings().write_single_elem_arrays_unwrapped {
            if let Some(element) = value.json_iter().next() {
                return self.element.serialize(writer, element, ctx, params);
            }
        }

        writer.begin_array()?;
        for element in value.json_iter() {
            self.element.serialize(writer, element, ctx, params)?;
        }
        Ok(writer.end_array()?)
    }

    fn is_empty(&self, value: &C) -> bool {
        value.json_len() == 0
    }
}

/// Deserializer of any [`JsonCollection`]
///
/// With [`accept_single_value_as_array`](crate::context::DeserializerSettings::accept_single_value_as_array)
/// a value which is not an array is read as collection with that single element.
pub struct SequenceDeserializer<T: 'static, C> {
    element: SharedDeserializer<T>,
    _marker: PhantomData<fn() -> C>,
}

impl<T: 'static, C: JsonCollection<T>> SequenceDeserializer<T, C> {
    /// Creates a deserializer reading the elements with `element`
    pub fn new(element: SharedDeserializer<T>) -> Self {
        SequenceDeserializer {
            element,
            _marker: PhantomData,
        }
    }

    /// Kind of the container this deserializer creates
    pub fn kind(&self) -> CollectionKind {
        C::KIND
    }
}

/// Reads the elements of a JSON array, or a single value if accepted as array
pub(crate) fn read_items<T>(
    reader: &mut dyn JsonReader,
    ctx: &mut DeserializationContext<'_>,
    params: &DeserializerParameters,
    element: &dyn JsonDeserializer<T>,
) -> Result<Vec<T>, DeserializationError> {
    if reader.peek()? != TokenKind::BeginArray && ctx.settings().accept_single_value_as_array {
        return Ok(vec![element.deserialize(reader, ctx, params)?]);
    }

    let mut items = Vec::new();
    reader.begin_array()?;
    while reader.has_next()? {
        items.push(element.deserialize(reader, ctx, params)?);
    }
    reader.end_array()?;
    Ok(items)
}

impl<T: 'static, C: JsonCollection<T>> JsonDeserializer<C> for SequenceDeserializer<T, C> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<C, DeserializationError> {
        let items = read_items(reader, ctx, params, self.element.as_ref())?;
        Ok(C::from_json_items(items))
    }
}
