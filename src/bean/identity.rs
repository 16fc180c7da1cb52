//! Object identity tracking for documents which reference the same bean instance more than once
//!
//! The first time an instance is written it is written as full object with an additional id
//! member; every later occurrence of the same instance within the same top-level call is
//! written as the bare id. Instances are identified by `Arc` pointer identity, so two equal
//! but distinct values get different ids.
//!
//! On deserialization the bare id is resolved to the instance which was read earlier in the
//! document. References to an id which has not been seen yet, or whose object is still being
//! read (a cycle), fail with [`DeserializationError::UnresolvedReference`]: forward references
//! are not supported.
//!
//! Polymorphic base types can be identity-tracked as well: [`SubtypeSerializer`] and
//! [`SubtypeDeserializer`] implement the bean codec views expected here, and the id member
//! is then written next to an inline discriminator, or inside the wrapper object.
//!
//! [`SubtypeSerializer`]: super::subtype::SubtypeSerializer
//! [`SubtypeDeserializer`]: super::subtype::SubtypeDeserializer

use std::sync::Arc;

use tracing::trace;
use uuid::Uuid;

use super::{BeanDeserializerCore, BeanSerializerCore};
use crate::{
    codec::{DeserializerParameters, JsonDeserializer, JsonSerializer, SerializerParameters},
    context::{DeserializationContext, ObjectId, SerializationContext},
    error::{DeserializationError, SerializationError},
    reader::{JsonReader, TokenKind},
    writer::JsonWriter,
};

/// How ids of new instances are generated
#[derive(PartialEq, Eq, Clone, Copy, Default, strum::Display, Debug)]
pub enum IdGenerator {
    /// Integers starting at 1, counted separately per scope
    #[default]
    IntSequence,
    /// Random UUIDs, written as strings
    Uuid,
}

/// Describes how the identity of a bean type is carried in JSON
#[derive(Clone, Debug)]
pub struct IdentityInfo {
    /// Name of the id member
    pub property: String,
    /// How ids are generated
    pub generator: IdGenerator,
    /// Ids are unique within a scope; bean types sharing a scope share one id space
    pub scope: String,
}

impl IdentityInfo {
    /// Creates identity info with id member `property`, ids unique within `scope`
    pub fn new(property: impl Into<String>, generator: IdGenerator, scope: impl Into<String>) -> Self {
        IdentityInfo {
            property: property.into(),
            generator,
            scope: scope.into(),
        }
    }
}

/// Reads an object id, either an integer or a string
pub(crate) fn read_object_id(reader: &mut dyn JsonReader) -> Result<ObjectId, DeserializationError> {
    match reader.peek()? {
        TokenKind::Number => {
            let number = reader.next_number_str()?;
            number.parse().map(ObjectId::Int).map_err(|_| {
                DeserializationError::value(&*reader, "object id", number.clone(), "not an integer id")
            })
        }
        TokenKind::String => Ok(ObjectId::Str(reader.next_string()?)),
        kind => Err(DeserializationError::value(
            &*reader,
            "object id",
            kind.to_string(),
            "expected an integer or string id",
        )),
    }
}

fn write_object_id(writer: &mut dyn JsonWriter, id: &ObjectId) -> Result<(), SerializationError> {
    match id {
        ObjectId::Int(id) => Ok(writer.integer_value(i128::from(*id))?),
        ObjectId::Str(id) => Ok(writer.string_value(id)?),
    }
}

/// Writes the id member of an object which has already been started
pub(crate) fn write_id_member(
    writer: &mut dyn JsonWriter,
    info: &IdentityInfo,
    id: &ObjectId,
) -> Result<(), SerializationError> {
    writer.name(&info.property)?;
    write_object_id(writer, id)
}

/// Serializer of identity-tracked beans, held in an `Arc`
pub struct IdentitySerializer<T: 'static> {
    bean: Arc<dyn BeanSerializerCore<T>>,
    info: IdentityInfo,
}

impl<T: 'static> IdentitySerializer<T> {
    /// Creates a serializer writing objects with `bean`, which is either a
    /// [`BeanSerializer`](super::BeanSerializer) or a polymorphic
    /// [`SubtypeSerializer`](super::subtype::SubtypeSerializer)
    pub fn new(bean: Arc<dyn BeanSerializerCore<T>>, info: IdentityInfo) -> Self {
        IdentitySerializer { bean, info }
    }
}

impl<T: 'static> JsonSerializer<Arc<T>> for IdentitySerializer<T> {
    fn serialize(
        &self,
        writer: &mut dyn JsonWriter,
        value: &Arc<T>,
        ctx: &mut SerializationContext<'_>,
        _params: &SerializerParameters,
    ) -> Result<(), SerializationError> {
        let scope = &self.info.scope;
        let address = Arc::as_ptr(value) as usize;
        if let Some(id) = ctx.assigned_identity(scope, address) {
            trace!(bean = self.bean.bean_name(), %id, "writing object reference");
            let id = id.clone();
            return write_object_id(writer, &id);
        }

        let id = match self.info.generator {
            IdGenerator::IntSequence => ObjectId::Int(ctx.next_sequence_id(scope)),
            IdGenerator::Uuid => ObjectId::Str(Uuid::new_v4().to_string()),
        };
        ctx.assign_identity(scope, address, id.clone());
        self.bean
            .write_object(writer, value.as_ref(), ctx, Some((&self.info, &id)))
    }
}

/// Deserializer of identity-tracked beans, creating an `Arc`
pub struct IdentityDeserializer<T: 'static> {
    bean: Arc<dyn BeanDeserializerCore<T>>,
    info: IdentityInfo,
}

impl<T: Send + Sync + 'static> IdentityDeserializer<T> {
    /// Creates a deserializer reading objects with `bean`, which is either a
    /// [`BeanDeserializer`](super::BeanDeserializer) or a polymorphic
    /// [`SubtypeDeserializer`](super::subtype::SubtypeDeserializer)
    pub fn new(bean: Arc<dyn BeanDeserializerCore<T>>, info: IdentityInfo) -> Self {
        IdentityDeserializer { bean, info }
    }
}

impl<T: Send + Sync + 'static> JsonDeserializer<Arc<T>> for IdentityDeserializer<T> {
    fn deserialize(
        &self,
        reader: &mut dyn JsonReader,
        ctx: &mut DeserializationContext<'_>,
        params: &DeserializerParameters,
    ) -> Result<Arc<T>, DeserializationError> {
        let scope = &self.info.scope;
        if reader.peek()? != TokenKind::BeginObject {
            let id = read_object_id(reader)?;
            trace!(bean = self.bean.bean_name(), %id, "resolving object reference");
            return ctx
                .resolve_identity::<T>(scope, &id)
                .ok_or_else(|| DeserializationError::UnresolvedReference {
                    id: id.to_string(),
                    location: reader.current_position(true),
                });
        }

        reader.begin_object()?;
        let (value, id) = self
            .bean
            .read_body(reader, ctx, params, Vec::new(), Some(&self.info))?;
        let value = Arc::new(value);
        if let Some(id) = id {
            ctx.complete_identity(scope, id, value.clone());
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bean::{BeanDeserializer, BeanSerializer},
        codec::{
            collection::{SequenceDeserializer, SequenceSerializer},
            scalar::StringCodec,
            testing::{read, write},
            SharedDeserializer, SharedSerializer,
        },
    };

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[derive(Default, PartialEq, Debug)]
    struct Employee {
        name: String,
    }

    fn employee_info(generator: IdGenerator) -> IdentityInfo {
        IdentityInfo::new("@id", generator, "Employee")
    }

    fn list_serializer(generator: IdGenerator) -> SequenceSerializer<Arc<Employee>, Vec<Arc<Employee>>> {
        let string: SharedSerializer<String> = Arc::new(StringCodec);
        let bean = BeanSerializer::<Employee>::new("Employee").property("name", string, |e: &Employee| &e.name);
        SequenceSerializer::new(Arc::new(IdentitySerializer::<Employee>::new(Arc::new(bean), employee_info(generator))))
    }

    fn list_deserializer() -> SequenceDeserializer<Arc<Employee>, Vec<Arc<Employee>>> {
        let string: SharedDeserializer<String> = Arc::new(StringCodec);
        let bean = BeanDeserializer::<Employee>::new("Employee")
            .property("name", string, |e: &mut Employee, v| e.name = v);
        SequenceDeserializer::new(Arc::new(IdentityDeserializer::<Employee>::new(
            Arc::new(bean),
            employee_info(IdGenerator::IntSequence),
        )))
    }

    #[test]
    fn shared_instances() -> TestResult {
        let ann = Arc::new(Employee { name: "Ann".to_owned() });
        let other_ann = Arc::new(Employee { name: "Ann".to_owned() });
        let list = vec![ann.clone(), other_ann, ann];

        let json = write(&list_serializer(IdGenerator::IntSequence), &list)?;
        assert_eq!(r#"[{"@id":1,"name":"Ann"},{"@id":2,"name":"Ann"},1]"#, json);

        let read_list = read(&list_deserializer(), &json)?;
        assert_eq!(3, read_list.len());
        assert!(Arc::ptr_eq(&read_list[0], &read_list[2]));
        assert!(!Arc::ptr_eq(&read_list[0], &read_list[1]));
        assert_eq!(list, read_list);
        Ok(())
    }

    #[test]
    fn uuid_ids() -> TestResult {
        let ann = Arc::new(Employee { name: "Ann".to_owned() });
        let json = write(&list_serializer(IdGenerator::Uuid), &vec![ann.clone(), ann])?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        let id = value[0]["@id"].as_str().ok_or("missing id")?;
        assert_eq!(36, id.len());
        assert_eq!(id, value[1].as_str().ok_or("missing reference")?);

        let read_list = read(&list_deserializer(), &json)?;
        assert!(Arc::ptr_eq(&read_list[0], &read_list[1]));
        Ok(())
    }

    #[test]
    fn unresolved_references() {
        // Forward reference
        match read(&list_deserializer(), r#"[1, {"@id": 1, "name": "Ann"}]"#) {
            Err(DeserializationError::UnresolvedReference { id, .. }) => assert_eq!("1", id),
            r => panic!("unexpected result: {r:?}"),
        }
        assert!(matches!(
            read(&list_deserializer(), r#"[{"@id": "a", "name": "Ann"}, "b"]"#),
            Err(DeserializationError::UnresolvedReference { .. })
        ));
        assert!(matches!(
            read(&list_deserializer(), r#"[{"@id": 1}, {"@id": 1}]"#),
            Err(DeserializationError::Bean { .. })
        ));
        assert!(matches!(
            read(&list_deserializer(), "[true]"),
            Err(DeserializationError::Value { target: "object id", .. })
        ));
    }
}
