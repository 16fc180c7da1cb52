//! Errors of serialization and deserialization
//!
//! Every error carries the [`JsonPosition`] of the reader or writer at the point where it
//! occurred. Errors are never recovered from in the middle of a document; they propagate
//! unchanged to the caller of the top-level read or write.

use thiserror::Error;

use crate::{
    reader::{JsonPosition, JsonReader, ReaderError},
    writer::{JsonWriter, WriterError},
};

/// Error which occurred while deserializing a value
#[non_exhaustive]
#[derive(Error, Clone, PartialEq, Debug)]
pub enum DeserializationError {
    /// Malformed JSON, or a token of a different kind than the one expected
    #[error(transparent)]
    Reader(#[from] ReaderError),
    /// A scalar could not be converted to the target type
    #[error("cannot deserialize {target} from {value}: {message} at {location}")]
    Value {
        /// Name of the target type
        target: &'static str,
        /// The offending JSON value, or a description of it
        value: String,
        /// Describes why the conversion failed
        message: String,
        /// Location of the value
        location: JsonPosition,
    },
    /// A map key could not be converted to the key type
    #[error("cannot deserialize map key '{key}' as {target}: {message} at {location}")]
    KeyFormat {
        /// The member name
        key: String,
        /// Name of the key type
        target: &'static str,
        /// Describes why the conversion failed
        message: String,
        /// Location of the member
        location: JsonPosition,
    },
    /// A bean has no property with this name and unknown properties are not tolerated
    #[error("unknown property '{name}' in {bean} at {location}")]
    UnknownProperty {
        /// The member name
        name: String,
        /// Name of the bean
        bean: String,
        /// Location of the member
        location: JsonPosition,
    },
    /// No subtype is registered for a type discriminator
    #[error("unknown subtype '{discriminator}' of {base} at {location}")]
    UnknownSubtype {
        /// The discriminator read from the JSON data
        discriminator: String,
        /// Name of the base type
        base: String,
        /// Location of the discriminator
        location: JsonPosition,
    },
    /// An object of a polymorphic type has no discriminator property
    #[error("missing type discriminator property '{property}' for {base} at {location}")]
    MissingTypeDiscriminator {
        /// Name of the discriminator property
        property: String,
        /// Name of the base type
        base: String,
        /// Location of the end of the object
        location: JsonPosition,
    },
    /// An identity reference does not refer to a previously deserialized object
    #[error("unresolved object reference '{id}' at {location}")]
    UnresolvedReference {
        /// The referenced id
        id: String,
        /// Location of the reference
        location: JsonPosition,
    },
    /// The root value is not wrapped as expected
    #[error("{message} at {location}")]
    RootWrap {
        /// Describes the mismatch
        message: String,
        /// Location of the mismatch
        location: JsonPosition,
    },
    /// Inline type information was requested for a subtype which is not a bean
    #[error("subtype '{discriminator}' of {base} is not a bean and cannot use inline type information at {location}")]
    UnsupportedInlineTarget {
        /// Discriminator of the subtype
        discriminator: String,
        /// Name of the base type
        base: String,
        /// Location of the discriminator
        location: JsonPosition,
    },
    /// A bean could not be created from the deserialized properties
    #[error("cannot create {bean}: {message} at {location}")]
    Bean {
        /// Name of the bean
        bean: String,
        /// Describes why creation failed
        message: String,
        /// Location of the end of the bean object
        location: JsonPosition,
    },
}

impl DeserializationError {
    /// Location where the error occurred
    pub fn location(&self) -> &JsonPosition {
        match self {
            DeserializationError::Reader(e) => e.location(),
            DeserializationError::Value { location, .. }
            | DeserializationError::KeyFormat { location, .. }
            | DeserializationError::UnknownProperty { location, .. }
            | DeserializationError::UnknownSubtype { location, .. }
            | DeserializationError::MissingTypeDiscriminator { location, .. }
            | DeserializationError::UnresolvedReference { location, .. }
            | DeserializationError::RootWrap { location, .. }
            | DeserializationError::UnsupportedInlineTarget { location, .. }
            | DeserializationError::Bean { location, .. } => location,
        }
    }

    /// Creates a [`Value`](Self::Value) error at the current position of the reader
    pub fn value(
        reader: &dyn JsonReader,
        target: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DeserializationError::Value {
            target,
            value: value.into(),
            message: message.into(),
            location: reader.current_position(true),
        }
    }
}

/// Error which occurred while serializing a value
#[non_exhaustive]
#[derive(Error, Clone, PartialEq, Debug)]
pub enum SerializationError {
    /// The writer rejected a value, for example a non-finite number
    #[error(transparent)]
    Writer(#[from] WriterError),
    /// A value of a polymorphic type matches none of the registered subtypes
    #[error("value of {base} matches no registered subtype at {location}")]
    UnknownSubtype {
        /// Name of the base type
        base: String,
        /// Location where the value would have been written
        location: JsonPosition,
    },
    /// Inline type information was requested for a subtype which is not a bean
    #[error("subtype '{discriminator}' of {base} is not a bean and cannot use inline type information at {location}")]
    UnsupportedInlineTarget {
        /// Discriminator of the subtype
        discriminator: String,
        /// Name of the base type
        base: String,
        /// Location where the value would have been written
        location: JsonPosition,
    },
    /// Any other failure while converting a value
    #[error("cannot serialize {value_type}: {message} at {location}")]
    Custom {
        /// Name of the type of the value
        value_type: &'static str,
        /// Describes why serialization failed
        message: String,
        /// Location where the value would have been written
        location: JsonPosition,
    },
}

impl SerializationError {
    /// Location where the error occurred
    pub fn location(&self) -> &JsonPosition {
        match self {
            SerializationError::Writer(e) => e.location(),
            SerializationError::UnknownSubtype { location, .. }
            | SerializationError::UnsupportedInlineTarget { location, .. }
            | SerializationError::Custom { location, .. } => location,
        }
    }

    /// Creates a [`Custom`](Self::Custom) error at the current position of the writer
    pub fn custom<T: ?Sized>(writer: &dyn JsonWriter, message: impl Into<String>) -> Self {
        SerializationError::Custom {
            value_type: std::any::type_name::<T>(),
            message: message.into(),
            location: writer.current_position(),
        }
    }
}
