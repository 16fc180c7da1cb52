#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Allow needless `return` because that makes it sometimes more obvious that
// an expression is the result of the function
#![allow(clippy::needless_return)]
// Allow `assert_eq!(true, ...)` because in some cases it is used to check a bool
// value and not a 'flag' / 'state', and `assert_eq!` makes that more explicit
#![allow(clippy::bool_assert_comparison)]
// Enable 'unused' warnings for doc tests (are disabled by default)
#![doc(test(no_crate_inject))]
#![doc(test(attr(warn(unused))))]
// Fail on warnings in doc tests
#![doc(test(attr(deny(warnings))))]
// When `docsrs` configuration flag is set enable banner for features in documentation
// See https://stackoverflow.com/q/61417452
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Beanson is a typed JSON object mapper whose codecs are resolved ahead of time.
//!
//! Instead of inspecting values at conversion time, every type is converted by a codec which
//! was constructed once, typically by generated code, and which is then shared by all
//! conversions. Codecs only talk to a token-level [`JsonReader`](reader::JsonReader) or
//! [`JsonWriter`](writer::JsonWriter); they never see the JSON text itself.
//!
//! The crate consists of these layers:
//!
//! - [`reader`] and [`writer`]: the token stream
//! - [`codec`]: serializer and deserializer traits, codecs of scalars, dates, arrays,
//!   collections and maps, and the key codecs used for map member names
//! - [`bean`]: codecs of structs ("beans") built from property bindings, plus polymorphic
//!   subtype resolution and object identity tracking
//! - [`context`]: settings and the per-call state threaded through all codecs
//! - [`mapper`]: [`ObjectMapper`](mapper::ObjectMapper), reading and writing complete documents
//! - [`registry`]: [`CodecRegistry`](registry::CodecRegistry), the table from types to codecs
//!
//! # Terminology
//!
//! This crate uses the same terminology as the JSON specification:
//!
//! - *object*: `{ ... }`
//!   - *member*: Entry in an object. For example the JSON object `{"a": 1}` has the member
//!     `"a": 1` where `"a"` is the member *name* and `1` is the member *value*.
//! - *array*: `[ ... ]`
//! - *literal*:
//!   - *boolean*: `true` or `false`
//!   - `null`
//! - *number*: number value, for example `123.4e+10`
//! - *string*: string value, for example `"text in \"quotes\""`
//!
//! Additionally a *bean* is a struct converted from and to a JSON object member by member,
//! and a *discriminator* is the string identifying the concrete subtype of a polymorphic value.
//!
//! # Usage examples
//!
//! ## Mapping a list of numbers
//! ```
//! # use std::sync::Arc;
//! # use beanson::codec::collection::{SequenceDeserializer, SequenceSerializer};
//! # use beanson::codec::scalar::{NumberDeserializer, NumberSerializer};
//! # use beanson::context::SerializerSettings;
//! # use beanson::mapper::ObjectMapper;
//! let mapper = ObjectMapper::<Vec<u64>>::new(
//!     "numbers",
//!     Arc::new(SequenceSerializer::<u64, Vec<u64>>::new(Arc::new(NumberSerializer))),
//!     Arc::new(SequenceDeserializer::<u64, Vec<u64>>::new(Arc::new(NumberDeserializer))),
//! );
//! assert_eq!(vec![1, 2], mapper.read("[1, 2]")?);
//!
//! let settings = SerializerSettings {
//!     write_single_elem_arrays_unwrapped: true,
//!     ..Default::default()
//! };
//! assert_eq!("42", mapper.write_with(&vec![42], &settings)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reading tokens
//! ```
//! # use beanson::reader::*;
//! let json = r#"{"a": [1, true]}"#;
//! let mut json_reader = JsonTextReader::new(json);
//!
//! json_reader.begin_object()?;
//! assert_eq!("a", json_reader.next_name()?);
//!
//! json_reader.begin_array()?;
//! assert_eq!("1", json_reader.next_number_str()?);
//! assert_eq!(true, json_reader.next_bool()?);
//! json_reader.end_array()?;
//!
//! json_reader.end_object()?;
//! // Ensures that there is no trailing data
//! json_reader.consume_trailing_whitespace()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! See the [`bean`] module for converting structs.
//!
//! # Thread safety
//!
//! Codecs, mappers and the registry are immutable after construction and implement `Send` and
//! `Sync`. All mutable state of a conversion, such as the identity tables, lives in the
//! [`SerializationContext`](context::SerializationContext) or
//! [`DeserializationContext`](context::DeserializationContext) created for each top-level call.
//!
//! # Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events: `debug` when unknown properties
//! are skipped, when a default subtype is used and when a top-level conversion fails, `trace`
//! for object identity references. No subscriber is installed by this crate.

pub mod bean;
pub mod codec;
pub mod context;
pub mod error;
pub mod mapper;
pub mod reader;
pub mod registry;
pub mod writer;

mod json_number;
