//! # binstream-core
//!
//! Declarative binary message codec.  A message type declares its fields, in
//! order, with a wire type for each; the codec walks that declaration to turn
//! an instance into bytes and bytes back into an instance.
//!
//! The crate performs no I/O.  Transport framing, routing by command ID, and
//! schema versioning belong to the caller.
//!
//! - **`protocol`** – cursors, scalar and composite codecs, the schema
//!   registry, and the [`Message`] envelope.
//! - **`config`** – limits applied by a [`Codec`].
//!
//! All numbers are little-endian; text, array and map prefixes are `u16`.

pub mod config;
pub mod protocol;

pub use config::{CodecConfig, ConfigError};
pub use protocol::{
    Codec, CodecError, Fields, FromValue, Message, Result, Route, Schema, SchemaBuilder,
    SchemaRegistry, StructType, ToValue, Value, WireStruct, WireType,
};
