//! Message envelope: the contract every wire message implements, and the
//! [`Codec`] that drives encoding and decoding.

use std::fmt;

use tracing::trace;

use crate::config::CodecConfig;
use crate::protocol::codec::{decode_struct, encode_struct};
use crate::protocol::cursor::{ReadCursor, WriteCursor};
use crate::protocol::error::{CodecError, Result};
use crate::protocol::schema::{SchemaBuilder, SchemaRegistry};
use crate::protocol::value::Fields;

/// A type with a declared field layout.  May be sent on its own as part of a
/// [`Message`] or nested inside another struct.
///
/// # Examples
///
/// ```rust
/// use binstream_core::{Fields, Result, SchemaBuilder, WireStruct, WireType};
///
/// struct Point {
///     x: i16,
///     y: i16,
/// }
///
/// impl WireStruct for Point {
///     fn declare(schema: &mut SchemaBuilder) {
///         schema.field("x", WireType::Int16).field("y", WireType::Int16);
///     }
///
///     fn to_fields(&self) -> Fields {
///         Fields::new().with("x", &self.x).with("y", &self.y)
///     }
///
///     fn from_fields(mut fields: Fields) -> Result<Self> {
///         Ok(Point { x: fields.take("x")?, y: fields.take("y")? })
///     }
/// }
/// ```
pub trait WireStruct: Sized + 'static {
    /// Declares the fields in wire order.  Called once per process.
    fn declare(schema: &mut SchemaBuilder);

    /// Current field values, keyed by declared name.
    fn to_fields(&self) -> Fields;

    /// Rebuilds an instance from decoded field values.
    fn from_fields(fields: Fields) -> Result<Self>;
}

/// Routing identifiers an external dispatcher uses to pick a handler.
///
/// They travel in the transport framing, not in the encoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub main_command: u16,
    pub sub_command: u16,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_command, self.sub_command)
    }
}

/// A top-level wire message.
pub trait Message: WireStruct {
    const MAIN_COMMAND: u16;
    const SUB_COMMAND: u16;

    fn main_command(&self) -> u16 {
        Self::MAIN_COMMAND
    }

    fn sub_command(&self) -> u16 {
        Self::SUB_COMMAND
    }

    fn route(&self) -> Route {
        Route {
            main_command: Self::MAIN_COMMAND,
            sub_command: Self::SUB_COMMAND,
        }
    }

    /// Encodes the message body with the default [`Codec`].
    fn encode(&self) -> Result<Vec<u8>> {
        Codec::default().encode(self)
    }

    /// Decodes a message body with the default [`Codec`].
    fn decode(bytes: &[u8]) -> Result<Self> {
        Codec::default().decode(bytes)
    }
}

// ── Codec ─────────────────────────────────────────────────────────────────────

/// Encodes and decodes [`WireStruct`] values under a [`CodecConfig`].
///
/// Encoding is deterministic: equal field values always yield identical bytes.
/// Decoding either returns a fully populated value or an error, never a
/// partial value.
#[derive(Debug, Clone)]
pub struct Codec<'r> {
    config: CodecConfig,
    registry: &'r SchemaRegistry,
}

impl Codec<'static> {
    /// A codec backed by the process-wide schema registry.
    pub fn new(config: CodecConfig) -> Self {
        Self::with_registry(config, SchemaRegistry::global())
    }
}

impl Default for Codec<'static> {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl<'r> Codec<'r> {
    pub fn with_registry(config: CodecConfig, registry: &'r SchemaRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encodes `value` into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Any schema error for `T`, [`CodecError::ValueOutOfRange`],
    /// [`CodecError::TypeMismatch`] or [`CodecError::MissingField`] for bad
    /// field values, and [`CodecError::MessageTooLarge`] past the configured
    /// limit.  No bytes are returned on failure.
    pub fn encode<T: WireStruct>(&self, value: &T) -> Result<Vec<u8>> {
        let schema = self.registry.schema_of::<T>()?;
        let mut out = WriteCursor::with_capacity(schema.min_encoded_len());
        encode_struct(self.registry, &schema, value.to_fields(), &mut out)?;

        let bytes = out.into_inner();
        self.check_size(bytes.len())?;
        trace!("encoded {} in {} bytes", schema.type_name(), bytes.len());
        Ok(bytes)
    }

    /// Decodes exactly one `T` from `bytes`.
    ///
    /// # Errors
    ///
    /// Truncation and encoding errors from the field codecs, and
    /// [`CodecError::TrailingBytes`] if input remains after the last field
    /// (unless the config allows it).
    pub fn decode<T: WireStruct>(&self, bytes: &[u8]) -> Result<T> {
        self.check_size(bytes.len())?;
        let (value, consumed) = self.decode_prefix(bytes)?;
        let remaining = bytes.len() - consumed;
        if remaining > 0 && !self.config.allow_trailing_bytes {
            return Err(CodecError::TrailingBytes { remaining });
        }
        Ok(value)
    }

    /// Decodes one `T` from the start of `bytes` and reports how many bytes
    /// it used, so the caller can continue with the next message.
    pub fn decode_prefix<T: WireStruct>(&self, bytes: &[u8]) -> Result<(T, usize)> {
        let schema = self.registry.schema_of::<T>()?;
        let mut cursor = ReadCursor::new(bytes);
        let fields = decode_struct(self.registry, &schema, &mut cursor)?;
        let consumed = cursor.position();
        self.check_size(consumed)?;
        trace!("decoded {} from {} bytes", schema.type_name(), consumed);
        Ok((T::from_fields(fields)?, consumed))
    }

    fn check_size(&self, len: usize) -> Result<()> {
        match self.config.max_message_len {
            Some(max) if len > max => Err(CodecError::MessageTooLarge { len, max }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::schema::WireType;

    #[derive(Debug, Clone, PartialEq)]
    struct Login {
        account: String,
        level: u8,
    }

    impl WireStruct for Login {
        fn declare(schema: &mut SchemaBuilder) {
            schema
                .field("account", WireType::Text)
                .field("level", WireType::UInt8);
        }

        fn to_fields(&self) -> Fields {
            Fields::new()
                .with("account", &self.account)
                .with("level", &self.level)
        }

        fn from_fields(mut fields: Fields) -> Result<Self> {
            Ok(Login {
                account: fields.take("account")?,
                level: fields.take("level")?,
            })
        }
    }

    impl Message for Login {
        const MAIN_COMMAND: u16 = 3;
        const SUB_COMMAND: u16 = 7;
    }

    fn login() -> Login {
        Login {
            account: "guest".to_string(),
            level: 9,
        }
    }

    #[test]
    fn test_route_accessors() {
        let msg = login();
        assert_eq!(msg.main_command(), 3);
        assert_eq!(msg.sub_command(), 7);
        assert_eq!(msg.route().to_string(), "3/7");
    }

    #[test]
    fn test_routing_ids_are_not_encoded() {
        let bytes = login().encode().unwrap();
        assert_eq!(bytes, vec![0x05, 0x00, b'g', b'u', b'e', b's', b't', 0x09]);
    }

    #[test]
    fn test_round_trip() {
        let msg = login();
        assert_eq!(Login::decode(&msg.encode().unwrap()).unwrap(), msg);
    }

    #[test]
    fn test_trailing_bytes_rejected_by_default() {
        let mut bytes = login().encode().unwrap();
        bytes.push(0xAA);
        assert_eq!(
            Login::decode(&bytes),
            Err(CodecError::TrailingBytes { remaining: 1 })
        );
    }

    #[test]
    fn test_trailing_bytes_allowed_by_config() {
        let codec = Codec::new(CodecConfig {
            allow_trailing_bytes: true,
            ..CodecConfig::default()
        });
        let mut bytes = login().encode().unwrap();
        bytes.extend_from_slice(&[1, 2, 3]);
        assert_eq!(codec.decode::<Login>(&bytes).unwrap(), login());
    }

    #[test]
    fn test_decode_prefix_reports_consumed_bytes() {
        let first = login();
        let second = Login {
            account: "admin".to_string(),
            level: 1,
        };
        let mut stream = first.encode().unwrap();
        let first_len = stream.len();
        stream.extend(second.encode().unwrap());

        let codec = Codec::default();
        let (a, n) = codec.decode_prefix::<Login>(&stream).unwrap();
        assert_eq!((a, n), (first, first_len));
        let (b, m) = codec.decode_prefix::<Login>(&stream[n..]).unwrap();
        assert_eq!(b, second);
        assert_eq!(n + m, stream.len());
    }

    #[test]
    fn test_message_too_large_on_encode_and_decode() {
        let codec = Codec::new(CodecConfig {
            max_message_len: Some(4),
            ..CodecConfig::default()
        });
        assert_eq!(
            codec.encode(&login()),
            Err(CodecError::MessageTooLarge { len: 8, max: 4 })
        );
        let bytes = login().encode().unwrap();
        assert_eq!(
            codec.decode::<Login>(&bytes),
            Err(CodecError::MessageTooLarge { len: 8, max: 4 })
        );
    }

    #[test]
    fn test_private_registry_starts_cold() {
        let registry = SchemaRegistry::new();
        let codec = Codec::with_registry(CodecConfig::default(), &registry);
        assert!(registry.is_empty());
        codec.encode(&login()).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
