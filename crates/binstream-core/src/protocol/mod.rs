pub mod codec;
pub mod cursor;
pub mod error;
pub mod message;
pub mod scalar;
pub mod schema;
pub mod value;

pub use codec::{decode_struct, decode_value, encode_struct, encode_value};
pub use cursor::{ReadCursor, WriteCursor, LENGTH_PREFIX_SIZE, MAX_PREFIXED_LEN};
pub use error::{CodecError, Result};
pub use message::{Codec, Message, Route, WireStruct};
pub use scalar::Scalar;
pub use schema::{FieldDecl, Schema, SchemaBuilder, SchemaRegistry, StructType, WireType};
pub use value::{Fields, FromValue, ToValue, Value};
