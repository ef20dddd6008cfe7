//! Lobby messages.
//!
//! Wire layouts (little-endian, no framing):
//!
//! ```text
//! TestBinaryMessage   [user.value32:f32][user.value64:f64]                 = 12 bytes
//! LobbyScalarsMessage [value32:f32][value64:f64][int8][int16][int32]
//!                     [uint8][uint16][uint32][str:len16+utf8]
//!                     [arr:count16+i8...][testMap:count16+(text,i32)...]
//! ```

use binstream_core::{Fields, Message, Result, SchemaBuilder, Value, WireStruct, WireType};

use crate::commands::{LobbySubCmd, MainCmd};

// ── TestData ──────────────────────────────────────────────────────────────────

/// Pair of floats nested inside [`TestBinaryMessage`].
#[derive(Debug, Clone, PartialEq)]
pub struct TestData {
    pub value32: f32,
    pub value64: f64,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            value32: 32.0,
            value64: 64.0,
        }
    }
}

impl WireStruct for TestData {
    fn declare(schema: &mut SchemaBuilder) {
        schema
            .field("value32", WireType::Float32)
            .field("value64", WireType::Float64);
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("value32", &self.value32)
            .with("value64", &self.value64)
    }

    fn from_fields(mut fields: Fields) -> Result<Self> {
        Ok(TestData {
            value32: fields.take("value32")?,
            value64: fields.take("value64")?,
        })
    }
}

// ── TestBinaryMessage ─────────────────────────────────────────────────────────

/// LOBBY / TEST_BINARY: exercises a nested struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestBinaryMessage {
    pub user: TestData,
}

impl WireStruct for TestBinaryMessage {
    fn declare(schema: &mut SchemaBuilder) {
        schema.field("user", WireType::nested::<TestData>());
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("user", Value::from_struct(&self.user));
        fields
    }

    fn from_fields(mut fields: Fields) -> Result<Self> {
        Ok(TestBinaryMessage {
            user: fields.take_struct("user")?,
        })
    }
}

impl Message for TestBinaryMessage {
    const MAIN_COMMAND: u16 = MainCmd::Lobby as u16;
    const SUB_COMMAND: u16 = LobbySubCmd::TestBinary as u16;
}

// ── LobbyScalarsMessage ───────────────────────────────────────────────────────

/// LOBBY / TEST_SCALARS: one field of every wire type.
#[derive(Debug, Clone, PartialEq)]
pub struct LobbyScalarsMessage {
    pub value32: f32,
    pub value64: f64,
    pub int8: i8,
    pub int16: i16,
    pub int32: i32,
    pub uint8: u8,
    pub uint16: u16,
    pub uint32: u32,
    /// Declared as `str`.
    pub text: String,
    pub arr: Vec<i8>,
    /// Declared as `testMap`.  Kept in insertion order, which is also wire
    /// order.
    pub test_map: Vec<(String, i32)>,
}

impl Default for LobbyScalarsMessage {
    fn default() -> Self {
        Self {
            value32: 32.0,
            value64: 64.0,
            int8: 18,
            int16: 116,
            int32: 132,
            uint8: 8,
            uint16: 16,
            uint32: 32,
            text: "这只是一个测试，你没看错".to_string(),
            arr: vec![1, 2, 3, 4, 5, 6],
            test_map: vec![
                ("keyy_1".to_string(), 1),
                ("keyy_2".to_string(), 2),
                ("keyy_3".to_string(), 2),
                ("keyy_4".to_string(), 4),
                ("keyy_5".to_string(), 5),
            ],
        }
    }
}

impl WireStruct for LobbyScalarsMessage {
    fn declare(schema: &mut SchemaBuilder) {
        schema
            .field("value32", WireType::Float32)
            .field("value64", WireType::Float64)
            .field("int8", WireType::Int8)
            .field("int16", WireType::Int16)
            .field("int32", WireType::Int32)
            .field("uint8", WireType::UInt8)
            .field("uint16", WireType::UInt16)
            .field("uint32", WireType::UInt32)
            .field("str", WireType::Text)
            .field("arr", WireType::array(WireType::Int8))
            .field("testMap", WireType::map(WireType::Text, WireType::Int32));
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new()
            .with("value32", &self.value32)
            .with("value64", &self.value64)
            .with("int8", &self.int8)
            .with("int16", &self.int16)
            .with("int32", &self.int32)
            .with("uint8", &self.uint8)
            .with("uint16", &self.uint16)
            .with("uint32", &self.uint32)
            .with("str", &self.text)
            .with("arr", &self.arr);
        fields.insert(
            "testMap",
            Value::map(self.test_map.iter().map(|(k, v)| (k, v))),
        );
        fields
    }

    fn from_fields(mut fields: Fields) -> Result<Self> {
        Ok(LobbyScalarsMessage {
            value32: fields.take("value32")?,
            value64: fields.take("value64")?,
            int8: fields.take("int8")?,
            int16: fields.take("int16")?,
            int32: fields.take("int32")?,
            uint8: fields.take("uint8")?,
            uint16: fields.take("uint16")?,
            uint32: fields.take("uint32")?,
            text: fields.take("str")?,
            arr: fields.take("arr")?,
            test_map: fields.take_entries("testMap")?,
        })
    }
}

impl Message for LobbyScalarsMessage {
    const MAIN_COMMAND: u16 = MainCmd::Lobby as u16;
    const SUB_COMMAND: u16 = LobbySubCmd::TestScalars as u16;
}
