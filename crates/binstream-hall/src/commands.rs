//! Routing command identifiers.
//!
//! The pair (main, sub) travels in the transport framing and selects a
//! handler on the server.  It is never part of the encoded message body.

use thiserror::Error;

/// Returned when a raw command value has no matching variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} command: {value}")]
pub struct UnknownCommand {
    pub kind: &'static str,
    pub value: u16,
}

/// Top-level service a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MainCmd {
    Lobby = 0x0001,
}

impl TryFrom<u16> for MainCmd {
    type Error = UnknownCommand;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(MainCmd::Lobby),
            _ => Err(UnknownCommand { kind: "main", value }),
        }
    }
}

/// Operations within [`MainCmd::Lobby`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum LobbySubCmd {
    /// Binary codec self-test carrying a nested struct.
    TestBinary = 0x0064,
    /// Binary codec self-test carrying one field of every wire type.
    TestScalars = 0x0065,
}

impl TryFrom<u16> for LobbySubCmd {
    type Error = UnknownCommand;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0064 => Ok(LobbySubCmd::TestBinary),
            0x0065 => Ok(LobbySubCmd::TestScalars),
            _ => Err(UnknownCommand {
                kind: "lobby sub",
                value,
            }),
        }
    }
}
