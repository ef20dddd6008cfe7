//! # binstream-hall
//!
//! Message catalog for the hall (lobby) service.  Each message declares its
//! field layout through `binstream-core` and carries the command pair an
//! external dispatcher routes on.

pub mod commands;
pub mod messages;

pub use commands::{LobbySubCmd, MainCmd, UnknownCommand};
pub use messages::{LobbyScalarsMessage, TestBinaryMessage, TestData};
