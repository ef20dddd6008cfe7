//! Codec configuration.
//!
//! The codec never reads files or environment variables itself; a host
//! application that keeps its settings in TOML hands the relevant table to
//! [`CodecConfig::from_toml_str`]:
//!
//! ```toml
//! max_message_len = 65507   # e.g. one UDP datagram over IPv4
//! allow_trailing_bytes = false
//! ```
//!
//! Every key is optional and falls back to the value in
//! [`CodecConfig::default`], which places no cap on message size.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML content could not be parsed.
    #[error("failed to parse codec config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("invalid codec config: {0}")]
    Invalid(String),
}

/// Limits and strictness applied by [`Codec`](crate::Codec).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodecConfig {
    /// Longest message, in bytes, that may be encoded or decoded.  `None`
    /// leaves the size bounded only by the wire format.
    #[serde(default)]
    pub max_message_len: Option<usize>,
    /// Whether `decode` tolerates unread bytes after the last field.
    #[serde(default)]
    pub allow_trailing_bytes: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_message_len: None,
            allow_trailing_bytes: false,
        }
    }
}

impl CodecConfig {
    /// Parses a config from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML, [`ConfigError::Invalid`] if
    /// `max_message_len` is zero.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig = toml::from_str(text)?;
        if config.max_message_len == Some(0) {
            return Err(ConfigError::Invalid(
                "max_message_len must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
