//! Error type shared by every codec in the crate.

use thiserror::Error;

/// Errors that can occur while building schemas, encoding, or decoding.
///
/// Decode errors are data errors and always recoverable by the caller.
/// [`CodecError::CyclicSchema`] and [`CodecError::DuplicateFieldName`] are
/// raised while a schema is built and indicate a defect in a type's
/// declaration; they should abort registration rather than be retried.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// The stream ended before a field, or the elements of a collection, could be read.
    #[error("truncated input: need {needed} bytes, {available} remaining")]
    TruncatedInput { needed: usize, available: usize },

    /// A text length or collection count prefix exceeds what is left in the buffer.
    #[error("length prefix overflow: declared {declared}, only {remaining} bytes remaining")]
    LengthOverflow { declared: usize, remaining: usize },

    /// Text bytes are not valid UTF-8.
    #[error("invalid text encoding: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// A value does not fit the width it is being encoded to or decoded into.
    #[error("value {value} does not fit {target}")]
    ValueOutOfRange { target: &'static str, value: String },

    /// A struct nests itself, directly or through other structs.
    #[error("cyclic schema: {path}")]
    CyclicSchema { path: String },

    /// Two fields of the same struct share a name.
    #[error("duplicate field name `{field}` in {type_name}")]
    DuplicateFieldName {
        type_name: &'static str,
        field: &'static str,
    },

    /// The value supplied for a field is not the kind its wire type expects.
    #[error("field `{field}` expects {expected}, got {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A declared field has no value.
    #[error("missing value for field `{0}`")]
    MissingField(&'static str),

    /// Bytes remain after the last declared field was decoded.
    #[error("{remaining} trailing bytes after message")]
    TrailingBytes { remaining: usize },

    /// An encoded message is longer than the configured limit.
    #[error("message of {len} bytes exceeds the limit of {max}")]
    MessageTooLarge { len: usize, max: usize },
}

impl CodecError {
    /// Returns `true` if the input ended early, whether at a fixed-width read
    /// or inside a length-prefixed payload.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            CodecError::TruncatedInput { .. } | CodecError::LengthOverflow { .. }
        )
    }

    /// Returns `true` for errors caused by a broken type declaration rather
    /// than by the data being encoded or decoded.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            CodecError::CyclicSchema { .. } | CodecError::DuplicateFieldName { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_kinds() {
        assert!(CodecError::TruncatedInput { needed: 4, available: 1 }.is_truncation());
        assert!(CodecError::LengthOverflow { declared: 9, remaining: 2 }.is_truncation());
        assert!(!CodecError::TrailingBytes { remaining: 1 }.is_truncation());
    }

    #[test]
    fn test_schema_error_kinds() {
        let dup = CodecError::DuplicateFieldName {
            type_name: "Foo",
            field: "a",
        };
        assert!(dup.is_schema_error());
        assert!(CodecError::CyclicSchema { path: "A -> A".into() }.is_schema_error());
        assert!(!CodecError::MissingField("a").is_schema_error());
    }

    #[test]
    fn test_display_includes_context() {
        let err = CodecError::TypeMismatch {
            field: "user",
            expected: "Int8",
            found: "Text",
        };
        assert_eq!(err.to_string(), "field `user` expects Int8, got Text");
    }
}
