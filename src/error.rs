//! Error types for store operations
//!
//! The display strings double as reply texts, so the command layer can turn
//! any `StoreError` straight into an error reply.

use thiserror::Error;

/// Errors returned by typed keyspace operations.
///
/// Every operation validates before it mutates: when one of these is
/// returned, the store is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The key holds a value of another type.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    TypeMismatch,

    /// The stored value (or an argument) does not parse as an i64.
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    /// The stored value (or an argument) does not parse as a finite float.
    #[error("ERR value is not a valid float")]
    NotAFloat,

    /// An integer increment left the i64 range.
    #[error("ERR increment or decrement would overflow")]
    Overflow,

    /// A batch write named the same key twice.
    #[error("ERR duplicate key in batch set")]
    DuplicateKey,

    /// Start/stop indices could not be read as integers.
    #[error("ERR value is not an integer or out of range")]
    InvalidRange,

    /// A string write exceeded the configured maximum length.
    #[error("ERR string exceeds maximum allowed size")]
    ValueTooLarge,

    /// A numeric argument is outside the accepted domain.
    #[error("ERR value is out of range, {0}")]
    OutOfRange(String),

    /// Malformed option list.
    #[error("ERR syntax error")]
    Syntax,

    /// A stream id that is not `ms-seq`, `ms` or `*`.
    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidStreamId,

    /// An explicit stream id not greater than the last one.
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdTooSmall,
}

/// Result alias used across the store.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrongtype_message() {
        assert_eq!(
            StoreError::TypeMismatch.to_string(),
            "WRONGTYPE Operation against a key holding the wrong kind of value"
        );
    }

    #[test]
    fn test_out_of_range_message() {
        let err = StoreError::OutOfRange("must be positive".into());
        assert_eq!(err.to_string(), "ERR value is out of range, must be positive");
    }
}
