//! Codec errors.

use thiserror::Error;

use super::Operation;

/// Errors that occur while translating between typed engine values and the
/// primitive argument/reply shapes an executor understands.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The operation name is not part of the fixed vocabulary.
    #[error("Unsupported operation: {name}")]
    UnsupportedOperation {
        /// The name that was requested
        name: String,
    },

    /// The argument list does not match the operation's argument shape.
    #[error("Invalid arguments for {op}: {reason}")]
    InvalidArguments {
        /// The operation whose arguments were rejected
        op: Operation,
        /// What was wrong with them
        reason: String,
    },

    /// The executor replied with a shape the operation does not produce.
    #[error("Malformed {op} reply: expected {expected}, found {found}")]
    Decode {
        /// The operation whose reply was rejected
        op: Operation,
        /// The shape that was expected
        expected: &'static str,
        /// A description of what arrived instead
        found: String,
    },

    /// A response body that is not valid for its endpoint at all.
    #[error("Malformed {endpoint} response body: {reason}")]
    MalformedBody {
        /// The endpoint that answered
        endpoint: String,
        /// The parser's complaint
        reason: String,
    },
}

impl CodecError {
    /// Check if this error rejected an unknown operation name.
    pub fn is_unsupported_operation(&self) -> bool {
        matches!(self, CodecError::UnsupportedOperation { .. })
    }

    /// Check if this error rejected a malformed reply or response body.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            CodecError::Decode { .. } | CodecError::MalformedBody { .. }
        )
    }

    /// Check if this error rejected a malformed argument list.
    pub fn is_invalid_arguments(&self) -> bool {
        matches!(self, CodecError::InvalidArguments { .. })
    }
}

impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
