//! Backend error types.
//!
//! This module defines structured error types for the stores that execute
//! tree operations, covering connectivity, persistence and storage
//! corruption. Failures of the tree operations themselves are
//! [`TreeError`](crate::tree::TreeError)s, not backend errors.

use thiserror::Error;

/// Errors that can occur while reaching or using a backing store.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Field additions/changes require a major version bump
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// The store could not be reached.
    #[error("Store unreachable at {address}: {reason}")]
    Unreachable {
        /// Address of the store
        address: String,
        /// Description of the connection failure
        reason: String,
    },

    /// The operation did not finish within its deadline.
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        /// The deadline that expired
        duration_ms: u64,
    },

    /// A remote store answered with a failure status.
    #[error("Remote store returned HTTP {status}: {reason}")]
    RemoteStatus {
        /// The HTTP status code
        status: u16,
        /// Body or description returned with it
        reason: String,
    },

    /// SQL backend error from sqlx.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of what failed
        reason: String,
        /// The underlying sqlx error, if any
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Stored state breaks a structural invariant.
    #[error("Corrupt collection state: {reason}")]
    CorruptState {
        /// Which invariant is broken, and where
        reason: String,
    },
}

impl BackendError {
    /// Check if this error means the store could not be used at all.
    pub fn is_connectivity_error(&self) -> bool {
        match self {
            BackendError::Unreachable { .. }
            | BackendError::Timeout { .. }
            | BackendError::RemoteStatus { .. } => true,
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            BackendError::SqlxError { .. } => true,
            _ => false,
        }
    }

    /// Check if this error indicates a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout { .. })
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, BackendError::CorruptState { .. })
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
