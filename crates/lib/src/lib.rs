//!
//! Trellis: shared, ordered, multi-parent trees on top of an atomic store.
//!
//! A collection is a set of nodes joined by child-edges. Every node keeps an
//! ordered list of children and an unordered set of parents, so one node may
//! appear under several unrelated parents at once. The library keeps those two
//! views in lock-step, refuses any edge that would make a node its own
//! descendant, and deletes nodes once their last parent edge is gone.
//!
//! ## Core Concepts
//!
//! * **TreeEngine (`tree::TreeEngine`)**: The typed client API. Holds no tree state; every call is one round trip to an executor.
//! * **AtomicExecutor (`backend::AtomicExecutor`)**: A store that runs each tree operation as one indivisible unit:
//!     * **InMemory (`backend::database::InMemory`)**: Per-collection locks over in-process state, with optional JSON persistence.
//!     * **SqlxBackend (`backend::database::SqlxBackend`)**: SQLite or PostgreSQL, one transaction per operation (requires the "sqlite" or "postgres" feature).
//!     * **HttpBackend (`backend::remote::HttpBackend`)**: Forwards operations to a server running any other executor (requires the "remote" feature).
//! * **Codec (`codec`)**: The primitive argument and reply shapes exchanged with an executor.
//! * **Forest (`forest::Forest`)**: One collection's nodes and edges as executors hold them while an operation runs.
//! * **Scripts (`script`)**: The body of every operation, written once against a `Forest` and shared by all executors.

pub mod backend;
pub mod codec;
pub mod forest;
pub mod script;
pub mod tree;

/// Re-export the `TreeEngine` struct for easier access.
pub use tree::TreeEngine;

/// Result type used throughout the Trellis library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Trellis library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured store errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured wire errors from the codec module
    #[error(transparent)]
    Codec(codec::CodecError),

    /// Structured tree operation errors from the tree module
    #[error(transparent)]
    Tree(tree::TreeError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Backend(_) => "backend",
            Error::Codec(_) => "codec",
            Error::Tree(_) => "tree",
        }
    }

    /// Check if this error means the store could not be reached or did not
    /// answer in time.
    pub fn is_connectivity_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_connectivity_error(),
            _ => false,
        }
    }

    /// Check if this error rejected an unknown operation name.
    pub fn is_unsupported_operation(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_unsupported_operation(),
            _ => false,
        }
    }

    /// Check if this error rejected a malformed argument list.
    pub fn is_invalid_arguments(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_invalid_arguments(),
            _ => false,
        }
    }

    /// Check if this error rejected a mutation that would break a structural
    /// invariant (cycle, duplicate edge, rename collision).
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_invariant_violation(),
            _ => false,
        }
    }

    /// Check if this error rejected a malformed executor reply.
    pub fn is_decode_error(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_decode_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a node, edge, or sibling was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a timeout.
    pub fn is_timeout_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }
}
