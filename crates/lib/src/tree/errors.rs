//! Tree structure errors.
//!
//! These are the failures an atomic operation reports when applying it would
//! break one of the collection's structural invariants, or when it names a
//! node or edge that is not there. They are produced inside the store's atomic
//! unit and are always reported before anything is mutated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by tree operations.
///
/// `TreeError` is serializable so that a remote executor can hand it back to
/// the caller unchanged.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeError {
    /// Adding or moving the edge would make a node its own descendant.
    #[error("Edge {parent} -> {node} would create a cycle")]
    CycleDetected {
        /// The would-be parent
        parent: String,
        /// The would-be child
        node: String,
    },

    /// The parent already holds an edge to this child.
    #[error("Edge {parent} -> {node} already exists")]
    DuplicateEdge {
        /// The parent of the existing edge
        parent: String,
        /// The child of the existing edge
        node: String,
    },

    /// The target id of a rename is already taken.
    #[error("Cannot rename {node} to {new_id}: {new_id} already exists")]
    NameCollision {
        /// The node being renamed
        node: String,
        /// The id that is already in use
        new_id: String,
    },

    /// The named parent -> child edge does not exist.
    #[error("Edge not found: {parent} -> {node}")]
    EdgeNotFound {
        /// The parent of the missing edge
        parent: String,
        /// The child of the missing edge
        node: String,
    },

    /// The named node does not exist in the collection.
    #[error("Node not found: {node}")]
    NodeNotFound {
        /// The missing node id
        node: String,
    },

    /// A `Before`/`After` placement named a sibling the parent does not hold.
    #[error("Sibling {sibling} is not a child of {parent}")]
    SiblingNotFound {
        /// The parent being inserted into
        parent: String,
        /// The sibling that could not be found
        sibling: String,
    },
}

impl TreeError {
    /// Check if this error rejected a mutation that would break an invariant.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            TreeError::CycleDetected { .. }
                | TreeError::DuplicateEdge { .. }
                | TreeError::NameCollision { .. }
        )
    }

    /// Check if this error indicates a node, edge, or sibling was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TreeError::EdgeNotFound { .. }
                | TreeError::NodeNotFound { .. }
                | TreeError::SiblingNotFound { .. }
        )
    }

    /// The node id this error is primarily about.
    pub fn node(&self) -> &str {
        match self {
            TreeError::CycleDetected { node, .. }
            | TreeError::DuplicateEdge { node, .. }
            | TreeError::NameCollision { node, .. }
            | TreeError::EdgeNotFound { node, .. }
            | TreeError::NodeNotFound { node } => node,
            TreeError::SiblingNotFound { sibling, .. } => sibling,
        }
    }
}

impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        crate::Error::Tree(err)
    }
}
