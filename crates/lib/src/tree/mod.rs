//! The tree engine: typed operations over shared, ordered, multi-parent trees.
//!
//! A [`TreeEngine`] holds no tree state of its own. Every call encodes its
//! typed arguments into a primitive argument list, hands it to the
//! [`AtomicExecutor`] in a single round trip, and decodes the primitive reply
//! back into a typed result. Many engines may share one executor and one
//! collection; consistency is the executor's job, not the caller's.
//!
//! ```no_run
//! # async fn example() -> trellis::Result<()> {
//! use std::sync::Arc;
//! use trellis::backend::database::InMemory;
//! use trellis::tree::{Placement, TreeEngine};
//!
//! let engine = TreeEngine::new(Arc::new(InMemory::new()));
//! engine.insert("docs", "root", "intro", Placement::end()).await?;
//! engine.insert("docs", "root", "setup", Placement::before("intro")).await?;
//! assert_eq!(engine.parents("docs", "intro").await?, vec!["root"]);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::backend::{AtomicExecutor, BackendError};
use crate::codec::{
    Command, Reply, decode_bool, decode_count, decode_mrem, decode_nodes, decode_position,
    decode_strings,
};

mod errors;
mod types;

pub use errors::TreeError;
pub use types::{ChildrenOptions, MoveMode, MremOptions, MremResult, Placement, TreeNode};
pub(crate) use types::TreeBuilder;

/// Client-side facade over an [`AtomicExecutor`].
///
/// Cloning is cheap and clones share the executor.
#[derive(Clone)]
pub struct TreeEngine {
    executor: Arc<dyn AtomicExecutor>,
    timeout: Option<Duration>,
}

impl TreeEngine {
    /// Creates an engine with no deadline on its calls.
    pub fn new(executor: Arc<dyn AtomicExecutor>) -> Self {
        Self {
            executor,
            timeout: None,
        }
    }

    /// Bounds every call to `timeout`.
    ///
    /// A call that runs out of time fails with [`BackendError::Timeout`] and
    /// is cancelled; the executor rolls back whatever it had started.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The executor this engine dispatches to.
    pub fn executor(&self) -> &Arc<dyn AtomicExecutor> {
        &self.executor
    }

    /// Adds the edge `parent -> node` and returns the index `node` landed at.
    ///
    /// Both nodes are created if absent. Fails without mutating anything if
    /// the edge exists already or would close a cycle.
    pub async fn insert(
        &self,
        collection: &str,
        parent: &str,
        node: &str,
        placement: Placement,
    ) -> Result<usize> {
        let command = Command::Insert {
            parent: parent.to_string(),
            node: node.to_string(),
            placement,
        };
        let op = command.op();
        Ok(decode_position(op, self.dispatch(collection, command).await?)?)
    }

    /// Nested snapshots of `node`'s children, in stored order.
    ///
    /// A missing node yields an empty list. Without a depth bound the whole
    /// subtree is returned, which costs time proportional to its size.
    pub async fn children(
        &self,
        collection: &str,
        node: &str,
        options: ChildrenOptions,
    ) -> Result<Vec<TreeNode>> {
        let command = Command::Children {
            node: node.to_string(),
            depth: options.depth,
        };
        Ok(decode_nodes(self.dispatch(collection, command).await?)?)
    }

    /// Immediate parents of `node`; empty for a root or a missing node.
    pub async fn parents(&self, collection: &str, node: &str) -> Result<Vec<String>> {
        let command = Command::Parents {
            node: node.to_string(),
        };
        let op = command.op();
        Ok(decode_strings(op, self.dispatch(collection, command).await?)?)
    }

    /// Shortest route from `from` down to `to`, ties going to the lowest
    /// child index. Empty if there is none.
    pub async fn path(&self, collection: &str, from: &str, to: &str) -> Result<Vec<String>> {
        let command = Command::Path {
            from: from.to_string(),
            to: to.to_string(),
        };
        let op = command.op();
        Ok(decode_strings(op, self.dispatch(collection, command).await?)?)
    }

    /// Removes the edge `parent -> node` and returns how many nodes the
    /// resulting cascade destroyed.
    ///
    /// `count` is reserved: edges are unique, so every value removes the one
    /// matching edge.
    pub async fn rem(
        &self,
        collection: &str,
        parent: &str,
        count: i64,
        node: &str,
    ) -> Result<usize> {
        let command = Command::Rem {
            parent: parent.to_string(),
            count,
            node: node.to_string(),
        };
        let op = command.op();
        Ok(decode_count(op, self.dispatch(collection, command).await?)?)
    }

    /// Removes `node` from all its parents except `options.exclude`.
    pub async fn mrem(
        &self,
        collection: &str,
        node: &str,
        options: MremOptions,
    ) -> Result<MremResult> {
        let command = Command::Mrem {
            node: node.to_string(),
            exclude: options.exclude,
        };
        Ok(decode_mrem(self.dispatch(collection, command).await?)?)
    }

    /// Destroys `node` and every descendant left without a parent.
    ///
    /// Returns the number of nodes removed, `node` included.
    pub async fn destroy(&self, collection: &str, node: &str) -> Result<usize> {
        let command = Command::Destroy {
            node: node.to_string(),
        };
        let op = command.op();
        Ok(decode_count(op, self.dispatch(collection, command).await?)?)
    }

    pub async fn exists(&self, collection: &str, node: &str) -> Result<bool> {
        let command = Command::Exists {
            node: node.to_string(),
        };
        let op = command.op();
        Ok(decode_bool(op, self.dispatch(collection, command).await?)?)
    }

    /// Relabels `node` as `new_id` on every edge it takes part in.
    ///
    /// `Ok(false)` if `node` does not exist; [`TreeError::NameCollision`] if
    /// `new_id` is taken.
    pub async fn rename(&self, collection: &str, node: &str, new_id: &str) -> Result<bool> {
        let command = Command::Rename {
            node: node.to_string(),
            new_id: new_id.to_string(),
        };
        let op = command.op();
        Ok(decode_bool(op, self.dispatch(collection, command).await?)?)
    }

    /// Detaches `node` from every parent and deletes what that orphans.
    pub async fn prune(&self, collection: &str, node: &str) -> Result<bool> {
        let command = Command::Prune {
            node: node.to_string(),
        };
        let op = command.op();
        Ok(decode_bool(op, self.dispatch(collection, command).await?)?)
    }

    /// Moves every child of `source` under `target`, all or nothing.
    pub async fn move_children(
        &self,
        collection: &str,
        source: &str,
        target: &str,
        mode: MoveMode,
    ) -> Result<usize> {
        let command = Command::MoveChildren {
            source: source.to_string(),
            target: target.to_string(),
            mode,
        };
        let op = command.op();
        Ok(decode_count(op, self.dispatch(collection, command).await?)?)
    }

    /// One round trip to the executor, under the engine's deadline.
    async fn dispatch(&self, collection: &str, command: Command) -> Result<Reply> {
        let op = command.op();
        let args = command.encode();
        tracing::debug!(collection, %op, backend = self.executor.kind(), "dispatching");

        let call = self.executor.execute_op(op, collection, &args);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(BackendError::Timeout {
                        duration_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    }
                    .into());
                }
            },
            None => call.await,
        };

        if let Err(err) = &result {
            tracing::debug!(collection, %op, error = %err, "operation failed");
        }
        result
    }
}

impl std::fmt::Debug for TreeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeEngine")
            .field("backend", &self.executor.kind())
            .field("timeout", &self.timeout)
            .finish()
    }
}
