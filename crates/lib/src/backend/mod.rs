//! Backends that execute tree operations atomically.
//!
//! This module provides the [`AtomicExecutor`] trait and its implementations,
//! organized by category (local databases, remote stores).
//!
//! An executor receives an operation name, a collection key and an ordered
//! argument list, runs the matching operation script as one indivisible unit
//! against its stored representation of the collection, and returns a
//! primitive [`Reply`]. No caller ever observes a child list updated without
//! the matching parent-set update; how that is guaranteed is up to the
//! executor (a lock for the in-memory store, a transaction for SQL, the
//! server's own executor for a remote store).

use std::any::Any;

use async_trait::async_trait;

use crate::Result;
use crate::codec::{Arg, Operation, Reply};

// Category modules
pub mod database;
#[cfg(feature = "remote")]
pub mod remote;

mod errors;

pub use errors::BackendError;

/// A store that executes tree operations as single atomic units.
///
/// All executors must be `Send` and `Sync` so one instance can be shared by
/// every engine and task, and implement `Any` to allow downcasting to the
/// concrete store (for persistence or inspection).
#[async_trait]
pub trait AtomicExecutor: Send + Sync + Any {
    /// Runs `op` against `collection` as one atomic unit.
    ///
    /// Structural failures come back as [`TreeError`](crate::tree::TreeError)s
    /// and leave the collection untouched.
    async fn execute_op(&self, op: Operation, collection: &str, args: &[Arg]) -> Result<Reply>;

    /// Runs the operation called `name`.
    ///
    /// Unknown names fail with
    /// [`CodecError::UnsupportedOperation`](crate::codec::CodecError) before
    /// the store is contacted.
    async fn execute(&self, name: &str, collection: &str, args: &[Arg]) -> Result<Reply> {
        let op: Operation = name.parse()?;
        self.execute_op(op, collection, args).await
    }

    /// Short label of the store kind, for logs and health reports.
    fn kind(&self) -> &'static str;

    /// Returns a reference to the executor as a dynamic `Any` type.
    fn as_any(&self) -> &dyn Any;
}
