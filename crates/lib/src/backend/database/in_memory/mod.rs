//! In-memory executor implementation
//!
//! This module provides an in-memory implementation of the AtomicExecutor
//! trait, suitable for testing, development, single-process deployments, or
//! scenarios where persistence is handled by saving and loading the whole
//! state to a file.

mod persistence;

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::AtomicExecutor;
use crate::codec::{Arg, Command, Operation, Reply};
use crate::forest::Forest;
use crate::script;

/// A simple in-memory executor keeping one [`Forest`] per collection.
///
/// Each collection sits behind its own `RwLock`: mutating operations hold the
/// write lock for the whole script and read operations share the read lock,
/// so no reader ever sees half an edge. Operations on different collections
/// never contend beyond the brief lookup in the outer map.
///
/// It provides basic persistence capabilities via `save_to_file` and
/// `load_from_file`, serializing every collection's child lists to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    collections: RwLock<HashMap<String, Arc<RwLock<Forest>>>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all collections that currently hold nodes, sorted.
    pub async fn collections(&self) -> Vec<String> {
        let collections = self.collections.read().await;
        let mut names = Vec::with_capacity(collections.len());
        for (name, forest) in collections.iter() {
            if !forest.read().await.is_empty() {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }

    /// A consistent copy of one collection, taken under its read lock.
    ///
    /// A collection that was never written to comes back empty.
    pub async fn snapshot(&self, collection: &str) -> Forest {
        match self.get(collection).await {
            Some(forest) => forest.read().await.clone(),
            None => Forest::new(),
        }
    }

    /// Saves every collection to `path` as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads a store previously written by [`save_to_file`](Self::save_to_file).
    ///
    /// If the file does not exist, a new, empty store is returned. Every
    /// loaded collection is checked for structural integrity.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }

    async fn get(&self, collection: &str) -> Option<Arc<RwLock<Forest>>> {
        self.collections.read().await.get(collection).cloned()
    }

    async fn get_or_create(&self, collection: &str) -> Arc<RwLock<Forest>> {
        if let Some(forest) = self.get(collection).await {
            return forest;
        }
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Forest::new())))
            .clone()
    }

    /// Drops an empty collection from the map unless another task still holds it.
    ///
    /// Handles are only cloned under the map lock, so while it is held
    /// exclusively the strong count cannot grow.
    async fn remove_if_unused(&self, collection: &str, forest: Arc<RwLock<Forest>>) {
        let mut collections = self.collections.write().await;
        let unused = collections
            .get(collection)
            .is_some_and(|current| Arc::ptr_eq(current, &forest))
            && Arc::strong_count(&forest) == 2
            && forest.try_read().is_ok_and(|f| f.is_empty());
        if unused {
            collections.remove(collection);
        }
    }
}

#[async_trait]
impl AtomicExecutor for InMemory {
    async fn execute_op(&self, op: Operation, collection: &str, args: &[Arg]) -> Result<Reply> {
        let command = Command::decode(op, args)?;

        if !op.is_mutating() {
            return match self.get(collection).await {
                Some(forest) => script::run_read(&*forest.read().await, &command),
                None => script::run_read(&Forest::new(), &command),
            };
        }

        let forest = self.get_or_create(collection).await;
        let (result, now_empty) = {
            let mut guard = forest.write().await;
            let result = script::run(&mut guard, command);
            // Nothing is written back, so the dirty record is only drained.
            guard.take_dirty();
            (result, guard.is_empty())
        };
        if now_empty {
            self.remove_if_unused(collection, forest).await;
        }
        result
    }

    fn kind(&self) -> &'static str {
        "inmemory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
