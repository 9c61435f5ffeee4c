//! Persistence operations for the InMemory executor
//!
//! This module handles serialization and file I/O for saving/loading
//! every collection to/from a JSON file. Only child lists and node ids are
//! written; parent-sets are derived again on load.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use super::InMemory;
use crate::backend::BackendError;
use crate::forest::Forest;
use crate::{Error, Result};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// Serializable form of the whole store.
#[derive(Serialize, Deserialize)]
struct SerializableStore {
    /// File format version for compatibility checking
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    collections: BTreeMap<String, SerializableCollection>,
}

#[derive(Serialize, Deserialize)]
struct SerializableCollection {
    /// Every node id, including childless and parentless ones.
    nodes: Vec<String>,
    /// Ordered child lists keyed by parent.
    #[serde(default)]
    children: BTreeMap<String, Vec<String>>,
}

impl From<&Forest> for SerializableCollection {
    fn from(forest: &Forest) -> Self {
        Self {
            nodes: forest.node_ids(),
            children: forest.child_lists(),
        }
    }
}

/// Saves every non-empty collection to `path` as JSON.
///
/// Each collection is copied under its own read lock, so the file holds a
/// consistent state per collection.
pub(crate) async fn save_to_file<P: AsRef<Path>>(store: &InMemory, path: P) -> Result<()> {
    let handles: Vec<(String, Arc<RwLock<Forest>>)> = store
        .collections
        .read()
        .await
        .iter()
        .map(|(name, forest)| (name.clone(), forest.clone()))
        .collect();

    let mut collections = BTreeMap::new();
    for (name, forest) in handles {
        let forest = forest.read().await;
        if !forest.is_empty() {
            collections.insert(name, SerializableCollection::from(&*forest));
        }
    }
    let count = collections.len();

    let serializable = SerializableStore {
        version: PERSISTENCE_VERSION,
        collections,
    };
    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
    tokio::fs::write(path.as_ref(), json)
        .await
        .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })?;

    tracing::info!(path = %path.as_ref().display(), collections = count, "saved in-memory store");
    Ok(())
}

/// Loads the store from a JSON file.
///
/// If the file does not exist, a new, empty store is returned. A collection
/// whose stored edges break a structural invariant fails the whole load with
/// [`BackendError::CorruptState`].
pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(BackendError::FileIo { source: e }.into()),
    };
    let serializable: SerializableStore = serde_json::from_str(&json)
        .map_err(|e| -> Error { BackendError::DeserializationFailed { source: e }.into() })?;

    let mut collections = std::collections::HashMap::new();
    for (name, stored) in serializable.collections {
        let forest = Forest::from_child_lists(stored.nodes, stored.children);
        if let Err(err) = forest.check_integrity() {
            tracing::warn!(collection = %name, error = %err, "rejecting corrupt collection");
            return Err(err);
        }
        collections.insert(name, Arc::new(RwLock::new(forest)));
    }

    tracing::info!(
        path = %path.as_ref().display(),
        collections = collections.len(),
        "loaded in-memory store"
    );
    Ok(InMemory {
        collections: RwLock::new(collections),
    })
}
