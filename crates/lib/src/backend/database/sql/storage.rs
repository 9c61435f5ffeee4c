//! Loading and writing back collections inside a transaction.
//!
//! Every function here runs on the connection of an open transaction; none of
//! them commits.

use std::collections::BTreeMap;

use sqlx::AnyConnection;

use crate::Result;
use crate::forest::Forest;

use super::SqlxResultExt;

/// Takes the per-collection write lock by bumping the collection's revision.
///
/// On SQLite this is the transaction's first write, so it acquires the
/// database write lock before anything is read. On PostgreSQL it row-locks
/// the collection until commit.
pub(super) async fn lock_collection(conn: &mut AnyConnection, collection: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO tree_collections (collection, revision) VALUES ($1, 1)
         ON CONFLICT (collection) DO UPDATE SET revision = tree_collections.revision + 1",
    )
    .bind(collection)
    .execute(&mut *conn)
    .await
    .sql_context("Failed to lock collection")?;
    Ok(())
}

/// Reads one collection into a [`Forest`].
pub(super) async fn load(conn: &mut AnyConnection, collection: &str) -> Result<Forest> {
    let nodes: Vec<(String,)> = sqlx::query_as(
        "SELECT node_id FROM tree_nodes WHERE collection = $1",
    )
    .bind(collection)
    .fetch_all(&mut *conn)
    .await
    .sql_context("Failed to load nodes")?;

    let edges: Vec<(String, String)> = sqlx::query_as(
        "SELECT parent_id, child_id FROM tree_edges
         WHERE collection = $1
         ORDER BY parent_id, position",
    )
    .bind(collection)
    .fetch_all(&mut *conn)
    .await
    .sql_context("Failed to load edges")?;

    let mut child_lists: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (parent, child) in edges {
        child_lists.entry(parent).or_default().push(child);
    }

    Ok(Forest::from_child_lists(
        nodes.into_iter().map(|(id,)| id),
        child_lists,
    ))
}

/// Writes every dirty node of `forest` back to the collection.
///
/// A dirty node that still exists gets its row upserted and its child list
/// rewritten; one that no longer exists loses its row and outgoing edges.
/// Incoming edges live in the parents' lists, which are dirty as well
/// whenever they changed. Returns the number of nodes written.
pub(super) async fn store(
    conn: &mut AnyConnection,
    collection: &str,
    forest: &mut Forest,
) -> Result<usize> {
    let mut dirty: Vec<String> = forest.take_dirty().into_iter().collect();
    dirty.sort();

    for id in &dirty {
        sqlx::query("DELETE FROM tree_edges WHERE collection = $1 AND parent_id = $2")
            .bind(collection)
            .bind(id.as_str())
            .execute(&mut *conn)
            .await
            .sql_context("Failed to clear child list")?;

        if !forest.contains(id) {
            sqlx::query("DELETE FROM tree_nodes WHERE collection = $1 AND node_id = $2")
                .bind(collection)
                .bind(id.as_str())
                .execute(&mut *conn)
                .await
                .sql_context("Failed to delete node")?;
            continue;
        }

        sqlx::query(
            "INSERT INTO tree_nodes (collection, node_id) VALUES ($1, $2)
             ON CONFLICT (collection, node_id) DO NOTHING",
        )
        .bind(collection)
        .bind(id.as_str())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to store node")?;

        for (position, child) in forest.children(id).iter().enumerate() {
            sqlx::query(
                "INSERT INTO tree_edges (collection, parent_id, child_id, position)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(collection)
            .bind(id.as_str())
            .bind(child.as_str())
            .bind(position as i64)
            .execute(&mut *conn)
            .await
            .sql_context("Failed to store edge")?;
        }
    }

    Ok(dirty.len())
}

/// Collections that currently hold at least one node.
pub(super) async fn collections(conn: &mut AnyConnection) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT collection FROM tree_nodes ORDER BY collection",
    )
    .fetch_all(&mut *conn)
    .await
    .sql_context("Failed to list collections")?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
