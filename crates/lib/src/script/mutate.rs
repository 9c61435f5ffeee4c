//! Mutating scripts.
//!
//! Each function validates first and mutates second; every early return
//! happens before the forest is touched.

use crate::forest::Forest;
use crate::tree::{MoveMode, MremResult, Placement, TreeError};

/// Adds `parent -> node` and returns the index the child landed at.
pub(super) fn insert(
    forest: &mut Forest,
    parent: &str,
    node: &str,
    placement: &Placement,
) -> Result<usize, TreeError> {
    if parent == node || forest.is_descendant(node, parent) {
        return Err(TreeError::CycleDetected {
            parent: parent.to_string(),
            node: node.to_string(),
        });
    }
    if forest.has_edge(parent, node) {
        return Err(TreeError::DuplicateEdge {
            parent: parent.to_string(),
            node: node.to_string(),
        });
    }

    let len = forest.children(parent).len();
    let index = match placement {
        Placement::Index(index) if *index < 0 => {
            let from_end = index.unsigned_abs().saturating_sub(1);
            len.saturating_sub(usize::try_from(from_end).unwrap_or(usize::MAX))
        }
        Placement::Index(index) => usize::try_from(*index).unwrap_or(usize::MAX).min(len),
        Placement::Before(sibling) => sibling_position(forest, parent, sibling)?,
        Placement::After(sibling) => sibling_position(forest, parent, sibling)? + 1,
    };

    Ok(forest.link(parent, node, index))
}

fn sibling_position(forest: &Forest, parent: &str, sibling: &str) -> Result<usize, TreeError> {
    forest
        .position(parent, sibling)
        .ok_or_else(|| TreeError::SiblingNotFound {
            parent: parent.to_string(),
            sibling: sibling.to_string(),
        })
}

/// Removes `parent -> node`, then cascades if `node` is left without parents.
///
/// `count` is accepted for list-removal compatibility. Edges are unique, so
/// every count removes the single matching edge.
pub(super) fn rem(
    forest: &mut Forest,
    parent: &str,
    count: i64,
    node: &str,
) -> Result<usize, TreeError> {
    if !forest.has_edge(parent, node) {
        return Err(TreeError::EdgeNotFound {
            parent: parent.to_string(),
            node: node.to_string(),
        });
    }
    tracing::trace!(parent, node, count, "removing edge");
    forest.unlink(parent, node);
    Ok(forest.destroy_if_orphaned(node))
}

/// Removes `node` from every parent except `exclude`, then cascades.
pub(super) fn mrem(
    forest: &mut Forest,
    node: &str,
    exclude: Option<&str>,
) -> Result<MremResult, TreeError> {
    if !forest.contains(node) {
        return Err(not_found(node));
    }
    let mut result = MremResult::default();
    for parent in forest.parents(node) {
        if Some(parent.as_str()) != exclude && forest.unlink(&parent, node) {
            result.removed += 1;
        }
    }
    result.destroyed = forest.destroy_if_orphaned(node);
    Ok(result)
}

/// Destroys `node` and whatever it leaves orphaned.
pub(super) fn destroy(forest: &mut Forest, node: &str) -> Result<usize, TreeError> {
    if !forest.contains(node) {
        return Err(not_found(node));
    }
    Ok(forest.destroy(node))
}

/// Relabels `node` as `new_id`. `false` if `node` does not exist.
pub(super) fn rename(forest: &mut Forest, node: &str, new_id: &str) -> Result<bool, TreeError> {
    if !forest.contains(node) {
        return Ok(false);
    }
    if node == new_id {
        return Ok(true);
    }
    if forest.contains(new_id) {
        return Err(TreeError::NameCollision {
            node: node.to_string(),
            new_id: new_id.to_string(),
        });
    }
    forest.rename(node, new_id);
    Ok(true)
}

/// Detaches `node` from all its parents and deletes what that orphans.
pub(super) fn prune(forest: &mut Forest, node: &str) -> bool {
    if !forest.contains(node) {
        return false;
    }
    forest.destroy(node);
    true
}

/// Moves all of `source`'s children under `target`, keeping their order.
///
/// Either every edge moves or none does: each moved child is checked against
/// the target before the first edge is touched.
pub(super) fn move_children(
    forest: &mut Forest,
    source: &str,
    target: &str,
    mode: MoveMode,
) -> Result<usize, TreeError> {
    if source == target {
        return Ok(0);
    }
    let moved = forest.children(source).to_vec();
    if moved.is_empty() {
        return Ok(0);
    }
    if let Some(child) = moved.iter().find(|c| forest.is_descendant(c, target)) {
        return Err(TreeError::CycleDetected {
            parent: target.to_string(),
            node: child.clone(),
        });
    }

    for child in &moved {
        forest.unlink(source, child);
    }
    let mut index = match mode {
        MoveMode::Append => forest.children(target).len(),
        MoveMode::Prepend => 0,
    };
    for child in &moved {
        if forest.has_edge(target, child) {
            continue;
        }
        index = forest.link(target, child, index) + 1;
    }
    Ok(moved.len())
}

fn not_found(node: &str) -> TreeError {
    TreeError::NodeNotFound {
        node: node.to_string(),
    }
}
