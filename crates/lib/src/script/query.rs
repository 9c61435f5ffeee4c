//! Read-only scripts.

use std::collections::{HashMap, VecDeque};

use crate::codec::{Reply, encode_nodes};
use crate::forest::Forest;

/// Snapshot of `node`'s children, `depth` levels deep, as preorder rows.
///
/// A missing node has no children, so it yields an empty array. The walk
/// keeps its own stack of child lists, so any depth of tree is fine.
pub(super) fn children(forest: &Forest, node: &str, depth: Option<usize>) -> Reply {
    let mut rows = Vec::new();
    if depth == Some(0) {
        return encode_nodes(rows);
    }

    // (child list, index of the next child to emit)
    let mut stack: Vec<(&[String], usize)> = vec![(forest.children(node), 0)];
    while let Some(top) = stack.last_mut() {
        let (siblings, next) = *top;
        let Some(child) = siblings.get(next) else {
            stack.pop();
            continue;
        };
        top.1 += 1;
        let level = stack.len() - 1;
        let grandchildren = forest.children(child);
        rows.push((child.clone(), grandchildren.len(), level));
        if !grandchildren.is_empty() && depth.is_none_or(|d| level + 1 < d) {
            stack.push((grandchildren, 0));
        }
    }
    encode_nodes(rows)
}

/// Shortest route from `from` down to `to`.
///
/// Breadth-first over the ordered child lists, keeping the first discovery of
/// each node, so among equally short routes the one through the lowest child
/// indices wins. Empty when either end is missing or `to` is unreachable.
pub(super) fn path(forest: &Forest, from: &str, to: &str) -> Vec<String> {
    if !forest.contains(from) || !forest.contains(to) {
        return Vec::new();
    }
    if from == to {
        return vec![from.to_string()];
    }

    let mut came_from: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        for child in forest.children(current) {
            let child = child.as_str();
            if child == from || came_from.contains_key(child) {
                continue;
            }
            came_from.insert(child, current);
            if child == to {
                let mut route = vec![to.to_string()];
                let mut step = to;
                while let Some(&prev) = came_from.get(step) {
                    route.push(prev.to_string());
                    step = prev;
                }
                route.reverse();
                return route;
            }
            queue.push_back(child);
        }
    }
    Vec::new()
}
