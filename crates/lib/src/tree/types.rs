//! Typed arguments and results of tree operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where `insert` places a child among its parent's existing children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Zero-based index, clamped to the valid range. Negative values count
    /// from the end, so `-1` appends.
    Index(i64),
    /// Directly before an existing child of the parent.
    Before(String),
    /// Directly after an existing child of the parent.
    After(String),
}

impl Placement {
    /// Append after the parent's last child.
    pub fn end() -> Self {
        Placement::Index(-1)
    }

    /// Insert ahead of the parent's first child.
    pub fn start() -> Self {
        Placement::Index(0)
    }

    pub fn before(sibling: impl Into<String>) -> Self {
        Placement::Before(sibling.into())
    }

    pub fn after(sibling: impl Into<String>) -> Self {
        Placement::After(sibling.into())
    }
}

impl Default for Placement {
    fn default() -> Self {
        Placement::end()
    }
}

/// Where `move_children` puts the moved children relative to the target's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveMode {
    #[default]
    Append,
    Prepend,
}

/// Options for `children`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChildrenOptions {
    /// How many levels below the node to return. `None` returns the whole
    /// subtree, which costs time proportional to its size.
    pub depth: Option<usize>,
}

impl ChildrenOptions {
    /// Return at most `depth` levels.
    pub fn depth(depth: usize) -> Self {
        Self { depth: Some(depth) }
    }

    /// Return immediate children only.
    pub fn immediate() -> Self {
        Self::depth(1)
    }
}

/// Options for `mrem`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MremOptions {
    /// A parent whose edge to the node is kept.
    pub exclude: Option<String>,
}

impl MremOptions {
    pub fn excluding(parent: impl Into<String>) -> Self {
        Self {
            exclude: Some(parent.into()),
        }
    }
}

/// Snapshot of one node as returned by `children`.
///
/// Snapshots can be as deep as the stored tree, so cloning, comparing,
/// walking and dropping them never recurse.
#[derive(Default)]
pub struct TreeNode {
    /// The node id.
    pub node: String,
    /// Whether the node has any children, even if they were cut off by the
    /// depth bound.
    pub has_child: bool,
    /// Child snapshots in stored order; empty when the depth bound was reached.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Ids of this node's direct child snapshots, in order.
    pub fn child_ids(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.node.as_str()).collect()
    }

    /// Number of nodes in this snapshot, including this one.
    pub fn size(&self) -> usize {
        1 + TreeNode::walk(&self.children).count()
    }

    /// Every node under `nodes` in depth-first preorder, with its level
    /// (0 for the entries of `nodes` themselves).
    pub fn walk(nodes: &[TreeNode]) -> impl Iterator<Item = (usize, &TreeNode)> + '_ {
        let mut stack = vec![nodes.iter()];
        std::iter::from_fn(move || {
            loop {
                let level = stack.len().checked_sub(1)?;
                match stack.last_mut()?.next() {
                    Some(node) => {
                        if !node.children.is_empty() {
                            stack.push(node.children.iter());
                        }
                        return Some((level, node));
                    }
                    None => {
                        stack.pop();
                    }
                }
            }
        })
    }
}

impl Clone for TreeNode {
    fn clone(&self) -> Self {
        let mut builder = TreeBuilder::default();
        builder.push(self.node.clone(), self.has_child, 0);
        for (level, node) in TreeNode::walk(&self.children) {
            builder.push(node.node.clone(), node.has_child, level + 1);
        }
        builder.finish().pop().unwrap_or_default()
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let descendants: Vec<(usize, &str, bool)> = TreeNode::walk(&self.children)
            .map(|(level, n)| (level, n.node.as_str(), n.has_child))
            .collect();
        f.debug_struct("TreeNode")
            .field("node", &self.node)
            .field("has_child", &self.has_child)
            .field("descendants", &descendants)
            .finish()
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        fn rows(node: &TreeNode) -> Vec<(usize, &str, bool)> {
            std::iter::once((0, node))
                .chain(TreeNode::walk(&node.children).map(|(level, n)| (level + 1, n)))
                .map(|(level, n)| (level, n.node.as_str(), n.has_child))
                .collect::<Vec<_>>()
        }
        rows(self) == rows(other)
    }
}

impl Eq for TreeNode {}

impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Rebuilds nested snapshots from nodes given in depth-first preorder.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    roots: Vec<TreeNode>,
    /// The path from a root down to the last node pushed.
    open: Vec<TreeNode>,
}

impl TreeBuilder {
    /// Appends the next node at `level`.
    ///
    /// Returns `false` and ignores the node if `level` is deeper than one
    /// below the previous node.
    pub(crate) fn push(&mut self, node: String, has_child: bool, level: usize) -> bool {
        if level > self.open.len() {
            return false;
        }
        self.close_to(level);
        self.open.push(TreeNode {
            node,
            has_child,
            children: Vec::new(),
        });
        true
    }

    fn close_to(&mut self, level: usize) {
        while self.open.len() > level {
            let Some(done) = self.open.pop() else {
                return;
            };
            match self.open.last_mut() {
                Some(parent) => parent.children.push(done),
                None => self.roots.push(done),
            }
        }
    }

    pub(crate) fn finish(mut self) -> Vec<TreeNode> {
        self.close_to(0);
        self.roots
    }
}

/// Outcome of `mrem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MremResult {
    /// Parent edges that were removed.
    pub removed: usize,
    /// Nodes destroyed by the cascade that followed.
    pub destroyed: usize,
}
