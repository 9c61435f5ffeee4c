//! The stored representation of one collection.
//!
//! A [`Forest`] keeps, for every node, its ordered child list and its
//! parent-set. The child lists are the source of truth; parent-sets are
//! derived from them when a forest is rebuilt from storage and then kept in
//! step by every primitive here, so the two always mirror each other.
//!
//! The primitives do not validate. Operation scripts check every precondition
//! first and only then call into this module, which is what makes a failed
//! operation leave the forest untouched.
//!
//! Every node whose child list or existence changes is recorded as dirty, so
//! executors that write back to external storage only touch those rows.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::Result;
use crate::backend::BackendError;


/// Structural links of a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NodeLinks {
    pub(crate) children: Vec<String>,
    pub(crate) parents: BTreeSet<String>,
}

/// One collection's nodes and edges.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: HashMap<String, NodeLinks>,
    dirty: HashSet<String>,
}

impl Forest {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a forest from its node ids and ordered child lists.
    ///
    /// Nodes named only inside a child list are created as well. The result
    /// starts with no dirty nodes.
    pub fn from_child_lists<N, E>(nodes: N, child_lists: E) -> Self
    where
        N: IntoIterator<Item = String>,
        E: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut forest = Forest::new();
        for id in nodes {
            forest.nodes.entry(id).or_default();
        }
        for (parent, children) in child_lists {
            for child in &children {
                forest
                    .nodes
                    .entry(child.clone())
                    .or_default()
                    .parents
                    .insert(parent.clone());
            }
            forest.nodes.entry(parent).or_default().children = children;
        }
        forest
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Ordered children of `id`; empty if the node does not exist.
    pub fn children(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|links| links.children.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate parents of `id`, in id order; empty if the node does not exist.
    pub fn parents(&self, id: &str) -> Vec<String> {
        self.nodes
            .get(id)
            .map(|links| links.parents.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `parent` holds an edge to `child`.
    pub fn has_edge(&self, parent: &str, child: &str) -> bool {
        self.nodes
            .get(child)
            .is_some_and(|links| links.parents.contains(parent))
    }

    /// Position of `child` in `parent`'s child list.
    pub fn position(&self, parent: &str, child: &str) -> Option<usize> {
        self.children(parent).iter().position(|c| c == child)
    }

    /// All node ids, sorted.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All non-empty child lists keyed by parent.
    pub fn child_lists(&self) -> BTreeMap<String, Vec<String>> {
        self.nodes
            .iter()
            .filter(|(_, links)| !links.children.is_empty())
            .map(|(id, links)| (id.clone(), links.children.clone()))
            .collect()
    }

    /// Whether `node` can be reached from `ancestor` through child edges.
    ///
    /// A node counts as its own descendant. The search walks upwards from
    /// `node` through parent-sets, which are usually far smaller than the
    /// subtree below `ancestor`.
    pub fn is_descendant(&self, ancestor: &str, node: &str) -> bool {
        if ancestor == node {
            return self.contains(node);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([node]);
        while let Some(current) = queue.pop_front() {
            let Some(links) = self.nodes.get(current) else {
                continue;
            };
            for parent in &links.parents {
                if parent == ancestor {
                    return true;
                }
                if seen.insert(parent.as_str()) {
                    queue.push_back(parent.as_str());
                }
            }
        }
        false
    }

    /// Node ids changed since the last call, draining the record.
    pub fn take_dirty(&mut self) -> HashSet<String> {
        std::mem::take(&mut self.dirty)
    }

    /// Creates `id` as a root if it does not exist yet.
    pub(crate) fn ensure(&mut self, id: &str) {
        if !self.nodes.contains_key(id) {
            self.nodes.insert(id.to_string(), NodeLinks::default());
            self.dirty.insert(id.to_string());
        }
    }

    /// Adds the edge `parent -> child` at `index`, clamped to the child list.
    ///
    /// Creates either node if needed. Returns the index used. The caller has
    /// already ruled out duplicates and cycles.
    pub(crate) fn link(&mut self, parent: &str, child: &str, index: usize) -> usize {
        self.ensure(parent);
        self.ensure(child);
        let links = self.nodes.entry(parent.to_string()).or_default();
        let index = index.min(links.children.len());
        links.children.insert(index, child.to_string());
        self.dirty.insert(parent.to_string());
        if let Some(child_links) = self.nodes.get_mut(child) {
            child_links.parents.insert(parent.to_string());
        }
        index
    }

    /// Removes the edge `parent -> child`. Returns whether it existed.
    ///
    /// Never cascades; see `destroy_if_orphaned`.
    pub(crate) fn unlink(&mut self, parent: &str, child: &str) -> bool {
        let removed = match self.nodes.get_mut(parent) {
            Some(links) => match links.children.iter().position(|c| c == child) {
                Some(pos) => {
                    links.children.remove(pos);
                    true
                }
                None => false,
            },
            None => false,
        };
        if removed {
            self.dirty.insert(parent.to_string());
            if let Some(child_links) = self.nodes.get_mut(child) {
                child_links.parents.remove(parent);
            }
        }
        removed
    }

    /// Destroys `id` and every descendant left without parents as a result.
    ///
    /// `id` is first unlinked from all its parents. Descendants that still
    /// have another parent keep their other edges and survive. Returns the
    /// number of nodes removed, `id` included.
    pub(crate) fn destroy(&mut self, id: &str) -> usize {
        let Some(links) = self.nodes.get(id) else {
            return 0;
        };
        let parents: Vec<String> = links.parents.iter().cloned().collect();
        for parent in &parents {
            self.unlink(parent, id);
        }

        let mut destroyed = 0;
        let mut pending = vec![id.to_string()];
        while let Some(current) = pending.pop() {
            let Some(links) = self.nodes.remove(&current) else {
                continue;
            };
            destroyed += 1;
            for child in links.children {
                if let Some(child_links) = self.nodes.get_mut(&child) {
                    child_links.parents.remove(&current);
                    if child_links.parents.is_empty() {
                        pending.push(child);
                    }
                }
            }
            self.dirty.insert(current);
        }
        destroyed
    }

    /// Destroys `id` if it exists and has no parent left.
    pub(crate) fn destroy_if_orphaned(&mut self, id: &str) -> usize {
        match self.nodes.get(id) {
            Some(links) if links.parents.is_empty() => self.destroy(id),
            _ => 0,
        }
    }

    /// Relabels `old` as `new`, keeping every edge and child position.
    ///
    /// The caller has checked that `old` exists and `new` does not.
    pub(crate) fn rename(&mut self, old: &str, new: &str) {
        let Some(links) = self.nodes.remove(old) else {
            return;
        };
        for parent in &links.parents {
            if let Some(parent_links) = self.nodes.get_mut(parent) {
                for child in parent_links.children.iter_mut().filter(|c| *c == old) {
                    *child = new.to_string();
                }
            }
            self.dirty.insert(parent.clone());
        }
        for child in &links.children {
            if let Some(child_links) = self.nodes.get_mut(child) {
                child_links.parents.remove(old);
                child_links.parents.insert(new.to_string());
            }
        }
        self.nodes.insert(new.to_string(), links);
        self.dirty.insert(old.to_string());
        self.dirty.insert(new.to_string());
    }

    /// Verifies every structural invariant of the collection.
    ///
    /// Checks that each child-edge is mirrored by the child's parent-set and
    /// the other way round, that no child list repeats an id or names a
    /// missing node, and that no node is its own descendant.
    pub fn check_integrity(&self) -> Result<()> {
        let corrupt = |reason: String| -> crate::Error { BackendError::CorruptState { reason }.into() };

        for (id, links) in &self.nodes {
            let mut seen = HashSet::new();
            for child in &links.children {
                if !seen.insert(child.as_str()) {
                    return Err(corrupt(format!("{id} lists child {child} twice")));
                }
                match self.nodes.get(child) {
                    None => return Err(corrupt(format!("{id} lists missing child {child}"))),
                    Some(child_links) if !child_links.parents.contains(id) => {
                        return Err(corrupt(format!(
                            "{child} is a child of {id} but {id} is not in its parent-set"
                        )));
                    }
                    Some(_) => {}
                }
            }
            for parent in &links.parents {
                let listed = self
                    .nodes
                    .get(parent)
                    .is_some_and(|p| p.children.iter().any(|c| c == id));
                if !listed {
                    return Err(corrupt(format!(
                        "{parent} is in the parent-set of {id} but does not list it"
                    )));
                }
            }
        }

        if let Some(node) = self.find_cycle() {
            return Err(corrupt(format!("{node} is its own descendant")));
        }
        Ok(())
    }

    /// A node on a child-edge cycle, if there is one.
    fn find_cycle(&self) -> Option<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for start in self.nodes.keys() {
            if marks.contains_key(start.as_str()) {
                continue;
            }
            // (node, index of the next child to visit)
            let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            marks.insert(start.as_str(), Mark::Visiting);
            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let children = self.children(node);
                if top.1 < children.len() {
                    let child = children[top.1].as_str();
                    top.1 += 1;
                    match marks.get(child) {
                        Some(Mark::Visiting) => return Some(child.to_string()),
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(child, Mark::Visiting);
                            stack.push((child, 0));
                        }
                    }
                } else {
                    marks.insert(node, Mark::Done);
                    stack.pop();
                }
            }
        }
        None
    }
}
