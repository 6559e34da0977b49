use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::descriptor::NodeDescriptor;

/// Index of a node inside a [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl Default for NodeId {
    fn default() -> Self {
        NodeId(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Root,
    Directory,
    Package,
    Archive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Label-only node: the tree root, a content directory, a jar or a package inside one.
    Group(GroupKind),
    /// A loaded building block.
    Entity(NodeDescriptor),
}

impl NodeKind {
    pub fn is_entity(&self) -> bool {
        matches!(self, NodeKind::Entity(_))
    }

    pub fn descriptor(&self) -> Option<&NodeDescriptor> {
        match self {
            NodeKind::Entity(d) => Some(d),
            NodeKind::Group(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub label: String,
    pub path: Option<PathBuf>,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// Arena of nodes hanging off a single root group.
///
/// Slots of detached or cleared nodes are left empty; ids are never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub root: NodeId,
    nodes: Vec<Option<TreeNode>>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        let root = NodeId(0);
        Self {
            root,
            nodes: vec![Some(TreeNode {
                id: root,
                parent: None,
                label: "root".to_string(),
                path: None,
                kind: NodeKind::Group(GroupKind::Root),
                children: Vec::new(),
            })],
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0 as usize).and_then(|n| n.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.0 as usize).and_then(|n| n.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Inserts a node as the first child of `parent`. Falls back to the root when `parent`
    /// is no longer live.
    pub fn insert(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        path: Option<PathBuf>,
        kind: NodeKind,
    ) -> NodeId {
        let parent = if self.contains(parent) { parent } else { self.root };
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(Some(TreeNode {
            id,
            parent: Some(parent),
            label: label.into(),
            path,
            kind,
            children: Vec::new(),
        }));
        if let Some(p) = self.get_mut(parent) {
            p.children.insert(0, id);
        }
        id
    }

    /// Unlinks `id` from its parent and drops its whole subtree from the arena.
    /// Returns the removed nodes in pre-order. The root cannot be detached.
    pub fn detach(&mut self, id: NodeId) -> Vec<TreeNode> {
        if id == self.root || !self.contains(id) {
            return Vec::new();
        }
        let parent = self.get(id).and_then(|n| n.parent);
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        let order = self.depth_first(id);
        order
            .into_iter()
            .filter_map(|n| self.nodes.get_mut(n.0 as usize).and_then(Option::take))
            .collect()
    }

    /// Drops every node except the root. Their slots stay behind as tombstones, so ids
    /// handed out before the clear never name a later node.
    pub fn clear(&mut self) {
        for slot in self.nodes.iter_mut().skip(1) {
            *slot = None;
        }
        if let Some(root) = self.get_mut(self.root) {
            root.children.clear();
        }
    }

    /// Pre-order walk starting at (and including) `from`.
    pub fn depth_first(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            out.push(id);
            // reversed so the first child is visited first
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// First entity node, depth-first from the root, whose descriptor resolves to `path`.
    pub fn find_entity_by_path(&self, path: &Path) -> Option<NodeId> {
        self.depth_first(self.root).into_iter().find(|id| {
            self.get(*id)
                .and_then(|n| n.kind.descriptor())
                .and_then(|d| d.canonical_path())
                .is_some_and(|p| p == path)
        })
    }

    /// First group node, depth-first from the root, created for `path`.
    pub fn find_group_by_path(&self, path: &Path) -> Option<NodeId> {
        self.depth_first(self.root).into_iter().find(|id| {
            self.get(*id).is_some_and(|n| {
                matches!(n.kind, NodeKind::Group(_)) && n.path.as_deref() == Some(path)
            })
        })
    }

    pub fn find_child_by_label(&self, parent: NodeId, label: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.get(*c).is_some_and(|n| n.label == label))
    }

    /// Live nodes in arena order, root first.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().filter_map(|n| n.as_ref())
    }

    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &NodeDescriptor)> {
        self.iter()
            .filter_map(|n| n.kind.descriptor().map(|d| (n.id, d)))
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True when nothing hangs off the root.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }
}
