use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::NodeId;

/// Content roots already materialised in the tree.
///
/// Directory groups are keyed by path. Package groups are keyed by the archive group they
/// belong to plus the dotted package name, so a package is created once per archive.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    directory_roots: HashMap<PathBuf, NodeId>,
    packages: HashMap<(NodeId, String), NodeId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self, path: &Path) -> Option<NodeId> {
        self.directory_roots.get(path).copied()
    }

    pub fn register_directory(&mut self, path: &Path, node: NodeId) {
        self.directory_roots.insert(path.to_path_buf(), node);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.directory_roots.contains_key(path)
    }

    pub fn package(&self, archive: NodeId, package: &str) -> Option<NodeId> {
        self.packages.get(&(archive, package.to_string())).copied()
    }

    pub fn register_package(&mut self, archive: NodeId, package: &str, node: NodeId) {
        self.packages.insert((archive, package.to_string()), node);
    }

    /// Drops every entry pointing at `node` or keyed under it as an archive.
    pub fn forget(&mut self, node: NodeId) {
        self.directory_roots.retain(|_, n| *n != node);
        self.packages
            .retain(|(archive, _), n| *n != node && *archive != node);
    }

    pub fn directories(&self) -> impl Iterator<Item = (&Path, NodeId)> {
        self.directory_roots.iter().map(|(p, n)| (p.as_path(), *n))
    }

    pub fn len(&self) -> usize {
        self.directory_roots.len() + self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory_roots.is_empty() && self.packages.is_empty()
    }

    pub fn clear(&mut self) {
        self.directory_roots.clear();
        self.packages.clear();
    }
}
