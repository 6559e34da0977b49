use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::classify::{ArchiveScanner, Messenger, ModelStatus, NodeClassifier};
use crate::config::LegoConfig;
use crate::drag::{DragObserver, DragPlatform, DragSource, DragState, DragToken};
use crate::model::{NodeId, Tree};
use crate::registry::Registry;
use crate::scan::{self, ScanContext};
use crate::static_classifier::StaticClassifier;

/// The LEGO palette: a tree of building blocks found under content roots.
///
/// Owns the node arena and the registry of materialised roots. Descriptors belong to the
/// class manager; the tree only asks it to unload them when their nodes go away.
pub struct LegoTree {
    tree: Tree,
    registry: Registry,
    config: LegoConfig,
    classifier: Box<dyn NodeClassifier>,
    archives: Box<dyn ArchiveScanner>,
    messenger: Box<dyn Messenger>,
    model: Option<Box<dyn ModelStatus>>,
    selection: Vec<NodeId>,
    drag: DragSource,
}

impl LegoTree {
    pub fn new(
        config: LegoConfig,
        classifier: Box<dyn NodeClassifier>,
        archives: Box<dyn ArchiveScanner>,
        messenger: Box<dyn Messenger>,
    ) -> Self {
        Self {
            tree: Tree::new(),
            registry: Registry::new(),
            config,
            classifier,
            archives,
            messenger,
            model: None,
            selection: Vec::new(),
            drag: DragSource::new(),
        }
    }

    /// Tree backed by a shared [`StaticClassifier`] for both files and archives.
    pub fn with_static_classifier(config: LegoConfig, messenger: Box<dyn Messenger>) -> Self {
        let classifier = Rc::new(RefCell::new(StaticClassifier::new(&config)));
        Self::new(config, Box::new(classifier.clone()), Box::new(classifier), messenger)
    }

    pub fn set_model_status(&mut self, model: Option<Box<dyn ModelStatus>>) {
        self.model = model;
    }

    pub fn set_drag_observer(&mut self, observer: Box<dyn DragObserver>) {
        self.drag.set_observer(observer);
    }

    fn context(&mut self) -> ScanContext<'_> {
        ScanContext {
            tree: &mut self.tree,
            registry: &mut self.registry,
            classifier: &mut *self.classifier,
            archives: &mut *self.archives,
            messenger: &mut *self.messenger,
            model: self.model.as_mut().map(|m| m.as_mut() as &mut dyn ModelStatus),
            config: &self.config,
        }
    }

    pub fn add_content_root(&mut self, path: &Path, recurse: bool) {
        scan::add_content_root(&mut self.context(), path, recurse);
    }

    pub fn add_content_roots<'p>(&mut self, roots: impl IntoIterator<Item = (&'p Path, bool)>) {
        let mut cx = self.context();
        for (path, recurse) in roots {
            scan::add_content_root(&mut cx, path, recurse);
        }
    }

    pub fn add_jar_file(&mut self, path: &Path) {
        let path = scan::canonical(path);
        scan::add_jar_file(&mut self.context(), &path);
    }

    /// Returns false when nothing under the root was loaded from `path`.
    pub fn remove_content_root(&mut self, path: &Path) -> bool {
        let removed = scan::remove_content_root(&mut self.context(), path);
        let tree = &self.tree;
        self.selection.retain(|id| tree.contains(*id));
        removed
    }

    pub fn clear(&mut self) {
        scan::clear(&mut self.tree, &mut self.registry);
        self.selection.clear();
        self.drag.drag_finished();
    }

    /// Clears the tree and scans `roots` again, e.g. after the classpath changed.
    pub fn rebuild(&mut self, roots: &[(PathBuf, bool)]) {
        self.clear();
        self.add_content_roots(roots.iter().map(|(p, r)| (p.as_path(), *r)));
    }

    pub fn target_class(&self) -> &str {
        &self.config.target_type
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &LegoConfig {
        &self.config
    }

    pub fn select(&mut self, ids: &[NodeId]) {
        self.selection = ids
            .iter()
            .copied()
            .filter(|id| self.tree.contains(*id))
            .collect();
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// Drag gesture on the current selection.
    pub fn begin_drag(&mut self, platform: &mut dyn DragPlatform) -> Option<DragToken> {
        let interface = self.config.target_type.clone();
        self.drag
            .gesture_recognized(&self.tree, &self.selection, &interface, platform)
    }

    pub fn end_drag(&mut self) {
        self.drag.drag_finished();
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }
}
