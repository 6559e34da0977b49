use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use lego_core::{
    DragPlatform, DragStartError, DragToken, DropTarget, DroppedEntity, LegoConfig, LegoTree,
    ModelStatus, NodeId, RecordingMessenger,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRootEntry {
    pub path: PathBuf,
    pub recurse: bool,
}

/// The diagram being edited on the canvas.
#[derive(Debug, Default)]
pub struct CanvasModel {
    pub open: bool,
    pub dirty: bool,
}

impl ModelStatus for CanvasModel {
    fn is_open(&self) -> bool {
        self.open
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Hands the transfer string to egui's drag-and-drop payload.
pub struct EguiDrag<'a> {
    pub ctx: &'a eframe::egui::Context,
}

impl DragPlatform for EguiDrag<'_> {
    fn start_drag(&mut self, token: &DragToken) -> Result<(), DragStartError> {
        if eframe::egui::DragAndDrop::has_any_payload(self.ctx) {
            return Err(DragStartError::InvalidOperation);
        }
        eframe::egui::DragAndDrop::set_payload(self.ctx, token.to_transfer_string());
        Ok(())
    }
}

pub struct AppState {
    pub lego: LegoTree,
    pub messages: Rc<RefCell<RecordingMessenger>>,
    pub canvas: Rc<RefCell<DropTarget>>,
    pub model: Rc<RefCell<CanvasModel>>,
    pub roots: Vec<ContentRootEntry>,
    pub dropped: Vec<DroppedEntity>,
    pub search: String,
    pub recurse: bool,
    pub last_drop_error: Option<String>,
}

impl AppState {
    pub fn new(roots: Vec<ContentRootEntry>) -> Self {
        let config = LegoConfig::default();
        let messages = Rc::new(RefCell::new(RecordingMessenger::new()));
        let canvas = Rc::new(RefCell::new(DropTarget::new(config.target_type.clone())));
        let model = Rc::new(RefCell::new(CanvasModel {
            open: true,
            dirty: false,
        }));
        let mut lego = LegoTree::with_static_classifier(config, Box::new(messages.clone()));
        lego.set_model_status(Some(Box::new(model.clone())));
        lego.set_drag_observer(Box::new(canvas.clone()));
        lego.add_content_roots(roots.iter().map(|r| (r.path.as_path(), r.recurse)));
        Self {
            lego,
            messages,
            canvas,
            model,
            roots,
            dropped: Vec::new(),
            search: String::new(),
            recurse: true,
            last_drop_error: None,
        }
    }

    pub fn add_root(&mut self, path: PathBuf, recurse: bool) {
        self.lego.add_content_root(&path, recurse);
        let entry = ContentRootEntry { path, recurse };
        if !self.roots.contains(&entry) {
            self.roots.push(entry);
        }
    }

    pub fn remove_root(&mut self, path: &Path) {
        self.lego.remove_content_root(path);
        self.roots.retain(|r| r.path != path);
    }

    pub fn rebuild(&mut self) {
        let roots: Vec<(PathBuf, bool)> = self
            .roots
            .iter()
            .map(|r| (r.path.clone(), r.recurse))
            .collect();
        self.lego.rebuild(&roots);
    }

    pub fn clear(&mut self) {
        self.lego.clear();
        self.roots.clear();
    }

    pub fn select(&mut self, id: NodeId) {
        self.lego.select(&[id]);
    }

    pub fn begin_drag(&mut self, id: NodeId, ctx: &eframe::egui::Context) {
        self.lego.select(&[id]);
        self.lego.begin_drag(&mut EguiDrag { ctx });
    }

    pub fn drop_payload(&mut self, payload: &str) {
        self.lego.end_drag();
        match self.canvas.borrow_mut().drop_transfer(payload) {
            Ok(entity) => {
                tracing::info!(class = entity.class_name(), "dropped LEGO on canvas");
                self.dropped.push(entity);
                self.model.borrow_mut().dirty = true;
                self.last_drop_error = None;
            }
            Err(e) => self.last_drop_error = Some(e.to_string()),
        }
    }

    pub fn open_source(&self, path: &Path) {
        if let Err(e) = open::that(path) {
            tracing::warn!(path = %path.display(), error = %e, "cannot open file");
        }
    }
}
