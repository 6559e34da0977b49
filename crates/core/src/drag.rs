//! Drag source for tree leaves and the matching drop side used by diagram canvases.
//!
//! The transferable is `interface<TAB>identity`, where identity is either a class name or a
//! serialised file-based descriptor.

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::descriptor::{DescriptorError, NodeDescriptor, Parsed};
use crate::model::{NodeId, Tree};

pub const TOKEN_DELIM: char = '\t';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragToken {
    pub interface_name: String,
    pub node_identity: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DragTokenError {
    #[error("transfer string has no tab separator")]
    MissingDelimiter,
    #[error("transfer string has an empty {0}")]
    Empty(&'static str),
}

#[derive(Debug, Error)]
pub enum DragStartError {
    #[error("drag operation is not valid here")]
    InvalidOperation,
    #[error("platform refused drag: {0}")]
    Platform(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DropError {
    #[error(transparent)]
    Token(#[from] DragTokenError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("drop target accepts {expected}, got {actual}")]
    WrongInterface { expected: String, actual: String },
}

impl DragToken {
    pub fn new(interface_name: impl Into<String>, node_identity: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            node_identity: node_identity.into(),
        }
    }

    pub fn to_transfer_string(&self) -> String {
        format!("{}{TOKEN_DELIM}{}", self.interface_name, self.node_identity)
    }

    pub fn parse(s: &str) -> Result<Self, DragTokenError> {
        let (interface_name, node_identity) = s
            .split_once(TOKEN_DELIM)
            .ok_or(DragTokenError::MissingDelimiter)?;
        if interface_name.is_empty() {
            return Err(DragTokenError::Empty("interface name"));
        }
        if node_identity.is_empty() {
            return Err(DragTokenError::Empty("node identity"));
        }
        Ok(Self::new(interface_name, node_identity))
    }
}

/// Told about a drag before the platform starts it, so a canvas can get ready for the drop.
pub trait DragObserver {
    fn starting_drag(&mut self, token: &DragToken);
}

impl<T: DragObserver + ?Sized> DragObserver for Rc<RefCell<T>> {
    fn starting_drag(&mut self, token: &DragToken) {
        self.borrow_mut().starting_drag(token)
    }
}

/// Native drag support of whatever toolkit hosts the tree.
pub trait DragPlatform {
    fn start_drag(&mut self, token: &DragToken) -> Result<(), DragStartError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    GestureRecognized,
    Dragging,
}

#[derive(Default)]
pub struct DragSource {
    state: DragState,
    observer: Option<Box<dyn DragObserver>>,
}

impl DragSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_observer(&mut self, observer: Box<dyn DragObserver>) {
        self.observer = Some(observer);
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Starts a drag for a selection made of exactly one entity leaf.
    ///
    /// Returns the token handed to the platform, or `None` when no drag is visible: nothing
    /// draggable is selected, or the platform could not start the drag.
    pub fn gesture_recognized(
        &mut self,
        tree: &Tree,
        selection: &[NodeId],
        interface_name: &str,
        platform: &mut dyn DragPlatform,
    ) -> Option<DragToken> {
        self.state = DragState::GestureRecognized;
        let descriptor = match selection {
            [only] => tree.get(*only).and_then(|n| n.kind.descriptor()),
            _ => None,
        };
        let Some(descriptor) = descriptor else {
            self.state = DragState::Idle;
            return None;
        };

        let token = DragToken::new(interface_name, descriptor.identity());
        if let Some(observer) = self.observer.as_mut() {
            observer.starting_drag(&token);
        }
        match platform.start_drag(&token) {
            Ok(()) => {
                self.state = DragState::Dragging;
                Some(token)
            }
            Err(e) => {
                tracing::debug!(error = %e, "drag did not start");
                self.state = DragState::Idle;
                None
            }
        }
    }

    pub fn drag_finished(&mut self) {
        self.state = DragState::Idle;
    }
}

/// What a canvas builds a diagram node from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroppedEntity {
    Class(String),
    FileBased(NodeDescriptor),
}

impl DroppedEntity {
    pub fn class_name(&self) -> &str {
        match self {
            DroppedEntity::Class(name) => name,
            DroppedEntity::FileBased(descriptor) => descriptor.class_name(),
        }
    }
}

/// Drop side of the bridge. Accepts tokens for one interface.
#[derive(Debug, Clone)]
pub struct DropTarget {
    accepted_interface: String,
    pending: Option<DragToken>,
}

impl DropTarget {
    pub fn new(accepted_interface: impl Into<String>) -> Self {
        Self {
            accepted_interface: accepted_interface.into(),
            pending: None,
        }
    }

    pub fn accepted_interface(&self) -> &str {
        &self.accepted_interface
    }

    /// Token announced by the most recent drag start and not dropped yet.
    pub fn pending(&self) -> Option<&DragToken> {
        self.pending.as_ref()
    }

    /// Consumes a transfer string. The pending token is cleared whatever the outcome.
    pub fn drop_transfer(&mut self, transfer: &str) -> Result<DroppedEntity, DropError> {
        self.pending = None;
        let token = DragToken::parse(transfer)?;
        if token.interface_name != self.accepted_interface {
            return Err(DropError::WrongInterface {
                expected: self.accepted_interface.clone(),
                actual: token.interface_name,
            });
        }
        match NodeDescriptor::parse(&token.node_identity)? {
            Parsed::FileBased(descriptor) => Ok(DroppedEntity::FileBased(descriptor)),
            Parsed::NotFileBased => Ok(DroppedEntity::Class(token.node_identity)),
        }
    }
}

impl DragObserver for DropTarget {
    fn starting_drag(&mut self, token: &DragToken) {
        self.pending = Some(token.clone());
    }
}
