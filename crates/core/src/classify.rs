//! Collaborators the tree consumes: the class manager that classifies candidate files, the
//! archive scanner, the user messaging channel and the open-model status signal.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::descriptor::NodeDescriptor;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("{class} in {file} does not implement or extend {target}")]
    NotCapable {
        file: PathBuf,
        class: String,
        target: String,
    },
    #[error("{file} is not a loadable entity: {reason}")]
    Invalid { file: PathBuf, reason: String },
    #[error("cannot read {file}: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot open {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },
}

/// Class manager capability: turns a candidate file into a descriptor when it satisfies
/// the target type.
pub trait NodeClassifier {
    fn load_file(&mut self, file: &Path, target: &str) -> Result<NodeDescriptor, ClassifyError>;
    fn unload_file(&mut self, descriptor: &NodeDescriptor);
}

/// Lists the fully qualified names of archive classes satisfying the target type.
pub trait ArchiveScanner {
    fn find_classes(&mut self, archive: &Path, target: &str) -> Result<Vec<String>, ScanError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

pub trait Messenger {
    /// `message` may contain simple HTML markup.
    fn message_to_user(&mut self, severity: Severity, title: &str, message: &str);
}

/// The diagram model currently open in the editor, if any.
pub trait ModelStatus {
    fn is_open(&self) -> bool;
    fn mark_dirty(&mut self);
}

impl<T: NodeClassifier + ?Sized> NodeClassifier for Rc<RefCell<T>> {
    fn load_file(&mut self, file: &Path, target: &str) -> Result<NodeDescriptor, ClassifyError> {
        self.borrow_mut().load_file(file, target)
    }

    fn unload_file(&mut self, descriptor: &NodeDescriptor) {
        self.borrow_mut().unload_file(descriptor)
    }
}

impl<T: ArchiveScanner + ?Sized> ArchiveScanner for Rc<RefCell<T>> {
    fn find_classes(&mut self, archive: &Path, target: &str) -> Result<Vec<String>, ScanError> {
        self.borrow_mut().find_classes(archive, target)
    }
}

impl<T: Messenger + ?Sized> Messenger for Rc<RefCell<T>> {
    fn message_to_user(&mut self, severity: Severity, title: &str, message: &str) {
        self.borrow_mut().message_to_user(severity, title, message)
    }
}

impl<T: ModelStatus + ?Sized> ModelStatus for Rc<RefCell<T>> {
    fn is_open(&self) -> bool {
        self.borrow().is_open()
    }

    fn mark_dirty(&mut self) {
        self.borrow_mut().mark_dirty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub at: DateTime<Local>,
}

/// Messenger that keeps every message and mirrors it to the log.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    diagnostics: Vec<Diagnostic>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl Messenger for RecordingMessenger {
    fn message_to_user(&mut self, severity: Severity, title: &str, message: &str) {
        match severity {
            Severity::Info => tracing::info!(title, message),
            Severity::Warning => tracing::warn!(title, message),
            Severity::Error => tracing::error!(title, message),
        }
        self.diagnostics.push(Diagnostic {
            severity,
            title: title.to_string(),
            message: message.to_string(),
            at: Local::now(),
        });
    }
}

/// Model status for editors with no diagram open.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpenModel;

impl ModelStatus for NoOpenModel {
    fn is_open(&self) -> bool {
        false
    }

    fn mark_dirty(&mut self) {}
}
