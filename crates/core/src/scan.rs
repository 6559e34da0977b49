//! Content root scanning.
//!
//! Every helper takes a [`ScanContext`] holding the tree, the registry and the collaborators,
//! so scanning can be exercised without a widget. Failures never escape: each one is reported
//! through the messenger and only ends the work on the file or root it concerns.

use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::classify::{ArchiveScanner, Messenger, ModelStatus, NodeClassifier, Severity};
use crate::config::LegoConfig;
use crate::descriptor::NodeDescriptor;
use crate::model::{GroupKind, NodeId, NodeKind, Tree};
use crate::registry::Registry;

pub const LOAD_ERROR_TITLE: &str = "LEGO load error";
pub const FILE_ERROR_TITLE: &str = "File not readable";
pub const EMPTY_ARCHIVE_TITLE: &str = "No LEGOs in archive";

/// Directory levels below a content root that a non-recursive scan still visits.
pub const SHALLOW_LEVELS: usize = 1;

pub struct ScanContext<'a> {
    pub tree: &'a mut Tree,
    pub registry: &'a mut Registry,
    pub classifier: &'a mut dyn NodeClassifier,
    pub archives: &'a mut dyn ArchiveScanner,
    pub messenger: &'a mut dyn Messenger,
    pub model: Option<&'a mut dyn ModelStatus>,
    pub config: &'a LegoConfig,
}

impl ScanContext<'_> {
    fn report(&mut self, severity: Severity, title: &str, message: &str) {
        self.messenger.message_to_user(severity, title, message);
    }

    fn flag_open_model(&mut self) {
        if let Some(model) = self.model.as_deref_mut() {
            if model.is_open() {
                model.mark_dirty();
            }
        }
    }

    fn target(&self) -> &str {
        &self.config.target_type
    }
}

pub fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

pub fn is_archive(path: &Path) -> bool {
    has_extension(path, "jar")
}

pub fn is_source(path: &Path) -> bool {
    has_extension(path, "java")
}

/// Compiled top-level classes and XML documents. Inner classes never become LEGOs.
pub fn is_eligible_file(path: &Path) -> bool {
    if has_extension(path, "xml") {
        return true;
    }
    has_extension(path, "class") && !file_name(path).contains('$')
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Eligible regular file, or a symlink resolving to one.
fn is_candidate_file(path: &Path) -> bool {
    path.is_file() && is_eligible_file(path)
}

/// True when some file under `dir`, outside version-control and reserved folders, could become
/// a LEGO. Symlinked directories are not followed.
pub fn contains_eligible(config: &LegoConfig, dir: &Path) -> bool {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !config.is_excluded_dir_name(&name) && !config.is_reserved_dir_name(&name)
        })
        .filter_map(Result::ok)
        .any(|e| !e.file_type().is_dir() && is_candidate_file(e.path()))
}

/// Subdirectory filter for scans: no VCS or reserved folders, no dead branches.
pub fn accepts_directory(config: &LegoConfig, dir: &Path) -> bool {
    let name = file_name(dir);
    !config.is_excluded_dir_name(&name)
        && !config.is_reserved_dir_name(&name)
        && contains_eligible(config, dir)
}

/// Adds a file, directory or archive to the tree.
pub fn add_content_root(cx: &mut ScanContext<'_>, path: &Path, recurse: bool) {
    if !path.exists() {
        cx.report(
            Severity::Error,
            FILE_ERROR_TITLE,
            &format!("<b>{}</b> does not exist", escape_html(&path.display().to_string())),
        );
        return;
    }
    let path = canonical(path);
    let name = file_name(&path);
    if path.is_dir() && cx.config.is_excluded_dir_name(&name) {
        tracing::debug!(path = %path.display(), "skipping version control directory");
        return;
    }
    if is_archive(&path) {
        add_jar_file(cx, &path);
        return;
    }
    if is_source(&path) {
        tracing::debug!(path = %path.display(), "skipping source file");
        return;
    }

    tracing::info!(path = %path.display(), recurse, "adding content root");
    if !path.is_dir() {
        let parent = parent_group(cx, &path);
        scan_file(cx, &path, parent);
    } else if !contains_eligible(cx.config, &path) {
        tracing::debug!(path = %path.display(), "no candidate files below content root");
    } else if recurse {
        scan_recursive(cx, &path);
    } else {
        scan_shallow(cx, &path, SHALLOW_LEVELS);
    }
}

/// Classifies one candidate file and inserts it under `parent` when it passes.
fn scan_file(cx: &mut ScanContext<'_>, file: &Path, parent: NodeId) {
    let target = cx.target().to_string();
    match cx.classifier.load_file(file, &target) {
        Ok(descriptor) => {
            if let Some(prior) = descriptor
                .canonical_path()
                .and_then(|p| cx.tree.find_entity_by_path(p))
            {
                tracing::debug!(path = %file.display(), "replacing previously loaded node");
                for node in cx.tree.detach(prior) {
                    cx.registry.forget(node.id);
                }
            }
            let label = descriptor.simple_name().to_string();
            let id = cx.tree.insert(
                parent,
                label,
                Some(file.to_path_buf()),
                NodeKind::Entity(descriptor),
            );
            tracing::debug!(node = id.0, path = %file.display(), "inserted LEGO");
        }
        Err(e) => {
            cx.report(
                Severity::Error,
                LOAD_ERROR_TITLE,
                &format!(
                    "Could not load <b>{}</b>:<br>{}",
                    escape_html(&file_name(file)),
                    escape_html(&e.to_string())
                ),
            );
            cx.flag_open_model();
        }
    }
}

/// Immediate eligible children of `dir`, sorted by name. Symlinked directories are skipped;
/// symlinked files are returned resolved.
fn list_children(cx: &mut ScanContext<'_>, dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            cx.report(
                Severity::Error,
                FILE_ERROR_TITLE,
                &format!(
                    "Cannot list <b>{}</b>:<br>{}",
                    escape_html(&dir.display().to_string()),
                    escape_html(&e.to_string())
                ),
            );
            return Vec::new();
        }
    };
    let mut children: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let path = entry.path();
            let is_link = entry.file_type().map(|t| t.is_symlink()).unwrap_or(false);
            if path.is_dir() {
                !is_link && accepts_directory(cx.config, &path)
            } else {
                is_candidate_file(&path)
            }
        })
        .map(|entry| entry.path())
        .collect();
    children.sort();
    children.iter().map(|child| canonical(child)).collect()
}

fn parent_group(cx: &ScanContext<'_>, path: &Path) -> NodeId {
    path.parent()
        .and_then(|p| cx.registry.directory(p))
        .unwrap_or(cx.tree.root)
}

/// Top-level groups show the shortened path, nested ones their folder name.
fn group_label(cx: &ScanContext<'_>, dir: &Path, parent: NodeId) -> String {
    if parent == cx.tree.root {
        cx.config.shorten(dir)
    } else {
        file_name(dir)
    }
}

/// Non-recursive scan: a fresh group for `dir`, its files, and `levels` more directory levels.
///
/// A directory scanned this way again replaces its earlier group.
fn scan_shallow(cx: &mut ScanContext<'_>, dir: &Path, levels: usize) {
    if let Some(old) = cx.registry.directory(dir) {
        for node in cx.tree.detach(old) {
            if let NodeKind::Entity(descriptor) = &node.kind {
                cx.classifier.unload_file(descriptor);
            }
            cx.registry.forget(node.id);
        }
    }
    let parent = parent_group(cx, dir);
    let label = group_label(cx, dir, parent);
    let group = cx.tree.insert(
        parent,
        label,
        Some(dir.to_path_buf()),
        NodeKind::Group(GroupKind::Directory),
    );
    cx.registry.register_directory(dir, group);

    for child in list_children(cx, dir) {
        if child.is_dir() {
            if levels > 0 {
                scan_shallow(cx, &child, levels - 1);
            }
        } else {
            scan_file(cx, &child, group);
        }
    }
}

/// Recursive scan: reuses the registered group for `dir` if there is one.
fn scan_recursive(cx: &mut ScanContext<'_>, dir: &Path) {
    let group = match cx.registry.directory(dir) {
        Some(group) => group,
        None => {
            let parent = parent_group(cx, dir);
            let label = group_label(cx, dir, parent);
            let group = cx.tree.insert(
                parent,
                label,
                Some(dir.to_path_buf()),
                NodeKind::Group(GroupKind::Directory),
            );
            cx.registry.register_directory(dir, group);
            group
        }
    };

    for child in list_children(cx, dir) {
        if child.is_dir() {
            scan_recursive(cx, &child);
        } else {
            scan_file(cx, &child, group);
        }
    }
}

/// Adds the classes of a jar that satisfy the target type, grouped by package.
pub fn add_jar_file(cx: &mut ScanContext<'_>, path: &Path) {
    if let Err(e) = File::open(path) {
        cx.report(
            Severity::Error,
            FILE_ERROR_TITLE,
            &format!(
                "Cannot open archive <b>{}</b>:<br>{}",
                escape_html(&path.display().to_string()),
                escape_html(&e.to_string())
            ),
        );
        return;
    }
    let base = file_name(path);
    if cx.tree.find_child_by_label(cx.tree.root, &base).is_some() {
        tracing::debug!(archive = %base, "archive already present");
        return;
    }

    let target = cx.target().to_string();
    let classes = match cx.archives.find_classes(path, &target) {
        Ok(classes) => classes,
        Err(e) => {
            cx.report(
                Severity::Error,
                FILE_ERROR_TITLE,
                &escape_html(&e.to_string()),
            );
            return;
        }
    };
    if classes.is_empty() {
        tracing::warn!(archive = %base, target = %target, "no matching classes in archive");
        cx.report(
            Severity::Warning,
            EMPTY_ARCHIVE_TITLE,
            &format!(
                "<b>{}</b> contains no classes implementing {}",
                escape_html(&base),
                escape_html(&target)
            ),
        );
        return;
    }

    let archive = cx.tree.insert(
        cx.tree.root,
        base.clone(),
        Some(path.to_path_buf()),
        NodeKind::Group(GroupKind::Archive),
    );
    for class_name in classes {
        let descriptor = NodeDescriptor::CompiledClass {
            class_name,
            class_file: None,
        };
        let parent = ensure_package(cx, archive, descriptor.package());
        let label = descriptor.simple_name().to_string();
        cx.tree.insert(parent, label, None, NodeKind::Entity(descriptor));
    }
    tracing::info!(archive = %base, "added archive");
}

/// Package group for `package` inside `archive`, creating missing ancestors first.
fn ensure_package(cx: &mut ScanContext<'_>, archive: NodeId, package: &str) -> NodeId {
    if package.is_empty() {
        return archive;
    }
    if let Some(node) = cx.registry.package(archive, package) {
        return node;
    }
    let (parent, label) = match package.rsplit_once('.') {
        Some((outer, last)) => (ensure_package(cx, archive, outer), last),
        None => (archive, package),
    };
    let node = cx
        .tree
        .insert(parent, label, None, NodeKind::Group(GroupKind::Package));
    cx.registry.register_package(archive, package, node);
    node
}

/// Removes the first node loaded from `path`: an entity whose descriptor resolves to it,
/// otherwise a directory or archive group created for it. Entities below the removed node
/// are unloaded from the class manager. Returns false when nothing matched.
pub fn remove_content_root(cx: &mut ScanContext<'_>, path: &Path) -> bool {
    let path = canonical(path);
    let found = cx
        .tree
        .find_entity_by_path(&path)
        .or_else(|| cx.registry.directory(&path))
        .or_else(|| cx.tree.find_group_by_path(&path));
    let Some(id) = found else {
        tracing::debug!(path = %path.display(), "nothing to remove");
        return false;
    };
    for node in cx.tree.detach(id) {
        if let NodeKind::Entity(descriptor) = &node.kind {
            cx.classifier.unload_file(descriptor);
        }
        cx.registry.forget(node.id);
    }
    tracing::info!(path = %path.display(), "removed content root");
    true
}

pub fn clear(tree: &mut Tree, registry: &mut Registry) {
    tree.clear();
    registry.clear();
}
