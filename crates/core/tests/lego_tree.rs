mod common;

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use common::*;
use lego_core::scan::{EMPTY_ARCHIVE_TITLE, FILE_ERROR_TITLE, LOAD_ERROR_TITLE};
use lego_core::{
    DragPlatform, DragStartError, DragState, DragToken, DropTarget, DroppedEntity, GroupKind,
    NodeKind, Severity,
};
use tempfile::TempDir;

fn labels(h: &Harness, parent: lego_core::NodeId) -> Vec<String> {
    let tree = h.lego.tree();
    tree.children(parent)
        .iter()
        .map(|c| tree.get(*c).unwrap().label.clone())
        .collect()
}

#[test]
fn add_then_remove_file_leaves_no_trace() {
    let tmp = TempDir::new().unwrap();
    let foo = write(&tmp.path().join("Foo.class"), b"ok");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&foo, false);
    assert_eq!(h.lego.tree().leaves().count(), 1);

    assert!(h.lego.remove_content_root(&foo));
    assert!(!h.lego.registry().contains(&foo));
    assert!(h.lego.tree().find_entity_by_path(&foo).is_none());
    assert_eq!(h.classifier.borrow().unloaded.len(), 1);
    assert!(!h.lego.remove_content_root(&foo));
}

#[test]
fn add_then_remove_directory_leaves_no_trace() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("lib/A.class"), b"ok");
    write(&tmp.path().join("lib/B.xml"), b"ok");
    let lib = fs::canonicalize(tmp.path().join("lib")).unwrap();
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&lib, false);
    assert!(h.lego.registry().contains(&lib));
    assert_eq!(h.lego.tree().leaves().count(), 2);

    assert!(h.lego.remove_content_root(&lib));
    assert!(!h.lego.registry().contains(&lib));
    assert_eq!(h.lego.tree().leaves().count(), 0);
    assert_eq!(h.classifier.borrow().unloaded.len(), 2);
}

#[test]
fn re_adding_a_root_does_not_duplicate_leaves() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("EventGraphs/Foo.xml"), b"ok");
    write(&tmp.path().join("EventGraphs/sub/Baz.class"), b"ok");
    let root = tmp.path().join("EventGraphs");

    for recurse in [true, false] {
        let mut h = harness(config_for(tmp.path()));
        h.lego.add_content_root(&root, recurse);
        h.lego.add_content_root(&root, recurse);
        assert_eq!(h.lego.tree().leaves().count(), 2, "recurse = {recurse}");
        assert_eq!(labels(&h, h.lego.tree().root), vec!["EventGraphs"]);
    }
}

#[test]
fn re_adding_a_single_file_replaces_its_node() {
    let tmp = TempDir::new().unwrap();
    let foo = write(&tmp.path().join("Foo.class"), b"ok");
    let mut h = harness(config_for(tmp.path()));
    h.lego.add_content_root(&foo, false);
    h.lego.add_content_root(&foo, true);
    assert_eq!(h.lego.tree().leaves().count(), 1);
    assert!(h.messages.borrow().diagnostics().is_empty());
}

#[test]
fn lone_vcs_folder_inserts_nothing() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("proj/.svn/entries.xml"), b"ok");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&tmp.path().join("proj"), true);
    h.lego.add_content_root(&tmp.path().join("proj"), false);
    h.lego.add_content_root(&tmp.path().join("proj/.svn"), true);

    assert!(h.lego.tree().is_empty());
    assert!(h.classifier.borrow().loaded.is_empty());
    assert!(h.messages.borrow().diagnostics().is_empty());
}

#[test]
fn empty_archive_warns_once_and_inserts_nothing() {
    let tmp = TempDir::new().unwrap();
    let jar = write(&tmp.path().join("empty.jar"), b"PK");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&jar, false);

    assert!(h.lego.tree().is_empty());
    let messages = h.messages.borrow();
    assert_eq!(messages.diagnostics().len(), 1);
    assert_eq!(messages.count(Severity::Warning), 1);
    assert_eq!(messages.diagnostics()[0].title, EMPTY_ARCHIVE_TITLE);
}

#[test]
fn one_valid_one_invalid_gives_one_leaf_one_diagnostic() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("dir/Good.class"), b"ok");
    write(&tmp.path().join("dir/Bad.class"), b"broken");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&tmp.path().join("dir"), true);

    assert_eq!(h.lego.tree().leaves().count(), 1);
    let messages = h.messages.borrow();
    assert_eq!(messages.diagnostics().len(), 1);
    assert_eq!(messages.diagnostics()[0].severity, Severity::Error);
    assert_eq!(messages.diagnostics()[0].title, LOAD_ERROR_TITLE);
    assert!(messages.diagnostics()[0].message.contains("Bad.class"));
}

#[test]
fn failed_classification_marks_open_model_dirty() {
    let tmp = TempDir::new().unwrap();
    let bad = write(&tmp.path().join("Bad.class"), b"broken");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&bad, false);
    assert_eq!(h.model.borrow().dirty, 0);

    h.model.borrow_mut().open = true;
    h.lego.add_content_root(&bad, false);
    assert_eq!(h.model.borrow().dirty, 1);
    assert!(h.lego.tree().is_empty());
}

#[test]
fn clear_empties_tree_and_registry() {
    let tmp = TempDir::new().unwrap();
    for i in 0..5 {
        write(&tmp.path().join(format!("a/b{i}/C{i}.class")), b"ok");
    }
    let mut h = harness(config_for(tmp.path()));
    h.lego.add_content_root(&tmp.path().join("a"), true);
    assert_eq!(h.lego.tree().leaves().count(), 5);
    assert!(!h.lego.registry().is_empty());

    h.lego.clear();

    assert!(h.lego.tree().is_empty());
    assert_eq!(h.lego.tree().len(), 1);
    assert!(h.lego.registry().is_empty());
}

#[test]
fn recursive_scan_nests_groups_and_skips_reserved_and_dead_folders() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("proj/EventGraphs/Arrival.xml"), b"ok");
    write(&tmp.path().join("proj/EventGraphs/servers/Server.xml"), b"ok");
    write(&tmp.path().join("proj/Assemblies/Assembly.xml"), b"ok");
    write(&tmp.path().join("proj/docs/readme.txt"), b"ok");
    write(&tmp.path().join("proj/EventGraphs/Arrival.java"), b"ok");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&tmp.path().join("proj"), true);

    let tree = h.lego.tree();
    let proj = tree.children(tree.root)[0];
    assert_eq!(tree.get(proj).unwrap().label, "proj");
    assert_eq!(labels(&h, proj), vec!["EventGraphs"]);
    let graphs = tree.children(proj)[0];
    // children are inserted at the front, so later siblings come first
    let graph_children = labels(&h, graphs);
    assert_eq!(graph_children.len(), 2);
    assert!(graph_children.contains(&"Arrival".to_string()));
    assert_eq!(tree.leaves().count(), 2);
    assert_eq!(h.classifier.borrow().loaded.len(), 2);
}

#[test]
fn folders_holding_only_reserved_content_are_dead_branches() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("proj/EventGraphs/A.xml"), b"ok");
    write(&tmp.path().join("proj/other/Assemblies/X.xml"), b"ok");
    write(&tmp.path().join("proj/more/Scenario/Y.xml"), b"ok");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&tmp.path().join("proj"), true);

    let tree = h.lego.tree();
    let proj = tree.children(tree.root)[0];
    assert_eq!(labels(&h, proj), vec!["EventGraphs"]);
    assert!(!h.lego.registry().contains(&fs::canonicalize(tmp.path().join("proj/other")).unwrap()));
    assert_eq!(tree.leaves().count(), 1);
}

#[test]
fn nested_groups_are_labelled_by_folder_name() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("models/queues/Server.class"), b"ok");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&tmp.path().join("models"), false);

    let tree = h.lego.tree();
    let models = tree.children(tree.root)[0];
    assert_eq!(tree.get(models).unwrap().label, "models");
    assert_eq!(labels(&h, models), vec!["queues"]);
}

#[cfg(unix)]
#[test]
fn symlinked_files_are_scanned_and_removed_by_their_target() {
    let tmp = TempDir::new().unwrap();
    let real = write(&tmp.path().join("store/Server.class"), b"ok");
    fs::create_dir_all(tmp.path().join("linked")).unwrap();
    std::os::unix::fs::symlink(&real, tmp.path().join("linked/Server.class")).unwrap();
    let linked = fs::canonicalize(tmp.path().join("linked")).unwrap();
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&linked, true);

    let tree = h.lego.tree();
    let group = tree.children(tree.root)[0];
    assert_eq!(tree.get(group).unwrap().path.as_deref(), Some(linked.as_path()));
    let leaf = tree.find_entity_by_path(&real).unwrap();
    assert_eq!(tree.get(leaf).unwrap().parent, Some(group));

    assert!(h.lego.remove_content_root(&tmp.path().join("linked/Server.class")));
    assert_eq!(h.lego.tree().leaves().count(), 0);
}

#[test]
fn shallow_scan_walks_one_directory_level() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("top/A.class"), b"ok");
    write(&tmp.path().join("top/mid/B.class"), b"ok");
    write(&tmp.path().join("top/mid/deep/C.class"), b"ok");
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&tmp.path().join("top"), false);

    let names: Vec<String> = h
        .lego
        .tree()
        .leaves()
        .map(|(_, d)| d.class_name().to_string())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"test.A".to_string()));
    assert!(names.contains(&"test.B".to_string()));
    assert!(!h.lego.registry().contains(&fs::canonicalize(tmp.path().join("top/mid/deep")).unwrap()));
}

#[test]
fn archive_classes_hang_off_package_groups() {
    let tmp = TempDir::new().unwrap();
    let jar = write(&tmp.path().join("simkit.jar"), b"PK");
    let mut h = harness(config_for(tmp.path()));
    h.archives.borrow_mut().classes.insert(
        "simkit.jar".into(),
        vec![
            "simkit.examples.ArrivalProcess".into(),
            "simkit.examples.Server".into(),
            "simkit.smd.Mover".into(),
            "TopLevel".into(),
        ],
    );

    h.lego.add_jar_file(&jar);

    let tree = h.lego.tree();
    let archive = tree.find_child_by_label(tree.root, "simkit.jar").unwrap();
    assert_eq!(tree.get(archive).unwrap().kind, NodeKind::Group(GroupKind::Archive));
    assert!(tree.find_child_by_label(archive, "TopLevel").is_some());
    let simkit = tree.find_child_by_label(archive, "simkit").unwrap();
    let examples = tree.find_child_by_label(simkit, "examples").unwrap();
    assert_eq!(tree.children(examples).len(), 2);
    assert!(tree.find_child_by_label(simkit, "smd").is_some());
    assert_eq!(tree.leaves().count(), 4);
    assert_eq!(h.lego.registry().package(archive, "simkit.examples"), Some(examples));
}

#[test]
fn duplicate_archive_names_are_scanned_once() {
    let tmp = TempDir::new().unwrap();
    let a = write(&tmp.path().join("a/lib.jar"), b"PK");
    let b = write(&tmp.path().join("b/lib.jar"), b"PK");
    let mut h = harness(config_for(tmp.path()));
    h.archives
        .borrow_mut()
        .classes
        .insert("lib.jar".into(), vec!["x.Y".into()]);

    h.lego.add_content_root(&a, false);
    h.lego.add_content_root(&b, false);

    assert_eq!(h.archives.borrow().calls, 1);
    assert_eq!(h.lego.tree().leaves().count(), 1);
}

#[test]
fn unreadable_paths_report_once() {
    let tmp = TempDir::new().unwrap();
    let mut h = harness(config_for(tmp.path()));

    h.lego.add_content_root(&tmp.path().join("missing.jar"), false);
    h.lego.add_jar_file(&tmp.path().join("also-missing.jar"));

    assert!(h.lego.tree().is_empty());
    let messages = h.messages.borrow();
    assert_eq!(messages.count(Severity::Error), 2);
    assert!(messages.diagnostics().iter().all(|d| d.title == FILE_ERROR_TITLE));
    assert_eq!(h.archives.borrow().calls, 0);
}

#[test]
fn source_files_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let src = write(&tmp.path().join("Foo.java"), b"ok");
    let mut h = harness(config_for(tmp.path()));
    h.lego.add_content_root(&src, true);
    assert!(h.lego.tree().is_empty());
    assert!(h.messages.borrow().diagnostics().is_empty());
}

#[test]
fn rebuild_rescans_roots() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("lib/A.class"), b"ok");
    let lib = fs::canonicalize(tmp.path().join("lib")).unwrap();
    let mut h = harness(config_for(tmp.path()));
    h.lego.add_content_root(&lib, true);

    write(&tmp.path().join("lib/B.class"), b"ok");
    h.lego.rebuild(&[(lib.clone(), true)]);

    assert_eq!(h.lego.tree().leaves().count(), 2);
    assert_eq!(labels(&h, h.lego.tree().root), vec!["lib"]);
}

struct RecordingPlatform {
    started: Vec<String>,
}

impl DragPlatform for RecordingPlatform {
    fn start_drag(&mut self, token: &DragToken) -> Result<(), DragStartError> {
        self.started.push(token.to_transfer_string());
        Ok(())
    }
}

#[test]
fn dragging_a_leaf_reaches_the_canvas() {
    let tmp = TempDir::new().unwrap();
    let foo = write(&tmp.path().join("Foo.xml"), b"ok");
    let mut h = harness(config_for(tmp.path()));
    let canvas = Rc::new(RefCell::new(DropTarget::new(h.lego.target_class())));
    h.lego.set_drag_observer(Box::new(canvas.clone()));
    h.lego.add_content_root(&foo, false);

    let leaf = h.lego.tree().find_entity_by_path(&foo).unwrap();
    h.lego.select(&[leaf]);
    let mut platform = RecordingPlatform { started: vec![] };
    let token = h.lego.begin_drag(&mut platform).unwrap();

    assert_eq!(h.lego.drag_state(), DragState::Dragging);
    assert_eq!(token.interface_name, h.lego.target_class());
    assert!(canvas.borrow().pending().is_some());

    let dropped = canvas.borrow_mut().drop_transfer(&platform.started[0]).unwrap();
    match dropped {
        DroppedEntity::FileBased(d) => {
            assert_eq!(d.canonical_path(), Some(foo.as_path()));
            assert!(d.is_xml());
        }
        DroppedEntity::Class(name) => panic!("expected a file-based node, got {name}"),
    }
    h.lego.end_drag();
    assert_eq!(h.lego.drag_state(), DragState::Idle);
}

#[test]
fn removing_a_selected_node_drops_it_from_the_selection() {
    let tmp = TempDir::new().unwrap();
    let foo = write(&tmp.path().join("Foo.class"), b"ok");
    let mut h = harness(config_for(tmp.path()));
    h.lego.add_content_root(&foo, false);
    let leaf = h.lego.tree().find_entity_by_path(&foo).unwrap();
    h.lego.select(&[leaf]);

    h.lego.remove_content_root(&foo);

    assert!(h.lego.selection().is_empty());
    let mut platform = RecordingPlatform { started: vec![] };
    assert!(h.lego.begin_drag(&mut platform).is_none());
}
