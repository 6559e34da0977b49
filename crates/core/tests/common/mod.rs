#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lego_core::{
    ArchiveScanner, ClassifyError, LegoConfig, LegoTree, ModelStatus, NodeClassifier,
    NodeDescriptor, RecordingMessenger, ScanError,
};

/// Passes files whose contents start with "ok", fails everything else.
#[derive(Default)]
pub struct FakeClassifier {
    pub loaded: Vec<PathBuf>,
    pub unloaded: Vec<NodeDescriptor>,
}

impl NodeClassifier for FakeClassifier {
    fn load_file(&mut self, file: &Path, target: &str) -> Result<NodeDescriptor, ClassifyError> {
        let text = fs::read_to_string(file).unwrap_or_default();
        let stem = file.file_stem().unwrap().to_string_lossy().into_owned();
        if !text.starts_with("ok") {
            return Err(ClassifyError::NotCapable {
                file: file.to_path_buf(),
                class: format!("test.{stem}"),
                target: target.to_string(),
            });
        }
        self.loaded.push(file.to_path_buf());
        let class_name = format!("test.{stem}");
        Ok(if file.extension().is_some_and(|e| e == "xml") {
            NodeDescriptor::XmlSource {
                class_name,
                package: "test".into(),
                xml_source: file.to_path_buf(),
                class_file: None,
            }
        } else {
            NodeDescriptor::CompiledClass {
                class_name,
                class_file: Some(file.to_path_buf()),
            }
        })
    }

    fn unload_file(&mut self, descriptor: &NodeDescriptor) {
        self.unloaded.push(descriptor.clone());
    }
}

/// Answers with a fixed class list per archive file name.
#[derive(Default)]
pub struct FakeArchives {
    pub classes: HashMap<String, Vec<String>>,
    pub calls: usize,
}

impl ArchiveScanner for FakeArchives {
    fn find_classes(&mut self, archive: &Path, _target: &str) -> Result<Vec<String>, ScanError> {
        self.calls += 1;
        let name = archive.file_name().unwrap().to_string_lossy().into_owned();
        Ok(self.classes.get(&name).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeModel {
    pub open: bool,
    pub dirty: usize,
}

impl ModelStatus for FakeModel {
    fn is_open(&self) -> bool {
        self.open
    }

    fn mark_dirty(&mut self) {
        self.dirty += 1;
    }
}

pub struct Harness {
    pub lego: LegoTree,
    pub classifier: Rc<RefCell<FakeClassifier>>,
    pub archives: Rc<RefCell<FakeArchives>>,
    pub messages: Rc<RefCell<RecordingMessenger>>,
    pub model: Rc<RefCell<FakeModel>>,
}

pub fn harness(config: LegoConfig) -> Harness {
    let classifier = Rc::new(RefCell::new(FakeClassifier::default()));
    let archives = Rc::new(RefCell::new(FakeArchives::default()));
    let messages = Rc::new(RefCell::new(RecordingMessenger::new()));
    let model = Rc::new(RefCell::new(FakeModel::default()));
    let mut lego = LegoTree::new(
        config,
        Box::new(classifier.clone()),
        Box::new(archives.clone()),
        Box::new(messages.clone()),
    );
    lego.set_model_status(Some(Box::new(model.clone())));
    Harness {
        lego,
        classifier,
        archives,
        messages,
        model,
    }
}

/// Config whose label prefix is the (canonical) temp root, so groups get short labels.
pub fn config_for(root: &Path) -> LegoConfig {
    LegoConfig {
        project_root: Some(fs::canonicalize(root).unwrap()),
        ..LegoConfig::default()
    }
}

pub fn write(path: &Path, contents: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
    fs::canonicalize(path).unwrap()
}

/// Minimal class file header: this class, superclass and interfaces, names dotted.
pub fn class_bytes(name: &str, super_class: &str, interfaces: &[&str], flags: u16) -> Vec<u8> {
    let mut names = vec![name, super_class];
    names.extend_from_slice(interfaces);

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0, 52]);
    out.extend_from_slice(&((names.len() * 2 + 1) as u16).to_be_bytes());
    for (i, n) in names.iter().enumerate() {
        let internal = n.replace('.', "/");
        out.push(1);
        out.extend_from_slice(&(internal.len() as u16).to_be_bytes());
        out.extend_from_slice(internal.as_bytes());
        out.push(7);
        out.extend_from_slice(&((i * 2 + 1) as u16).to_be_bytes());
    }
    out.extend_from_slice(&flags.to_be_bytes());
    out.extend_from_slice(&2u16.to_be_bytes());
    out.extend_from_slice(&4u16.to_be_bytes());
    out.extend_from_slice(&(interfaces.len() as u16).to_be_bytes());
    for i in 0..interfaces.len() {
        out.extend_from_slice(&((i * 2 + 6) as u16).to_be_bytes());
    }
    // no fields, methods or attributes
    out.extend_from_slice(&[0; 6]);
    out
}

pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) -> PathBuf {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, bytes) in entries {
        zip.start_file(*name, zip::write::FileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
    fs::canonicalize(path).unwrap()
}

pub fn event_graph(name: &str, package: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SimEntity name="{name}" package="{package}" version="1.0">
    <StateVariable name="numberArrivals" type="int"/>
    <Event name="Run"/>
</SimEntity>
"#
    )
    .into_bytes()
}

/// Rewrites the central directory record of `entry` so that it claims an uncompressed size
/// of `declared` through a zip64 extra field. The stored data is left alone.
pub fn declare_entry_size(jar: &Path, entry: &str, declared: u64) {
    let mut bytes = fs::read(jar).unwrap();
    let eocd = bytes
        .windows(4)
        .rposition(|w| w == [0x50, 0x4b, 0x05, 0x06])
        .unwrap();
    let le16 = |b: &[u8], at: usize| u16::from_le_bytes([b[at], b[at + 1]]) as usize;
    let le32 = |b: &[u8], at: usize| u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]]);

    let mut at = le32(&bytes, eocd + 16) as usize;
    loop {
        assert_eq!(&bytes[at..at + 4], &[0x50, 0x4b, 0x01, 0x02]);
        let name_len = le16(&bytes, at + 28);
        let extra_len = le16(&bytes, at + 30);
        let comment_len = le16(&bytes, at + 32);
        if &bytes[at + 46..at + 46 + name_len] != entry.as_bytes() {
            at += 46 + name_len + extra_len + comment_len;
            continue;
        }

        let mut zip64 = vec![0x01, 0x00, 0x08, 0x00];
        zip64.extend_from_slice(&declared.to_le_bytes());
        bytes[at + 24..at + 28].copy_from_slice(&u32::MAX.to_le_bytes());
        bytes[at + 30..at + 32].copy_from_slice(&((extra_len + zip64.len()) as u16).to_le_bytes());
        let insert_at = at + 46 + name_len + extra_len;
        bytes.splice(insert_at..insert_at, zip64.iter().copied());

        let eocd = eocd + zip64.len();
        let cd_size = le32(&bytes, eocd + 12) + zip64.len() as u32;
        bytes[eocd + 12..eocd + 16].copy_from_slice(&cd_size.to_le_bytes());
        break;
    }
    fs::write(jar, bytes).unwrap();
}
