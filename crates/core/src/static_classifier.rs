use std::collections::{HashMap, HashSet, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::classfile::ClassInfo;
use crate::classify::{ArchiveScanner, ClassifyError, NodeClassifier, ScanError};
use crate::config::LegoConfig;
use crate::descriptor::NodeDescriptor;
use crate::eventgraph::EventGraphHeader;

/// Archive entries larger than this are not read as classes.
pub const MAX_CLASS_BYTES: u64 = 16 * 1024 * 1024;

/// Classifier that inspects class files and event-graph XML in place instead of compiling.
///
/// Supertypes of every type it reads are remembered, so capability checks see through
/// classes loaded earlier from the same roots.
#[derive(Debug, Default)]
pub struct StaticClassifier {
    ancestry: HashMap<String, Vec<String>>,
    loaded: HashSet<String>,
}

impl StaticClassifier {
    pub fn new(config: &LegoConfig) -> Self {
        Self {
            ancestry: config.known_ancestors.clone().into_iter().collect(),
            loaded: HashSet::new(),
        }
    }

    pub fn is_loaded(&self, class_name: &str) -> bool {
        self.loaded.contains(class_name)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    fn remember(&mut self, class: &str, supertypes: Vec<String>) {
        self.ancestry.insert(class.to_string(), supertypes);
    }

    /// Walks the known supertype graph breadth-first looking for `target`.
    pub fn satisfies(&self, class: &str, target: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([class]);
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            if names_match(name, target) {
                return true;
            }
            if let Some(parents) = self.ancestry.get(name) {
                queue.extend(parents.iter().map(String::as_str));
            }
        }
        false
    }

    fn load_class_file(&mut self, file: &Path, target: &str) -> Result<NodeDescriptor, ClassifyError> {
        let bytes = std::fs::read(file).map_err(|source| ClassifyError::Io {
            file: file.to_path_buf(),
            source,
        })?;
        let info = ClassInfo::parse(&bytes).map_err(|e| ClassifyError::Invalid {
            file: file.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.remember(&info.name, info.supertypes());
        if !info.is_concrete() {
            return Err(ClassifyError::Invalid {
                file: file.to_path_buf(),
                reason: format!("{} is abstract or an interface", info.name),
            });
        }
        if !self.satisfies(&info.name, target) {
            return Err(ClassifyError::NotCapable {
                file: file.to_path_buf(),
                class: info.name,
                target: target.to_string(),
            });
        }
        self.loaded.insert(info.name.clone());
        Ok(NodeDescriptor::CompiledClass {
            class_name: info.name,
            class_file: Some(file.to_path_buf()),
        })
    }

    fn load_event_graph(&mut self, file: &Path, target: &str) -> Result<NodeDescriptor, ClassifyError> {
        let text = std::fs::read_to_string(file).map_err(|source| ClassifyError::Io {
            file: file.to_path_buf(),
            source,
        })?;
        let header = EventGraphHeader::parse(&text).map_err(|e| ClassifyError::Invalid {
            file: file.to_path_buf(),
            reason: e.to_string(),
        })?;
        let class_name = header.class_name();
        let mut supertypes = vec![header.super_class().to_string()];
        supertypes.extend(header.implement.iter().cloned());
        self.remember(&class_name, supertypes);
        if !self.satisfies(&class_name, target) {
            return Err(ClassifyError::NotCapable {
                file: file.to_path_buf(),
                class: class_name,
                target: target.to_string(),
            });
        }
        self.loaded.insert(class_name.clone());
        Ok(NodeDescriptor::XmlSource {
            class_name,
            package: header.package,
            xml_source: file.to_path_buf(),
            class_file: None,
        })
    }
}

/// `target` may be given as a simple name.
fn names_match(name: &str, target: &str) -> bool {
    if name == target {
        return true;
    }
    !target.contains('.') && name.rsplit('.').next() == Some(target)
}

fn extension(file: &Path) -> Option<String> {
    file.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl NodeClassifier for StaticClassifier {
    fn load_file(&mut self, file: &Path, target: &str) -> Result<NodeDescriptor, ClassifyError> {
        match extension(file).as_deref() {
            Some("class") => self.load_class_file(file, target),
            Some("xml") => self.load_event_graph(file, target),
            _ => Err(ClassifyError::Invalid {
                file: file.to_path_buf(),
                reason: "neither a class file nor an event graph".to_string(),
            }),
        }
    }

    fn unload_file(&mut self, descriptor: &NodeDescriptor) {
        if self.loaded.remove(descriptor.class_name()) {
            tracing::debug!(class = descriptor.class_name(), "unloaded");
        }
    }
}

impl ArchiveScanner for StaticClassifier {
    fn find_classes(&mut self, archive: &Path, target: &str) -> Result<Vec<String>, ScanError> {
        let file = File::open(archive).map_err(|source| ScanError::Unreadable {
            path: archive.to_path_buf(),
            source,
        })?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| ScanError::Archive {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut concrete = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(|e| ScanError::Archive {
                path: archive.to_path_buf(),
                reason: e.to_string(),
            })?;
            let name = entry.name().to_string();
            if entry.is_dir() || !name.ends_with(".class") || name.contains('$') {
                continue;
            }
            // the size in the directory header is not trusted
            let mut bytes = Vec::new();
            if let Err(e) = entry.by_ref().take(MAX_CLASS_BYTES + 1).read_to_end(&mut bytes) {
                tracing::debug!(entry = %name, error = %e, "skipping unreadable archive entry");
                continue;
            }
            if bytes.len() as u64 > MAX_CLASS_BYTES {
                tracing::debug!(
                    entry = %name,
                    limit = MAX_CLASS_BYTES,
                    "skipping oversized archive entry"
                );
                continue;
            }
            match ClassInfo::parse(&bytes) {
                Ok(info) => {
                    self.remember(&info.name, info.supertypes());
                    if info.is_concrete() {
                        concrete.push(info.name);
                    }
                }
                Err(e) => tracing::debug!(entry = %name, error = %e, "skipping archive entry"),
            }
        }

        // every class in the archive is indexed before any capability check
        let mut found: Vec<String> = concrete
            .into_iter()
            .filter(|c| self.satisfies(c, target))
            .collect();
        found.sort();
        self.loaded.extend(found.iter().cloned());
        Ok(found)
    }
}
