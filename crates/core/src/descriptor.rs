use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const FILE_BASED_MARK: &str = "<fbasedNodeMark>";
pub const FILE_BASED_DELIM: &str = "<fbasedDelim>";

/// A loadable building block produced by the class manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeDescriptor {
    /// A compiled class. `class_file` is set when it was loaded from a loose `.class` file
    /// and empty for classes found inside an archive.
    CompiledClass {
        class_name: String,
        class_file: Option<PathBuf>,
    },
    /// An event graph whose XML source is authoritative.
    XmlSource {
        class_name: String,
        package: String,
        xml_source: PathBuf,
        class_file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    FileBased(NodeDescriptor),
    /// Plain class name; the string never named a file-based node.
    NotFileBased,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("file-based node string has {0} fields, expected 5")]
    FieldCount(usize),
    #[error("unknown file-based node representation '{0}'")]
    Representation(String),
    #[error("file-based node string has an empty class name")]
    EmptyClassName,
}

impl NodeDescriptor {
    pub fn class_name(&self) -> &str {
        match self {
            NodeDescriptor::CompiledClass { class_name, .. } => class_name,
            NodeDescriptor::XmlSource { class_name, .. } => class_name,
        }
    }

    pub fn simple_name(&self) -> &str {
        let name = self.class_name();
        name.rsplit_once('.').map(|(_, s)| s).unwrap_or(name)
    }

    pub fn package(&self) -> &str {
        match self {
            NodeDescriptor::CompiledClass { class_name, .. } => {
                class_name.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
            }
            NodeDescriptor::XmlSource { package, .. } => package,
        }
    }

    pub fn is_xml(&self) -> bool {
        matches!(self, NodeDescriptor::XmlSource { .. })
    }

    pub fn class_file(&self) -> Option<&Path> {
        match self {
            NodeDescriptor::CompiledClass { class_file, .. } => class_file.as_deref(),
            NodeDescriptor::XmlSource { class_file, .. } => class_file.as_deref(),
        }
    }

    /// The source file duplicates are detected by.
    pub fn canonical_path(&self) -> Option<&Path> {
        match self {
            NodeDescriptor::CompiledClass { class_file, .. } => class_file.as_deref(),
            NodeDescriptor::XmlSource { xml_source, .. } => Some(xml_source),
        }
    }

    pub fn is_file_based(&self) -> bool {
        self.canonical_path().is_some()
    }

    pub fn is_duplicate_of(&self, other: &NodeDescriptor) -> bool {
        match (self.canonical_path(), other.canonical_path()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Identity carried in drag tokens: the class name for archive classes, a serialised
    /// descriptor for anything loaded from a file.
    pub fn identity(&self) -> String {
        if !self.is_file_based() {
            return self.class_name().to_string();
        }
        let (repr, source) = match self {
            NodeDescriptor::XmlSource { xml_source, .. } => ("xml", xml_source.as_path()),
            NodeDescriptor::CompiledClass { class_file, .. } => {
                ("class", class_file.as_deref().unwrap_or(Path::new("")))
            }
        };
        let class_file = self
            .class_file()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let fields = [
            repr.to_string(),
            self.class_name().to_string(),
            source.display().to_string(),
            class_file,
            self.package().to_string(),
        ];
        format!("{FILE_BASED_MARK}{}", fields.join(FILE_BASED_DELIM))
    }

    /// Inverse of [`NodeDescriptor::identity`] for file-based nodes.
    pub fn parse(s: &str) -> Result<Parsed, DescriptorError> {
        let Some(body) = s.strip_prefix(FILE_BASED_MARK) else {
            return Ok(Parsed::NotFileBased);
        };
        let fields: Vec<&str> = body.split(FILE_BASED_DELIM).collect();
        let &[repr, class_name, source, class_file, package] = fields.as_slice() else {
            return Err(DescriptorError::FieldCount(fields.len()));
        };
        if class_name.is_empty() {
            return Err(DescriptorError::EmptyClassName);
        }
        let class_file = (!class_file.is_empty()).then(|| PathBuf::from(class_file));
        let desc = match repr {
            "xml" => NodeDescriptor::XmlSource {
                class_name: class_name.to_string(),
                package: package.to_string(),
                xml_source: PathBuf::from(source),
                class_file,
            },
            "class" => NodeDescriptor::CompiledClass {
                class_name: class_name.to_string(),
                class_file: Some(PathBuf::from(source)),
            },
            other => return Err(DescriptorError::Representation(other.to_string())),
        };
        Ok(Parsed::FileBased(desc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_class_identity_is_class_name() {
        let d = NodeDescriptor::CompiledClass {
            class_name: "simkit.examples.ArrivalProcess".into(),
            class_file: None,
        };
        assert_eq!(d.identity(), "simkit.examples.ArrivalProcess");
        assert_eq!(d.simple_name(), "ArrivalProcess");
        assert_eq!(d.package(), "simkit.examples");
        assert_eq!(NodeDescriptor::parse(&d.identity()), Ok(Parsed::NotFileBased));
    }

    #[test]
    fn xml_identity_parses_back() {
        let d = NodeDescriptor::XmlSource {
            class_name: "examples.Server".into(),
            package: "examples".into(),
            xml_source: PathBuf::from("/proj/EventGraphs/Server.xml"),
            class_file: None,
        };
        let id = d.identity();
        assert!(id.starts_with(FILE_BASED_MARK));
        assert_eq!(NodeDescriptor::parse(&id), Ok(Parsed::FileBased(d)));
    }

    #[test]
    fn malformed_file_based_string_is_an_error() {
        let s = format!("{FILE_BASED_MARK}xml{FILE_BASED_DELIM}Foo");
        assert_eq!(NodeDescriptor::parse(&s), Err(DescriptorError::FieldCount(2)));
    }

    #[test]
    fn duplicates_compare_canonical_paths() {
        let a = NodeDescriptor::CompiledClass {
            class_name: "a.Foo".into(),
            class_file: Some(PathBuf::from("/x/Foo.class")),
        };
        let b = NodeDescriptor::CompiledClass {
            class_name: "b.Foo".into(),
            class_file: Some(PathBuf::from("/x/Foo.class")),
        };
        let jar = NodeDescriptor::CompiledClass { class_name: "a.Foo".into(), class_file: None };
        assert!(a.is_duplicate_of(&b));
        assert!(!a.is_duplicate_of(&jar));
    }
}
