use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_TARGET_TYPE: &str = "simkit.BasicSimEntity";
pub const PROPERTY_CHANGE_LISTENER: &str = "java.beans.PropertyChangeListener";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegoConfig {
    /// Class or interface every leaf must implement or extend.
    pub target_type: String,
    /// Directory names never scanned (version control metadata).
    pub excluded_dirs: Vec<String>,
    /// Sibling project folders skipped during recursive scans.
    pub reserved_dirs: Vec<String>,
    /// Prefix stripped from directory labels after the working and home directories.
    pub project_root: Option<PathBuf>,
    /// Supertypes of classes the classifier never sees on disk, e.g. the runtime library.
    pub known_ancestors: BTreeMap<String, Vec<String>>,
}

impl Default for LegoConfig {
    fn default() -> Self {
        LegoConfig {
            target_type: DEFAULT_TARGET_TYPE.to_string(),
            excluded_dirs: Self::default_excluded_dirs(),
            reserved_dirs: Self::default_reserved_dirs(),
            project_root: None,
            known_ancestors: Self::default_known_ancestors(),
        }
    }
}

impl LegoConfig {
    fn default_excluded_dirs() -> Vec<String> {
        vec![".svn".to_string(), ".git".to_string()]
    }

    fn default_reserved_dirs() -> Vec<String> {
        ["Assemblies", "Scenario", "Locations"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn default_known_ancestors() -> BTreeMap<String, Vec<String>> {
        let edges: [(&str, &[&str]); 6] = [
            ("simkit.SimEntityBase", &["simkit.BasicSimEntity"]),
            (
                "simkit.BasicSimEntity",
                &["simkit.BasicSimEventSource", "simkit.SimEntity"],
            ),
            (
                "simkit.SimEntity",
                &["simkit.SimEventSource", "simkit.SimEventListener", "simkit.ReRunnable"],
            ),
            ("simkit.BasicSimEventSource", &["simkit.SimEventSource"]),
            (
                "simkit.stat.AbstractSimpleStats",
                &["simkit.stat.SampleStatistics", PROPERTY_CHANGE_LISTENER],
            ),
            ("simkit.util.SimplePropertyDumper", &[PROPERTY_CHANGE_LISTENER]),
        ];
        edges
            .into_iter()
            .map(|(class, parents)| {
                (
                    class.to_string(),
                    parents.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: LegoConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalize())
    }

    pub fn normalize(mut self) -> Self {
        self.target_type = self.target_type.trim().to_string();
        if self.target_type.is_empty() {
            self.target_type = DEFAULT_TARGET_TYPE.to_string();
        }
        self.excluded_dirs = clean_names(self.excluded_dirs);
        if self.excluded_dirs.is_empty() {
            self.excluded_dirs = Self::default_excluded_dirs();
        }
        self.reserved_dirs = clean_names(self.reserved_dirs);
        self
    }

    pub fn is_excluded_dir_name(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }

    pub fn is_reserved_dir_name(&self, name: &str) -> bool {
        self.reserved_dirs.iter().any(|d| d == name)
    }

    /// Candidate prefixes for label shortening: working directory, home, project root.
    pub fn label_prefixes(&self) -> Vec<PathBuf> {
        [std::env::current_dir().ok(), dirs::home_dir(), self.project_root.clone()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Strips the first matching prefix from `path` for display.
    pub fn shorten(&self, path: &Path) -> String {
        shorten_with(path, &self.label_prefixes())
    }
}

fn clean_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().trim_matches('/').to_string();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

pub(crate) fn shorten_with(path: &Path, prefixes: &[PathBuf]) -> String {
    for prefix in prefixes {
        if let Ok(rest) = path.strip_prefix(prefix) {
            if rest.as_os_str().is_empty() {
                continue;
            }
            return rest.display().to_string();
        }
    }
    path.display().to_string()
}
