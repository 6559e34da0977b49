//! Header of an event-graph XML document: just enough of the root `<SimEntity>` element to
//! name the entity and the types it extends and implements.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

pub const EVENT_GRAPH_ROOT: &str = "SimEntity";
pub const DEFAULT_EVENT_GRAPH_BASE: &str = "simkit.SimEntityBase";

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static START_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z_][\w:.\-]*)((?:[^>/]|/[^>])*)/?>").unwrap());
static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_][\w:.\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventGraphError {
    #[error("document has no root element")]
    NoRootElement,
    #[error("root element is <{0}>, not an event graph")]
    NotAnEventGraph(String),
    #[error("event graph has no name attribute")]
    MissingName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventGraphHeader {
    pub name: String,
    pub package: String,
    pub extend: Option<String>,
    pub implement: Vec<String>,
}

impl EventGraphHeader {
    pub fn parse(text: &str) -> Result<Self, EventGraphError> {
        let text = COMMENT.replace_all(text, "");
        let root = START_TAG
            .captures(&text)
            .ok_or(EventGraphError::NoRootElement)?;
        let tag = &root[1];
        if tag != EVENT_GRAPH_ROOT {
            return Err(EventGraphError::NotAnEventGraph(tag.to_string()));
        }
        let attrs: HashMap<&str, &str> = ATTRIBUTE
            .captures_iter(root.get(2).map(|m| m.as_str()).unwrap_or(""))
            .filter_map(|c| {
                let key = c.get(1)?.as_str();
                let value = c.get(2).or_else(|| c.get(3))?.as_str();
                Some((key, value))
            })
            .collect();

        let name = attrs
            .get("name")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or(EventGraphError::MissingName)?
            .to_string();
        let package = attrs.get("package").map(|s| s.trim()).unwrap_or("").to_string();
        let extend = attrs
            .get("extend")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from);
        let implement = attrs
            .get("implement")
            .map(|s| {
                s.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(EventGraphHeader {
            name,
            package,
            extend,
            implement,
        })
    }

    pub fn class_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Superclass the generated entity will have.
    pub fn super_class(&self) -> &str {
        self.extend.as_deref().unwrap_or(DEFAULT_EVENT_GRAPH_BASE)
    }
}
