//! Palette of simulation building blocks ("LEGOs") kept in sync with the filesystem.
//!
//! A [`LegoTree`] walks content roots (directories of compiled classes and event-graph XML,
//! or jar archives), asks a [`NodeClassifier`] whether each candidate satisfies the target
//! capability type, and keeps an arena [`Tree`] of group and entity nodes that a diagram
//! editor can render and drag from.

pub mod classfile;
pub mod classify;
pub mod config;
pub mod descriptor;
pub mod drag;
pub mod eventgraph;
pub mod export;
pub mod lego_tree;
pub mod model;
pub mod registry;
pub mod render;
pub mod scan;
pub mod search;
pub mod static_classifier;

pub use classify::*;
pub use config::*;
pub use descriptor::*;
pub use drag::*;
pub use lego_tree::*;
pub use model::*;
pub use registry::*;
pub use render::*;
pub use static_classifier::*;
