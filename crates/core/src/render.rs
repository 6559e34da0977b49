use crate::descriptor::NodeDescriptor;
use crate::model::{GroupKind, NodeId, NodeKind, Tree, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Root,
    Folder,
    Package,
    Archive,
    CompiledClass,
    XmlSource,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Root => "🌳",
            Icon::Folder => "📁",
            Icon::Package => "📦",
            Icon::Archive => "🗄",
            Icon::CompiledClass => "☕",
            Icon::XmlSource => "📄",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderAttrs {
    pub icon: Icon,
    pub label: String,
    pub tooltip: Option<String>,
}

/// Maps a node to what a view shows for it.
pub trait NodeRenderer {
    fn render(&self, node: &TreeNode) -> RenderAttrs;
}

impl<F> NodeRenderer for F
where
    F: Fn(&TreeNode) -> RenderAttrs,
{
    fn render(&self, node: &TreeNode) -> RenderAttrs {
        self(node)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRenderer;

impl NodeRenderer for DefaultRenderer {
    fn render(&self, node: &TreeNode) -> RenderAttrs {
        match &node.kind {
            NodeKind::Group(kind) => RenderAttrs {
                icon: match kind {
                    GroupKind::Root => Icon::Root,
                    GroupKind::Directory => Icon::Folder,
                    GroupKind::Package => Icon::Package,
                    GroupKind::Archive => Icon::Archive,
                },
                label: node.label.clone(),
                tooltip: node.path.as_ref().map(|p| p.display().to_string()),
            },
            NodeKind::Entity(descriptor) => RenderAttrs {
                icon: if descriptor.is_xml() {
                    Icon::XmlSource
                } else {
                    Icon::CompiledClass
                },
                label: node.label.clone(),
                tooltip: Some(entity_tooltip(descriptor)),
            },
        }
    }
}

fn entity_tooltip(descriptor: &NodeDescriptor) -> String {
    match descriptor {
        NodeDescriptor::CompiledClass {
            class_name,
            class_file: Some(file),
        } => format!("{class_name}\n{}", file.display()),
        NodeDescriptor::CompiledClass {
            class_name,
            class_file: None,
        } => class_name.clone(),
        NodeDescriptor::XmlSource {
            class_name,
            xml_source,
            ..
        } => format!("{class_name}\n{} (event graph)", xml_source.display()),
    }
}

/// Indented text outline of the tree below the root.
pub fn render_ascii(tree: &Tree, renderer: &dyn NodeRenderer) -> String {
    fn walk(tree: &Tree, id: NodeId, depth: usize, renderer: &dyn NodeRenderer, out: &mut String) {
        for child in tree.children(id) {
            let Some(node) = tree.get(*child) else { continue };
            let attrs = renderer.render(node);
            out.push_str(&"  ".repeat(depth));
            out.push_str(attrs.icon.glyph());
            out.push(' ');
            out.push_str(&attrs.label);
            out.push('\n');
            walk(tree, *child, depth + 1, renderer, out);
        }
    }

    let mut out = String::new();
    walk(tree, tree.root, 0, renderer, &mut out);
    out
}
