use crate::model::*;

fn kind_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Group(GroupKind::Root) => "root",
        NodeKind::Group(GroupKind::Directory) => "directory",
        NodeKind::Group(GroupKind::Package) => "package",
        NodeKind::Group(GroupKind::Archive) => "archive",
        NodeKind::Entity(d) if d.is_xml() => "event-graph",
        NodeKind::Entity(_) => "class",
    }
}

pub fn to_csv(tree: &Tree, mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["id", "parent", "kind", "label", "path", "identity"])?;
    for n in tree.depth_first(tree.root) {
        let Some(n) = tree.get(n) else { continue };
        writer.write_record([
            n.id.0.to_string(),
            n.parent.map(|p| p.0.to_string()).unwrap_or_default(),
            kind_name(&n.kind).to_string(),
            n.label.clone(),
            n.path.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
            n.kind.descriptor().map(|d| d.identity()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_json(tree: &Tree) -> serde_json::Value {
    serde_json::json!({
        "root": tree.root.0,
        "nodes": tree.depth_first(tree.root).into_iter().filter_map(|id| tree.get(id)).map(|n| serde_json::json!({
            "id": n.id.0,
            "parent": n.parent.as_ref().map(|p| p.0),
            "kind": kind_name(&n.kind),
            "label": n.label,
            "path": n.path,
            "class": n.kind.descriptor().map(|d| d.class_name()),
            "identity": n.kind.descriptor().map(|d| d.identity()),
            "children": n.children.iter().map(|c| c.0).collect::<Vec<_>>()
        })).collect::<Vec<_>>()
    })
}
