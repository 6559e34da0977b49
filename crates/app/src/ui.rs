use eframe::egui::{self, Ui};
use std::path::PathBuf;
use lego_core::search::filter_leaves;
use lego_core::{DefaultRenderer, LegoTree, NodeId, NodeKind, NodeRenderer, Severity};

use crate::state::AppState;

enum PaletteAction {
    Select(NodeId),
    BeginDrag(NodeId),
    OpenSource(PathBuf),
    RemoveRoot(PathBuf),
}

pub fn draw(app: &mut AppState, ctx: &egui::Context) {
    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        top_bar(ui, app);
    });

    egui::TopBottomPanel::bottom("diagnostics")
        .resizable(true)
        .default_height(120.0)
        .show(ctx, |ui| {
            diagnostics(ui, app);
        });

    let mut actions = Vec::new();
    egui::SidePanel::left("palette").resizable(true).default_width(320.0).show(ctx, |ui| {
        ui.heading("LEGOs");
        ui.label(format!("Implementing {}", app.lego.target_class()));
        ui.separator();
        egui::ScrollArea::vertical().show(ui, |ui| {
            if app.search.trim().is_empty() {
                let root = app.lego.tree().root;
                for child in app.lego.tree().children(root) {
                    node_ui(ui, &app.lego, *child, &mut actions);
                }
            } else {
                for (id, _) in filter_leaves(app.lego.tree(), app.search.trim()) {
                    node_ui(ui, &app.lego, id, &mut actions);
                }
            }
        });
    });

    for action in actions {
        match action {
            PaletteAction::Select(id) => app.select(id),
            PaletteAction::BeginDrag(id) => app.begin_drag(id, ctx),
            PaletteAction::OpenSource(path) => app.open_source(&path),
            PaletteAction::RemoveRoot(path) => app.remove_root(&path),
        }
    }

    egui::CentralPanel::default().show(ctx, |ui| {
        canvas(ui, app);
    });

    // the canvas has already taken any drop by now
    if ctx.input(|i| i.pointer.any_released()) {
        app.lego.end_drag();
    }
}

fn top_bar(ui: &mut Ui, app: &mut AppState) {
    ui.horizontal(|ui| {
        if ui.button("Add Folder…").clicked() {
            if let Some(path) = rfd::FileDialog::new().pick_folder() {
                let recurse = app.recurse;
                app.add_root(path, recurse);
            }
        }
        ui.checkbox(&mut app.recurse, "Recurse");
        if ui.button("Add Jar…").clicked() {
            if let Some(path) = rfd::FileDialog::new().add_filter("Java archive", &["jar"]).pick_file() {
                app.add_root(path, false);
            }
        }
        ui.separator();
        if ui.button("Rebuild").clicked() {
            app.rebuild();
        }
        if ui.button("Clear").clicked() {
            app.clear();
        }
        ui.separator();
        ui.label("Search:");
        ui.text_edit_singleline(&mut app.search);
    });
}

fn node_ui(ui: &mut Ui, lego: &LegoTree, id: NodeId, actions: &mut Vec<PaletteAction>) {
    let Some(node) = lego.tree().get(id) else { return };
    let attrs = DefaultRenderer.render(node);
    let text = format!("{} {}", attrs.icon.glyph(), attrs.label);

    match &node.kind {
        NodeKind::Group(_) => {
            let header = egui::CollapsingHeader::new(text)
                .id_source(("lego-node", id.0))
                .default_open(true)
                .show(ui, |ui| {
                    for child in lego.tree().children(id) {
                        node_ui(ui, lego, *child, actions);
                    }
                });
            let is_root_entry = node.parent == Some(lego.tree().root);
            if let (true, Some(path)) = (is_root_entry, node.path.clone()) {
                header.header_response.context_menu(|ui| {
                    if ui.button("Remove").clicked() {
                        actions.push(PaletteAction::RemoveRoot(path.clone()));
                        ui.close_menu();
                    }
                });
            }
        }
        NodeKind::Entity(descriptor) => {
            let selected = lego.selection() == [id];
            let mut response = ui
                .add(egui::SelectableLabel::new(selected, text))
                .interact(egui::Sense::click_and_drag());
            if let Some(tip) = &attrs.tooltip {
                response = response.on_hover_text(tip);
            }
            if response.clicked() {
                actions.push(PaletteAction::Select(id));
            }
            if response.drag_started() {
                actions.push(PaletteAction::BeginDrag(id));
            }
            if let Some(path) = descriptor.canonical_path().map(|p| p.to_path_buf()) {
                response.context_menu(|ui| {
                    if ui.button("Open source").clicked() {
                        actions.push(PaletteAction::OpenSource(path.clone()));
                        ui.close_menu();
                    }
                });
            }
        }
    }
}

fn canvas(ui: &mut Ui, app: &mut AppState) {
    ui.heading("Canvas");
    if app.model.borrow().dirty {
        ui.label("● modified");
    }
    let frame = egui::Frame::default().inner_margin(12.0);
    let (_, payload) = ui.dnd_drop_zone::<String, ()>(frame, |ui| {
        ui.set_min_size(ui.available_size());
        if app.dropped.is_empty() {
            ui.label("Drag LEGOs here");
        }
        for entity in &app.dropped {
            ui.label(entity.class_name());
        }
    });
    if let Some(payload) = payload {
        app.drop_payload(&payload);
    }
    if let Some(err) = &app.last_drop_error {
        ui.colored_label(egui::Color32::RED, err);
    }
}

fn diagnostics(ui: &mut Ui, app: &mut AppState) {
    let messages = app.messages.borrow();
    ui.horizontal(|ui| {
        ui.strong("Messages");
        ui.label(format!(
            "{} errors, {} warnings",
            messages.count(Severity::Error),
            messages.count(Severity::Warning)
        ));
    });
    egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
        for d in messages.diagnostics() {
            let color = match d.severity {
                Severity::Info => ui.visuals().text_color(),
                Severity::Warning => egui::Color32::YELLOW,
                Severity::Error => egui::Color32::RED,
            };
            ui.colored_label(
                color,
                format!("{}  {}: {}", d.at.format("%H:%M:%S"), d.title, strip_tags(&d.message)),
            );
        }
    });
}

/// Messages carry light HTML markup; the panel shows plain text.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}
