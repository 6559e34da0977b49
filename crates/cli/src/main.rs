use anyhow::Context;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use lego_core::search::filter_leaves;
use lego_core::{
    render_ascii, DefaultRenderer, DragObserver, DragPlatform, DragStartError, DragToken,
    LegoConfig, LegoTree, RecordingMessenger, Severity,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lego-cli", about = "Builds the LEGO palette for event graphs and assemblies")]
struct Args {
    /// Directories, class files, event graphs or jars to scan
    #[arg(required = true)]
    roots: Vec<PathBuf>,
    /// Descend into subdirectories of every root
    #[arg(short, long)]
    recurse: bool,
    /// Type every LEGO must implement or extend
    #[arg(short, long)]
    target: Option<String>,
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Output JSON report path
    #[arg(long)]
    json: Option<PathBuf>,
    /// Output CSV report path
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Only list LEGOs matching this fuzzy pattern
    #[arg(short, long)]
    search: Option<String>,
    /// Print the drag transfer string of the LEGO with this label
    #[arg(long)]
    drag: Option<String>,
}

/// Writes the transferable to stdout instead of a native drag.
struct StdoutPlatform;

impl DragPlatform for StdoutPlatform {
    fn start_drag(&mut self, token: &DragToken) -> Result<(), DragStartError> {
        println!("{}", token.to_transfer_string());
        Ok(())
    }
}

struct LogObserver;

impl DragObserver for LogObserver {
    fn starting_drag(&mut self, token: &DragToken) {
        tracing::info!(interface = %token.interface_name, "starting drag");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => LegoConfig::load(path)?,
        None => LegoConfig::default(),
    };
    if let Some(target) = args.target {
        config.target_type = target;
        config = config.normalize();
    }

    let messages = Rc::new(RefCell::new(RecordingMessenger::new()));
    let mut lego = LegoTree::with_static_classifier(config, Box::new(messages.clone()));
    lego.set_drag_observer(Box::new(LogObserver));
    lego.add_content_roots(args.roots.iter().map(|p| (p.as_path(), args.recurse)));

    match &args.search {
        Some(needle) => {
            for (id, score) in filter_leaves(lego.tree(), needle) {
                if let Some(node) = lego.tree().get(id) {
                    let class = node.kind.descriptor().map(|d| d.class_name()).unwrap_or("");
                    println!("{score:>5}  {}  ({class})", node.label);
                }
            }
        }
        None => print!("{}", render_ascii(lego.tree(), &DefaultRenderer)),
    }

    if let Some(label) = &args.drag {
        let leaf = lego
            .tree()
            .leaves()
            .map(|(id, _)| id)
            .find(|id| lego.tree().get(*id).is_some_and(|n| &n.label == label))
            .with_context(|| format!("no LEGO labelled {label}"))?;
        lego.select(&[leaf]);
        lego.begin_drag(&mut StdoutPlatform);
        lego.end_drag();
    }

    if let Some(path) = &args.json {
        let json = lego_core::export::to_json(lego.tree());
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        lego_core::export::to_csv(lego.tree(), file)?;
    }

    let messages = messages.borrow();
    eprintln!(
        "{} LEGOs, {} errors, {} warnings",
        lego.tree().leaves().count(),
        messages.count(Severity::Error),
        messages.count(Severity::Warning)
    );
    Ok(())
}
