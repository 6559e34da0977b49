mod state;
mod ui;

use eframe::egui;
use state::{AppState, ContentRootEntry};
use tracing_subscriber::EnvFilter;

const ROOTS_KEY: &str = "lego-content-roots";

struct MyApp {
    state: AppState,
}

impl MyApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let roots: Vec<ContentRootEntry> = cc
            .storage
            .and_then(|s| eframe::get_value(s, ROOTS_KEY))
            .unwrap_or_default();
        Self {
            state: AppState::new(roots),
        }
    }
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::draw(&mut self.state, ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, ROOTS_KEY, &self.state.roots);
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "LEGO Palette",
        options,
        Box::new(|cc| Ok(Box::new(MyApp::new(cc)))),
    )
}
