mod app;
mod cli;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use app::BioplotApp;
use clap::Parser;
use cli::{Cli, Command, ScatterKind};
use eframe::egui;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Volcano(args) => cli::run_scatter(ScatterKind::Volcano, &args),
        Command::Ma(args) => cli::run_scatter(ScatterKind::Ma, &args),
        Command::Density(args) => cli::run_density(&args),
        Command::Swatch(args) => cli::run_swatch(&args),
        Command::View { table } => run_viewer(table),
    }
}

fn run_viewer(table: Option<PathBuf>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Bioplot – Differential Expression Viewer",
        options,
        Box::new(move |_cc| {
            let mut app = BioplotApp::default();
            if let Some(path) = &table {
                app.state.open(path);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}
