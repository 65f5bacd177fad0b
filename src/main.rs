mod app;
mod color;
mod config;
mod data;
mod selection;
mod state;
mod ui;

use app::PartitionViewerApp;
use config::ViewerConfig;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ViewerConfig::load()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Partition Viewer – Parallel Coordinate and 2D Plot",
        options,
        Box::new(|_cc| Ok(Box::new(PartitionViewerApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("running viewer: {e}"))
}
