use eframe::egui::{self, RichText};

use crate::config::ViewerConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PartitionViewerApp {
    pub state: AppState,
}

impl PartitionViewerApp {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Ingest the first file dropped onto the window.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.state.ingest(&path);
        }
    }
}

impl eframe::App for PartitionViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selectors and labeling ----
        egui::SidePanel::left("control_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: parallel plot above, scatter below ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_height();
            plot::parallel_plot(ui, &self.state, available * 0.42);

            ui.vertical_centered(|ui| {
                let text = self.state.selected_count_text().unwrap_or_default();
                ui.label(RichText::new(text).size(16.0));
            });

            let remaining = ui.available_height();
            plot::scatter_plot(ui, &mut self.state, remaining);
        });
    }
}
