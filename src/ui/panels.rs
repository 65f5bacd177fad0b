use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{ChannelPair, LabelAction};
use crate::selection::SelectionTool;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selectors, labeling and tallies
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            upload_section(ui, state);

            let samples = match &state.dataset {
                Some(ds) => ds.samples().to_vec(),
                None => {
                    ui.separator();
                    ui.label("No dataset loaded.");
                    return;
                }
            };

            ui.separator();
            ui.strong("Sample");
            let current = state.sample.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("sample")
                .selected_text(&current)
                .show_ui(ui, |ui: &mut Ui| {
                    for sample in &samples {
                        if ui.selectable_label(current == *sample, sample).clicked() {
                            state.select_sample(sample.clone());
                        }
                    }
                });

            ui.add_space(6.0);
            ui.strong("Dye combination");
            egui::ComboBox::from_id_salt("channel_pair")
                .selected_text(state.pair.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for pair in ChannelPair::ALL {
                        if ui.selectable_label(state.pair == pair, pair.label()).clicked() {
                            state.select_pair(pair);
                        }
                    }
                });

            ui.add_space(6.0);
            ui.strong("Selection tool");
            ui.horizontal(|ui: &mut Ui| {
                for tool in [SelectionTool::Box, SelectionTool::Lasso] {
                    ui.selectable_value(&mut state.tool, tool, tool.label());
                }
            });
            if state.selection.is_some() && ui.small_button("Clear selection").clicked() {
                state.clear_selection();
            }

            ui.separator();
            labeling_section(ui, state);

            ui.separator();
            tally_table(ui, state);
        });
}

fn upload_section(ui: &mut Ui, state: &AppState) {
    ui.heading("Upload");
    match &state.upload {
        Some(upload) => {
            ui.label(format!("Uploaded: {}", upload.file_name));
            ui.label(format!("Run Name: {}", upload.runs.join(", ")));
            ui.label(format!("Number of rows: {}", upload.rows));
            ui.label(format!("Number of columns: {}", upload.columns));
        }
        None => {
            ui.label("Drag and drop a file here or use File → Open…");
        }
    }
}

fn labeling_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Labeling");
    egui::ComboBox::from_id_salt("label_action")
        .selected_text(state.label_action.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for action in LabelAction::ALL {
                ui.selectable_value(&mut state.label_action, action, action.to_string());
            }
        });

    let has_selection = state.selection.is_some();
    if ui
        .add_enabled(has_selection, egui::Button::new("Apply to selection"))
        .clicked()
    {
        let updated = state.apply_label();
        log::info!("{} applied to {updated} partitions", state.label_action);
    }
}

/// Positive and measured counts per labeled channel for the current sample.
fn tally_table(ui: &mut Ui, state: &AppState) {
    let tally = state.tally();
    if tally.is_empty() {
        return;
    }

    ui.strong("Label counts");
    TableBuilder::new(ui)
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(70.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(60.0))
        .header(20.0, |mut header| {
            for title in ["Channel", "Pos", "Total"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for entry in &tally {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(entry.channel.name());
                    });
                    row.col(|ui| {
                        ui.label(entry.positives.to_string());
                    });
                    row.col(|ui| {
                        ui.label(entry.measured.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} partitions in {} samples",
                ds.len(),
                ds.samples().len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open partition data")
        .add_filter("Supported files", &["csv", "xls", "xlsx", "parquet"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xls", "xlsx"])
        .add_filter("Parquet", &["parquet"])
        .pick_file();

    if let Some(path) = file {
        state.ingest(&path);
    }
}
