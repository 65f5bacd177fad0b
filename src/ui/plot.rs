use std::collections::HashSet;

use eframe::egui::{Align2, Color32, PointerButton, RichText, Stroke, Ui};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text, VLine};

use crate::color::{ColorScale, MISSING_COLOR};
use crate::data::filter::{ParallelLine, ParallelView};
use crate::data::model::RowId;
use crate::selection::SelectionShape;
use crate::state::AppState;

const DIMMED_LINE: Color32 = Color32::from_rgba_premultiplied(150, 150, 150, 40);
const SELECTION_OUTLINE: Color32 = Color32::from_rgb(40, 40, 40);

fn placeholder(ui: &mut Ui, height: f32, text: &str) {
    ui.allocate_ui(eframe::egui::vec2(ui.available_width(), height), |ui: &mut Ui| {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(text);
        });
    });
}

// ---------------------------------------------------------------------------
// Parallel coordinates (upper central panel)
// ---------------------------------------------------------------------------

/// Render the parallel-coordinates plot for the selected sample.
pub fn parallel_plot(ui: &mut Ui, state: &AppState, height: f32) {
    let Some(view) = state.parallel() else {
        placeholder(ui, height, "Open a file to view partitions  (File → Open…)");
        return;
    };
    if view.dimensions.is_empty() {
        placeholder(ui, height, "No measurements for this sample.");
        return;
    }

    let scale = view
        .color_range()
        .map(|range| ColorScale::new(range, state.config.color_bins));
    let names: Vec<String> = view.dimensions.iter().map(|c| c.column_name()).collect();
    let axis_names = names.clone();
    let last_axis = (names.len() - 1) as f64;

    Plot::new("parallel_plot")
        .height(height)
        .show_axes([true, false])
        .show_grid([false, true])
        .include_x(-0.3)
        .include_x(last_axis + 0.3)
        .include_y(-0.08)
        .include_y(1.05)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 {
                axis_names.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            for line in &view.dimmed {
                for segment in segments(&view, line) {
                    plot_ui.line(Line::new(segment).color(DIMMED_LINE).width(1.0));
                }
            }

            for line in &view.lines {
                let color = match (&scale, view.color_value(line)) {
                    (Some(scale), Some(v)) => scale.color_for(v),
                    _ => MISSING_COLOR,
                };
                for segment in segments(&view, line) {
                    plot_ui.line(Line::new(segment).color(color).width(1.2));
                }
            }

            for (d, name) in names.iter().enumerate() {
                let x = d as f64;
                plot_ui.vline(VLine::new(x).color(Color32::DARK_GRAY).width(1.5));
                if let Some((lo, hi)) = view.ranges[d] {
                    plot_ui.text(
                        Text::new(PlotPoint::new(x, 1.0), format!("{hi:.0}"))
                            .anchor(Align2::CENTER_BOTTOM),
                    );
                    plot_ui.text(
                        Text::new(PlotPoint::new(x, 0.0), format!("{lo:.0}"))
                            .anchor(Align2::CENTER_TOP),
                    );
                }
                plot_ui.text(
                    Text::new(PlotPoint::new(x, 1.05), RichText::new(name).strong())
                        .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}

/// Polyline pieces of one partition; a missing value breaks the line.
fn segments(view: &ParallelView, line: &ParallelLine) -> Vec<Vec<[f64; 2]>> {
    let mut out = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for (d, value) in line.values.iter().enumerate() {
        match value {
            Some(v) => current.push([d as f64, view.normalize(d, *v)]),
            None => {
                if current.len() > 1 {
                    out.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() > 1 {
        out.push(current);
    }
    out
}

// ---------------------------------------------------------------------------
// 2D scatter (lower central panel)
// ---------------------------------------------------------------------------

/// Render the scatter plot and handle box / lasso selection on it.
pub fn scatter_plot(ui: &mut Ui, state: &mut AppState, height: f32) {
    let view = match state.scatter() {
        None => {
            placeholder(ui, height, "Select a sample to view the scatter plot.");
            return;
        }
        Some(Err(e)) => {
            placeholder(ui, height, &e.to_string());
            return;
        }
        Some(Ok(view)) => view,
    };

    let x_name = view.pair.first().column_name();
    let y_name = view.pair.second().column_name();
    let scale = view
        .color_range
        .map(|range| ColorScale::new(range, state.config.color_bins));

    // Bucket points by colour bin so each bin is one Points item.
    let n_bins = scale.as_ref().map_or(1, ColorScale::bins);
    let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); n_bins];
    for point in &view.points {
        if let (Some(pos), Some(y)) = (point.position(), point.y) {
            let bin = scale.as_ref().map_or(0, |s| s.bin_for(y));
            buckets[bin].push(pos);
        }
    }
    let selected: Vec<[f64; 2]> = match &state.selection {
        Some(sel) => {
            let picked: HashSet<RowId> = sel.ids.iter().copied().collect();
            view.points
                .iter()
                .filter(|p| picked.contains(&p.id))
                .filter_map(|p| p.position())
                .collect()
        }
        None => Vec::new(),
    };

    let radius = state.config.point_radius;
    let drag_outline = SelectionShape::from_drag(state.tool, &state.drag_path).map(|s| s.outline());

    let response = Plot::new("scatter_plot")
        .height(height)
        .x_axis_label(&x_name)
        .y_axis_label(&y_name)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (bin, points) in buckets.into_iter().enumerate() {
                if points.is_empty() {
                    continue;
                }
                let color = scale.as_ref().map_or(MISSING_COLOR, |s| s.bin_color(bin));
                plot_ui.points(Points::new(points).radius(radius).color(color));
            }

            if !selected.is_empty() {
                plot_ui.points(
                    Points::new(selected)
                        .radius(radius + 1.5)
                        .filled(false)
                        .color(SELECTION_OUTLINE)
                        .name("selected"),
                );
            }

            if let Some(outline) = drag_outline {
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(outline))
                        .stroke(Stroke::new(1.0, SELECTION_OUTLINE))
                        .fill_color(Color32::from_rgba_unmultiplied(80, 120, 200, 30)),
                );
            }

            plot_ui.pointer_coordinate()
        });

    let pointer = response.inner;
    let r = &response.response;

    if r.double_clicked() {
        state.drag_path.clear();
        state.clear_selection();
        return;
    }
    if r.drag_started_by(PointerButton::Primary) {
        state.drag_path.clear();
    }
    if r.dragged_by(PointerButton::Primary) {
        if let Some(p) = pointer {
            state.drag_path.push([p.x, p.y]);
        }
    }
    if r.drag_stopped_by(PointerButton::Primary) {
        let path = std::mem::take(&mut state.drag_path);
        if let Some(shape) = SelectionShape::from_drag(state.tool, &path) {
            let ids = view.select(|p| shape.contains(p));
            state.set_selection(ids);
        }
    }
}
