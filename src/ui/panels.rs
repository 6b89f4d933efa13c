use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_bioplot::classify::Category;
use rusty_bioplot::data::loader::SUPPORTED_EXTENSIONS;

use crate::state::{AppState, PlotKind};
use crate::ui::plot::color32;

// ---------------------------------------------------------------------------
// Left side panel – plot controls and highlights
// ---------------------------------------------------------------------------

/// Combo box over `choices`; returns true when the selection changed.
fn column_combo(ui: &mut Ui, label: &str, current: &mut Option<String>, choices: &[String]) -> bool {
    let mut changed = false;
    egui::ComboBox::from_label(label)
        .selected_text(current.as_deref().unwrap_or("–"))
        .show_ui(ui, |ui: &mut Ui| {
            for choice in choices {
                let is_current = current.as_deref() == Some(choice.as_str());
                if ui.selectable_label(is_current, choice.as_str()).clicked() && !is_current {
                    *current = Some(choice.clone());
                    changed = true;
                }
            }
        });
    changed
}

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Plot");
    ui.separator();

    let table = match &state.table {
        Some(t) => t,
        None => {
            ui.label("No table loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the widgets.
    let numeric: Vec<String> = table.numeric_columns().into_iter().map(String::from).collect();
    let text: Vec<String> = table.text_columns().into_iter().map(String::from).collect();
    let unique = state
        .highlight_column
        .as_ref()
        .and_then(|c| table.unique_values.get(c))
        .cloned()
        .unwrap_or_default();

    let mut changed = false;

    egui::ComboBox::from_label("Plot type")
        .selected_text(state.plot_kind.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in PlotKind::ALL {
                changed |= ui
                    .selectable_value(&mut state.plot_kind, kind, kind.to_string())
                    .changed();
            }
        });

    ui.add_space(4.0);
    match state.plot_kind {
        PlotKind::Density => {
            changed |= column_combo(ui, "Values", &mut state.mean_column, &numeric);
            changed |= ui.checkbox(&mut state.cumulative, "Cumulative").changed();
        }
        kind => {
            changed |= column_combo(ui, "Effect size", &mut state.effect_column, &numeric);
            changed |= column_combo(ui, "Significance", &mut state.significance_column, &numeric);
            if kind == PlotKind::Ma {
                changed |= column_combo(ui, "Mean", &mut state.mean_column, &numeric);
            }

            ui.add_space(4.0);
            ui.horizontal(|ui: &mut Ui| {
                ui.label("|fold change| >");
                changed |= ui
                    .add(
                        DragValue::new(&mut state.thresholds.effect)
                            .speed(0.05)
                            .range(0.0..=20.0),
                    )
                    .changed();
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("FDR <");
                changed |= ui
                    .add(
                        DragValue::new(&mut state.thresholds.significance)
                            .speed(0.001)
                            .range(0.0..=1.0),
                    )
                    .changed();
            });
        }
    }
    changed |= column_combo(ui, "Identifier", &mut state.id_column, &text);

    if changed {
        state.rebuild();
    }

    ui.add_space(8.0);
    ui.heading("Highlight");
    ui.separator();

    let mut highlight_column = state.highlight_column.clone();
    if column_combo(ui, "Column", &mut highlight_column, &text) {
        if let Some(col) = highlight_column {
            state.set_highlight_column(col);
        }
        // The value list belongs to the old column; draw it next frame.
        return;
    }
    let Some(col) = state.highlight_column.clone() else {
        ui.label("No text column to highlight by.");
        return;
    };

    let n_selected = state.selection.get(&col).map_or(0, |s| s.len());
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{n_selected}/{} selected", unique.len()));
        if ui.small_button("None").clicked() {
            state.select_none(&col);
        }
    });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for val in &unique {
                let mut checked = state
                    .selection
                    .get(&col)
                    .is_some_and(|s| s.contains(val));

                // Show the value in its highlight colour
                let mut label = RichText::new(val.to_string());
                if let Some(cm) = &state.color_map {
                    label = label.color(color32(cm.color_for(val), 1.0));
                }

                if ui.checkbox(&mut checked, label).changed() {
                    state.toggle_highlight_value(&col, val);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Bottom panel – significant features
// ---------------------------------------------------------------------------

pub fn feature_table(ui: &mut Ui, state: &AppState) {
    if state.figure.is_none() || state.plot_kind == PlotKind::Density {
        return;
    }
    ui.label(format!("{} significant features", state.significant.len()));

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(140.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["id", "effect size", "significance", "category"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, state.significant.len(), |mut row| {
                let r = &state.significant[row.index()];
                row.col(|ui: &mut Ui| {
                    ui.label(r.id.as_str());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.3}", r.effect));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.3e}", r.significance));
                });
                row.col(|ui: &mut Ui| {
                    let color = match r.category {
                        Category::Upregulated => Color32::DARK_RED,
                        _ => Color32::DARK_BLUE,
                    };
                    ui.label(RichText::new(r.category.to_string()).color(color));
                });
            });
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
            let can_export = state.figure.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(table), Some(path)) = (&state.table, &state.source) {
            ui.label(format!("{} rows from {}", table.len(), path.display()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open results table")
        .add_filter("Supported files", &SUPPORTED_EXTENSIONS)
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV / TSV", &["csv", "tsv", "txt"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}

pub fn export_dialog(state: &mut AppState) {
    let Some(figure) = &state.figure else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export figure")
        .set_file_name(format!("{}.png", state.plot_kind.to_string().to_lowercase()))
        .add_filter("PNG", &["png"])
        .add_filter("SVG", &["svg"])
        .save_file();

    let Some(mut path) = file else {
        return;
    };
    if path.extension().is_none() {
        path.set_extension("png");
    }
    match figure.save(&path) {
        Ok(()) => {
            log::info!("Exported figure to {}", path.display());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to export figure: {e}");
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
