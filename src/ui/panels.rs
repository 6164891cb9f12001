use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::dashboard::export_json;
use crate::data::filter::MULTI_SELECT_COLUMNS;
use crate::data::loader::load_dataset;
use crate::data::model::Column;
use crate::data::normalize::SchemaError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Nationality / Gender / Project (multi-select) ----
            for col in MULTI_SELECT_COLUMNS {
                let options = dataset.options(col);
                let n_selected = state.selection.values(col).map_or(0, |s| s.len());
                let header_text = if n_selected == 0 {
                    format!("{col}  (all)")
                } else {
                    format!("{col}  ({n_selected}/{})", options.len())
                };

                let mut toggled: Option<String> = None;
                let mut cleared = false;

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Clear").clicked() {
                            cleared = true;
                        }
                        for val in &options {
                            let mut checked = state
                                .selection
                                .values(col)
                                .is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.as_str()).changed() {
                                toggled = Some(val.clone());
                            }
                        }
                    });

                // Applied after rendering so each click triggers exactly one refresh.
                if cleared {
                    state.clear_values(col);
                } else if let Some(val) = toggled {
                    state.toggle_value(col, &val);
                }
            }

            ui.separator();

            // ---- Region (single-select, locality chart only) ----
            ui.strong("Region");
            let current = state.selection.region.clone();
            let mut chosen: Option<Option<String>> = None;
            egui::ComboBox::from_id_salt("region_filter")
                .selected_text(current.as_deref().unwrap_or("All regions"))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui.selectable_label(current.is_none(), "All regions").clicked() {
                        chosen = Some(None);
                    }
                    for region in dataset.options(Column::Region) {
                        let is_current = current.as_deref() == Some(region.as_str());
                        if ui.selectable_label(is_current, region.as_str()).clicked() {
                            chosen = Some(Some(region));
                        }
                    }
                });
            if let Some(region) = chosen {
                state.set_region(region);
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
            let has_data = state.dataset.is_some();
            if ui
                .add_enabled(has_data, egui::Button::new("Export chart data…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} match the filters",
                ds.len(),
                state.payload.matched_records
            ));
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
        .set_title("Open survey data")
        .add_filter("Supported files", &["xlsx", "xlsm", "xls", "ods", "csv", "json", "parquet", "pq"])
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    let Some(path) = file else {
        return;
    };
    match load_dataset(&path) {
        Ok(dataset) => {
            log::info!("Loaded {} records from {}", dataset.len(), path.display());
            state.set_dataset_from(&path, dataset);
        }
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            let msg = match e.downcast_ref::<SchemaError>() {
                Some(schema) => format!("Schema error: {schema}"),
                None => format!("Error: {e:#}"),
            };
            state.status_message = Some(msg);
        }
    }
}

fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export chart data")
        .set_file_name("charts.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = export_json(&path, &state.selection, &state.payload) {
            log::error!("Failed to export chart data: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
