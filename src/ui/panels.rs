use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use spectra_workbench::data::loader::{self, SPECTRUM_EXTENSIONS, WRITABLE_EXTENSIONS};
use spectra_workbench::data::report::ReportValue;

use crate::state::{AppState, Preprocessing};

// ---------------------------------------------------------------------------
// Left side panel – processing and selection widgets
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        ui.heading("Selection");
        ui.separator();
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let columns = dataset.column_names.clone();
    let unique = dataset.unique_values.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            processing_section(ui, state);
            ui.separator();
            outlier_section(ui, state);
            ui.separator();

            ui.heading("Selection");

            // ---- Colour-by selector ----
            ui.strong("Color by");
            let current_color_col = state.color_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(&current_color_col)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &columns {
                        if ui
                            .selectable_label(current_color_col == *col, col)
                            .clicked()
                        {
                            state.set_color_column(col.clone());
                        }
                    }
                });
            if let Some(cm) = &state.color_map {
                ui.horizontal_wrapped(|ui: &mut Ui| {
                    ui.label(RichText::new(format!("{}:", cm.column)).weak());
                    for (label, color) in cm.legend_entries() {
                        ui.label(RichText::new(label).color(color));
                    }
                });
            }
            ui.separator();

            // ---- Per-field selection widgets (collapsible) ----
            let mut toggled: Vec<(String, ReportValue)> = Vec::new();
            for col in &columns {
                let Some(all_values) = unique.get(col) else {
                    continue;
                };

                let n_selected = state.selections.get(col).map_or(0, |s| s.len());
                let header_text = format!("{col}  ({n_selected}/{})", all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        for val in all_values {
                            let mut checked = state
                                .selections
                                .get(col)
                                .is_some_and(|s| s.contains(val));

                            // Colour swatch if this is the colour field
                            let mut text = RichText::new(val.to_string());
                            if state.color_column.as_deref() == Some(col) {
                                if let Some(cm) = &state.color_map {
                                    text = text.color(cm.color_for(val));
                                }
                            }

                            if ui.checkbox(&mut checked, text).changed() {
                                toggled.push((col.clone(), val.clone()));
                            }
                        }
                    });
            }

            for (col, val) in toggled {
                state.toggle_selection_value(&col, &val);
            }
        });
}

fn processing_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Preprocessing");

    let mut choice = state.preprocessing;
    egui::ComboBox::from_id_salt("preprocessing")
        .selected_text(choice.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for p in Preprocessing::ALL {
                ui.selectable_value(&mut choice, p, p.to_string());
            }
        });

    let mut changed = choice != state.preprocessing;
    state.preprocessing = choice;

    if matches!(
        state.preprocessing,
        Preprocessing::Smoothing | Preprocessing::FirstDerivative
    ) {
        changed |= ui
            .add(egui::Slider::new(&mut state.half_window, 1..=25).text("half window"))
            .changed();
    }

    if changed {
        state.reprocess();
    }
}

fn outlier_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Outliers");

    if ui
        .checkbox(&mut state.detect_outliers, "Highlight outliers")
        .changed()
    {
        state.redetect();
    }

    ui.horizontal(|ui: &mut Ui| {
        if ui
            .button("Train envelope")
            .on_hover_text("Learn the amplitude range of the visible spectra")
            .clicked()
        {
            state.train_envelope();
        }
        if state.envelope.is_some() && ui.small_button("Clear").clicked() {
            state.envelope = None;
            state.redetect();
        }
    });

    if state.detect_outliers {
        let flagged = state
            .visible_indices
            .iter()
            .filter(|&&i| state.outliers.contains_key(&i))
            .count();
        ui.label(format!("{flagged} visible spectra flagged"));
    }
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
            let can_export = state.dataset.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export visible…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if state.loading {
            ui.spinner();
        }
        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} spectra loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.minmax_scaling, "Min-Max Scaling")
            .clicked()
        {
            state.minmax_scaling = !state.minmax_scaling;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open spectral data")
        .add_filter("Supported files", SPECTRUM_EXTENSIONS)
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Simple spectrum", &["sspec"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} spectra with fields {:?}",
                    dataset.len(),
                    dataset.column_names
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}

/// Save the visible spectra, as currently displayed, to a file.
pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export spectra")
        .add_filter("Supported files", WRITABLE_EXTENSIONS)
        .set_file_name("spectra.json")
        .save_file();

    let Some(path) = file else {
        return;
    };

    let spectra = state.visible_display_spectra();
    match loader::save_file(&path, &spectra) {
        Ok(()) => {
            log::info!("Exported {} spectra to {}", spectra.len(), path.display());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
