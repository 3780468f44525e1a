use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::OUTLIER_COLOR;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Bottom panel – report of one spectrum
// ---------------------------------------------------------------------------

/// Render the report inspector: a spectrum picker and its report fields.
pub fn report_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    let selected_text = state
        .inspected
        .and_then(|i| dataset.spectra.get(i))
        .map_or_else(|| "Inspect spectrum…".to_string(), |sp| sp.id.clone());

    let mut inspected = state.inspected;
    egui::ComboBox::from_id_salt("inspect")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            for &idx in &state.visible_indices {
                if let Some(sp) = dataset.spectra.get(idx) {
                    ui.selectable_value(&mut inspected, Some(idx), &sp.id);
                }
            }
        });
    state.inspected = inspected;

    let Some(idx) = state.inspected else {
        return;
    };
    let Some(sp) = state.display_spectrum(idx) else {
        ui.label("Preprocessing failed for this spectrum.");
        return;
    };

    ui.label(format!("{} points, format {}", sp.len(), sp.format));
    if let Some(violations) = state.outliers.get(&idx) {
        for v in violations {
            ui.label(RichText::new(v).color(OUTLIER_COLOR));
        }
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(160.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Field");
            });
            header.col(|ui| {
                ui.strong("Type");
            });
            header.col(|ui| {
                ui.strong("Value");
            });
        })
        .body(|mut body| {
            for (name, value) in sp.report.iter() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(name);
                    });
                    row.col(|ui| {
                        ui.label(format!("{:?}", value.data_type()));
                    });
                    row.col(|ui| {
                        ui.label(value.to_string());
                    });
                });
            }
        });
}
