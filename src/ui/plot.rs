use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use spectra_workbench::data::model::Spectrum;

use crate::color::OUTLIER_COLOR;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectral plot (central panel)
// ---------------------------------------------------------------------------

fn scaled_amplitudes(sp: &Spectrum, minmax: bool) -> Vec<f64> {
    let y = sp.amplitudes();
    if !minmax {
        return y;
    }
    let (Some(min), Some(max)) = (sp.min_amplitude(), sp.max_amplitude()) else {
        return y;
    };
    let range = max - min;
    if range.abs() < f64::EPSILON {
        vec![0.0; y.len()]
    } else {
        y.iter().map(|&yi| (yi - min) / range).collect()
    }
}

/// Render the spectral plot in the central panel.
pub fn spectral_plot(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view spectra  (File → Open…)");
        });
        return;
    };

    let color_map = &state.color_map;
    let color_col = state.color_column.as_deref();

    Plot::new("spectral_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Wave number")
        .y_axis_label("Amplitude")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for &idx in &state.visible_indices {
                // Legend and colour come from the raw spectrum's report.
                let Some(raw) = dataset.spectra.get(idx) else {
                    continue;
                };
                let Some(sp) = state.display_spectrum(idx) else {
                    continue;
                };
                let is_outlier = state.outliers.contains_key(&idx);

                let color = if is_outlier {
                    OUTLIER_COLOR
                } else {
                    color_col
                        .and_then(|col| {
                            let val = raw.report.value(col)?;
                            let cm = color_map.as_ref()?;
                            Some(cm.color_for(val))
                        })
                        .unwrap_or(Color32::LIGHT_BLUE)
                };

                let name = if is_outlier {
                    "outlier".to_string()
                } else {
                    color_col
                        .and_then(|col| raw.report.value(col))
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| raw.id.clone())
                };

                let points: PlotPoints = sp
                    .wave_numbers()
                    .into_iter()
                    .zip(scaled_amplitudes(sp, state.minmax_scaling))
                    .map(|(x, y)| [x, y])
                    .collect();

                let line = Line::new(points)
                    .name(&name)
                    .color(color)
                    .width(if is_outlier { 2.0 } else { 1.5 });

                plot_ui.line(line);
            }
        });
}
