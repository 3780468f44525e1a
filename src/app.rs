use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, report};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct WorkbenchApp {
    pub state: AppState,
}

impl eframe::App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: preprocessing, outliers, selection ----
        egui::SidePanel::left("side_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: report inspector ----
        if self.state.dataset.is_some() {
            egui::TopBottomPanel::bottom("report_panel")
                .resizable(true)
                .default_height(180.0)
                .show(ctx, |ui| {
                    report::report_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::spectral_plot(ui, &self.state);
        });
    }
}
