//! Diagnosis card.

use super::UiApp;
use eframe::egui;
use leaf_core::DiagnosisView;

impl UiApp {
    pub(super) fn render_diagnosis(&mut self, ui: &mut egui::Ui, view: &DiagnosisView) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.heading("Diagnosis");
            ui.separator();
            egui::Grid::new("diagnosis-grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Disease:");
                    ui.strong(&view.disease);
                    ui.end_row();
                    ui.label("Confidence:");
                    ui.label(&view.confidence);
                    ui.end_row();
                });
            ui.add_space(8.0);
            ui.strong("Description");
            ui.label(&view.description);
            ui.add_space(6.0);
            ui.strong("Recommended Treatment");
            ui.label(&view.treatment);
            ui.add_space(8.0);
            if ui.button("Copy diagnosis").clicked() {
                self.copy_to_clipboard(view.to_plain_text());
            }
        });
    }

    fn copy_to_clipboard(&mut self, text: String) {
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
            Ok(()) => self.status = "Diagnosis copied.".to_string(),
            Err(e) => {
                tracing::warn!("clipboard unavailable: {e}");
                self.status = format!("Copy failed: {e}");
            }
        }
    }
}
