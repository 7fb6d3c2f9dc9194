//! Settings panel rendering for the service endpoint, timeout and health probe.

use super::UiApp;
use anyhow::{Context, Result};
use eframe::egui;
use leaf_core::{ClientConfig, ClientSettings, HttpDiagnosisClient, SubmitError};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;

impl UiApp {
    /// Renders the settings screen.
    pub(super) fn render_settings_panel(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Service endpoint");
            ui.add(egui::TextEdit::singleline(&mut self.endpoint_input).desired_width(360.0));
        });
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label("Timeout");
            ui.add(
                egui::DragValue::new(&mut self.timeout_secs)
                    .range(0..=300)
                    .speed(1)
                    .suffix(" s"),
            );
            ui.label("(0 waits indefinitely)");
        });
        ui.add_space(8.0);
        if ui.button("Save").clicked() {
            self.status = match self.apply_settings() {
                Ok(()) => "Settings saved.".to_string(),
                Err(e) => {
                    tracing::warn!("settings not applied: {e:#}");
                    format!("Settings not saved: {e:#}")
                }
            };
        }

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let checking = self.pending_health.is_some();
            if ui
                .add_enabled(!checking, egui::Button::new("Check server"))
                .clicked()
            {
                self.start_health_check(ctx);
            }
            if checking {
                ui.spinner();
            } else if !self.health.is_empty() {
                ui.label(&self.health);
            }
        });

        ui.add_space(16.0);
        ui.separator();
        ui.add_space(6.0);
        ui.label(format!("App version: {}", self.app_version));
        if let Some(path) = &self.settings_path {
            ui.label(format!("Settings file: {}", path.display()));
        }
    }

    /// Rebuild the client from the edited fields and persist them.
    /// An in-flight analysis keeps the client it started with.
    fn apply_settings(&mut self) -> Result<()> {
        let settings = ClientSettings {
            endpoint: Some(self.endpoint_input.trim().to_string()),
            timeout_secs: Some(self.timeout_secs),
        };
        let config = ClientConfig::from_settings(&settings)?;
        self.client = HttpDiagnosisClient::new(config)?;
        if let Some(path) = &self.settings_path {
            settings
                .save(path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        tracing::info!("diagnosis endpoint set to {}", self.client.config().endpoint);
        Ok(())
    }

    fn start_health_check(&mut self, ctx: &egui::Context) {
        let client = self.client.clone();
        let ctx = ctx.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(client.check_health());
            ctx.request_repaint();
        });
        self.pending_health = Some(rx);
    }

    pub(super) fn poll_health(&mut self) {
        let Some(rx) = &self.pending_health else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(SubmitError::Unknown("health worker exited".into()))
            }
        };
        self.pending_health = None;
        self.health = match outcome {
            Ok(health) if health.is_ok() => format!("Server online: {}", health.message),
            Ok(health) => format!("Server reports {}: {}", health.status, health.message),
            Err(e) => e.user_message(),
        };
    }
}
