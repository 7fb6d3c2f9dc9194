//! Main window: image selection, analysis and the diagnosis card.

mod diagnosis;
mod settings;

use crate::picker::DesktopPicker;
use anyhow::{Context, Result};
use eframe::{App, Frame, egui};
use leaf_core::{
    Acquisition, ClientConfig, DetectionWorkflow, DiagnosisResult, DiagnosisService,
    HttpDiagnosisClient, ImageSource, Notice, ServerHealth, SubmitError, WorkflowPhase,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

const PREVIEW_SIZE: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Panel {
    Detect,
    Settings,
}

pub struct UiApp {
    panel: Panel,
    workflow: DetectionWorkflow,
    picker: DesktopPicker,
    client: HttpDiagnosisClient,
    settings_path: Option<PathBuf>,
    /// Outcome of the in-flight diagnosis, delivered by its worker thread.
    pending: Option<Receiver<Result<DiagnosisResult, SubmitError>>>,
    pending_health: Option<Receiver<Result<ServerHealth, SubmitError>>>,
    /// Notices that are not tied to a failed submission.
    notice: Option<Notice>,
    preview: Option<(PathBuf, egui::TextureHandle)>,
    status: String,
    endpoint_input: String,
    timeout_secs: u64,
    health: String,
    app_version: &'static str,
}

impl UiApp {
    pub fn new(config: ClientConfig, settings_path: Option<PathBuf>) -> Result<Self> {
        let settings = config.to_settings();
        let client = HttpDiagnosisClient::new(config).context("HTTP client unavailable")?;
        Ok(Self {
            panel: Panel::Detect,
            workflow: DetectionWorkflow::new(),
            picker: DesktopPicker::new(),
            client,
            settings_path,
            pending: None,
            pending_health: None,
            notice: None,
            preview: None,
            status: String::new(),
            endpoint_input: settings.endpoint.unwrap_or_default(),
            timeout_secs: settings.timeout_secs.unwrap_or_default(),
            health: String::new(),
            app_version: env!("LEAF_DOCTOR_VERSION"),
        })
    }

    fn acquire(&mut self, source: ImageSource) {
        match self.workflow.acquire(&mut self.picker, source) {
            Ok(Acquisition::Selected) => self.status.clear(),
            Ok(Acquisition::Cancelled) => {}
            Err(err) => self.notice = Some(err.notice()),
        }
    }

    fn select_dropped(&mut self, path: PathBuf) {
        if let Err(err) = self.workflow.select_image(path) {
            self.notice = Some(err.notice());
        } else {
            self.status.clear();
        }
    }

    fn start_submission(&mut self, ctx: &egui::Context) {
        let image = match self.workflow.begin_submission() {
            Ok(image) => image,
            Err(err) => {
                self.notice = Some(err.notice());
                return;
            }
        };
        let client = self.client.clone();
        let ctx = ctx.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let outcome = client.diagnose(&image);
            let _ = tx.send(outcome);
            ctx.request_repaint();
        });
        self.pending = Some(rx);
        self.status = "Please wait, analyzing image...".to_string();
    }

    fn poll_submission(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(SubmitError::Unknown("analysis worker exited".into()))
            }
        };
        self.pending = None;
        match self.workflow.complete_submission(outcome) {
            Ok(result) => self.status = format!("Diagnosis: {}", result.disease),
            // failures surface through the workflow's own notice
            Err(_) => self.status.clear(),
        }
    }

    fn active_notice(&self) -> Option<Notice> {
        self.notice.clone().or_else(|| self.workflow.notice())
    }

    fn render_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.active_notice() else {
            return;
        };
        let retryable = self.notice.is_none() && self.workflow.phase() == WorkflowPhase::Failed;
        let mut dismissed = false;
        let mut retry = false;
        egui::Window::new(notice.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(notice.message.as_str());
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                    if retryable && ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            });
        if retry {
            self.start_submission(ctx);
        } else if dismissed && self.notice.take().is_none() {
            self.workflow.dismiss_notice();
        }
    }

    fn preview_texture(&mut self, ctx: &egui::Context, path: &Path) -> Option<egui::TextureId> {
        if let Some((cached, tex)) = &self.preview
            && cached == path
        {
            return Some(tex.id());
        }
        self.preview = None;
        match image::open(path) {
            Ok(img) => {
                let thumb = image::imageops::thumbnail(&img, PREVIEW_SIZE, PREVIEW_SIZE);
                let (w, h) = thumb.dimensions();
                let pixels = thumb.into_raw();
                let color =
                    egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &pixels);
                let tex = ctx.load_texture(
                    format!("preview:{}", path.display()),
                    color,
                    egui::TextureOptions::LINEAR,
                );
                let id = tex.id();
                self.preview = Some((path.to_path_buf(), tex));
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Failed to load preview for {}: {}", path.display(), e);
                None
            }
        }
    }

    fn render_detect_panel(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let busy = self.workflow.is_submitting();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new("Gallery"))
                .clicked()
            {
                self.acquire(ImageSource::Library);
            }
            if ui.add_enabled(!busy, egui::Button::new("Camera")).clicked() {
                self.acquire(ImageSource::Camera);
            }
        });
        ui.add_space(12.0);

        let Some(image) = self.workflow.image().cloned() else {
            ui.label("Select an image to start analysis.");
            return;
        };

        match self.preview_texture(ctx, image.path()) {
            Some(id) => {
                let size = self
                    .preview
                    .as_ref()
                    .map(|(_, tex)| tex.size_vec2())
                    .unwrap_or(egui::vec2(PREVIEW_SIZE as f32, PREVIEW_SIZE as f32));
                let scale = (300.0 / size.x.max(size.y)).min(1.0);
                ui.image((id, size * scale));
            }
            None => {
                ui.label(format!("{} (no preview)", image.file_name()));
            }
        }
        ui.add_space(12.0);

        let label = if busy { "ANALYZING..." } else { "ANALYZE PLANT" };
        if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
            self.start_submission(ctx);
        }
        if busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Please wait, analyzing image...");
            });
        }

        if let Some(view) = self.workflow.view() {
            ui.add_space(12.0);
            self.render_diagnosis(ui, &view);
        }
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_submission();
        self.poll_health();

        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            self.select_dropped(path);
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Leaf Doctor");
                ui.separator();
                ui.selectable_value(&mut self.panel, Panel::Detect, "Detect");
                ui.selectable_value(&mut self.panel, Panel::Settings, "Settings");
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| match self.panel {
                    Panel::Detect => self.render_detect_panel(ctx, ui),
                    Panel::Settings => self.render_settings_panel(ctx, ui),
                });
        });

        self.render_notice(ctx);
    }
}
