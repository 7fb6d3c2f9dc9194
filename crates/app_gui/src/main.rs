mod app;
mod picker;

use app::UiApp;
use directories_next::ProjectDirs;
use eframe::NativeOptions;
use leaf_core::{ClientConfig, ClientSettings};
use std::path::{Path, PathBuf};

fn main() {
    tracing_subscriber::fmt::init();
    let settings_path = settings_path();
    let config = load_config(settings_path.as_deref());
    tracing::info!(
        "Leaf Doctor {} using {}",
        env!("LEAF_DOCTOR_VERSION"),
        config.endpoint
    );
    let app = match UiApp::new(config, settings_path) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Cannot start Leaf Doctor: {e:#}");
            return;
        }
    };
    let options = NativeOptions::default();
    if let Err(e) = eframe::run_native(
        "Leaf Doctor",
        options,
        Box::new(|_cc| Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(app))),
    ) {
        eprintln!("Application stopped with error: {e}");
    }
}

fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "LeafDoctor", "LeafDoctor")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
}

/// Defaults overlaid with the saved settings; unreadable settings fall back
/// to the defaults.
fn load_config(path: Option<&Path>) -> ClientConfig {
    let Some(path) = path else {
        return ClientConfig::default();
    };
    match ClientSettings::load(path).and_then(|s| ClientConfig::from_settings(&s)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("ignoring settings in {}: {e}", path.display());
            ClientConfig::default()
        }
    }
}
