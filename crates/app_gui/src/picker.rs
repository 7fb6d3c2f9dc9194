//! Desktop stand-in for the platform image picker.

use directories_next::UserDirs;
use leaf_core::{ImagePicker, ImageSource, PermissionStatus};
use rfd::FileDialog;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "gif", "heic", "tif", "tiff",
];

/// Library picks browse anywhere; camera picks browse the folder capture apps
/// write to, and are denied when the user has no pictures folder.
pub struct DesktopPicker {
    capture_dir: Option<PathBuf>,
}

impl DesktopPicker {
    pub fn new() -> Self {
        let capture_dir = UserDirs::new().and_then(|d| d.picture_dir().map(Path::to_path_buf));
        Self::with_capture_dir(capture_dir)
    }

    pub fn with_capture_dir(capture_dir: Option<PathBuf>) -> Self {
        Self { capture_dir }
    }
}

impl ImagePicker for DesktopPicker {
    fn request_permission(&mut self, source: ImageSource) -> PermissionStatus {
        match source {
            ImageSource::Library => PermissionStatus::Granted,
            ImageSource::Camera => match &self.capture_dir {
                Some(dir) if dir.is_dir() => PermissionStatus::Granted,
                _ => PermissionStatus::Denied,
            },
        }
    }

    fn pick(&mut self, source: ImageSource) -> Option<PathBuf> {
        let dialog = FileDialog::new().add_filter("Images", IMAGE_EXTENSIONS);
        let dialog = match (source, &self.capture_dir) {
            (ImageSource::Camera, Some(dir)) => {
                dialog.set_title("Choose a captured photo").set_directory(dir)
            }
            _ => dialog.set_title("Choose a leaf photo").set_directory("."),
        };
        dialog.pick_file()
    }
}
