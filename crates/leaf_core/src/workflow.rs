//! Selection → submission → result lifecycle of a single leaf diagnosis.
//!
//! The workflow owns all state; callers only drive it through the
//! transitions below. At most one submission is in flight: while
//! `Submitting`, both a new submission and a new image selection are
//! refused with [`WorkflowError::SubmissionInFlight`].

use crate::client::DiagnosisService;
use crate::diagnosis::{DiagnosisResult, DiagnosisView};
use crate::error::{Notice, SubmitError, WorkflowError};
use crate::selection::{ImageSource, SelectedImage};
use std::path::PathBuf;

/// Outcome of a permission request on the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Platform image-selection collaborator.
pub trait ImagePicker {
    fn request_permission(&mut self, source: ImageSource) -> PermissionStatus;
    /// `None` when the user cancelled.
    fn pick(&mut self, source: ImageSource) -> Option<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Selected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    ImageReady {
        image: SelectedImage,
    },
    Submitting {
        image: SelectedImage,
    },
    ResultReady {
        image: SelectedImage,
        result: DiagnosisResult,
    },
    /// Last submission failed; the image is kept for a retry.
    Failed {
        image: SelectedImage,
        error: SubmitError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    ImageReady,
    Submitting,
    ResultReady,
    Failed,
}

#[derive(Debug, Default)]
pub struct DetectionWorkflow {
    state: WorkflowState,
}

impl DetectionWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> WorkflowPhase {
        match self.state {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::ImageReady { .. } => WorkflowPhase::ImageReady,
            WorkflowState::Submitting { .. } => WorkflowPhase::Submitting,
            WorkflowState::ResultReady { .. } => WorkflowPhase::ResultReady,
            WorkflowState::Failed { .. } => WorkflowPhase::Failed,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, WorkflowState::Submitting { .. })
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        match &self.state {
            WorkflowState::Idle => None,
            WorkflowState::ImageReady { image }
            | WorkflowState::Submitting { image }
            | WorkflowState::ResultReady { image, .. }
            | WorkflowState::Failed { image, .. } => Some(image),
        }
    }

    pub fn result(&self) -> Option<&DiagnosisResult> {
        match &self.state {
            WorkflowState::ResultReady { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<DiagnosisView> {
        self.result().map(DiagnosisView::from)
    }

    /// Pending failure notice, until dismissed.
    pub fn notice(&self) -> Option<Notice> {
        match &self.state {
            WorkflowState::Failed { error, .. } => {
                Some(WorkflowError::Submit(error.clone()).notice())
            }
            _ => None,
        }
    }

    /// Ask the picker for an image from `source` and select it.
    ///
    /// Denied permission and cancellation leave the state untouched.
    pub fn acquire(
        &mut self,
        picker: &mut dyn ImagePicker,
        source: ImageSource,
    ) -> Result<Acquisition, WorkflowError> {
        if self.is_submitting() {
            return Err(WorkflowError::SubmissionInFlight);
        }
        if picker.request_permission(source) == PermissionStatus::Denied {
            tracing::info!("{source} permission denied");
            return Err(WorkflowError::PermissionDenied(source));
        }
        match picker.pick(source) {
            Some(path) => {
                self.select_image(path)?;
                Ok(Acquisition::Selected)
            }
            None => {
                tracing::debug!("{source} selection cancelled");
                Ok(Acquisition::Cancelled)
            }
        }
    }

    /// Replace the current image, discarding any previous result or failure.
    pub fn select_image(&mut self, path: impl Into<PathBuf>) -> Result<(), WorkflowError> {
        if self.is_submitting() {
            return Err(WorkflowError::SubmissionInFlight);
        }
        let image = SelectedImage::from_path(path);
        tracing::debug!("selected {} ({})", image.file_name(), image.mime_type());
        self.state = WorkflowState::ImageReady { image };
        Ok(())
    }

    /// Enter `Submitting` and hand out the image to send.
    pub fn begin_submission(&mut self) -> Result<SelectedImage, WorkflowError> {
        let image = match &self.state {
            WorkflowState::Idle => return Err(WorkflowError::NoImageSelected),
            WorkflowState::Submitting { .. } => return Err(WorkflowError::SubmissionInFlight),
            WorkflowState::ImageReady { image }
            | WorkflowState::ResultReady { image, .. }
            | WorkflowState::Failed { image, .. } => image.clone(),
        };
        tracing::debug!("submitting {}", image.file_name());
        self.state = WorkflowState::Submitting {
            image: image.clone(),
        };
        Ok(image)
    }

    /// Record the outcome of the in-flight submission.
    pub fn complete_submission(
        &mut self,
        outcome: Result<DiagnosisResult, SubmitError>,
    ) -> Result<DiagnosisResult, WorkflowError> {
        let image = match std::mem::take(&mut self.state) {
            WorkflowState::Submitting { image } => image,
            other => {
                tracing::warn!("discarding submission outcome; workflow is not submitting");
                self.state = other;
                return Err(WorkflowError::NotSubmitting);
            }
        };
        match outcome {
            Ok(result) => {
                tracing::info!(
                    "diagnosis for {}: {} ({:.2}%)",
                    image.file_name(),
                    result.disease,
                    result.confidence
                );
                self.state = WorkflowState::ResultReady {
                    image,
                    result: result.clone(),
                };
                Ok(result)
            }
            Err(error) => {
                tracing::warn!("diagnosis for {} failed: {error}", image.file_name());
                self.state = WorkflowState::Failed {
                    image,
                    error: error.clone(),
                };
                Err(WorkflowError::Submit(error))
            }
        }
    }

    /// Submit the selected image and wait for the outcome.
    pub fn submit(
        &mut self,
        service: &dyn DiagnosisService,
    ) -> Result<DiagnosisResult, WorkflowError> {
        let image = self.begin_submission()?;
        let outcome = service.diagnose(&image);
        self.complete_submission(outcome)
    }

    /// Dismiss a failure notice; the image stays selected.
    pub fn dismiss_notice(&mut self) {
        if let WorkflowState::Failed { image, .. } = &self.state {
            self.state = WorkflowState::ImageReady {
                image: image.clone(),
            };
        }
    }
}
