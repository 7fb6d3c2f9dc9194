//! Core of the leaf disease detector: picking a leaf photo, sending it to the
//! inference service and turning the answer into display state.

pub mod client;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod selection;
pub mod workflow;

pub use client::{DiagnosisService, HttpDiagnosisClient, ServerHealth};
pub use config::{ClientConfig, ClientSettings};
pub use diagnosis::{DiagnosisResult, DiagnosisView};
pub use error::{ConfigError, Notice, SubmitError, WorkflowError};
pub use selection::{ImageSource, SelectedImage};
pub use workflow::{
    Acquisition, DetectionWorkflow, ImagePicker, PermissionStatus, WorkflowPhase, WorkflowState,
};
