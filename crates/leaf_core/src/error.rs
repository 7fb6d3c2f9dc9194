use crate::selection::ImageSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One-shot, dismissible message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Failure of a single diagnosis request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    /// No response arrived: connection failed, the request could not be sent,
    /// or the timeout elapsed.
    #[error("server unreachable")]
    NetworkUnreachable,
    /// Non-2xx status, with the `detail` message from the body when present.
    #[error("server returned status {status}")]
    ServerError { status: u16, detail: Option<String> },
    /// 2xx response whose body is not a valid diagnosis.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl SubmitError {
    /// Text shown in the failure notice.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::NetworkUnreachable => {
                "Network Error: Could not reach server. Check IP and firewall.".to_string()
            }
            SubmitError::ServerError {
                detail: Some(detail),
                ..
            } => detail.clone(),
            SubmitError::ServerError {
                status,
                detail: None,
            } => format!("Server Error: Status {status}."),
            SubmitError::MalformedResponse(_) => "Unexpected response from server.".to_string(),
            SubmitError::Unknown(_) => "Unknown Error. Check network configuration.".to_string(),
        }
    }
}

/// Errors raised by the detection workflow's transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("{0} permission denied")]
    PermissionDenied(ImageSource),
    #[error("no image selected")]
    NoImageSelected,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("no submission is in flight")]
    NotSubmitting,
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl WorkflowError {
    pub fn notice(&self) -> Notice {
        match self {
            WorkflowError::PermissionDenied(source) => Notice::new(
                "Permission denied!",
                format!("Please allow {source} access."),
            ),
            WorkflowError::NoImageSelected => {
                Notice::new("Select an image first!", "Pick a photo of a leaf to analyze.")
            }
            WorkflowError::SubmissionInFlight => Notice::new(
                "Analysis in progress",
                "Please wait for the current analysis to finish.",
            ),
            WorkflowError::NotSubmitting => Notice::new(
                "Analysis finished",
                "The analysis result is no longer current.",
            ),
            WorkflowError::Submit(err) => Notice::new("Prediction Failed", err.user_message()),
        }
    }
}

/// Problems loading or applying client settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
