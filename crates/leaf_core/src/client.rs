//! HTTP adapter for the plant disease inference service.

use crate::config::ClientConfig;
use crate::diagnosis::{DiagnosisResult, parse_diagnosis};
use crate::error::{ConfigError, SubmitError};
use crate::selection::SelectedImage;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::fs;

/// Multipart field the service reads the image from.
pub const FILE_FIELD: &str = "file";

/// Anything that can turn a selected image into a diagnosis.
pub trait DiagnosisService {
    fn diagnose(&self, image: &SelectedImage) -> Result<DiagnosisResult, SubmitError>;
}

/// Response of the service's root health route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHealth {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ServerHealth {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Blocking client issuing one multipart POST per diagnosis. No retries.
#[derive(Debug, Clone)]
pub struct HttpDiagnosisClient {
    client: reqwest::blocking::Client,
    config: ClientConfig,
}

impl HttpDiagnosisClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Probe `GET /` on the endpoint's origin.
    pub fn check_health(&self) -> Result<ServerHealth, SubmitError> {
        let url = self
            .config
            .endpoint
            .join("/")
            .map_err(|e| SubmitError::Unknown(e.to_string()))?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| transport_error(&e))?;
        let status = response.status();
        let body = response.bytes().map_err(|e| body_error(&e, status))?;
        if !status.is_success() {
            return Err(SubmitError::ServerError {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }
        serde_json::from_slice(&body).map_err(|e| SubmitError::MalformedResponse(e.to_string()))
    }
}

impl DiagnosisService for HttpDiagnosisClient {
    fn diagnose(&self, image: &SelectedImage) -> Result<DiagnosisResult, SubmitError> {
        let bytes = fs::read(image.path()).map_err(|e| {
            tracing::warn!("cannot read {}: {e}", image.path().display());
            SubmitError::Unknown(format!("cannot read {}: {e}", image.path().display()))
        })?;
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| SubmitError::Unknown(e.to_string()))?;
        let form = Form::new().part(FILE_FIELD, part);

        tracing::info!(
            "submitting {} ({}, {size} bytes) to {}",
            image.file_name(),
            image.mime_type(),
            self.config.endpoint
        );
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.bytes().map_err(|e| body_error(&e, status))?;
        if !status.is_success() {
            let detail = extract_detail(&body);
            tracing::warn!("diagnosis request failed with {status}: {detail:?}");
            return Err(SubmitError::ServerError {
                status: status.as_u16(),
                detail,
            });
        }
        parse_diagnosis(&body)
    }
}

/// Failure while reading a body whose status line already arrived.
fn body_error(err: &reqwest::Error, status: StatusCode) -> SubmitError {
    tracing::warn!("reading {status} response body failed: {err}");
    if err.is_timeout() {
        SubmitError::NetworkUnreachable
    } else if status.is_success() {
        SubmitError::MalformedResponse(err.to_string())
    } else {
        SubmitError::ServerError {
            status: status.as_u16(),
            detail: None,
        }
    }
}

fn transport_error(err: &reqwest::Error) -> SubmitError {
    tracing::warn!("transport error: {err}");
    if err.is_timeout() || err.is_connect() || err.is_request() {
        SubmitError::NetworkUnreachable
    } else {
        SubmitError::Unknown(err.to_string())
    }
}

/// Message from a structured `detail` field: the string itself, or the first
/// entry's `msg` when it is a validation-error list.
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let detail = match value.get("detail")? {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items.first()?.get("msg")?.as_str()?.to_string(),
        _ => return None,
    };
    (!detail.is_empty()).then_some(detail)
}
