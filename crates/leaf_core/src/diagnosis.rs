//! Diagnosis returned by the inference service and its display projection.

use crate::error::SubmitError;
use serde::{Deserialize, Serialize};

/// Text shown for a diagnosis field the service left out.
pub const PLACEHOLDER: &str = "N/A";

/// Validated diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub disease: String,
    /// Percentage in `[0, 100]`.
    pub confidence: f64,
    pub description: Option<String>,
    pub treatment: Option<String>,
}

/// Wire shape before validation; every field may be missing.
#[derive(Debug, Deserialize)]
struct RawDiagnosis {
    disease: Option<String>,
    confidence: Option<f64>,
    description: Option<String>,
    treatment: Option<String>,
}

impl TryFrom<RawDiagnosis> for DiagnosisResult {
    type Error = SubmitError;

    fn try_from(raw: RawDiagnosis) -> Result<Self, Self::Error> {
        let disease = raw
            .disease
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| SubmitError::MalformedResponse("missing disease".into()))?;
        let confidence = raw
            .confidence
            .ok_or_else(|| SubmitError::MalformedResponse("missing confidence".into()))?;
        if !confidence.is_finite() || !(0.0..=100.0).contains(&confidence) {
            return Err(SubmitError::MalformedResponse(format!(
                "confidence {confidence} outside 0-100"
            )));
        }
        Ok(Self {
            disease,
            confidence,
            description: raw.description,
            treatment: raw.treatment,
        })
    }
}

/// Parse and validate a 2xx response body.
pub fn parse_diagnosis(body: &[u8]) -> Result<DiagnosisResult, SubmitError> {
    let raw: RawDiagnosis = serde_json::from_slice(body)
        .map_err(|e| SubmitError::MalformedResponse(e.to_string()))?;
    DiagnosisResult::try_from(raw)
}

/// Display fields for a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisView {
    pub disease: String,
    pub confidence: String,
    pub description: String,
    pub treatment: String,
}

impl DiagnosisView {
    pub fn to_plain_text(&self) -> String {
        format!(
            "Disease: {}\nConfidence: {}\nDescription: {}\nTreatment: {}",
            self.disease, self.confidence, self.description, self.treatment
        )
    }
}

impl From<&DiagnosisResult> for DiagnosisView {
    fn from(result: &DiagnosisResult) -> Self {
        Self {
            disease: text_or_placeholder(Some(&result.disease)),
            confidence: format_confidence(result.confidence),
            description: text_or_placeholder(result.description.as_deref()),
            treatment: text_or_placeholder(result.treatment.as_deref()),
        }
    }
}

/// Rounded percentage, halves away from zero.
pub fn format_confidence(percent: f64) -> String {
    format!("{}%", percent.round() as i64)
}

fn text_or_placeholder(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}
