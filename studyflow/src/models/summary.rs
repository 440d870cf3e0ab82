//! Patient-facing report summary.

use super::{ExamMetadata, FollowUpExtractionResponse, FollowUpInterval};
use serde::{Deserialize, Serialize};

/// Target reading level of the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientReadingLevel {
    /// Roughly 5th grade.
    VerySimple,
    /// Roughly 8th grade.
    #[default]
    Simple,
    /// Roughly 10th-12th grade.
    Standard,
}

/// Tone of the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientSummaryTone {
    /// Plain and factual.
    #[default]
    Neutral,
    /// Softened for anxious patients.
    Reassuring,
}

/// How soon a next step should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientNextStepUrgency {
    /// At the next regular visit.
    Routine,
    /// Within weeks.
    Soon,
    /// As soon as possible.
    Urgent,
    /// Not stated in the report.
    Unknown,
}

/// A medical term with a lay-language explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryItem {
    /// The term as written in the report.
    pub term: String,
    /// Lay explanation.
    pub explanation: String,
}

/// An action or follow-up explained for the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientNextStep {
    /// What the patient should do.
    pub description: String,
    /// How soon.
    pub urgency: PatientNextStepUrgency,
    /// Structured interval, when the report gives one.
    pub followup_interval: Option<FollowUpInterval>,
    /// Links to `IncidentalFinding::id` when derived from follow-up data.
    pub source_finding_id: Option<String>,
}

/// Request sent to the patient-summary collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientReportSummaryRequest {
    /// Exam the report belongs to.
    pub exam_metadata: ExamMetadata,
    /// Final working report text.
    pub report_text: String,
    /// Follow-up extraction output, used to enrich next steps.
    pub followup_data: Option<FollowUpExtractionResponse>,
    /// Target reading level.
    #[serde(default)]
    pub reading_level: PatientReadingLevel,
    /// Tone of the summary.
    #[serde(default)]
    pub tone: PatientSummaryTone,
    /// ISO language code, e.g. "en".
    pub language_code: String,
}

/// Result returned by the patient-summary collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientReportSummaryResponse {
    /// Response schema version.
    #[serde(default = "default_version")]
    pub version: String,
    /// The summary itself.
    pub patient_summary_text: String,
    /// Short bullet points.
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Suggested next steps.
    #[serde(default)]
    pub next_steps: Vec<PatientNextStep>,
    /// Terms explained for the patient.
    #[serde(default)]
    pub glossary: Vec<GlossaryItem>,
    /// Report text the summary was written from.
    pub original_report_text: String,
}

fn default_version() -> String {
    "v1".to_string()
}

impl PatientReportSummaryResponse {
    /// Creates a summary with only its text fields set.
    #[must_use]
    pub fn new(summary: impl Into<String>, original_report_text: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            patient_summary_text: summary.into(),
            key_points: Vec::new(),
            next_steps: Vec::new(),
            glossary: Vec::new(),
            original_report_text: original_report_text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let json = r#"{
            "exam_metadata": {},
            "report_text": "IMPRESSION: normal",
            "followup_data": null,
            "language_code": "es"
        }"#;
        let request: PatientReportSummaryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.reading_level, PatientReadingLevel::Simple);
        assert_eq!(request.tone, PatientSummaryTone::Neutral);
        assert_eq!(request.language_code, "es");
    }

    #[test]
    fn test_response_version_default() {
        let response = PatientReportSummaryResponse::new("All clear.", "IMPRESSION: normal");
        assert_eq!(response.version, "v1");
        assert!(response.next_steps.is_empty());
    }
}
