//! Report drafting request and result.

use super::{ClinicalContext, CvHighlightResult};
use serde::{Deserialize, Serialize};

/// A structured finding supplied by the radiologist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Anatomical location (e.g., "right lower lobe").
    pub location: String,
    /// Finding type (e.g., "opacity").
    #[serde(rename = "type")]
    pub finding_type: String,
    /// Severity (e.g., "mild").
    pub severity: String,
    /// Additional details.
    pub additional_details: Option<String>,
}

/// Request sent to the drafting collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDraftRequest {
    /// Clinical context for the drafter.
    pub clinical_context: ClinicalContext,
    /// Imaging modality.
    pub modality: Option<String>,
    /// Structured findings, if any.
    #[serde(default)]
    pub findings: Vec<Finding>,
    /// Vision summary, when the CV stage succeeded.
    pub cv_summary: Option<CvHighlightResult>,
}

/// A key finding called out by the drafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFinding {
    /// Short label.
    pub label: String,
    /// pathology, normal_variant, device, artifact
    pub category: String,
    /// critical, significant, minor, normal
    pub severity: String,
}

/// How a CV signal was used while drafting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedCvSignal {
    /// Label produced by the CV model.
    pub cv_label: String,
    /// Whether the drafter used the signal.
    pub included_in_report: bool,
    /// Why the signal was used or ignored.
    pub reasoning: String,
}

/// Drafted report returned by the drafting collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    /// Full report text (TECHNIQUE, COMPARISON, FINDINGS, IMPRESSION).
    pub report_text: String,
    /// Findings the drafter considered most important.
    #[serde(default)]
    pub key_findings: Vec<KeyFinding>,
    /// How CV signals were used.
    #[serde(default)]
    pub used_cv_signals: Vec<UsedCvSignal>,
    /// Confidence in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence_score: f64,
}

fn default_confidence() -> f64 {
    0.75
}

impl ReportDraft {
    /// Creates a draft with only report text.
    #[must_use]
    pub fn new(report_text: impl Into<String>) -> Self {
        Self {
            report_text: report_text.into(),
            key_findings: Vec::new(),
            used_cv_signals: Vec::new(),
            confidence_score: default_confidence(),
        }
    }

    /// Returns true if the draft carries usable (non-blank) report text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.report_text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_defaults_confidence() {
        let draft: ReportDraft =
            serde_json::from_str(r#"{"report_text": "FINDINGS: clear."}"#).unwrap();
        assert!((draft.confidence_score - 0.75).abs() < f64::EPSILON);
        assert!(draft.key_findings.is_empty());
    }

    #[test]
    fn test_has_text() {
        assert!(ReportDraft::new("IMPRESSION: normal").has_text());
        assert!(!ReportDraft::new("").has_text());
        assert!(!ReportDraft::new("   \n").has_text());
    }

    #[test]
    fn test_finding_type_field_name() {
        let finding = Finding {
            location: "RLL".to_string(),
            finding_type: "opacity".to_string(),
            severity: "mild".to_string(),
            additional_details: None,
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["type"], "opacity");
    }
}
