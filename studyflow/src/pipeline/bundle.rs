//! Aggregate of stage outputs for one study.

use crate::models::{
    CvHighlightResult, ExamMetadata, FollowUpExtractionResponse, PatientReportSummaryResponse,
    ReportDraft, ReportQaResponse,
};
use serde::{Deserialize, Serialize};

/// Frozen outputs of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyBundle {
    /// Study identifier.
    pub study_id: String,
    /// Exam metadata from the request.
    pub exam_metadata: ExamMetadata,
    /// CV highlights, if CV succeeded.
    pub cv_analysis: Option<CvHighlightResult>,
    /// The draft, kept even when it came back empty.
    pub report_draft: Option<ReportDraft>,
    /// QA review, if QA succeeded.
    pub qa_result: Option<ReportQaResponse>,
    /// Working report text after drafting and QA. `None` if the draft failed.
    pub final_report_text: Option<String>,
    /// Follow-up extraction, if it succeeded.
    pub followup_data: Option<FollowUpExtractionResponse>,
    /// Patient summary, if it succeeded.
    pub patient_summary: Option<PatientReportSummaryResponse>,
}

/// Mutable bundle owned by a single run.
///
/// Each slot is written at most once by the stage that owns it.
#[derive(Debug)]
pub struct BundleBuilder {
    bundle: StudyBundle,
}

impl BundleBuilder {
    /// Starts an empty bundle for a study.
    #[must_use]
    pub fn new(study_id: impl Into<String>, exam_metadata: ExamMetadata) -> Self {
        Self {
            bundle: StudyBundle {
                study_id: study_id.into(),
                exam_metadata,
                cv_analysis: None,
                report_draft: None,
                qa_result: None,
                final_report_text: None,
                followup_data: None,
                patient_summary: None,
            },
        }
    }

    /// Stores the CV result.
    pub fn set_cv_analysis(&mut self, result: CvHighlightResult) {
        self.bundle.cv_analysis = Some(result);
    }

    /// Stores the report draft.
    pub fn set_report_draft(&mut self, draft: ReportDraft) {
        self.bundle.report_draft = Some(draft);
    }

    /// Stores the QA result.
    pub fn set_qa_result(&mut self, result: ReportQaResponse) {
        self.bundle.qa_result = Some(result);
    }

    /// Replaces the working text.
    pub fn set_final_report_text(&mut self, text: Option<String>) {
        self.bundle.final_report_text = text;
    }

    /// Stores the follow-up extraction.
    pub fn set_followup_data(&mut self, data: FollowUpExtractionResponse) {
        self.bundle.followup_data = Some(data);
    }

    /// Stores the patient summary.
    pub fn set_patient_summary(&mut self, summary: PatientReportSummaryResponse) {
        self.bundle.patient_summary = Some(summary);
    }

    /// The CV result so far.
    #[must_use]
    pub fn cv_analysis(&self) -> Option<&CvHighlightResult> {
        self.bundle.cv_analysis.as_ref()
    }

    /// The draft so far.
    #[must_use]
    pub fn report_draft(&self) -> Option<&ReportDraft> {
        self.bundle.report_draft.as_ref()
    }

    /// The QA result so far.
    #[must_use]
    pub fn qa_result(&self) -> Option<&ReportQaResponse> {
        self.bundle.qa_result.as_ref()
    }

    /// The follow-up data so far.
    #[must_use]
    pub fn followup_data(&self) -> Option<&FollowUpExtractionResponse> {
        self.bundle.followup_data.as_ref()
    }

    /// Current working report text.
    #[must_use]
    pub fn working_text(&self) -> Option<&str> {
        self.bundle.final_report_text.as_deref()
    }

    /// Freezes the bundle.
    #[must_use]
    pub fn freeze(self) -> StudyBundle {
        self.bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_starts_empty() {
        let bundle = BundleBuilder::new("S1", ExamMetadata::new()).freeze();
        assert_eq!(bundle.study_id, "S1");
        assert!(bundle.report_draft.is_none());
        assert!(bundle.final_report_text.is_none());
    }

    #[test]
    fn test_builder_tracks_working_text() {
        let mut builder = BundleBuilder::new("S1", ExamMetadata::new());
        builder.set_report_draft(ReportDraft::new("FINDINGS: clear."));
        builder.set_final_report_text(Some("FINDINGS: clear.".to_string()));
        assert_eq!(builder.working_text(), Some("FINDINGS: clear."));

        builder.set_final_report_text(Some("FINDINGS: Clear.".to_string()));
        let bundle = builder.freeze();
        assert_eq!(bundle.final_report_text.as_deref(), Some("FINDINGS: Clear."));
        assert_eq!(
            bundle.report_draft.map(|d| d.report_text),
            Some("FINDINGS: clear.".to_string())
        );
    }

    #[test]
    fn test_bundle_serialization() {
        let mut builder = BundleBuilder::new("S1", ExamMetadata::new().with_modality("CT"));
        builder.set_followup_data(FollowUpExtractionResponse::default());
        let json = serde_json::to_value(builder.freeze()).unwrap();

        assert_eq!(json["study_id"], "S1");
        assert_eq!(json["exam_metadata"]["modality"], "CT");
        assert!(json["cv_analysis"].is_null());
        assert_eq!(json["followup_data"]["has_any_followup"], false);
    }
}
