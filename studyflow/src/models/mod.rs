//! Data models exchanged between the orchestrator and its collaborators.
//!
//! The orchestrator treats the exam and clinical context as opaque
//! pass-through values. The per-stage request/response pairs mirror the
//! narrow interfaces of each collaborator.

mod cv;
mod exam;
mod followup;
mod learning;
mod qa;
mod report;
mod summary;

pub use cv::{CvHighlightMode, CvHighlightRequest, CvHighlightResult, CvRegionHighlight};
pub use exam::{ClinicalContext, ExamMetadata, ImageReference};
pub use followup::{
    FollowUpExtractionRequest, FollowUpExtractionResponse, FollowUpInterval, FollowUpType,
    IncidentalFinding, IncidentalFindingCategory, RecommendationStrength,
};
pub use learning::{DiscrepancySeverity, LearningEvent, LearningEventType};
pub use qa::{
    QaChangeType, QaIssue, QaIssueType, QaSection, QaSeverity, QaSummary, ReportQaRequest,
    ReportQaResponse,
};
pub use report::{Finding, KeyFinding, ReportDraft, ReportDraftRequest, UsedCvSignal};
pub use summary::{
    GlossaryItem, PatientNextStep, PatientNextStepUrgency, PatientReadingLevel,
    PatientReportSummaryRequest, PatientReportSummaryResponse, PatientSummaryTone,
};
