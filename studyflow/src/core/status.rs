//! Pipeline stage identity and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five fixed steps of the study pipeline.
///
/// Declaration order is execution order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    /// Vision model highlights regions on the primary image.
    CvAnalysis,
    /// LLM drafts the report text. The only critical stage.
    ReportDraft,
    /// QA reviewer checks the draft and may normalize it.
    QaReview,
    /// Extractor pulls incidental findings and follow-up recommendations.
    FollowupExtraction,
    /// Summarizer writes the patient-facing explanation.
    PatientSummary,
}

impl PipelineStage {
    /// All stages, in execution order.
    pub const ALL: [Self; 5] = [
        Self::CvAnalysis,
        Self::ReportDraft,
        Self::QaReview,
        Self::FollowupExtraction,
        Self::PatientSummary,
    ];

    /// Stages that depend on the drafted report text.
    pub const DOWNSTREAM_OF_DRAFT: [Self; 3] =
        [Self::QaReview, Self::FollowupExtraction, Self::PatientSummary];

    /// Wire name of the stage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CvAnalysis => "CV_ANALYSIS",
            Self::ReportDraft => "REPORT_DRAFT",
            Self::QaReview => "QA_REVIEW",
            Self::FollowupExtraction => "FOLLOWUP_EXTRACTION",
            Self::PatientSummary => "PATIENT_SUMMARY",
        }
    }

    /// Zero-based position in the execution order.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::CvAnalysis => 0,
            Self::ReportDraft => 1,
            Self::QaReview => 2,
            Self::FollowupExtraction => 3,
            Self::PatientSummary => 4,
        }
    }

    /// Returns true if a failure of this stage aborts the run.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self, Self::ReportDraft)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one stage within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    /// Stage has not been resolved yet.
    NotRun,
    /// Stage ran and produced its result.
    Success,
    /// Stage was not run (disabled, missing precondition, upstream failure).
    Skipped,
    /// Stage ran and its collaborator failed.
    Failed,
}

impl Default for StageStatus {
    fn default() -> Self {
        Self::NotRun
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRun => write!(f, "NOT_RUN"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Skipped => write!(f, "SKIPPED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotRun)
    }

    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Run-level outcome, computed once after every stage is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    /// Draft succeeded and no stage failed.
    Success,
    /// Draft succeeded but at least one other stage failed.
    PartialSuccess,
    /// The report draft failed.
    Failed,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::PartialSuccess => write!(f, "PARTIAL_SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}
