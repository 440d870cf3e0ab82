//! Learning events recorded for radiologist feedback.

use super::{ExamMetadata, QaIssue, QaSeverity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of learning event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningEventType {
    /// A report was corrected after sign-off.
    AddendumCorrection,
    /// QA review flagged issues.
    QaIssue,
    /// Peer review disagreed with the read.
    PeerReviewDiscrepancy,
    /// A finding was missed.
    MissedFinding,
    /// A finding was over-called.
    OverCall,
    /// Recommended follow-up does not match the findings.
    FollowupMismatch,
    /// Flagged as teaching material.
    InterestingCase,
}

/// Severity of a discrepancy recorded in a learning event.
///
/// Variants are declared from most to least severe; `Ord` follows that, so
/// `Critical < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancySeverity {
    /// Could change patient management.
    Critical,
    /// Clinically relevant.
    Major,
    /// Cosmetic or stylistic.
    Minor,
    /// Informational only.
    Info,
}

impl From<QaSeverity> for DiscrepancySeverity {
    fn from(severity: QaSeverity) -> Self {
        match severity {
            QaSeverity::Critical => Self::Critical,
            QaSeverity::Major => Self::Major,
            QaSeverity::Minor => Self::Minor,
            QaSeverity::Info => Self::Info,
        }
    }
}

impl fmt::Display for DiscrepancySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::Major => write!(f, "MAJOR"),
            Self::Minor => write!(f, "MINOR"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

/// A learning-signal record handed to the learning event sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningEvent {
    /// Unique event id (UUID v4).
    pub event_id: String,
    /// Radiologist the event is about.
    pub radiologist_id: String,
    /// Exam the report belongs to.
    pub exam_metadata: ExamMetadata,
    /// Kind of event.
    pub event_type: LearningEventType,
    /// Highest significant severity.
    pub severity: DiscrepancySeverity,
    /// Producer tag, e.g. "orchestrator", "peer_review".
    pub source: String,
    /// ISO 8601 timestamp.
    pub timestamp: String,
    /// Report text before correction.
    pub report_text_before: Option<String>,
    /// Report text after correction.
    pub report_text_after: Option<String>,
    /// QA issues behind the event.
    pub qa_issues: Option<Vec<QaIssue>>,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
}
