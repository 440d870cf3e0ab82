//! Follow-up and incidental-finding extraction.

use super::ExamMetadata;
use serde::{Deserialize, Serialize};

/// Structured follow-up interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpInterval {
    /// Whole years.
    #[serde(default)]
    pub years: u32,
    /// Whole months.
    #[serde(default)]
    pub months: u32,
    /// Whole weeks.
    #[serde(default)]
    pub weeks: u32,
}

impl FollowUpInterval {
    /// Returns true if no interval component is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years == 0 && self.months == 0 && self.weeks == 0
    }
}

/// Category of an incidental finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentalFindingCategory {
    /// Lung nodule.
    PulmonaryNodule,
    /// Liver lesion.
    LiverLesion,
    /// Renal cyst.
    RenalCyst,
    /// Adrenal nodule.
    AdrenalNodule,
    /// Thyroid nodule.
    ThyroidNodule,
    /// Anything else.
    Other,
}

/// Kind of follow-up recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpType {
    /// Repeat or additional imaging.
    Imaging,
    /// Clinical follow-up.
    Clinical,
    /// No follow-up needed.
    None,
    /// Not stated.
    Unknown,
}

/// How firmly the report recommends follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrength {
    /// Stated outright.
    Explicit,
    /// Depends on other factors.
    Conditional,
    /// No recommendation.
    None,
}

/// An incidental finding extracted from the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentalFinding {
    /// Identifier within the response (e.g., "IF1").
    pub id: String,
    /// What was found.
    pub description: String,
    /// Excerpt from the report.
    pub verbatim_snippet: String,
    /// Anatomic location.
    pub location: Option<String>,
    /// Size as written.
    pub size: Option<String>,
    /// Finding category.
    pub category: IncidentalFindingCategory,
    /// Whether follow-up is needed.
    pub followup_required: bool,
    /// Kind of follow-up.
    pub followup_type: FollowUpType,
    /// Modality for follow-up imaging.
    pub followup_modality: Option<String>,
    /// Structured interval.
    pub followup_interval: Option<FollowUpInterval>,
    /// Interval as written.
    pub followup_interval_text: Option<String>,
    /// Why follow-up is recommended.
    pub followup_rationale: Option<String>,
    /// How firmly it is recommended.
    pub recommendation_strength: RecommendationStrength,
}

/// Request sent to the follow-up collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpExtractionRequest {
    /// Exam the report belongs to.
    pub exam_metadata: ExamMetadata,
    /// Current working report text (post-QA when available).
    pub report_text: String,
}

/// Result returned by the follow-up collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpExtractionResponse {
    /// Findings extracted from the report.
    #[serde(default)]
    pub incidental_findings: Vec<IncidentalFinding>,
    /// Report-level follow-up comment.
    pub global_followup_comment: Option<String>,
    /// Whether any finding needs follow-up.
    pub has_any_followup: bool,
}

impl FollowUpExtractionResponse {
    /// Findings that require follow-up.
    pub fn required(&self) -> impl Iterator<Item = &IncidentalFinding> {
        self.incidental_findings.iter().filter(|f| f.followup_required)
    }
}
