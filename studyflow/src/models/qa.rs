//! QA review request and result.

use super::ExamMetadata;
use serde::{Deserialize, Serialize};

/// Severity of a QA issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaSeverity {
    /// Clinically dangerous or clearly wrong.
    Critical,
    /// Important but not immediately dangerous.
    Major,
    /// Stylistic or minor clarity issue.
    Minor,
    /// Optional improvement.
    Info,
}

impl QaSeverity {
    /// Returns true for issues worth a learning event (major or critical).
    #[must_use]
    pub fn is_significant(&self) -> bool {
        matches!(self, Self::Critical | Self::Major)
    }
}

/// Kind of QA issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaIssueType {
    /// Contradicts another part of the report.
    Consistency,
    /// Something is missing.
    Completeness,
    /// Hard to read or ambiguous.
    Clarity,
    /// Sections out of place.
    Structure,
    /// Repeated content.
    Redundancy,
    /// Non-standard terminology.
    Terminology,
    /// Anything else.
    Other,
}

/// Report section an issue refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QaSection {
    /// Technique.
    Technique,
    /// Comparison.
    Comparison,
    /// Findings.
    Findings,
    /// Impression.
    Impression,
    /// Another section.
    Other,
    /// The report as a whole.
    Global,
}

/// Kind of change QA suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaChangeType {
    /// Rewrite some text.
    SuggestEdit,
    /// Add a missing section.
    AddSection,
    /// Delete some text.
    RemoveText,
    /// Move text around.
    Reorder,
    /// No edit, just a note.
    NoteOnly,
}

/// One issue flagged by the QA reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaIssue {
    /// Identifier within the response.
    pub id: String,
    /// How serious the issue is.
    pub severity: QaSeverity,
    /// Kind of issue.
    #[serde(rename = "type")]
    pub issue_type: QaIssueType,
    /// Section the issue refers to.
    pub section: QaSection,
    /// Human-readable explanation.
    pub description: String,
    /// Snippet or position hint.
    pub location_hint: Option<String>,
    /// Suggested kind of change.
    pub suggested_change_type: QaChangeType,
    /// Replacement text, if suggested.
    pub suggested_text: Option<String>,
}

impl QaIssue {
    /// Creates a note-only issue in the global section.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        severity: QaSeverity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            issue_type: QaIssueType::Other,
            section: QaSection::Global,
            description: description.into(),
            location_hint: None,
            suggested_change_type: QaChangeType::NoteOnly,
            suggested_text: None,
        }
    }
}

/// Overall verdict of the QA reviewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaSummary {
    /// e.g. "good", "acceptable", "needs_revision"
    pub overall_quality: String,
    /// Number of critical issues.
    pub num_critical: u32,
    /// Number of major issues.
    pub num_major: u32,
    /// Number of minor issues.
    pub num_minor: u32,
    /// Reviewer comments.
    pub comments: Option<String>,
}

impl QaSummary {
    /// Builds a summary by counting issue severities.
    #[must_use]
    pub fn from_issues(overall_quality: impl Into<String>, issues: &[QaIssue]) -> Self {
        let count = |sev: QaSeverity| {
            u32::try_from(issues.iter().filter(|i| i.severity == sev).count()).unwrap_or(u32::MAX)
        };
        Self {
            overall_quality: overall_quality.into(),
            num_critical: count(QaSeverity::Critical),
            num_major: count(QaSeverity::Major),
            num_minor: count(QaSeverity::Minor),
            comments: None,
        }
    }
}

/// Request sent to the QA collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQaRequest {
    /// Exam the report belongs to.
    pub exam_metadata: ExamMetadata,
    /// Full report text as drafted.
    pub report_text: String,
}

/// Result returned by the QA collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQaResponse {
    /// Response schema version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Text that was reviewed.
    pub original_report_text: String,
    /// Cleaned/normalized report, if the reviewer produced one.
    pub normalized_report_text: Option<String>,
    /// Issues found.
    #[serde(default)]
    pub issues: Vec<QaIssue>,
    /// Counts and overall quality.
    pub summary: QaSummary,
}

fn default_version() -> String {
    "v1".to_string()
}

impl ReportQaResponse {
    /// Creates a response with no issues and no normalization.
    #[must_use]
    pub fn clean(original_report_text: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            original_report_text: original_report_text.into(),
            normalized_report_text: None,
            issues: Vec::new(),
            summary: QaSummary::from_issues("good", &[]),
        }
    }

    /// Sets the normalized report text.
    #[must_use]
    pub fn with_normalized_text(mut self, text: impl Into<String>) -> Self {
        self.normalized_report_text = Some(text.into());
        self
    }

    /// Sets the issues and recomputes the summary counts.
    #[must_use]
    pub fn with_issues(mut self, issues: Vec<QaIssue>) -> Self {
        let quality = if issues.iter().any(|i| i.severity.is_significant()) {
            "needs_revision"
        } else {
            "good"
        };
        self.summary = QaSummary::from_issues(quality, &issues);
        self.issues = issues;
        self
    }

    /// Normalized text, when present and not blank.
    #[must_use]
    pub fn usable_normalized_text(&self) -> Option<&str> {
        self.normalized_report_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// Returns true if any issue is major or critical.
    #[must_use]
    pub fn has_significant_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity.is_significant())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_normalized_text() {
        let response = ReportQaResponse::clean("draft");
        assert!(response.usable_normalized_text().is_none());

        let blank = ReportQaResponse::clean("draft").with_normalized_text("  ");
        assert!(blank.usable_normalized_text().is_none());

        let normalized = ReportQaResponse::clean("draft").with_normalized_text("Clean Report");
        assert_eq!(normalized.usable_normalized_text(), Some("Clean Report"));
    }

    #[test]
    fn test_significant_issues() {
        let minor_only = ReportQaResponse::clean("draft").with_issues(vec![
            QaIssue::new("Q1", QaSeverity::Minor, "wording"),
            QaIssue::new("Q2", QaSeverity::Info, "style"),
        ]);
        assert!(!minor_only.has_significant_issues());
        assert_eq!(minor_only.summary.overall_quality, "good");

        let major = ReportQaResponse::clean("draft")
            .with_issues(vec![QaIssue::new("Q1", QaSeverity::Major, "laterality mismatch")]);
        assert!(major.has_significant_issues());
        assert_eq!(major.summary.num_major, 1);
        assert_eq!(major.summary.overall_quality, "needs_revision");
    }

    #[test]
    fn test_issue_wire_format() {
        let issue = QaIssue::new("Q1", QaSeverity::Critical, "wrong side");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["type"], "other");
        assert_eq!(json["section"], "GLOBAL");
        assert_eq!(json["suggested_change_type"], "note_only");
    }
}
