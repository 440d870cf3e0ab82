//! Error types for the studyflow pipeline.
//!
//! Two families live here. [`ExecutorError`] is what a stage collaborator
//! returns when it cannot produce its result; the orchestrator records it in
//! the stage ledger and never propagates it. [`StudyflowError`] is the
//! crate-level error for faults in the orchestrator's own bookkeeping and
//! configuration handling.

use crate::core::PipelineStage;
use thiserror::Error;

/// The main error type for studyflow operations.
#[derive(Debug, Error)]
pub enum StudyflowError {
    /// The orchestrator's own bookkeeping broke an invariant.
    #[error("{0}")]
    Invariant(#[from] InvariantViolation),

    /// A configuration value could not be parsed or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised when the stage ledger does not hold one entry per stage in order.
#[derive(Debug, Clone, Error)]
#[error("Ledger invariant violated: {message} (recorded: {})", format_stages(recorded))]
pub struct InvariantViolation {
    /// What went wrong.
    pub message: String,
    /// Stages present in the ledger when the check ran.
    pub recorded: Vec<PipelineStage>,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    #[must_use]
    pub fn new(message: impl Into<String>, recorded: Vec<PipelineStage>) -> Self {
        Self {
            message: message.into(),
            recorded,
        }
    }
}

fn format_stages(stages: &[PipelineStage]) -> String {
    if stages.is_empty() {
        return "none".to_string();
    }
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure reported by a stage collaborator.
///
/// Every variant displays the bare message so the ledger records exactly
/// what the collaborator said (e.g. `"llm down"`).
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The collaborator (or the stage timeout) ran out of time.
    #[error("{0}")]
    Timeout(String),

    /// The collaborator answered, but the answer was unusable.
    #[error("{0}")]
    InvalidOutput(String),

    /// The collaborator or one of its backends is unreachable.
    #[error("{0}")]
    Unavailable(String),

    /// Any other collaborator failure.
    #[error("{0}")]
    Failed(String),

    /// Wrapped error from a collaborator built on `anyhow`.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ExecutorError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Creates an invalid output error.
    #[must_use]
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a generic failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Short machine-readable name of the variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::InvalidOutput(_) => "invalid_output",
            Self::Unavailable(_) => "unavailable",
            Self::Failed(_) => "failed",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_error_displays_bare_message() {
        assert_eq!(ExecutorError::timeout("llm down").to_string(), "llm down");
        assert_eq!(ExecutorError::failed("bad json").to_string(), "bad json");
    }

    #[test]
    fn test_executor_error_from_anyhow() {
        let err: ExecutorError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.kind(), "other");
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn test_invariant_violation_lists_stages() {
        let err = InvariantViolation::new(
            "expected 5 entries",
            vec![PipelineStage::CvAnalysis, PipelineStage::ReportDraft],
        );
        let msg = err.to_string();
        assert!(msg.contains("expected 5 entries"));
        assert!(msg.contains("CV_ANALYSIS, REPORT_DRAFT"));

        let wrapped: StudyflowError = err.into();
        assert!(matches!(wrapped, StudyflowError::Invariant(_)));
    }

    #[test]
    fn test_invariant_violation_empty_ledger() {
        let err = InvariantViolation::new("empty", Vec::new());
        assert!(err.to_string().contains("recorded: none"));
    }
}
