//! Stage result records and the per-run ledger.

use crate::core::{PipelineStage, StageStatus};
use crate::errors::InvariantViolation;
use crate::utils::{elapsed_ms, now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome record of one stage in one run. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage identity.
    pub stage: PipelineStage,
    /// Final status.
    pub status: StageStatus,
    /// Error message if the stage failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Reason the stage was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// When the collaborator was invoked. `None` for skipped stages.
    pub started_at: Option<Timestamp>,
    /// When the stage was resolved.
    pub finished_at: Option<Timestamp>,
    /// Free-form metadata (duration, model name, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl StageResult {
    /// Creates a successful stage result finishing now.
    #[must_use]
    pub fn success(stage: PipelineStage, started_at: Timestamp) -> Self {
        Self::finished(stage, StageStatus::Success, started_at, None)
    }

    /// Creates a failed stage result finishing now.
    #[must_use]
    pub fn failed(stage: PipelineStage, started_at: Timestamp, error: impl Into<String>) -> Self {
        Self::finished(stage, StageStatus::Failed, started_at, Some(error.into()))
    }

    /// Creates a skipped stage result.
    #[must_use]
    pub fn skipped(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            error: None,
            skip_reason: Some(reason.into()),
            started_at: None,
            finished_at: Some(now_utc()),
            metadata: HashMap::new(),
        }
    }

    fn finished(
        stage: PipelineStage,
        status: StageStatus,
        started_at: Timestamp,
        error: Option<String>,
    ) -> Self {
        let finished_at = now_utc();
        let mut metadata = HashMap::new();
        metadata.insert(
            "duration_ms".to_string(),
            serde_json::json!(elapsed_ms(&started_at, &finished_at)),
        );
        Self {
            stage,
            status,
            error,
            skip_reason: None,
            started_at: Some(started_at),
            finished_at: Some(finished_at),
            metadata,
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the duration in milliseconds, if the stage was invoked.
    #[must_use]
    pub fn duration_ms(&self) -> Option<f64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(elapsed_ms(&start, &end)),
            _ => None,
        }
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// Append-only, ordered record of stage results for one run.
///
/// Stages must be recorded in pipeline order, each exactly once.
#[derive(Debug, Default)]
pub struct StageLedger {
    results: Vec<StageResult>,
}

impl StageLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result.
    ///
    /// Fails if the stage is already recorded or would be out of order.
    pub fn record(&mut self, result: StageResult) -> Result<(), InvariantViolation> {
        let expected = PipelineStage::ALL.get(self.results.len()).copied();
        if expected != Some(result.stage) {
            return Err(InvariantViolation::new(
                format!(
                    "cannot record {} at position {}",
                    result.stage,
                    self.results.len()
                ),
                self.stages(),
            ));
        }
        self.results.push(result);
        Ok(())
    }

    /// Returns the recorded result for a stage.
    #[must_use]
    pub fn get(&self, stage: PipelineStage) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage == stage)
    }

    /// Returns the recorded status for a stage.
    #[must_use]
    pub fn status_of(&self, stage: PipelineStage) -> Option<StageStatus> {
        self.get(stage).map(|r| r.status)
    }

    /// Stages recorded so far, in order.
    #[must_use]
    pub fn stages(&self) -> Vec<PipelineStage> {
        self.results.iter().map(|r| r.stage).collect()
    }

    /// Returns true if any recorded stage failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(StageResult::is_failure)
    }

    /// Number of recorded results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Read-only view of the results.
    #[must_use]
    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    /// Checks that every stage is recorded exactly once, in order.
    pub fn verify_complete(&self) -> Result<(), InvariantViolation> {
        if self.stages() == PipelineStage::ALL {
            Ok(())
        } else {
            Err(InvariantViolation::new(
                format!(
                    "expected {} stage results, found {}",
                    PipelineStage::ALL.len(),
                    self.results.len()
                ),
                self.stages(),
            ))
        }
    }

    /// Consumes the ledger after checking it is complete.
    pub fn into_results(self) -> Result<Vec<StageResult>, InvariantViolation> {
        self.verify_complete()?;
        Ok(self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_ledger() -> StageLedger {
        let mut ledger = StageLedger::new();
        ledger
            .record(StageResult::skipped(PipelineStage::CvAnalysis, "disabled"))
            .unwrap();
        ledger
            .record(StageResult::success(PipelineStage::ReportDraft, now_utc()))
            .unwrap();
        ledger
            .record(StageResult::failed(PipelineStage::QaReview, now_utc(), "qa down"))
            .unwrap();
        ledger
            .record(StageResult::success(PipelineStage::FollowupExtraction, now_utc()))
            .unwrap();
        ledger
            .record(StageResult::success(PipelineStage::PatientSummary, now_utc()))
            .unwrap();
        ledger
    }

    #[test]
    fn test_stage_result_success() {
        let result = StageResult::success(PipelineStage::ReportDraft, now_utc());

        assert!(result.is_success());
        assert!(!result.is_failure());
        assert!(result.error.is_none());
        assert!(result.metadata.contains_key("duration_ms"));
        assert!(result.duration_ms().is_some());
    }

    #[test]
    fn test_stage_result_failed() {
        let result =
            StageResult::failed(PipelineStage::QaReview, now_utc(), "Something went wrong");

        assert!(result.is_failure());
        assert_eq!(result.error, Some("Something went wrong".to_string()));
    }

    #[test]
    fn test_stage_result_skipped_has_no_start() {
        let result = StageResult::skipped(PipelineStage::CvAnalysis, "No image references");

        assert_eq!(result.status, StageStatus::Skipped);
        assert!(result.started_at.is_none());
        assert!(result.finished_at.is_some());
        assert!(result.duration_ms().is_none());
        assert_eq!(result.skip_reason.as_deref(), Some("No image references"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_stage_result_duration() {
        let started = now_utc();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let result = StageResult::success(PipelineStage::ReportDraft, started);

        assert!(result.duration_ms().unwrap() >= 10.0);
    }

    #[test]
    fn test_ledger_complete() {
        let ledger = full_ledger();
        assert!(ledger.verify_complete().is_ok());
        assert!(ledger.has_failures());
        assert_eq!(ledger.status_of(PipelineStage::QaReview), Some(StageStatus::Failed));

        let results = ledger.into_results().unwrap();
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn test_ledger_rejects_out_of_order() {
        let mut ledger = StageLedger::new();
        let err = ledger
            .record(StageResult::success(PipelineStage::ReportDraft, now_utc()))
            .unwrap_err();
        assert!(err.message.contains("REPORT_DRAFT"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_ledger_rejects_duplicate() {
        let mut ledger = StageLedger::new();
        ledger
            .record(StageResult::skipped(PipelineStage::CvAnalysis, "disabled"))
            .unwrap();
        assert!(ledger
            .record(StageResult::skipped(PipelineStage::CvAnalysis, "disabled"))
            .is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_ledger_incomplete() {
        let mut ledger = StageLedger::new();
        ledger
            .record(StageResult::skipped(PipelineStage::CvAnalysis, "disabled"))
            .unwrap();

        let err = ledger.into_results().unwrap_err();
        assert_eq!(err.recorded, vec![PipelineStage::CvAnalysis]);
    }

    #[test]
    fn test_stage_result_serialization() {
        let result = StageResult::failed(PipelineStage::ReportDraft, now_utc(), "llm down");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["stage"], "REPORT_DRAFT");
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["error"], "llm down");
        assert!(json.get("skip_reason").is_none());

        let back: StageResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
