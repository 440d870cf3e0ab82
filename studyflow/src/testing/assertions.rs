//! Test assertions for orchestrator responses.

use crate::core::{PipelineStage, StageStatus};
use crate::pipeline::StudyOrchestrationResponse;

/// Asserts that the ledger has one entry per stage, in pipeline order.
pub fn assert_ledger_complete(response: &StudyOrchestrationResponse) {
    let stages: Vec<PipelineStage> = response.stages.iter().map(|r| r.stage).collect();
    assert_eq!(
        stages,
        PipelineStage::ALL.to_vec(),
        "Expected one result per stage in order, got {stages:?}"
    );
}

/// Asserts the status of every stage, in pipeline order.
pub fn assert_stage_statuses(response: &StudyOrchestrationResponse, expected: [StageStatus; 5]) {
    assert_ledger_complete(response);
    assert_eq!(
        response.statuses(),
        expected.to_vec(),
        "Stage statuses differ from expected"
    );
}

/// Asserts the status of one stage.
pub fn assert_stage_status(
    response: &StudyOrchestrationResponse,
    stage: PipelineStage,
    expected: StageStatus,
) {
    let actual = response.status_of(stage);
    assert_eq!(
        actual,
        Some(expected),
        "Expected {stage} to be {expected}, got {actual:?}"
    );
}

/// Asserts that a stage failed with exactly this message.
pub fn assert_stage_error(
    response: &StudyOrchestrationResponse,
    stage: PipelineStage,
    message: &str,
) {
    assert_stage_status(response, stage, StageStatus::Failed);
    let error = response.stage(stage).and_then(|r| r.error.as_deref());
    assert_eq!(error, Some(message), "Unexpected error for {stage}");
}

/// Asserts that a stage was skipped for this reason.
pub fn assert_stage_skipped(
    response: &StudyOrchestrationResponse,
    stage: PipelineStage,
    reason: &str,
) {
    assert_stage_status(response, stage, StageStatus::Skipped);
    let actual = response.stage(stage).and_then(|r| r.skip_reason.as_deref());
    assert_eq!(actual, Some(reason), "Unexpected skip reason for {stage}");
}

/// Asserts that no stage failed.
pub fn assert_no_failures(response: &StudyOrchestrationResponse) {
    let failed: Vec<_> = response
        .stages
        .iter()
        .filter(|r| r.status == StageStatus::Failed)
        .map(|r| (r.stage, r.error.clone()))
        .collect();
    assert!(failed.is_empty(), "Expected no failed stages, got {failed:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineStatus;
    use crate::models::ExamMetadata;
    use crate::pipeline::{BundleBuilder, GenerationMetadata};
    use crate::stages::StageResult;
    use crate::utils::now_utc;

    fn response(results: Vec<StageResult>) -> StudyOrchestrationResponse {
        StudyOrchestrationResponse::new(
            PipelineStatus::Success,
            BundleBuilder::new("S1", ExamMetadata::new()).freeze(),
            results,
            GenerationMetadata::default(),
        )
    }

    fn draft_only() -> StudyOrchestrationResponse {
        response(vec![
            StageResult::skipped(PipelineStage::CvAnalysis, "CV analysis disabled"),
            StageResult::success(PipelineStage::ReportDraft, now_utc()),
            StageResult::skipped(PipelineStage::QaReview, "QA review disabled"),
            StageResult::skipped(
                PipelineStage::FollowupExtraction,
                "Follow-up extraction disabled",
            ),
            StageResult::skipped(PipelineStage::PatientSummary, "Patient summary disabled"),
        ])
    }

    #[test]
    fn test_assert_stage_statuses() {
        use StageStatus::{Skipped, Success};
        assert_stage_statuses(&draft_only(), [Skipped, Success, Skipped, Skipped, Skipped]);
        assert_no_failures(&draft_only());
    }

    #[test]
    fn test_assert_stage_skipped() {
        assert_stage_skipped(&draft_only(), PipelineStage::CvAnalysis, "CV analysis disabled");
    }

    #[test]
    #[should_panic(expected = "Expected one result per stage")]
    fn test_assert_ledger_complete_fails() {
        let partial = response(vec![StageResult::skipped(PipelineStage::CvAnalysis, "off")]);
        assert_ledger_complete(&partial);
    }

    #[test]
    #[should_panic(expected = "Expected REPORT_DRAFT to be FAILED")]
    fn test_assert_stage_error_fails_on_success() {
        assert_stage_error(&draft_only(), PipelineStage::ReportDraft, "llm down");
    }
}
