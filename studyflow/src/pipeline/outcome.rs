//! Working-text derivation and run status.

use crate::core::{PipelineStage, PipelineStatus, StageStatus};
use crate::models::{ReportDraft, ReportQaResponse};
use crate::stages::StageLedger;

/// Derives the working report text.
///
/// No usable draft means no working text. Otherwise the QA-normalized text
/// wins when QA succeeded with a non-blank normalization; the draft text is
/// used in every other case.
#[must_use]
pub fn derive_working_text(
    draft: Option<&ReportDraft>,
    qa_result: Option<&ReportQaResponse>,
) -> Option<String> {
    let draft = draft.filter(|d| d.has_text())?;
    let text = qa_result
        .and_then(ReportQaResponse::usable_normalized_text)
        .unwrap_or(&draft.report_text);
    Some(text.to_string())
}

/// Computes the run-level status from a complete ledger.
///
/// `SKIPPED` never downgrades the result.
#[must_use]
pub fn compute_pipeline_status(ledger: &StageLedger) -> PipelineStatus {
    if ledger.status_of(PipelineStage::ReportDraft) != Some(StageStatus::Success) {
        PipelineStatus::Failed
    } else if ledger.has_failures() {
        PipelineStatus::PartialSuccess
    } else {
        PipelineStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::StageResult;
    use crate::utils::now_utc;

    fn ledger(statuses: [StageStatus; 5]) -> StageLedger {
        let mut ledger = StageLedger::new();
        for (stage, status) in PipelineStage::ALL.into_iter().zip(statuses) {
            let result = match status {
                StageStatus::Success => StageResult::success(stage, now_utc()),
                StageStatus::Failed => StageResult::failed(stage, now_utc(), "boom"),
                _ => StageResult::skipped(stage, "disabled"),
            };
            ledger.record(result).unwrap();
        }
        ledger
    }

    #[test]
    fn test_working_text_without_draft() {
        assert_eq!(derive_working_text(None, None), None);
        assert_eq!(derive_working_text(Some(&ReportDraft::new("  ")), None), None);
    }

    #[test]
    fn test_working_text_prefers_normalized() {
        let draft = ReportDraft::new("draft");
        let qa = ReportQaResponse::clean("draft").with_normalized_text("normalized");
        assert_eq!(
            derive_working_text(Some(&draft), Some(&qa)).as_deref(),
            Some("normalized")
        );
    }

    #[test]
    fn test_working_text_ignores_blank_normalization() {
        let draft = ReportDraft::new("draft");
        let qa = ReportQaResponse::clean("draft").with_normalized_text("   ");
        assert_eq!(derive_working_text(Some(&draft), Some(&qa)).as_deref(), Some("draft"));
        assert_eq!(derive_working_text(Some(&draft), None).as_deref(), Some("draft"));
    }

    #[test]
    fn test_status_success_with_skips() {
        use StageStatus::{Skipped, Success};
        let ledger = ledger([Skipped, Success, Skipped, Skipped, Skipped]);
        assert_eq!(compute_pipeline_status(&ledger), PipelineStatus::Success);
    }

    #[test]
    fn test_status_partial_success() {
        use StageStatus::{Failed, Success};
        let ledger = ledger([Failed, Success, Success, Success, Success]);
        assert_eq!(compute_pipeline_status(&ledger), PipelineStatus::PartialSuccess);
    }

    #[test]
    fn test_status_failed_when_draft_failed() {
        use StageStatus::{Failed, Skipped, Success};
        let ledger = ledger([Success, Failed, Skipped, Skipped, Skipped]);
        assert_eq!(compute_pipeline_status(&ledger), PipelineStatus::Failed);
    }
}
