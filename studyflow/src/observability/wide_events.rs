//! Wide event emitter: one summary payload per run.

use super::StageSpanAttributes;
use crate::core::{PipelineStatus, StageStatus};
use crate::events::EventSink;
use crate::stages::StageResult;
use std::collections::HashMap;

/// Builds and emits the end-of-run summary event.
#[derive(Debug, Clone)]
pub struct WideEventEmitter {
    /// Event type used for the summary.
    pub pipeline_event_type: String,
}

impl Default for WideEventEmitter {
    fn default() -> Self {
        Self {
            pipeline_event_type: "pipeline.completed".to_string(),
        }
    }
}

impl WideEventEmitter {
    /// Creates a new wide event emitter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the summary payload for a finished run.
    #[must_use]
    pub fn build_pipeline_payload(
        pipeline_name: &str,
        study_id: &str,
        run_id: &str,
        status: PipelineStatus,
        results: &[StageResult],
        duration_ms: f64,
    ) -> serde_json::Value {
        let mut stage_counts: HashMap<String, u32> = HashMap::new();
        for result in results {
            *stage_counts.entry(result.status.to_string()).or_insert(0) += 1;
        }

        let stage_details: Vec<serde_json::Value> = results
            .iter()
            .map(|r| StageSpanAttributes::from_result(r).to_detail())
            .collect();

        let failed_stages: Vec<String> = results
            .iter()
            .filter(|r| r.status == StageStatus::Failed)
            .map(|r| r.stage.to_string())
            .collect();

        serde_json::json!({
            "pipeline_name": pipeline_name,
            "study_id": study_id,
            "run_id": run_id,
            "status": status,
            "duration_ms": duration_ms,
            "stage_counts": stage_counts,
            "failed_stages": failed_stages,
            "stage_details": stage_details,
            "timestamp": crate::utils::iso_timestamp(),
        })
    }

    /// Emits the summary payload to a sink.
    pub fn emit_pipeline_event(
        &self,
        sink: &dyn EventSink,
        pipeline_name: &str,
        study_id: &str,
        run_id: &str,
        status: PipelineStatus,
        results: &[StageResult],
        duration_ms: f64,
    ) {
        let payload = Self::build_pipeline_payload(
            pipeline_name,
            study_id,
            run_id,
            status,
            results,
            duration_ms,
        );
        sink.try_emit(&self.pipeline_event_type, Some(payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineStage;
    use crate::events::CollectingEventSink;
    use crate::utils::now_utc;

    fn sample_results() -> Vec<StageResult> {
        vec![
            StageResult::skipped(PipelineStage::CvAnalysis, "CV analysis disabled"),
            StageResult::success(PipelineStage::ReportDraft, now_utc()),
            StageResult::failed(PipelineStage::QaReview, now_utc(), "qa down"),
            StageResult::success(PipelineStage::FollowupExtraction, now_utc()),
            StageResult::success(PipelineStage::PatientSummary, now_utc()),
        ]
    }

    #[test]
    fn test_emitter_creation() {
        let emitter = WideEventEmitter::new();
        assert_eq!(emitter.pipeline_event_type, "pipeline.completed");
    }

    #[test]
    fn test_build_pipeline_payload() {
        let payload = WideEventEmitter::build_pipeline_payload(
            "study_finalization",
            "S1",
            "run-1",
            PipelineStatus::PartialSuccess,
            &sample_results(),
            42.0,
        );

        assert_eq!(payload["pipeline_name"], "study_finalization");
        assert_eq!(payload["status"], "PARTIAL_SUCCESS");
        assert_eq!(payload["stage_counts"]["SUCCESS"], 3);
        assert_eq!(payload["stage_counts"]["FAILED"], 1);
        assert_eq!(payload["stage_counts"]["SKIPPED"], 1);
        assert_eq!(payload["failed_stages"], serde_json::json!(["QA_REVIEW"]));
        assert_eq!(payload["stage_details"].as_array().unwrap().len(), 5);
        assert_eq!(payload["stage_details"][2]["error"], "qa down");
    }

    #[test]
    fn test_emit_pipeline_event() {
        let sink = CollectingEventSink::new();
        WideEventEmitter::new().emit_pipeline_event(
            &sink,
            "study_finalization",
            "S1",
            "run-1",
            PipelineStatus::Success,
            &sample_results(),
            1.0,
        );

        let events = sink.events_of_type("pipeline.completed");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.as_ref().unwrap()["study_id"], "S1");
    }
}
