//! Lifecycle events emitted by the orchestrator.

use super::{PipelineStage, PipelineStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An event emitted during a pipeline run.
///
/// Events are consumed by an [`EventSink`](crate::events::EventSink) for
/// logging, monitoring or analytics. They never influence the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// The event type (e.g., "stage.started", "pipeline.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl PipelineEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Converts the event payload into a JSON object.
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        let mut map: serde_json::Map<String, serde_json::Value> =
            self.data.clone().into_iter().collect();
        map.insert("timestamp".to_string(), serde_json::json!(self.timestamp));
        serde_json::Value::Object(map)
    }

    /// Creates a "pipeline.started" event.
    #[must_use]
    pub fn pipeline_started(study_id: &str, run_id: &str) -> Self {
        Self::new("pipeline.started")
            .add_data("study_id", serde_json::json!(study_id))
            .add_data("run_id", serde_json::json!(run_id))
    }

    /// Creates a "pipeline.completed" event.
    #[must_use]
    pub fn pipeline_completed(study_id: &str, status: PipelineStatus, duration_ms: f64) -> Self {
        Self::new("pipeline.completed")
            .add_data("study_id", serde_json::json!(study_id))
            .add_data("status", serde_json::json!(status))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.started" event.
    #[must_use]
    pub fn stage_started(study_id: &str, stage: PipelineStage) -> Self {
        Self::new("stage.started")
            .add_data("study_id", serde_json::json!(study_id))
            .add_data("stage", serde_json::json!(stage))
    }

    /// Creates a "stage.completed" event.
    #[must_use]
    pub fn stage_completed(study_id: &str, stage: PipelineStage, duration_ms: f64) -> Self {
        Self::new("stage.completed")
            .add_data("study_id", serde_json::json!(study_id))
            .add_data("stage", serde_json::json!(stage))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.failed" event.
    #[must_use]
    pub fn stage_failed(
        study_id: &str,
        stage: PipelineStage,
        error: &str,
        duration_ms: f64,
    ) -> Self {
        Self::new("stage.failed")
            .add_data("study_id", serde_json::json!(study_id))
            .add_data("stage", serde_json::json!(stage))
            .add_data("error", serde_json::json!(error))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.skipped" event.
    #[must_use]
    pub fn stage_skipped(study_id: &str, stage: PipelineStage, reason: &str) -> Self {
        Self::new("stage.skipped")
            .add_data("study_id", serde_json::json!(study_id))
            .add_data("stage", serde_json::json!(stage))
            .add_data("reason", serde_json::json!(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = PipelineEvent::new("test.event");
        assert_eq!(event.event_type, "test.event");
        assert!(event.data.is_empty());
    }

    #[test]
    fn test_stage_started() {
        let event = PipelineEvent::stage_started("S1", PipelineStage::QaReview);
        assert_eq!(event.event_type, "stage.started");
        assert_eq!(event.data.get("stage"), Some(&serde_json::json!("QA_REVIEW")));
        assert_eq!(event.data.get("study_id"), Some(&serde_json::json!("S1")));
    }

    #[test]
    fn test_stage_failed_carries_error() {
        let event = PipelineEvent::stage_failed("S1", PipelineStage::ReportDraft, "llm down", 12.5);
        assert_eq!(event.data.get("error"), Some(&serde_json::json!("llm down")));
        assert_eq!(event.data.get("duration_ms"), Some(&serde_json::json!(12.5)));
    }

    #[test]
    fn test_payload_includes_timestamp() {
        let payload =
            PipelineEvent::pipeline_completed("S1", PipelineStatus::Success, 3.0).payload();
        assert_eq!(payload["status"], "SUCCESS");
        assert!(payload["timestamp"].is_string());
    }
}
