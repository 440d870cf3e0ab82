//! Event sink trait and implementations.

use crate::core::PipelineEvent;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, Level};

/// Receives pipeline lifecycle events.
///
/// Shared by every concurrent run of an orchestrator, so implementations
/// must be cheap and must not block.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "stage.started")
    /// * `data` - Optional event data
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Emits an event without awaiting. Must never panic or fail.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Emits a typed [`PipelineEvent`].
    fn publish(&self, event: &PipelineEvent) {
        self.try_emit(&event.event_type, Some(event.payload()));
    }
}

/// Discards all events. Used when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// Writes events to `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink at the given level. Anything other than
    /// `DEBUG` logs at `INFO`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event_type: &str, data: Option<&serde_json::Value>) {
        let study_id = data
            .and_then(|d| d.get("study_id"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("-");

        if self.level == Level::DEBUG {
            debug!(
                event_type = %event_type,
                study_id = %study_id,
                event_data = ?data,
                "Pipeline event"
            );
        } else {
            info!(
                event_type = %event_type,
                study_id = %study_id,
                event_data = ?data,
                "Pipeline event"
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }
}

/// Keeps every event in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the collected event types, in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Returns events for one study.
    #[must_use]
    pub fn events_for_study(&self, study_id: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(_, data)| {
                data.as_ref()
                    .and_then(|d| d.get("study_id"))
                    .and_then(serde_json::Value::as_str)
                    == Some(study_id)
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineStage;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit("pipeline.started", None).await;
        sink.publish(&PipelineEvent::stage_started("S1", PipelineStage::CvAnalysis));
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::debug();
        sink.emit("stage.completed", Some(serde_json::json!({"study_id": "S1"}))).await;
        sink.try_emit("stage.completed", None);
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("pipeline.started", None).await;
        sink.publish(&PipelineEvent::stage_skipped(
            "S1",
            PipelineStage::CvAnalysis,
            "No image references",
        ));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["pipeline.started", "stage.skipped"]);

        let (_, data) = &sink.events()[1];
        let data = data.as_ref().unwrap();
        assert_eq!(data["reason"], "No image references");
        assert!(data["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_collecting_sink_filters() {
        let sink = CollectingEventSink::new();
        sink.publish(&PipelineEvent::stage_started("S1", PipelineStage::ReportDraft));
        sink.publish(&PipelineEvent::stage_started("S2", PipelineStage::ReportDraft));
        sink.publish(&PipelineEvent::pipeline_started("S1", "run-1"));

        assert_eq!(sink.events_of_type("stage.").len(), 2);
        assert_eq!(sink.events_for_study("S1").len(), 2);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_emit_outside_runtime() {
        let sink = CollectingEventSink::new();
        tokio_test::block_on(sink.emit(
            "pipeline.completed",
            Some(serde_json::json!({"study_id": "S1", "status": "SUCCESS"})),
        ));

        let events = sink.events_for_study("S1");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "pipeline.completed");
    }
}
