//! Learning-signal side channel.
//!
//! When QA flags major or critical issues on a report, the orchestrator
//! hands one [`LearningEvent`] to the configured [`LearningEventSink`].
//! Delivery is best-effort: sink errors are logged by the caller and never
//! affect the run.

use crate::errors::ExecutorError;
use crate::models::{
    DiscrepancySeverity, ExamMetadata, LearningEvent, LearningEventType, QaIssue, ReportQaResponse,
};
use crate::stages::LearningEventSink;
use crate::utils::{generate_uuid, iso_timestamp};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Default producer tag for events built by the orchestrator.
pub const DEFAULT_LEARNING_SOURCE: &str = "orchestrator";

/// Highest significant severity among the issues.
///
/// Only `CRITICAL` and `MAJOR` count; critical wins.
#[must_use]
pub fn highest_severity(issues: &[QaIssue]) -> Option<DiscrepancySeverity> {
    issues
        .iter()
        .filter(|issue| issue.severity.is_significant())
        .map(|issue| DiscrepancySeverity::from(issue.severity))
        .min()
}

/// Inputs for a QA learning event.
#[derive(Debug, Clone, Copy)]
pub struct LearningEventDraft<'a> {
    /// Radiologist the feedback is for.
    pub radiologist_id: &'a str,
    /// Exam the report belongs to.
    pub exam_metadata: &'a ExamMetadata,
    /// Text QA reviewed.
    pub report_text_before: &'a str,
    /// Final working text, if any.
    pub report_text_after: Option<&'a str>,
    /// QA response carrying the issues.
    pub qa_result: &'a ReportQaResponse,
    /// Producer tag written on the event.
    pub source: &'a str,
}

impl LearningEventDraft<'_> {
    /// Builds the event, or `None` if QA found nothing significant.
    #[must_use]
    pub fn build(&self) -> Option<LearningEvent> {
        let severity = highest_severity(&self.qa_result.issues)?;

        Some(LearningEvent {
            event_id: generate_uuid().to_string(),
            radiologist_id: self.radiologist_id.to_string(),
            exam_metadata: self.exam_metadata.clone(),
            event_type: LearningEventType::QaIssue,
            severity,
            source: self.source.to_string(),
            timestamp: iso_timestamp(),
            report_text_before: Some(self.report_text_before.to_string()),
            report_text_after: self.report_text_after.map(ToString::to_string),
            qa_issues: Some(self.qa_result.issues.clone()),
            tags: Vec::new(),
        })
    }
}

/// Learning event sink that keeps events in memory.
///
/// Safe for concurrent `save` calls from many runs.
#[derive(Debug, Default)]
pub struct InMemoryLearningEventSink {
    events: Mutex<Vec<LearningEvent>>,
}

impl InMemoryLearningEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every saved event.
    #[must_use]
    pub fn events(&self) -> Vec<LearningEvent> {
        self.events.lock().clone()
    }

    /// Returns events saved for one radiologist.
    #[must_use]
    pub fn events_for(&self, radiologist_id: &str) -> Vec<LearningEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.radiologist_id == radiologist_id)
            .cloned()
            .collect()
    }

    /// Number of saved events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl LearningEventSink for InMemoryLearningEventSink {
    async fn save(&self, event: &LearningEvent) -> Result<(), ExecutorError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
