//! StagePorts - collaborators injected into the orchestrator.
//!
//! Every port is optional except the report drafter, which the orchestrator
//! takes separately because the run cannot proceed without it.

use super::{
    CvExecutor, FileImageSource, FollowUpExecutor, ImageSource, LearningEventSink,
    PatientSummaryExecutor, QaExecutor,
};
use std::sync::Arc;

/// Optional stage collaborators and side channels.
#[derive(Clone)]
pub struct StagePorts {
    /// Vision collaborator for CV analysis.
    pub cv: Option<Arc<dyn CvExecutor>>,
    /// QA reviewer.
    pub qa: Option<Arc<dyn QaExecutor>>,
    /// Follow-up extractor.
    pub followup: Option<Arc<dyn FollowUpExecutor>>,
    /// Patient summarizer.
    pub patient_summary: Option<Arc<dyn PatientSummaryExecutor>>,
    /// Learning event destination.
    pub learning_sink: Option<Arc<dyn LearningEventSink>>,
    /// Resolves image references to bytes.
    pub image_source: Arc<dyn ImageSource>,
}

impl Default for StagePorts {
    fn default() -> Self {
        Self {
            cv: None,
            qa: None,
            followup: None,
            patient_summary: None,
            learning_sink: None,
            image_source: Arc::new(FileImageSource),
        }
    }
}

impl std::fmt::Debug for StagePorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagePorts")
            .field("has_cv", &self.cv.is_some())
            .field("has_qa", &self.qa.is_some())
            .field("has_followup", &self.followup.is_some())
            .field("has_patient_summary", &self.patient_summary.is_some())
            .field("has_learning_sink", &self.learning_sink.is_some())
            .finish()
    }
}

impl StagePorts {
    /// Creates ports with no optional collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the CV collaborator.
    #[must_use]
    pub fn with_cv(mut self, cv: Arc<dyn CvExecutor>) -> Self {
        self.cv = Some(cv);
        self
    }

    /// Sets the QA collaborator.
    #[must_use]
    pub fn with_qa(mut self, qa: Arc<dyn QaExecutor>) -> Self {
        self.qa = Some(qa);
        self
    }

    /// Sets the follow-up collaborator.
    #[must_use]
    pub fn with_followup(mut self, followup: Arc<dyn FollowUpExecutor>) -> Self {
        self.followup = Some(followup);
        self
    }

    /// Sets the patient summary collaborator.
    #[must_use]
    pub fn with_patient_summary(mut self, summary: Arc<dyn PatientSummaryExecutor>) -> Self {
        self.patient_summary = Some(summary);
        self
    }

    /// Sets the learning event sink.
    #[must_use]
    pub fn with_learning_sink(mut self, sink: Arc<dyn LearningEventSink>) -> Self {
        self.learning_sink = Some(sink);
        self
    }

    /// Replaces the image source.
    #[must_use]
    pub fn with_image_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.image_source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCvExecutor, MockLearningSink};

    #[test]
    fn test_ports_default_is_empty() {
        let ports = StagePorts::new();
        assert!(ports.cv.is_none());
        assert!(ports.qa.is_none());
        assert!(ports.learning_sink.is_none());
    }

    #[test]
    fn test_ports_builder() {
        let ports = StagePorts::new()
            .with_cv(Arc::new(MockCvExecutor::no_findings()))
            .with_learning_sink(Arc::new(MockLearningSink::new()));

        assert!(ports.cv.is_some());
        assert!(ports.learning_sink.is_some());
        assert!(ports.followup.is_none());
    }

    #[test]
    fn test_ports_debug_hides_collaborators() {
        let ports = StagePorts::new().with_cv(Arc::new(MockCvExecutor::no_findings()));
        let debug = format!("{ports:?}");
        assert!(debug.contains("has_cv: true"));
        assert!(debug.contains("has_qa: false"));
    }
}
