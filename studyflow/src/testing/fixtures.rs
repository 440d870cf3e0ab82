//! Test fixtures for study pipeline testing.

use std::sync::Arc;

use super::mocks::{
    MockCvExecutor, MockDraftExecutor, MockFollowUpExecutor, MockLearningSink, MockQaExecutor,
    MockSummaryExecutor, StaticImageSource,
};
use crate::errors::StudyflowError;
use crate::events::CollectingEventSink;
use crate::models::{
    ClinicalContext, ExamMetadata, FollowUpExtractionResponse, ImageReference, QaIssue, QaSeverity,
    ReportQaResponse,
};
use crate::pipeline::{
    OrchestratorConfig, PipelineOptions, StudyOrchestrationRequest, StudyOrchestrator,
};
use crate::stages::StagePorts;

/// Draft text returned by the default fixture drafter.
pub const SAMPLE_DRAFT: &str = "FINDINGS: clear.";

/// A chest radiograph exam.
#[must_use]
pub fn sample_exam() -> ExamMetadata {
    ExamMetadata::new()
        .with_modality("CR")
        .with_accession("ACC-1001")
        .with_body_region("chest")
}

/// A short clinical context.
#[must_use]
pub fn sample_clinical_context() -> ClinicalContext {
    ClinicalContext::new("58F", "Productive cough for two weeks").with_history("Former smoker")
}

/// A request with default options, one image and no radiologist.
#[must_use]
pub fn sample_request(study_id: impl Into<String>) -> StudyOrchestrationRequest {
    StudyOrchestrationRequest::new(study_id, sample_exam(), sample_clinical_context())
        .with_image(ImageReference::from_path("/studies/chest-pa.png"))
}

/// A request that only drafts the report.
#[must_use]
pub fn draft_only_request(study_id: impl Into<String>) -> StudyOrchestrationRequest {
    sample_request(study_id).with_options(PipelineOptions::draft_only())
}

/// A QA response with one issue per severity given.
#[must_use]
pub fn qa_response_with(
    report_text: &str,
    normalized: Option<&str>,
    severities: &[QaSeverity],
) -> ReportQaResponse {
    let issues = severities
        .iter()
        .enumerate()
        .map(|(idx, severity)| {
            QaIssue::new(format!("qa-{idx}"), *severity, "Inconsistent laterality")
        })
        .collect();
    let response = ReportQaResponse::clean(report_text).with_issues(issues);
    match normalized {
        Some(text) => response.with_normalized_text(text),
        None => response,
    }
}

/// A full set of scripted collaborators, all succeeding by default.
///
/// Replace any field before calling [`orchestrator`](Self::orchestrator);
/// the fixture keeps its own handles so tests can inspect calls afterwards.
#[derive(Debug)]
pub struct PipelineFixture {
    /// CV collaborator.
    pub cv: Arc<MockCvExecutor>,
    /// Report drafter.
    pub drafter: Arc<MockDraftExecutor>,
    /// QA reviewer.
    pub qa: Arc<MockQaExecutor>,
    /// Follow-up extractor.
    pub followup: Arc<MockFollowUpExecutor>,
    /// Patient summarizer.
    pub summary: Arc<MockSummaryExecutor>,
    /// Learning event sink.
    pub learning: Arc<MockLearningSink>,
    /// Image source.
    pub images: Arc<StaticImageSource>,
    /// Collected lifecycle events.
    pub events: Arc<CollectingEventSink>,
    /// Orchestrator configuration.
    pub config: OrchestratorConfig,
}

impl Default for PipelineFixture {
    fn default() -> Self {
        Self {
            cv: Arc::new(MockCvExecutor::no_findings()),
            drafter: Arc::new(MockDraftExecutor::with_text(SAMPLE_DRAFT)),
            qa: Arc::new(MockQaExecutor::clean()),
            followup: Arc::new(MockFollowUpExecutor::returning(
                FollowUpExtractionResponse::default(),
            )),
            summary: Arc::new(MockSummaryExecutor::echo()),
            learning: Arc::new(MockLearningSink::new()),
            images: Arc::new(StaticImageSource::bytes(b"\x89PNG".to_vec())),
            events: Arc::new(CollectingEventSink::new()),
            config: OrchestratorConfig::default(),
        }
    }
}

impl PipelineFixture {
    /// Creates a fixture where every collaborator succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the CV collaborator.
    #[must_use]
    pub fn with_cv(mut self, cv: MockCvExecutor) -> Self {
        self.cv = Arc::new(cv);
        self
    }

    /// Replaces the drafter.
    #[must_use]
    pub fn with_drafter(mut self, drafter: MockDraftExecutor) -> Self {
        self.drafter = Arc::new(drafter);
        self
    }

    /// Replaces the QA reviewer.
    #[must_use]
    pub fn with_qa(mut self, qa: MockQaExecutor) -> Self {
        self.qa = Arc::new(qa);
        self
    }

    /// Replaces the follow-up extractor.
    #[must_use]
    pub fn with_followup(mut self, followup: MockFollowUpExecutor) -> Self {
        self.followup = Arc::new(followup);
        self
    }

    /// Replaces the summarizer.
    #[must_use]
    pub fn with_summary(mut self, summary: MockSummaryExecutor) -> Self {
        self.summary = Arc::new(summary);
        self
    }

    /// Replaces the learning sink.
    #[must_use]
    pub fn with_learning(mut self, learning: MockLearningSink) -> Self {
        self.learning = Arc::new(learning);
        self
    }

    /// Replaces the image source.
    #[must_use]
    pub fn with_images(mut self, images: StaticImageSource) -> Self {
        self.images = Arc::new(images);
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The collaborators as ports.
    #[must_use]
    pub fn ports(&self) -> StagePorts {
        StagePorts::new()
            .with_cv(self.cv.clone())
            .with_qa(self.qa.clone())
            .with_followup(self.followup.clone())
            .with_patient_summary(self.summary.clone())
            .with_learning_sink(self.learning.clone())
            .with_image_source(self.images.clone())
    }

    /// Builds an orchestrator wired to this fixture.
    pub fn orchestrator(&self) -> Result<StudyOrchestrator, StudyflowError> {
        StudyOrchestrator::builder(self.drafter.clone())
            .ports(self.ports())
            .event_sink(self.events.clone())
            .config(self.config.clone())
            .build()
    }

    /// Total executor calls across all five stages.
    #[must_use]
    pub fn executor_calls(&self) -> usize {
        self.cv.call_count()
            + self.drafter.call_count()
            + self.qa.call_count()
            + self.followup.call_count()
            + self.summary.call_count()
    }
}
