//! Scripted collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;

use crate::errors::ExecutorError;
use crate::models::{
    CvHighlightRequest, CvHighlightResult, FollowUpExtractionRequest, FollowUpExtractionResponse,
    ImageReference, LearningEvent, PatientReportSummaryRequest, PatientReportSummaryResponse,
    ReportDraft, ReportDraftRequest, ReportQaRequest, ReportQaResponse,
};
use crate::stages::{
    CvExecutor, FollowUpExecutor, ImageLoad, ImageSource, LearningEventSink,
    PatientSummaryExecutor, QaExecutor, ReportDraftExecutor,
};

type Responder<Req, T> = Box<dyn Fn(&Req) -> Result<T, ExecutorError> + Send + Sync>;

/// A collaborator that answers from a closure and records every request.
pub struct ScriptedExecutor<Req, T> {
    respond: Responder<Req, T>,
    delay: Option<Duration>,
    model: Option<String>,
    requests: Mutex<Vec<Req>>,
}

/// Scripted CV collaborator.
pub type MockCvExecutor = ScriptedExecutor<CvHighlightRequest, CvHighlightResult>;
/// Scripted report drafter.
pub type MockDraftExecutor = ScriptedExecutor<ReportDraftRequest, ReportDraft>;
/// Scripted QA reviewer.
pub type MockQaExecutor = ScriptedExecutor<ReportQaRequest, ReportQaResponse>;
/// Scripted follow-up extractor.
pub type MockFollowUpExecutor =
    ScriptedExecutor<FollowUpExtractionRequest, FollowUpExtractionResponse>;
/// Scripted patient summarizer.
pub type MockSummaryExecutor =
    ScriptedExecutor<PatientReportSummaryRequest, PatientReportSummaryResponse>;

impl<Req, T> fmt::Debug for ScriptedExecutor<Req, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedExecutor")
            .field("delay", &self.delay)
            .field("model", &self.model)
            .field("calls", &self.requests.lock().len())
            .finish_non_exhaustive()
    }
}

impl<Req: Clone, T> ScriptedExecutor<Req, T> {
    /// Answers every request with the closure's result.
    #[must_use]
    pub fn new(respond: impl Fn(&Req) -> Result<T, ExecutorError> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            delay: None,
            model: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always returns a clone of `value`.
    #[must_use]
    pub fn returning(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::new(move |_| Ok(value.clone()))
    }

    /// Always fails with a generic error.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(ExecutorError::failed(message.clone())))
    }

    /// Always fails with a timeout error.
    #[must_use]
    pub fn timing_out(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(ExecutorError::timeout(message.clone())))
    }

    /// Sleeps before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reports a model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Req> {
        self.requests.lock().clone()
    }

    /// The most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<Req> {
        self.requests.lock().last().cloned()
    }

    async fn answer(&self, request: &Req) -> Result<T, ExecutorError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(request)
    }
}

impl MockCvExecutor {
    /// A CV collaborator that finds nothing.
    #[must_use]
    pub fn no_findings() -> Self {
        Self::new(|request: &CvHighlightRequest| {
            Ok(CvHighlightResult {
                study_id: request.study_id.clone(),
                modality: request.modality.clone(),
                summary: "No focal abnormality highlighted".to_string(),
                regions: Vec::new(),
                heatmap_png_base64: None,
            })
        })
    }
}

impl MockDraftExecutor {
    /// A drafter that always returns `text`.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::returning(ReportDraft::new(text))
    }
}

impl MockQaExecutor {
    /// A reviewer that finds nothing and does not normalize.
    #[must_use]
    pub fn clean() -> Self {
        Self::new(|request: &ReportQaRequest| Ok(ReportQaResponse::clean(&request.report_text)))
    }
}

impl MockSummaryExecutor {
    /// A summarizer that echoes the report it was given.
    #[must_use]
    pub fn echo() -> Self {
        Self::new(|request: &PatientReportSummaryRequest| {
            Ok(PatientReportSummaryResponse::new(
                format!("Summary of: {}", request.report_text),
                &request.report_text,
            ))
        })
    }
}

#[async_trait]
impl CvExecutor for MockCvExecutor {
    async fn highlight(
        &self,
        request: &CvHighlightRequest,
        _image_bytes: &[u8],
    ) -> Result<CvHighlightResult, ExecutorError> {
        self.answer(request).await
    }

    fn model_name(&self) -> Option<String> {
        self.model.clone()
    }
}

#[async_trait]
impl ReportDraftExecutor for MockDraftExecutor {
    async fn draft_report(
        &self,
        request: &ReportDraftRequest,
    ) -> Result<ReportDraft, ExecutorError> {
        self.answer(request).await
    }

    fn model_name(&self) -> Option<String> {
        self.model.clone()
    }
}

#[async_trait]
impl QaExecutor for MockQaExecutor {
    async fn review_report(
        &self,
        request: &ReportQaRequest,
    ) -> Result<ReportQaResponse, ExecutorError> {
        self.answer(request).await
    }

    fn model_name(&self) -> Option<String> {
        self.model.clone()
    }
}

#[async_trait]
impl FollowUpExecutor for MockFollowUpExecutor {
    async fn extract_followups(
        &self,
        request: &FollowUpExtractionRequest,
    ) -> Result<FollowUpExtractionResponse, ExecutorError> {
        self.answer(request).await
    }

    fn model_name(&self) -> Option<String> {
        self.model.clone()
    }
}

#[async_trait]
impl PatientSummaryExecutor for MockSummaryExecutor {
    async fn explain(
        &self,
        request: &PatientReportSummaryRequest,
    ) -> Result<PatientReportSummaryResponse, ExecutorError> {
        self.answer(request).await
    }

    fn model_name(&self) -> Option<String> {
        self.model.clone()
    }
}

/// Learning sink that records events and can be told to fail.
#[derive(Debug, Default)]
pub struct MockLearningSink {
    failure: Option<String>,
    attempts: Mutex<Vec<LearningEvent>>,
}

impl MockLearningSink {
    /// Creates a sink that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink whose `save` always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Every event passed to `save`, including failed attempts.
    #[must_use]
    pub fn events(&self) -> Vec<LearningEvent> {
        self.attempts.lock().clone()
    }

    /// Number of `save` calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.attempts.lock().len()
    }
}

#[async_trait]
impl LearningEventSink for MockLearningSink {
    async fn save(&self, event: &LearningEvent) -> Result<(), ExecutorError> {
        self.attempts.lock().push(event.clone());
        match &self.failure {
            Some(message) => Err(ExecutorError::unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
enum ImageMode {
    Bytes(Vec<u8>),
    NoSource(String),
    Failing(String),
}

/// Image source with a fixed answer, for tests that should not touch disk.
#[derive(Debug)]
pub struct StaticImageSource {
    mode: ImageMode,
    loads: Mutex<usize>,
}

impl StaticImageSource {
    /// Always returns these bytes.
    #[must_use]
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_mode(ImageMode::Bytes(bytes.into()))
    }

    /// Never finds a byte source.
    #[must_use]
    pub fn no_source(reason: impl Into<String>) -> Self {
        Self::with_mode(ImageMode::NoSource(reason.into()))
    }

    /// Always fails to read.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_mode(ImageMode::Failing(message.into()))
    }

    fn with_mode(mode: ImageMode) -> Self {
        Self {
            mode,
            loads: Mutex::new(0),
        }
    }

    /// Number of `load` calls.
    #[must_use]
    pub fn load_count(&self) -> usize {
        *self.loads.lock()
    }
}

#[async_trait]
impl ImageSource for StaticImageSource {
    async fn load(&self, _reference: &ImageReference) -> ImageLoad {
        *self.loads.lock() += 1;
        match &self.mode {
            ImageMode::Bytes(bytes) => ImageLoad::Loaded(bytes.clone()),
            ImageMode::NoSource(reason) => ImageLoad::NoSource(reason.clone()),
            ImageMode::Failing(message) => {
                ImageLoad::Failed(ExecutorError::failed(message.clone()))
            }
        }
    }
}
