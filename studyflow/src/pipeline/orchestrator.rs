//! The study pipeline coordinator.
//!
//! Stages run strictly in [`PipelineStage::ALL`] order. Each stage is
//! resolved to exactly one [`StageResult`]:
//!
//! - CV analysis is optional and fail-soft.
//! - The report draft always runs. If it fails or comes back empty, the three
//!   text stages are skipped and the run is `FAILED`.
//! - QA, follow-up extraction and the patient summary are optional and
//!   fail-soft. A QA failure leaves the raw draft as the working text.
//!
//! Collaborator failures never escape [`StudyOrchestrator::run`]; they are
//! recorded in the ledger. `run` only errors when its own bookkeeping breaks.

use super::outcome::{compute_pipeline_status, derive_working_text};
use super::{
    BundleBuilder, GenerationMetadata, OrchestratorConfig, PipelineOptions,
    StudyOrchestrationRequest, StudyOrchestrationResponse,
};
use crate::core::{PipelineEvent, PipelineStage, PipelineStatus, StageStatus};
use crate::errors::{ExecutorError, StudyflowError};
use crate::events::{EventSink, NoOpEventSink};
use crate::learning::LearningEventDraft;
use crate::models::{
    CvHighlightRequest, FollowUpExtractionRequest, PatientReportSummaryRequest, ReportDraftRequest,
    ReportQaRequest,
};
use crate::observability::{RunSpanAttributes, SpanTimer, StageSpanAttributes, WideEventEmitter};
use crate::stages::{ImageLoad, ReportDraftExecutor, StageLedger, StagePorts, StageResult};
use crate::utils::{generate_uuid_v7, now_utc, Timestamp};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Skip reason for the stages that depend on the draft.
pub const UPSTREAM_FAILED: &str = "Upstream dependency failed";

/// Coordinates the five pipeline stages for one study at a time.
///
/// Holds only shared, immutable collaborators; all per-run state lives in
/// [`run`](Self::run), so one instance can serve many concurrent studies.
pub struct StudyOrchestrator {
    drafter: Arc<dyn ReportDraftExecutor>,
    ports: StagePorts,
    event_sink: Arc<dyn EventSink>,
    config: OrchestratorConfig,
    wide_events: WideEventEmitter,
}

impl std::fmt::Debug for StudyOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyOrchestrator")
            .field("ports", &self.ports)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`StudyOrchestrator`].
#[must_use]
pub struct StudyOrchestratorBuilder {
    drafter: Arc<dyn ReportDraftExecutor>,
    ports: StagePorts,
    event_sink: Option<Arc<dyn EventSink>>,
    config: OrchestratorConfig,
}

impl StudyOrchestratorBuilder {
    /// Replaces all optional collaborators at once.
    pub fn ports(mut self, ports: StagePorts) -> Self {
        self.ports = ports;
        self
    }

    /// Sets the CV collaborator.
    pub fn cv(mut self, cv: Arc<dyn crate::stages::CvExecutor>) -> Self {
        self.ports = self.ports.with_cv(cv);
        self
    }

    /// Sets the QA collaborator.
    pub fn qa(mut self, qa: Arc<dyn crate::stages::QaExecutor>) -> Self {
        self.ports = self.ports.with_qa(qa);
        self
    }

    /// Sets the follow-up collaborator.
    pub fn followup(mut self, followup: Arc<dyn crate::stages::FollowUpExecutor>) -> Self {
        self.ports = self.ports.with_followup(followup);
        self
    }

    /// Sets the patient summary collaborator.
    pub fn patient_summary(
        mut self,
        summary: Arc<dyn crate::stages::PatientSummaryExecutor>,
    ) -> Self {
        self.ports = self.ports.with_patient_summary(summary);
        self
    }

    /// Sets the learning event sink.
    pub fn learning_sink(mut self, sink: Arc<dyn crate::stages::LearningEventSink>) -> Self {
        self.ports = self.ports.with_learning_sink(sink);
        self
    }

    /// Replaces the image source.
    pub fn image_source(mut self, source: Arc<dyn crate::stages::ImageSource>) -> Self {
        self.ports = self.ports.with_image_source(source);
        self
    }

    /// Sets the lifecycle event sink.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Sets the orchestrator configuration.
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration and builds the orchestrator.
    pub fn build(self) -> Result<StudyOrchestrator, StudyflowError> {
        self.config.validate()?;
        Ok(StudyOrchestrator {
            drafter: self.drafter,
            ports: self.ports,
            event_sink: self.event_sink.unwrap_or_else(|| Arc::new(NoOpEventSink)),
            config: self.config,
            wide_events: WideEventEmitter::new(),
        })
    }
}

/// Per-run state. Owned by one `run` call.
struct StudyRun<'a> {
    request: &'a StudyOrchestrationRequest,
    run_id: String,
    ledger: StageLedger,
    bundle: BundleBuilder,
    cv_models: Vec<String>,
    llm_models: Vec<String>,
}

impl<'a> StudyRun<'a> {
    fn new(request: &'a StudyOrchestrationRequest, run_id: String) -> Self {
        Self {
            request,
            run_id,
            ledger: StageLedger::new(),
            bundle: BundleBuilder::new(&request.study_id, request.exam_metadata.clone()),
            cv_models: Vec::new(),
            llm_models: Vec::new(),
        }
    }

    fn options(&self) -> &'a PipelineOptions {
        &self.request.pipeline_options
    }

    fn study_id(&self) -> &'a str {
        &self.request.study_id
    }

    fn note_model(&mut self, stage: PipelineStage, model: Option<String>) {
        let Some(model) = model else { return };
        let models = if stage == PipelineStage::CvAnalysis {
            &mut self.cv_models
        } else {
            &mut self.llm_models
        };
        if !models.contains(&model) {
            models.push(model);
        }
    }
}

impl StudyOrchestrator {
    /// Starts building an orchestrator around the report drafter.
    pub fn builder(drafter: Arc<dyn ReportDraftExecutor>) -> StudyOrchestratorBuilder {
        StudyOrchestratorBuilder {
            drafter,
            ports: StagePorts::default(),
            event_sink: None,
            config: OrchestratorConfig::default(),
        }
    }

    /// Creates an orchestrator with default configuration and no event sink.
    #[must_use]
    pub fn new(drafter: Arc<dyn ReportDraftExecutor>, ports: StagePorts) -> Self {
        Self {
            drafter,
            ports,
            event_sink: Arc::new(NoOpEventSink),
            config: OrchestratorConfig::default(),
            wide_events: WideEventEmitter::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Returns the injected collaborators.
    #[must_use]
    pub fn ports(&self) -> &StagePorts {
        &self.ports
    }

    /// Runs the pipeline for one study.
    ///
    /// Collaborator failures are recorded in the returned ledger. The only
    /// error is [`StudyflowError::Invariant`], raised if the ledger does not
    /// end up with one entry per stage in order.
    pub async fn run(
        &self,
        request: &StudyOrchestrationRequest,
    ) -> Result<StudyOrchestrationResponse, StudyflowError> {
        let run_id = generate_uuid_v7().to_string();
        let span = info_span!(
            "study_pipeline",
            pipeline = %self.config.pipeline_name,
            study_id = %request.study_id,
            run_id = %run_id,
        );
        self.execute(request, run_id).instrument(span).await
    }

    async fn execute(
        &self,
        request: &StudyOrchestrationRequest,
        run_id: String,
    ) -> Result<StudyOrchestrationResponse, StudyflowError> {
        let timer = SpanTimer::start(&self.config.pipeline_name);
        let attributes = RunSpanAttributes::new()
            .with_pipeline_name(&self.config.pipeline_name)
            .with_run_id(&run_id)
            .with_study_id(&request.study_id)
            .with_radiologist_id(request.radiologist())
            .with_dry_run(request.dry_run);
        info!(attributes = ?attributes.to_attributes(), "Starting study pipeline");
        self.publish(&PipelineEvent::pipeline_started(&request.study_id, &run_id));

        let mut run = StudyRun::new(request, run_id);

        self.run_cv_analysis(&mut run).await?;
        if self.run_report_draft(&mut run).await? {
            self.run_qa_review(&mut run).await?;
            self.run_followup_extraction(&mut run).await?;
            self.run_patient_summary(&mut run).await?;
        } else {
            for stage in PipelineStage::DOWNSTREAM_OF_DRAFT {
                self.skip(&mut run, stage, UPSTREAM_FAILED)?;
            }
        }

        let pipeline_status = compute_pipeline_status(&run.ledger);
        if pipeline_status != PipelineStatus::Failed {
            self.emit_learning_event(&run).await;
        }

        let StudyRun {
            run_id,
            ledger,
            bundle,
            cv_models,
            llm_models,
            ..
        } = run;
        let stages = ledger.into_results()?;
        let duration_ms = timer.finish();

        if self.config.emit_pipeline_events {
            self.wide_events.emit_pipeline_event(
                self.event_sink.as_ref(),
                &self.config.pipeline_name,
                &request.study_id,
                &run_id,
                pipeline_status,
                &stages,
                duration_ms,
            );
        }
        info!(status = %pipeline_status, duration_ms, "Study pipeline finished");

        let metadata = GenerationMetadata {
            cv_models_used: cv_models,
            llm_models_used: llm_models,
            run_id,
            duration_ms,
        };
        Ok(StudyOrchestrationResponse::new(
            pipeline_status,
            bundle.freeze(),
            stages,
            metadata,
        ))
    }

    async fn run_cv_analysis(&self, run: &mut StudyRun<'_>) -> Result<(), StudyflowError> {
        const STAGE: PipelineStage = PipelineStage::CvAnalysis;
        let request = run.request;

        if !run.options().run_cv_analysis {
            return self.skip(run, STAGE, "CV analysis disabled");
        }
        let Some(cv) = self.ports.cv.as_ref() else {
            return self.skip(run, STAGE, "No CV executor configured");
        };
        let Some(reference) = request.image_references.first() else {
            return self.skip(run, STAGE, "No image references");
        };

        let started_at = now_utc();
        let bytes = match self.ports.image_source.load(reference).await {
            ImageLoad::NoSource(reason) => return self.skip(run, STAGE, &reason),
            ImageLoad::Loaded(bytes) => {
                self.publish(&PipelineEvent::stage_started(run.study_id(), STAGE));
                bytes
            }
            ImageLoad::Failed(err) => {
                self.publish(&PipelineEvent::stage_started(run.study_id(), STAGE));
                warn!(stage = %STAGE, error = %err, "Could not load image");
                return self.fail(run, STAGE, started_at, &err, None);
            }
        };

        let cv_request = CvHighlightRequest {
            study_id: Some(request.study_id.clone()),
            modality: request.exam_metadata.modality.clone().unwrap_or_default(),
            body_part: request.exam_metadata.body_region.clone(),
            ..CvHighlightRequest::default()
        };
        let outcome = self
            .call(run.options(), cv.highlight(&cv_request, &bytes))
            .await;
        let model = cv.model_name();

        match outcome {
            Ok(result) => {
                debug!(stage = %STAGE, regions = result.regions.len(), "CV analysis complete");
                run.bundle.set_cv_analysis(result);
                self.succeed(run, STAGE, started_at, model)
            }
            Err(err) => {
                warn!(stage = %STAGE, error = %err, "CV analysis failed");
                self.fail(run, STAGE, started_at, &err, model)
            }
        }
    }

    /// Returns whether a usable draft was produced.
    async fn run_report_draft(&self, run: &mut StudyRun<'_>) -> Result<bool, StudyflowError> {
        const STAGE: PipelineStage = PipelineStage::ReportDraft;
        let request = run.request;

        let draft_request = ReportDraftRequest {
            clinical_context: request.clinical_context.clone(),
            modality: request.exam_metadata.modality.clone(),
            findings: Vec::new(),
            cv_summary: run.bundle.cv_analysis().cloned(),
        };

        let started_at = now_utc();
        self.publish(&PipelineEvent::stage_started(run.study_id(), STAGE));
        let outcome = self
            .call(run.options(), self.drafter.draft_report(&draft_request))
            .await;
        let model = self.drafter.model_name();

        match outcome {
            Ok(draft) if draft.has_text() => {
                run.bundle
                    .set_final_report_text(derive_working_text(Some(&draft), None));
                run.bundle.set_report_draft(draft);
                self.succeed(run, STAGE, started_at, model)?;
                Ok(true)
            }
            Ok(draft) => {
                error!(stage = %STAGE, "Report draft returned empty text");
                run.bundle.set_report_draft(draft);
                let err = ExecutorError::invalid_output("Report draft returned empty text");
                self.fail(run, STAGE, started_at, &err, model)?;
                Ok(false)
            }
            Err(err) => {
                error!(stage = %STAGE, error = %err, "Report draft failed");
                self.fail(run, STAGE, started_at, &err, model)?;
                Ok(false)
            }
        }
    }

    async fn run_qa_review(&self, run: &mut StudyRun<'_>) -> Result<(), StudyflowError> {
        const STAGE: PipelineStage = PipelineStage::QaReview;

        if !run.options().run_qa_review {
            return self.skip(run, STAGE, "QA review disabled");
        }
        let Some(qa) = self.ports.qa.as_ref() else {
            return self.skip(run, STAGE, "No QA executor configured");
        };
        let Some(report_text) = run.bundle.working_text().map(ToString::to_string) else {
            return self.skip(run, STAGE, UPSTREAM_FAILED);
        };

        let qa_request = ReportQaRequest {
            exam_metadata: run.request.exam_metadata.clone(),
            report_text,
        };

        let started_at = now_utc();
        self.publish(&PipelineEvent::stage_started(run.study_id(), STAGE));
        let outcome = self.call(run.options(), qa.review_report(&qa_request)).await;
        let model = qa.model_name();

        match outcome {
            Ok(result) => {
                let working = derive_working_text(run.bundle.report_draft(), Some(&result));
                debug!(
                    stage = %STAGE,
                    issues = result.issues.len(),
                    normalized = result.usable_normalized_text().is_some(),
                    "QA review complete"
                );
                run.bundle.set_final_report_text(working);
                run.bundle.set_qa_result(result);
                self.succeed(run, STAGE, started_at, model)
            }
            Err(err) => {
                warn!(stage = %STAGE, error = %err, "QA review failed, keeping draft text");
                self.fail(run, STAGE, started_at, &err, model)
            }
        }
    }

    async fn run_followup_extraction(&self, run: &mut StudyRun<'_>) -> Result<(), StudyflowError> {
        const STAGE: PipelineStage = PipelineStage::FollowupExtraction;

        if !run.options().run_followup_extraction {
            return self.skip(run, STAGE, "Follow-up extraction disabled");
        }
        let Some(extractor) = self.ports.followup.as_ref() else {
            return self.skip(run, STAGE, "No follow-up executor configured");
        };
        let Some(report_text) = run.bundle.working_text().map(ToString::to_string) else {
            return self.skip(run, STAGE, "No working report text");
        };

        let followup_request = FollowUpExtractionRequest {
            exam_metadata: run.request.exam_metadata.clone(),
            report_text,
        };

        let started_at = now_utc();
        self.publish(&PipelineEvent::stage_started(run.study_id(), STAGE));
        let outcome = self
            .call(run.options(), extractor.extract_followups(&followup_request))
            .await;
        let model = extractor.model_name();

        match outcome {
            Ok(result) => {
                debug!(
                    stage = %STAGE,
                    findings = result.incidental_findings.len(),
                    has_any_followup = result.has_any_followup,
                    "Follow-up extraction complete"
                );
                run.bundle.set_followup_data(result);
                self.succeed(run, STAGE, started_at, model)
            }
            Err(err) => {
                warn!(stage = %STAGE, error = %err, "Follow-up extraction failed");
                self.fail(run, STAGE, started_at, &err, model)
            }
        }
    }

    async fn run_patient_summary(&self, run: &mut StudyRun<'_>) -> Result<(), StudyflowError> {
        const STAGE: PipelineStage = PipelineStage::PatientSummary;

        if !run.options().run_patient_summary {
            return self.skip(run, STAGE, "Patient summary disabled");
        }
        let Some(explainer) = self.ports.patient_summary.as_ref() else {
            return self.skip(run, STAGE, "No patient summary executor configured");
        };
        let Some(report_text) = run.bundle.working_text().map(ToString::to_string) else {
            return self.skip(run, STAGE, "No working report text");
        };

        let summary_request = PatientReportSummaryRequest {
            exam_metadata: run.request.exam_metadata.clone(),
            report_text,
            followup_data: run.bundle.followup_data().cloned(),
            reading_level: Default::default(),
            tone: Default::default(),
            language_code: run.request.language_code.clone(),
        };

        let started_at = now_utc();
        self.publish(&PipelineEvent::stage_started(run.study_id(), STAGE));
        let outcome = self
            .call(run.options(), explainer.explain(&summary_request))
            .await;
        let model = explainer.model_name();

        match outcome {
            Ok(result) => {
                run.bundle.set_patient_summary(result);
                self.succeed(run, STAGE, started_at, model)
            }
            Err(err) => {
                warn!(stage = %STAGE, error = %err, "Patient summary failed");
                self.fail(run, STAGE, started_at, &err, model)
            }
        }
    }

    /// Hands a learning event to the sink when QA found significant issues.
    ///
    /// Best-effort: a sink error is logged and dropped.
    async fn emit_learning_event(&self, run: &StudyRun<'_>) {
        let request = run.request;
        if request.dry_run {
            debug!("Dry run, no learning event");
            return;
        }
        let Some(sink) = self.ports.learning_sink.as_ref() else {
            return;
        };
        let Some(radiologist_id) = request.radiologist() else {
            return;
        };
        let (Some(qa_result), Some(draft)) = (run.bundle.qa_result(), run.bundle.report_draft())
        else {
            return;
        };

        let Some(event) = (LearningEventDraft {
            radiologist_id,
            exam_metadata: &request.exam_metadata,
            report_text_before: &draft.report_text,
            report_text_after: run.bundle.working_text(),
            qa_result,
            source: &self.config.learning_event_source,
        })
        .build() else {
            return;
        };

        match sink.save(&event).await {
            Ok(()) => info!(
                event_id = %event.event_id,
                severity = %event.severity,
                "Learning event recorded"
            ),
            Err(err) => error!(
                event_id = %event.event_id,
                error = %err,
                "Failed to record learning event"
            ),
        }
    }

    /// Awaits a collaborator call, bounded by the stage timeout when
    /// enforcement is on.
    async fn call<T>(
        &self,
        options: &PipelineOptions,
        fut: impl Future<Output = Result<T, ExecutorError>> + Send,
    ) -> Result<T, ExecutorError> {
        match self.stage_timeout(options) {
            Some(limit) => tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
                Err(ExecutorError::timeout(format!(
                    "Stage exceeded timeout of {}s",
                    limit.as_secs()
                )))
            }),
            None => fut.await,
        }
    }

    fn stage_timeout(&self, options: &PipelineOptions) -> Option<Duration> {
        if self.config.enforce_stage_timeout {
            options.stage_timeout()
        } else {
            None
        }
    }

    fn succeed(
        &self,
        run: &mut StudyRun<'_>,
        stage: PipelineStage,
        started_at: Timestamp,
        model: Option<String>,
    ) -> Result<(), StudyflowError> {
        let result = with_model(StageResult::success(stage, started_at), model.as_deref());
        run.note_model(stage, model);
        self.record(run, result)
    }

    fn fail(
        &self,
        run: &mut StudyRun<'_>,
        stage: PipelineStage,
        started_at: Timestamp,
        err: &ExecutorError,
        model: Option<String>,
    ) -> Result<(), StudyflowError> {
        let result = with_model(
            StageResult::failed(stage, started_at, err.to_string()),
            model.as_deref(),
        )
        .with_metadata("error_kind", serde_json::json!(err.kind()));
        run.note_model(stage, model);
        self.record(run, result)
    }

    fn skip(
        &self,
        run: &mut StudyRun<'_>,
        stage: PipelineStage,
        reason: &str,
    ) -> Result<(), StudyflowError> {
        debug!(stage = %stage, reason, "Skipping stage");
        self.record(run, StageResult::skipped(stage, reason))
    }

    fn record(&self, run: &mut StudyRun<'_>, result: StageResult) -> Result<(), StudyflowError> {
        let study_id = run.study_id();
        let duration_ms = result.duration_ms().unwrap_or_default();
        let event = match result.status {
            StageStatus::Success => {
                PipelineEvent::stage_completed(study_id, result.stage, duration_ms)
            }
            StageStatus::Failed => PipelineEvent::stage_failed(
                study_id,
                result.stage,
                result.error.as_deref().unwrap_or_default(),
                duration_ms,
            ),
            StageStatus::Skipped | StageStatus::NotRun => PipelineEvent::stage_skipped(
                study_id,
                result.stage,
                result.skip_reason.as_deref().unwrap_or_default(),
            ),
        };
        debug!(
            run_id = %run.run_id,
            attributes = ?StageSpanAttributes::from_result(&result).to_attributes(),
            "Stage resolved"
        );

        run.ledger.record(result)?;
        self.publish(&event);
        Ok(())
    }

    fn publish(&self, event: &PipelineEvent) {
        if self.config.emit_pipeline_events {
            self.event_sink.publish(event);
        }
    }
}

fn with_model(result: StageResult, model: Option<&str>) -> StageResult {
    match model {
        Some(model) => result.with_metadata("model", serde_json::json!(model)),
        None => result,
    }
}
