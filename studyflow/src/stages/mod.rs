//! Stage collaborator traits and per-stage bookkeeping.
//!
//! Each pipeline stage is produced by one collaborator. Collaborators are
//! narrow async traits: one request type in, one result type out, or an
//! [`ExecutorError`]. They are injected into the orchestrator through
//! [`StagePorts`] and can be replaced by test doubles.

mod image_source;
mod ports;
mod result;

pub use image_source::{FileImageSource, ImageLoad, ImageSource};
pub use ports::StagePorts;
pub use result::{StageLedger, StageResult};

use crate::errors::ExecutorError;
use crate::models::{
    CvHighlightRequest, CvHighlightResult, FollowUpExtractionRequest, FollowUpExtractionResponse,
    LearningEvent, PatientReportSummaryRequest, PatientReportSummaryResponse, ReportDraft,
    ReportDraftRequest, ReportQaRequest, ReportQaResponse,
};
use async_trait::async_trait;

/// Vision collaborator for the CV analysis stage.
#[async_trait]
pub trait CvExecutor: Send + Sync {
    /// Highlights regions of interest on the image.
    async fn highlight(
        &self,
        request: &CvHighlightRequest,
        image_bytes: &[u8],
    ) -> Result<CvHighlightResult, ExecutorError>;

    /// Name of the underlying model, recorded in generation metadata.
    fn model_name(&self) -> Option<String> {
        None
    }
}

/// Drafting collaborator for the report draft stage.
#[async_trait]
pub trait ReportDraftExecutor: Send + Sync {
    /// Drafts the report text.
    async fn draft_report(
        &self,
        request: &ReportDraftRequest,
    ) -> Result<ReportDraft, ExecutorError>;

    /// Name of the underlying model, recorded in generation metadata.
    fn model_name(&self) -> Option<String> {
        None
    }
}

/// QA collaborator for the review stage.
#[async_trait]
pub trait QaExecutor: Send + Sync {
    /// Reviews the drafted report.
    async fn review_report(
        &self,
        request: &ReportQaRequest,
    ) -> Result<ReportQaResponse, ExecutorError>;

    /// Name of the underlying model, recorded in generation metadata.
    fn model_name(&self) -> Option<String> {
        None
    }
}

/// Extraction collaborator for the follow-up stage.
#[async_trait]
pub trait FollowUpExecutor: Send + Sync {
    /// Extracts incidental findings and follow-up recommendations.
    async fn extract_followups(
        &self,
        request: &FollowUpExtractionRequest,
    ) -> Result<FollowUpExtractionResponse, ExecutorError>;

    /// Name of the underlying model, recorded in generation metadata.
    fn model_name(&self) -> Option<String> {
        None
    }
}

/// Summarization collaborator for the patient summary stage.
#[async_trait]
pub trait PatientSummaryExecutor: Send + Sync {
    /// Explains the report in lay language.
    async fn explain(
        &self,
        request: &PatientReportSummaryRequest,
    ) -> Result<PatientReportSummaryResponse, ExecutorError>;

    /// Name of the underlying model, recorded in generation metadata.
    fn model_name(&self) -> Option<String> {
        None
    }
}

/// Destination for learning events.
///
/// Implementations are shared by every concurrent run and must accept
/// concurrent `save` calls; any locking or transactional discipline is
/// theirs. The orchestrator treats `save` as best-effort and discards its
/// error after logging it.
#[async_trait]
pub trait LearningEventSink: Send + Sync {
    /// Persists one learning event.
    async fn save(&self, event: &LearningEvent) -> Result<(), ExecutorError>;
}
