//! # Studyflow
//!
//! Coordinates the finalization of a single imaging study.
//!
//! A run walks five stages in fixed order:
//!
//! - **CV analysis**: optional, highlights regions on the first image
//! - **Report draft**: required, produces the report text
//! - **QA review**: optional, may normalize the draft
//! - **Follow-up extraction**: optional, pulls incidental findings
//! - **Patient summary**: optional, explains the report in plain language
//!
//! Every stage ends with exactly one recorded result. Only a failed draft
//! fails the run; other stage failures degrade it to a partial success. When
//! QA finds significant issues for a known radiologist, a learning event is
//! handed to the configured sink.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use studyflow::prelude::*;
//!
//! let orchestrator = StudyOrchestrator::builder(drafter)
//!     .qa(qa_reviewer)
//!     .patient_summary(explainer)
//!     .event_sink(Arc::new(LoggingEventSink::default()))
//!     .build()?;
//!
//! let request = StudyOrchestrationRequest::new("study-1", exam, clinical_context)
//!     .with_radiologist_id("rad-42");
//! let response = orchestrator.run(&request).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_arguments
)]

pub mod core;
pub mod errors;
pub mod events;
pub mod learning;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{PipelineEvent, PipelineStage, PipelineStatus, StageStatus};
    pub use crate::errors::{ExecutorError, InvariantViolation, StudyflowError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::learning::InMemoryLearningEventSink;
    pub use crate::models::{
        ClinicalContext, CvHighlightRequest, CvHighlightResult, ExamMetadata,
        FollowUpExtractionRequest, FollowUpExtractionResponse, ImageReference, LearningEvent,
        PatientReportSummaryRequest, PatientReportSummaryResponse, ReportDraft,
        ReportDraftRequest, ReportQaRequest, ReportQaResponse,
    };
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{
        OrchestratorConfig, PipelineOptions, StudyBundle, StudyOrchestrationRequest,
        StudyOrchestrationResponse, StudyOrchestrator,
    };
    pub use crate::stages::{
        CvExecutor, FollowUpExecutor, ImageSource, LearningEventSink, PatientSummaryExecutor,
        QaExecutor, ReportDraftExecutor, StagePorts, StageResult,
    };
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}
