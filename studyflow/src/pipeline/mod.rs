//! Study pipeline coordination.
//!
//! This module provides:
//! - Request options and orchestrator configuration
//! - The result bundle and working-text derivation
//! - The [`StudyOrchestrator`] that drives the five stages

mod bundle;
mod options;
mod orchestrator;
mod outcome;
mod request;


pub use bundle::{BundleBuilder, StudyBundle};
pub use options::{OrchestratorConfig, PipelineOptions};
pub use orchestrator::{StudyOrchestrator, StudyOrchestratorBuilder, UPSTREAM_FAILED};
pub use outcome::{compute_pipeline_status, derive_working_text};
pub use request::{GenerationMetadata, StudyOrchestrationRequest, StudyOrchestrationResponse};
