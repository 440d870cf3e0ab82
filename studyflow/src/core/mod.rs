//! Core domain model types for studyflow.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - Stage identity and status enums
//! - Run-level pipeline status
//! - Lifecycle events

mod event;
mod status;

pub use event::PipelineEvent;
pub use status::{PipelineStage, PipelineStatus, StageStatus};
