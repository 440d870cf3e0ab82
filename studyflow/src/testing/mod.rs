//! Testing utilities for the study pipeline.
//!
//! This module provides:
//! - Scripted collaborators with call recording
//! - Request fixtures and a fully wired orchestrator fixture
//! - Assertions over the stage ledger

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_ledger_complete, assert_no_failures, assert_stage_error, assert_stage_skipped,
    assert_stage_status, assert_stage_statuses,
};
pub use fixtures::{
    draft_only_request, qa_response_with, sample_clinical_context, sample_exam, sample_request,
    PipelineFixture, SAMPLE_DRAFT,
};
pub use mocks::{
    MockCvExecutor, MockDraftExecutor, MockFollowUpExecutor, MockLearningSink, MockQaExecutor,
    MockSummaryExecutor, ScriptedExecutor, StaticImageSource,
};
