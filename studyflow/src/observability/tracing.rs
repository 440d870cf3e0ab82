//! Tracing setup and span attributes for study runs.

use crate::core::PipelineStage;
use crate::errors::StudyflowError;
use crate::stages::StageResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. With `json`
/// set, events are written as JSON lines.
///
/// # Errors
///
/// Returns [`StudyflowError::Config`] if a global subscriber is already set.
pub fn init_tracing(json: bool) -> Result<(), StudyflowError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| StudyflowError::Config(format!("failed to install tracing subscriber: {e}")))
}

/// Attributes describing one orchestrator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSpanAttributes {
    /// Pipeline name.
    pub pipeline_name: Option<String>,
    /// Run identifier.
    pub run_id: Option<String>,
    /// Study identifier.
    pub study_id: Option<String>,
    /// Radiologist, if known.
    pub radiologist_id: Option<String>,
    /// Whether learning events are suppressed.
    pub dry_run: bool,
}

impl RunSpanAttributes {
    /// Creates new run span attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = Some(name.into());
        self
    }

    /// Sets the run ID.
    #[must_use]
    pub fn with_run_id(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }

    /// Sets the study ID.
    #[must_use]
    pub fn with_study_id(mut self, id: impl Into<String>) -> Self {
        self.study_id = Some(id.into());
        self
    }

    /// Sets the radiologist ID.
    #[must_use]
    pub fn with_radiologist_id(mut self, id: Option<&str>) -> Self {
        self.radiologist_id = id.map(ToString::to_string);
        self
    }

    /// Marks the run as a dry run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Flattens to dotted attribute names.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.pipeline_name {
            attrs.insert("pipeline.name".to_string(), v.clone());
        }
        if let Some(ref v) = self.run_id {
            attrs.insert("pipeline.run_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.study_id {
            attrs.insert("study.id".to_string(), v.clone());
        }
        if let Some(ref v) = self.radiologist_id {
            attrs.insert("study.radiologist_id".to_string(), v.clone());
        }
        attrs.insert("pipeline.dry_run".to_string(), self.dry_run.to_string());

        attrs
    }
}

/// Attributes describing one resolved stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// Stage identity.
    pub stage: PipelineStage,
    /// Resolved status.
    pub status: Option<String>,
    /// Time spent in the collaborator.
    pub duration_ms: Option<f64>,
    /// Error message for failed stages.
    pub error: Option<String>,
    /// Reason for skipped stages.
    pub skip_reason: Option<String>,
    /// Model reported by the collaborator.
    pub model: Option<String>,
}

impl StageSpanAttributes {
    /// Creates attributes for a stage with nothing recorded yet.
    #[must_use]
    pub fn new(stage: PipelineStage) -> Self {
        Self {
            stage,
            status: None,
            duration_ms: None,
            error: None,
            skip_reason: None,
            model: None,
        }
    }

    /// Describes a recorded stage result.
    #[must_use]
    pub fn from_result(result: &StageResult) -> Self {
        Self {
            stage: result.stage,
            status: Some(result.status.to_string()),
            duration_ms: result.duration_ms(),
            error: result.error.clone(),
            skip_reason: result.skip_reason.clone(),
            model: result
                .metadata
                .get("model")
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string),
        }
    }

    /// Sets the stage status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Flattens to dotted attribute names.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        attrs.insert("stage.name".to_string(), self.stage.to_string());

        if let Some(ref v) = self.status {
            attrs.insert("stage.status".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("stage.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("stage.error".to_string(), v.clone());
        }
        if let Some(ref v) = self.skip_reason {
            attrs.insert("stage.skip_reason".to_string(), v.clone());
        }
        if let Some(ref v) = self.model {
            attrs.insert("stage.model".to_string(), v.clone());
        }

        attrs
    }

    /// Wide-event detail object for this stage.
    #[must_use]
    pub fn to_detail(&self) -> serde_json::Value {
        serde_json::json!({
            "stage": self.stage,
            "status": self.status,
            "duration_ms": self.duration_ms,
            "error": self.error,
            "skip_reason": self.skip_reason,
            "model": self.model,
        })
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::now_utc;

    #[test]
    fn test_run_span_attributes() {
        let attrs = RunSpanAttributes::new()
            .with_pipeline_name("study_finalization")
            .with_run_id("run-123")
            .with_study_id("S1")
            .with_radiologist_id(None);

        let flat = attrs.to_attributes();
        assert_eq!(flat.get("pipeline.name"), Some(&"study_finalization".to_string()));
        assert_eq!(flat.get("study.id"), Some(&"S1".to_string()));
        assert_eq!(flat.get("pipeline.dry_run"), Some(&"false".to_string()));
        assert!(!flat.contains_key("study.radiologist_id"));
    }

    #[test]
    fn test_stage_span_attributes_from_failed_result() {
        let result = StageResult::failed(PipelineStage::QaReview, now_utc(), "qa down")
            .with_metadata("model", serde_json::json!("qa-model-1"));
        let attrs = StageSpanAttributes::from_result(&result);

        let flat = attrs.to_attributes();
        assert_eq!(flat.get("stage.name"), Some(&"QA_REVIEW".to_string()));
        assert_eq!(flat.get("stage.status"), Some(&"FAILED".to_string()));
        assert_eq!(flat.get("stage.error"), Some(&"qa down".to_string()));
        assert_eq!(flat.get("stage.model"), Some(&"qa-model-1".to_string()));
        assert!(flat.contains_key("stage.duration_ms"));
    }

    #[test]
    fn test_stage_span_attributes_skipped_detail() {
        let result = StageResult::skipped(PipelineStage::CvAnalysis, "CV analysis disabled");
        let detail = StageSpanAttributes::from_result(&result).to_detail();

        assert_eq!(detail["stage"], "CV_ANALYSIS");
        assert_eq!(detail["status"], "SKIPPED");
        assert_eq!(detail["skip_reason"], "CV analysis disabled");
        assert!(detail["duration_ms"].is_null());
    }

    #[test]
    fn test_manual_attributes() {
        let flat = StageSpanAttributes::new(PipelineStage::ReportDraft)
            .with_status("SUCCESS")
            .with_duration_ms(123.45)
            .to_attributes();
        assert_eq!(flat.get("stage.duration_ms"), Some(&"123.45".to_string()));
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("REPORT_DRAFT");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "REPORT_DRAFT");
        let duration = timer.finish();
        assert!(duration >= 10.0);
    }
}
