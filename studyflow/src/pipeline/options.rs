//! Per-request pipeline options and per-orchestrator configuration.

use crate::errors::StudyflowError;
use crate::learning::DEFAULT_LEARNING_SOURCE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_true() -> bool {
    true
}

fn default_pipeline_name() -> String {
    "study_finalization".to_string()
}

fn default_learning_source() -> String {
    DEFAULT_LEARNING_SOURCE.to_string()
}

/// Which optional stages a request wants.
///
/// Every flag defaults to `true`. The report draft is not optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Run CV analysis on the first image.
    #[serde(default = "default_true")]
    pub run_cv_analysis: bool,
    /// Run QA review on the draft.
    #[serde(default = "default_true")]
    pub run_qa_review: bool,
    /// Extract incidental findings and follow-ups.
    #[serde(default = "default_true")]
    pub run_followup_extraction: bool,
    /// Write the patient-facing summary.
    #[serde(default = "default_true")]
    pub run_patient_summary: bool,
    /// Per-stage time limit hint. Only enforced when the orchestrator is
    /// configured with `enforce_stage_timeout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stage_timeout_seconds: Option<u64>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            run_cv_analysis: true,
            run_qa_review: true,
            run_followup_extraction: true,
            run_patient_summary: true,
            max_stage_timeout_seconds: None,
        }
    }
}

impl PipelineOptions {
    /// All optional stages enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the report draft runs.
    #[must_use]
    pub fn draft_only() -> Self {
        Self {
            run_cv_analysis: false,
            run_qa_review: false,
            run_followup_extraction: false,
            run_patient_summary: false,
            max_stage_timeout_seconds: None,
        }
    }

    /// Enables or disables CV analysis.
    #[must_use]
    pub fn with_cv_analysis(mut self, enabled: bool) -> Self {
        self.run_cv_analysis = enabled;
        self
    }

    /// Enables or disables QA review.
    #[must_use]
    pub fn with_qa_review(mut self, enabled: bool) -> Self {
        self.run_qa_review = enabled;
        self
    }

    /// Enables or disables follow-up extraction.
    #[must_use]
    pub fn with_followup_extraction(mut self, enabled: bool) -> Self {
        self.run_followup_extraction = enabled;
        self
    }

    /// Enables or disables the patient summary.
    #[must_use]
    pub fn with_patient_summary(mut self, enabled: bool) -> Self {
        self.run_patient_summary = enabled;
        self
    }

    /// Sets the per-stage timeout hint.
    #[must_use]
    pub fn with_max_stage_timeout_seconds(mut self, seconds: u64) -> Self {
        self.max_stage_timeout_seconds = Some(seconds);
        self
    }

    /// The timeout hint as a [`Duration`].
    #[must_use]
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.max_stage_timeout_seconds.map(Duration::from_secs)
    }
}

/// Orchestrator-wide settings, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Name reported in logs and pipeline events.
    #[serde(default = "default_pipeline_name")]
    pub pipeline_name: String,
    /// Wrap each collaborator call in the request's stage timeout.
    #[serde(default)]
    pub enforce_stage_timeout: bool,
    /// `source` tag written on learning events.
    #[serde(default = "default_learning_source")]
    pub learning_event_source: String,
    /// Emit `pipeline.*` and `stage.*` events to the event sink.
    #[serde(default = "default_true")]
    pub emit_pipeline_events: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            pipeline_name: default_pipeline_name(),
            enforce_stage_timeout: false,
            learning_event_source: default_learning_source(),
            emit_pipeline_events: true,
        }
    }
}

impl OrchestratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration. Missing keys take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self, StudyflowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StudyflowError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that the configured names are usable.
    pub fn validate(&self) -> Result<(), StudyflowError> {
        if self.pipeline_name.trim().is_empty() {
            return Err(StudyflowError::Config("pipeline_name must not be empty".to_string()));
        }
        if self.learning_event_source.trim().is_empty() {
            return Err(StudyflowError::Config(
                "learning_event_source must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = name.into();
        self
    }

    /// Enables or disables stage timeout enforcement.
    #[must_use]
    pub fn with_enforce_stage_timeout(mut self, enforce: bool) -> Self {
        self.enforce_stage_timeout = enforce;
        self
    }

    /// Sets the learning event source tag.
    #[must_use]
    pub fn with_learning_event_source(mut self, source: impl Into<String>) -> Self {
        self.learning_event_source = source.into();
        self
    }

    /// Enables or disables lifecycle event emission.
    #[must_use]
    pub fn with_emit_pipeline_events(mut self, emit: bool) -> Self {
        self.emit_pipeline_events = emit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_options_default_all_enabled() {
        let options = PipelineOptions::default();
        assert!(options.run_cv_analysis);
        assert!(options.run_qa_review);
        assert!(options.run_followup_extraction);
        assert!(options.run_patient_summary);
        assert!(options.stage_timeout().is_none());
    }

    #[test]
    fn test_options_partial_json_uses_defaults() {
        let options: PipelineOptions =
            serde_json::from_str(r#"{"run_qa_review": false, "max_stage_timeout_seconds": 30}"#)
                .unwrap();

        assert!(options.run_cv_analysis);
        assert!(!options.run_qa_review);
        assert_eq!(options.stage_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_draft_only() {
        let options = PipelineOptions::draft_only().with_qa_review(true);
        assert!(!options.run_cv_analysis);
        assert!(options.run_qa_review);
        assert!(!options.run_patient_summary);
    }

    #[test]
    fn test_config_defaults() {
        let config = OrchestratorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        assert_eq!(config.pipeline_name, "study_finalization");
        assert_eq!(config.learning_event_source, "orchestrator");
        assert!(!config.enforce_stage_timeout);
        assert!(config.emit_pipeline_events);
    }

    #[test]
    fn test_config_from_json() {
        let config = OrchestratorConfig::from_json_str(
            r#"{
                "pipeline_name": "ed_reads",
                "enforce_stage_timeout": true,
                "emit_pipeline_events": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.pipeline_name, "ed_reads");
        assert!(config.enforce_stage_timeout);
        assert!(!config.emit_pipeline_events);
    }

    #[test]
    fn test_config_rejects_blank_names() {
        let err = OrchestratorConfig::from_json_str(r#"{"pipeline_name": "  "}"#).unwrap_err();
        assert!(matches!(err, StudyflowError::Config(_)));

        let err =
            OrchestratorConfig::from_json_str(r#"{"learning_event_source": ""}"#).unwrap_err();
        assert!(err.to_string().contains("learning_event_source"));
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        let err = OrchestratorConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, StudyflowError::Serialization(_)));
    }

    #[test]
    fn test_config_from_path() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"learning_event_source": "ed_nightly"}"#).unwrap();

        let config = OrchestratorConfig::from_path(file.path()).unwrap();
        assert_eq!(config.learning_event_source, "ed_nightly");
        assert_eq!(config.pipeline_name, "study_finalization");
    }

    #[test]
    fn test_config_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = OrchestratorConfig::from_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, StudyflowError::Io(_)));
    }
}
