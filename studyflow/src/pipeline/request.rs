//! Orchestrator request and response envelopes.

use super::{PipelineOptions, StudyBundle};
use crate::core::{PipelineStage, PipelineStatus, StageStatus};
use crate::models::{ClinicalContext, ExamMetadata, ImageReference};
use crate::stages::StageResult;
use serde::{Deserialize, Deserializer, Serialize};

fn default_language_code() -> String {
    "en".to_string()
}

fn default_version() -> String {
    "v1".to_string()
}

/// Treats an explicit `null` list the same as a missing one.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Everything needed to finalize one study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyOrchestrationRequest {
    /// Study identifier, echoed on the response and every event.
    pub study_id: String,
    /// Passed through to QA, follow-up and summary collaborators.
    pub exam_metadata: ExamMetadata,
    /// Passed through to the report drafter.
    pub clinical_context: ClinicalContext,
    /// Image references; only the first is used by CV analysis. `null` is
    /// read as no images.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_references: Vec<ImageReference>,
    /// Accepted for forward compatibility; not used by any stage.
    #[serde(default)]
    pub prior_report_text: Option<String>,
    /// Required for learning events. Blank ids count as absent.
    #[serde(default)]
    pub radiologist_id: Option<String>,
    /// Which optional stages to run.
    #[serde(default)]
    pub pipeline_options: PipelineOptions,
    /// Language of the patient summary. Defaults to `"en"`.
    #[serde(default = "default_language_code")]
    pub language_code: String,
    /// Suppresses learning events.
    #[serde(default)]
    pub dry_run: bool,
}

impl StudyOrchestrationRequest {
    /// Creates a request with default options and no images.
    #[must_use]
    pub fn new(
        study_id: impl Into<String>,
        exam_metadata: ExamMetadata,
        clinical_context: ClinicalContext,
    ) -> Self {
        Self {
            study_id: study_id.into(),
            exam_metadata,
            clinical_context,
            image_references: Vec::new(),
            prior_report_text: None,
            radiologist_id: None,
            pipeline_options: PipelineOptions::default(),
            language_code: default_language_code(),
            dry_run: false,
        }
    }

    /// Adds an image reference.
    #[must_use]
    pub fn with_image(mut self, reference: ImageReference) -> Self {
        self.image_references.push(reference);
        self
    }

    /// Sets the radiologist.
    #[must_use]
    pub fn with_radiologist_id(mut self, id: impl Into<String>) -> Self {
        self.radiologist_id = Some(id.into());
        self
    }

    /// Sets the pipeline options.
    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.pipeline_options = options;
        self
    }

    /// Sets the patient summary language.
    #[must_use]
    pub fn with_language_code(mut self, code: impl Into<String>) -> Self {
        self.language_code = code.into();
        self
    }

    /// Sets the prior report text.
    #[must_use]
    pub fn with_prior_report_text(mut self, text: impl Into<String>) -> Self {
        self.prior_report_text = Some(text.into());
        self
    }

    /// Marks the request as a dry run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The radiologist id, if one was given and is not blank.
    #[must_use]
    pub fn radiologist(&self) -> Option<&str> {
        self.radiologist_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

/// Models and timing recorded for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Models reported by the CV collaborator.
    #[serde(default)]
    pub cv_models_used: Vec<String>,
    /// Models reported by the text collaborators, first use first.
    #[serde(default)]
    pub llm_models_used: Vec<String>,
    /// Time-ordered run identifier.
    pub run_id: String,
    /// Wall time of the whole run.
    pub duration_ms: f64,
}

/// Result of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyOrchestrationResponse {
    /// Response schema version, currently `"v1"`.
    #[serde(default = "default_version")]
    pub version: String,
    /// Overall outcome.
    pub pipeline_status: PipelineStatus,
    /// Study identifier from the request.
    pub study_id: String,
    /// Frozen stage outputs.
    pub bundle: StudyBundle,
    /// One entry per stage, in pipeline order.
    pub stages: Vec<StageResult>,
    /// Models used and run timing.
    pub generation_metadata: GenerationMetadata,
}

impl StudyOrchestrationResponse {
    pub(crate) fn new(
        pipeline_status: PipelineStatus,
        bundle: StudyBundle,
        stages: Vec<StageResult>,
        generation_metadata: GenerationMetadata,
    ) -> Self {
        Self {
            version: default_version(),
            pipeline_status,
            study_id: bundle.study_id.clone(),
            bundle,
            stages,
            generation_metadata,
        }
    }

    /// Returns the result recorded for a stage.
    #[must_use]
    pub fn stage(&self, stage: PipelineStage) -> Option<&StageResult> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// Returns the status recorded for a stage.
    #[must_use]
    pub fn status_of(&self, stage: PipelineStage) -> Option<StageStatus> {
        self.stage(stage).map(|r| r.status)
    }

    /// Stage statuses in pipeline order.
    #[must_use]
    pub fn statuses(&self) -> Vec<StageStatus> {
        self.stages.iter().map(|r| r.status).collect()
    }

    /// The final working report text.
    #[must_use]
    pub fn final_report_text(&self) -> Option<&str> {
        self.bundle.final_report_text.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let json = r#"{
            "study_id": "S1",
            "exam_metadata": {"modality": "CR"},
            "clinical_context": {"patient_info": "45M", "clinical_presentation": "cough"}
        }"#;
        let request: StudyOrchestrationRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.language_code, "en");
        assert!(request.image_references.is_empty());
        assert!(request.pipeline_options.run_cv_analysis);
        assert!(!request.dry_run);
        assert!(request.radiologist_id.is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = StudyOrchestrationRequest::new(
            "S1",
            ExamMetadata::new(),
            ClinicalContext::new("45M", "cough"),
        )
        .with_image(ImageReference::from_path("/tmp/a.png"))
        .with_radiologist_id("rad-1")
        .with_language_code("es")
        .with_dry_run(true);

        assert_eq!(request.image_references.len(), 1);
        assert_eq!(request.radiologist_id.as_deref(), Some("rad-1"));
        assert_eq!(request.language_code, "es");
        assert!(request.dry_run);
    }

    #[test]
    fn test_request_null_images_read_as_empty() {
        let json = r#"{
            "study_id": "S1",
            "exam_metadata": {},
            "clinical_context": {"patient_info": "45M", "clinical_presentation": "cough"},
            "image_references": null
        }"#;
        let request: StudyOrchestrationRequest = serde_json::from_str(json).unwrap();

        assert!(request.image_references.is_empty());
    }

    #[test]
    fn test_request_rejects_non_list_images() {
        let json = r#"{
            "study_id": "S1",
            "exam_metadata": {},
            "clinical_context": {"patient_info": "45M", "clinical_presentation": "cough"},
            "image_references": "chest.png"
        }"#;
        assert!(serde_json::from_str::<StudyOrchestrationRequest>(json).is_err());
    }

    #[test]
    fn test_blank_radiologist_is_absent() {
        let request = StudyOrchestrationRequest::new(
            "S1",
            ExamMetadata::new(),
            ClinicalContext::new("45M", "cough"),
        );
        assert_eq!(request.radiologist(), None);
        assert_eq!(request.clone().with_radiologist_id("  ").radiologist(), None);
        assert_eq!(request.with_radiologist_id("rad-1").radiologist(), Some("rad-1"));
    }
}
