//! Exam, clinical context and image reference inputs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Descriptive metadata of the imaging exam.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExamMetadata {
    /// Accession number.
    pub accession: Option<String>,
    /// Exam date as supplied by the caller.
    pub exam_date: Option<String>,
    /// Imaging modality (e.g., "CR", "CT").
    pub modality: Option<String>,
    /// Body region (e.g., "chest").
    pub body_region: Option<String>,
    /// Patient age in years.
    pub age: Option<u32>,
    /// Patient sex.
    pub sex: Option<String>,
}

impl ExamMetadata {
    /// Creates new empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the modality.
    #[must_use]
    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = Some(modality.into());
        self
    }

    /// Sets the accession number.
    #[must_use]
    pub fn with_accession(mut self, accession: impl Into<String>) -> Self {
        self.accession = Some(accession.into());
        self
    }

    /// Sets the body region.
    #[must_use]
    pub fn with_body_region(mut self, region: impl Into<String>) -> Self {
        self.body_region = Some(region.into());
        self
    }
}

/// Clinical background supplied with the study.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClinicalContext {
    /// Brief demographics and history (e.g., "65-year-old male").
    pub patient_info: String,
    /// Chief complaint and recent symptoms.
    pub clinical_presentation: String,
    /// Relevant medical history.
    pub relevant_history: Option<String>,
}

impl ClinicalContext {
    /// Creates a new clinical context.
    #[must_use]
    pub fn new(patient_info: impl Into<String>, clinical_presentation: impl Into<String>) -> Self {
        Self {
            patient_info: patient_info.into(),
            clinical_presentation: clinical_presentation.into(),
            relevant_history: None,
        }
    }

    /// Sets the relevant history.
    #[must_use]
    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.relevant_history = Some(history.into());
        self
    }
}

/// Reference to an image belonging to the study.
///
/// Only `file_path` is understood by the default image source. Any other
/// attributes are carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageReference {
    /// Local path of the image file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Any other attributes supplied by the caller.
    #[serde(flatten)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ImageReference {
    /// Creates a reference to a file on disk.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
            attributes: HashMap::new(),
        }
    }

    /// Creates a reference from attributes only (no byte source).
    #[must_use]
    pub fn from_attributes(attributes: HashMap<String, serde_json::Value>) -> Self {
        Self {
            file_path: None,
            attributes,
        }
    }

    /// Returns the file path, if the reference carries one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}
