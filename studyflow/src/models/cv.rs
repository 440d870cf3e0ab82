//! Computer-vision highlighting request and result.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// How the vision model presents its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvHighlightMode {
    /// Assistive, saliency-style highlighting.
    #[default]
    Attention,
    /// Bounding boxes around regions.
    #[serde(rename = "boxes")]
    BoundingBoxes,
}

/// Request sent to the vision collaborator alongside the image bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvHighlightRequest {
    /// Study identifier, for correlation.
    pub study_id: Option<String>,
    /// Imaging modality.
    pub modality: String,
    /// Body part (e.g., "chest").
    pub body_part: Option<String>,
    /// View (e.g., "PA").
    pub view: Option<String>,
    /// Output mode.
    #[serde(default)]
    pub assistive_mode: CvHighlightMode,
}

/// One highlighted region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvRegionHighlight {
    /// Region label (e.g., "opacity").
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub score: f64,
    /// Bounding box as `(x, y, w, h)`.
    pub bbox: Option<(u32, u32, u32, u32)>,
    /// Whether a segmentation mask accompanies the region.
    #[serde(default)]
    pub mask_present: bool,
}

/// Result of the vision collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvHighlightResult {
    /// Study identifier echoed back.
    pub study_id: Option<String>,
    /// Imaging modality.
    pub modality: String,
    /// Short text summary.
    pub summary: String,
    /// Highlighted regions.
    #[serde(default)]
    pub regions: Vec<CvRegionHighlight>,
    /// Heatmap overlay as base64-encoded PNG.
    pub heatmap_png_base64: Option<String>,
}

impl CvHighlightResult {
    /// Decodes the heatmap overlay.
    ///
    /// Returns `None` when no heatmap was produced or it is not valid base64.
    #[must_use]
    pub fn heatmap_png(&self) -> Option<Vec<u8>> {
        self.heatmap_png_base64
            .as_deref()
            .and_then(|encoded| STANDARD.decode(encoded).ok())
    }

    /// Labels of regions scoring at or above `threshold`.
    #[must_use]
    pub fn labels_above(&self, threshold: f64) -> Vec<&str> {
        self.regions
            .iter()
            .filter(|r| r.score >= threshold)
            .map(|r| r.label.as_str())
            .collect()
    }
}
