use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.45;
/// Model input side used when neither the options nor the model fix one.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Which face detection model backs the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorVariant {
    /// YOLO-pose face model: box plus 5 landmarks. Downloaded on first use.
    #[default]
    Yolo,
    /// BlazeFace short-range: box plus 6 keypoints. Needs an explicit model path.
    BlazeFace,
}

impl DetectorVariant {
    pub const ALL: &[DetectorVariant] = &[DetectorVariant::Yolo, DetectorVariant::BlazeFace];
}

impl std::fmt::Display for DetectorVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorVariant::Yolo => write!(f, "yolo"),
            DetectorVariant::BlazeFace => write!(f, "blazeface"),
        }
    }
}

impl FromStr for DetectorVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yolo" => Ok(DetectorVariant::Yolo),
            "blazeface" => Ok(DetectorVariant::BlazeFace),
            other => Err(format!(
                "Detector variant must be 'yolo' or 'blazeface', got '{other}'"
            )),
        }
    }
}

/// Configuration handed to the detection adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    pub variant: DetectorVariant,
    /// Minimum detector confidence for a face to be reported.
    pub score_threshold: f64,
    /// Overlap above which the weaker of two boxes is suppressed.
    pub iou_threshold: f64,
    /// Square model input side. `None` defers to the model's own fixed
    /// shape, then [`DEFAULT_INPUT_SIZE`]; see [`DetectorOptions::resolved_input_size`].
    pub input_size: Option<u32>,
    /// Explicit model file; `None` resolves the variant's default model.
    pub model_path: Option<PathBuf>,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            variant: DetectorVariant::default(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            input_size: None,
            model_path: None,
        }
    }
}

impl DetectorOptions {
    /// Input side to letterbox frames to: the explicit option, then the
    /// shape the model was exported with, then 640.
    pub fn resolved_input_size(&self, model_fixed: Option<u32>) -> u32 {
        self.input_size.or(model_fixed).unwrap_or(DEFAULT_INPUT_SIZE)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.score_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(format!(
                "IoU threshold must be between 0.0 and 1.0, got {}",
                self.iou_threshold
            ));
        }
        if let Some(size) = self.input_size {
            if size == 0 || size % 32 != 0 {
                return Err(format!(
                    "Input size must be a positive multiple of 32, got {size}"
                ));
            }
        }
        if self.variant == DetectorVariant::BlazeFace && self.model_path.is_none() {
            return Err("The blazeface detector needs an explicit model path".into());
        }
        Ok(())
    }
}
