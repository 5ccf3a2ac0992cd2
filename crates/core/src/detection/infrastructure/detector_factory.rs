use std::path::{Path, PathBuf};

use crate::detection::domain::detector_options::{DetectorOptions, DetectorVariant};
use crate::detection::domain::expression_classifier::ExpressionClassifier;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::{
    EXPRESSION_MODEL_NAME, EXPRESSION_MODEL_URL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use crate::shared::model_resolver::{self, ModelSpec, ProgressFn};

use super::expression_detector::ExpressionDetector;
use super::onnx_blazeface_detector::OnnxBlazefaceDetector;
use super::onnx_expression_classifier::OnnxExpressionClassifier;
use super::onnx_yolo_detector::OnnxYoloDetector;

/// Where the expression model comes from, if expressions are wanted at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExpressionModel {
    Disabled,
    /// FER+ model resolved from the cache, downloading it if missing.
    #[default]
    Default,
    Path(PathBuf),
}

/// Builds the detection adapter: face detector plus optional expression
/// classifier. Models are resolved (and downloaded if needed) here, so this
/// can block for a while on first run.
pub fn create_detector(
    options: &DetectorOptions,
    expressions: &ExpressionModel,
    progress: Option<ProgressFn>,
) -> Result<ExpressionDetector, Box<dyn std::error::Error>> {
    options.validate()?;

    let face_model = match &options.model_path {
        Some(path) => existing(path)?,
        None => model_resolver::resolve(
            ModelSpec {
                name: YOLO_MODEL_NAME,
                url: YOLO_MODEL_URL,
            },
            None,
            progress,
        )?,
    };

    let detector: Box<dyn FaceDetector> = match options.variant {
        DetectorVariant::Yolo => Box::new(OnnxYoloDetector::new(&face_model, options)?),
        DetectorVariant::BlazeFace => Box::new(OnnxBlazefaceDetector::new(&face_model, options)?),
    };
    log::info!(
        "Using {} detector (confidence={}, iou={})",
        options.variant,
        options.score_threshold,
        options.iou_threshold
    );

    let classifier = create_classifier(expressions)?;
    Ok(ExpressionDetector::new(detector, classifier))
}

fn create_classifier(
    expressions: &ExpressionModel,
) -> Result<Option<Box<dyn ExpressionClassifier>>, Box<dyn std::error::Error>> {
    let path = match expressions {
        ExpressionModel::Disabled => return Ok(None),
        ExpressionModel::Path(path) => existing(path)?,
        ExpressionModel::Default => model_resolver::resolve(
            ModelSpec {
                name: EXPRESSION_MODEL_NAME,
                url: EXPRESSION_MODEL_URL,
            },
            None,
            None,
        )?,
    };
    Ok(Some(Box::new(OnnxExpressionClassifier::new(&path)?)))
}

fn existing(path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Model file not found: {}", path.display()).into());
    }
    Ok(path.to_path_buf())
}
