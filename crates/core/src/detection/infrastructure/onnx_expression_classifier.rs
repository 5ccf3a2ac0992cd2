/// FER+ expression classifier using ONNX Runtime via `ort`.
///
/// Crops the face, converts it to a 64×64 grayscale tensor and softmaxes the
/// model's logits. The model's eighth class (contempt) has no label here and
/// is dropped before normalising.
use std::path::Path;

use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::expression::{Expression, ExpressionScores};
use crate::detection::domain::expression_classifier::ExpressionClassifier;
use crate::shared::frame::Frame;

use super::execution_provider::load_session;

const INPUT_SIZE: usize = 64;

/// Model output order. `None` marks classes with no matching label.
const OUTPUT_LABELS: [Option<Expression>; 8] = [
    Some(Expression::Neutral),
    Some(Expression::Happy),
    Some(Expression::Surprised),
    Some(Expression::Sad),
    Some(Expression::Angry),
    Some(Expression::Disgusted),
    Some(Expression::Fearful),
    None,
];

/// Fraction of the box size added on each side before cropping. FER+ was
/// trained on crops with some margin around the face.
const CROP_MARGIN: f64 = 0.1;

pub struct OnnxExpressionClassifier {
    session: ort::session::Session,
}

impl OnnxExpressionClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
        })
    }
}

impl ExpressionClassifier for OnnxExpressionClassifier {
    fn classify(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<ExpressionScores, Box<dyn std::error::Error>> {
        let Some(input) = preprocess(frame, face) else {
            return Ok(ExpressionScores::default());
        };

        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Expression model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let logits = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        if logits.len() < OUTPUT_LABELS.len() {
            return Err(format!(
                "Expression model expected {} outputs, got {}",
                OUTPUT_LABELS.len(),
                logits.len()
            )
            .into());
        }

        Ok(scores_from_logits(logits))
    }
}

fn scores_from_logits(logits: &[f32]) -> ExpressionScores {
    let labelled: Vec<(Expression, f32)> = OUTPUT_LABELS
        .iter()
        .zip(logits)
        .filter_map(|(label, &logit)| label.map(|e| (e, logit)))
        .collect();
    ExpressionScores::from_logits(&labelled)
}

/// Grayscale `[1, 1, 64, 64]` crop of the face with raw 0–255 intensities.
/// `None` when the box has no area inside the frame.
fn preprocess(frame: &Frame, face: &BoundingBox) -> Option<ndarray::Array4<f32>> {
    let margin_x = face.width * CROP_MARGIN;
    let margin_y = face.height * CROP_MARGIN;
    let crop = BoundingBox::new(
        face.x - margin_x,
        face.y - margin_y,
        face.width + 2.0 * margin_x,
        face.height + 2.0 * margin_y,
    )
    .clamped(frame.dimensions());
    if crop.width < 1.0 || crop.height < 1.0 {
        return None;
    }

    let src = frame.as_ndarray();
    let max_x = frame.width() as usize - 1;
    let max_y = frame.height() as usize - 1;
    let step_x = crop.width / INPUT_SIZE as f64;
    let step_y = crop.height / INPUT_SIZE as f64;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 1, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        let sy = ((crop.y + (y as f64 + 0.5) * step_y) as usize).min(max_y);
        for x in 0..INPUT_SIZE {
            let sx = ((crop.x + (x as f64 + 0.5) * step_x) as usize).min(max_x);
            let r = src[[sy, sx, 0]] as f32;
            let g = src[[sy, sx, 1]] as f32;
            let b = src[[sy, sx, 2]] as f32;
            tensor[[0, 0, y, x]] = 0.299 * r + 0.587 * g + 0.114 * b;
        }
    }
    Some(tensor)
}
