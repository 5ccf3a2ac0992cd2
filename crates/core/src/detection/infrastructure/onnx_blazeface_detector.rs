/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// A lightweight short-range detector. Each face carries 6 keypoints: eyes,
/// nose tip, mouth centre and both ear tragions.
use std::path::Path;

use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::detector_options::DetectorOptions;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;

use super::execution_provider::load_session;
use super::math::{nms, sigmoid, RawDetection};

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: 4 box values + 6 (x, y) keypoints.
const REGRESSOR_STRIDE: usize = 16;

const NUM_KEYPOINTS: usize = 6;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    score_threshold: f64,
    iou_threshold: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model. The input size option is ignored; the
    /// anchor layout fixes it at 128.
    pub fn new(model_path: &Path, options: &DetectorOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        Ok(Self {
            session,
            score_threshold: options.score_threshold,
            iou_threshold: options.iou_threshold,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
        let input_tensor = preprocess(frame, INPUT_SIZE);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let raw = decode(
            reg_data,
            score_data,
            &self.anchors,
            frame.dimensions(),
            self.score_threshold,
        );
        Ok(nms(raw, self.iou_threshold)
            .into_iter()
            .map(RawDetection::into_result)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Stretch-resize to `size × size`, normalized to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Anchors and decoding
// ---------------------------------------------------------------------------

/// Short-range anchors: a 16×16 grid with 2 anchors per cell, then an 8×8
/// grid with 6 per cell. Centres are normalised to [0, 1].
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Turns anchor-relative regressions into frame-space detections above
/// `score_threshold`. Scores are logits.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    frame: Dimensions,
    score_threshold: f64,
) -> Vec<RawDetection> {
    let fw = frame.width as f64;
    let fh = frame.height as f64;
    let input = INPUT_SIZE as f32;

    let mut raw = Vec::new();
    for (i, (&logit, anchor)) in score_data.iter().zip(anchors).enumerate() {
        let score = sigmoid(logit) as f64;
        if score < score_threshold {
            continue;
        }
        let Some(reg) = reg_data.get(i * REGRESSOR_STRIDE..(i + 1) * REGRESSOR_STRIDE) else {
            break;
        };

        let cx = (anchor[0] + reg[0] / input) as f64;
        let cy = (anchor[1] + reg[1] / input) as f64;
        let w = (reg[2] / input) as f64;
        let h = (reg[3] / input) as f64;

        let keypoints = (0..NUM_KEYPOINTS)
            .map(|k| {
                let kx = (anchor[0] + reg[4 + k * 2] / input) as f64;
                let ky = (anchor[1] + reg[5 + k * 2] / input) as f64;
                Some((kx * fw, ky * fh))
            })
            .collect();

        raw.push(RawDetection {
            bbox: BoundingBox::from_corners(
                (cx - w / 2.0) * fw,
                (cy - h / 2.0) * fh,
                (cx + w / 2.0) * fw,
                (cy + h / 2.0) * fh,
            )
            .clamped(frame),
            score,
            keypoints,
        });
    }
    raw
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_preprocess_shape() {
        let frame = Frame::filled(200, 100, [128, 128, 128], 0);
        let tensor = preprocess(&frame, 128);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
    }

    #[test]
    fn test_preprocess_normalized() {
        let frame = Frame::filled(50, 50, [255, 255, 255], 0);
        let tensor = preprocess(&frame, 128);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_generate_anchors_count() {
        // 16×16 × 2 + 8×8 × 6 = 512 + 384
        assert_eq!(generate_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for a in &generate_anchors() {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_decode_scales_box_and_keypoints_to_frame() {
        let anchors = [[0.5, 0.5]];
        // 64 model pixels wide and tall, centred on the anchor
        let mut reg = vec![0.0, 0.0, 64.0, 64.0];
        // Keypoints at the anchor offset by (+16, -16) model pixels
        for _ in 0..NUM_KEYPOINTS {
            reg.extend_from_slice(&[16.0, -16.0]);
        }
        let raw = decode(&reg, &[5.0], &anchors, Dimensions::new(400, 200), 0.5);

        assert_eq!(raw.len(), 1);
        let bbox = raw[0].bbox;
        assert_relative_eq!(bbox.x, 100.0, epsilon = 1e-4);
        assert_relative_eq!(bbox.y, 50.0, epsilon = 1e-4);
        assert_relative_eq!(bbox.width, 200.0, epsilon = 1e-4);
        assert_relative_eq!(bbox.height, 100.0, epsilon = 1e-4);

        assert_eq!(raw[0].keypoints.len(), NUM_KEYPOINTS);
        let (kx, ky) = raw[0].keypoints[0].unwrap();
        assert_relative_eq!(kx, 250.0, epsilon = 1e-4);
        assert_relative_eq!(ky, 75.0, epsilon = 1e-4);
    }

    #[test]
    fn test_decode_drops_low_scores() {
        let anchors = [[0.5, 0.5], [0.25, 0.25]];
        let reg = vec![0.0; 2 * REGRESSOR_STRIDE];
        let raw = decode(&reg, &[-5.0, 5.0], &anchors, Dimensions::new(128, 128), 0.5);
        assert_eq!(raw.len(), 1);
        assert!(raw[0].score > 0.9);
    }

    #[test]
    fn test_decode_stops_on_short_regressor_output() {
        let anchors = [[0.5, 0.5], [0.25, 0.25]];
        let reg = vec![0.0; REGRESSOR_STRIDE];
        let raw = decode(&reg, &[5.0, 5.0], &anchors, Dimensions::new(128, 128), 0.5);
        assert_eq!(raw.len(), 1);
    }
}
