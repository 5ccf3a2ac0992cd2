/// YOLO-pose face detector using ONNX Runtime via `ort`.
///
/// Letterbox preprocessing, inference, keypoint decoding and NMS. Each face
/// comes back with 5 landmarks (eyes, nose, mouth corners); keypoints the
/// model is unsure about are reported as hidden.
use std::path::Path;

use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::detector_options::DetectorOptions;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

use super::execution_provider::{fixed_input_size, load_session};
use super::math::{nms, RawDetection};

/// Number of keypoints per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Letterbox fill value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    score_threshold: f64,
    iou_threshold: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model.
    ///
    /// Input size precedence: explicit option, then the model's fixed NCHW
    /// shape, then 640.
    pub fn new(model_path: &Path, options: &DetectorOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input_size = options.resolved_input_size(fixed_input_size(&session));

        Ok(Self {
            session,
            score_threshold: options.score_threshold,
            iou_threshold: options.iou_threshold,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
        let letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(letterboxed.tensor.clone())?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let raw = decode_output(
            data,
            &shape,
            &letterboxed,
            frame,
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

struct Letterboxed {
    tensor: ndarray::Array4<f32>,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterboxed {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size`, NCHW float32.
fn letterbox(frame: &Frame, target_size: u32) -> Letterboxed {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_VALUE,
    );

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbour resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        scale,
        pad_x,
        pad_y,
    }
}

// ---------------------------------------------------------------------------
// Output decoding
// ---------------------------------------------------------------------------

/// Parses `[1, features, detections]` (transposed) or `[1, detections, features]`.
///
/// Row format: `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]` in
/// letterbox coordinates.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    letterboxed: &Letterboxed,
    frame: &Frame,
    score_threshold: f64,
) -> Vec<RawDetection> {
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Vec::new();
    }

    let bounds = frame.dimensions();
    let feature = |det: usize, f: usize| -> f64 {
        if transposed {
            data[f * num_dets + det] as f64
        } else {
            data[det * num_feats + f] as f64
        }
    };

    let mut raw = Vec::new();
    for i in 0..num_dets {
        let conf = feature(i, 4);
        if conf < score_threshold {
            continue;
        }

        let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
        let (x1, y1) = letterboxed.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterboxed.to_frame(cx + w / 2.0, cy + h / 2.0);

        let keypoints = if num_feats >= 5 + NUM_KEYPOINT_VALUES {
            (0..5)
                .map(|k| {
                    let base = 5 + k * 3;
                    (feature(i, base + 2) >= KEYPOINT_CONF_THRESH)
                        .then(|| letterboxed.to_frame(feature(i, base), feature(i, base + 1)))
                })
                .collect()
        } else {
            Vec::new()
        };

        raw.push(RawDetection {
            bbox: BoundingBox::from_corners(x1, y1, x2, y2).clamped(bounds),
            score: conf,
            keypoints,
        });
    }
    raw
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
