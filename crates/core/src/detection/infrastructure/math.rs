//! Post-processing shared by the ONNX detection backends.

use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::face_landmarks::{FaceLandmarks, Point};

/// A decoded, not yet suppressed detection in frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub score: f64,
    pub keypoints: Vec<Option<Point>>,
}

impl RawDetection {
    pub fn into_result(self) -> DetectionResult {
        DetectionResult::new(self.bbox, self.score)
            .with_landmarks(FaceLandmarks::new(self.keypoints))
    }
}

/// Greedy NMS: sort by score descending, suppress boxes overlapping a kept one.
pub fn nms(mut dets: Vec<RawDetection>, iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets {
        if keep.iter().all(|k| k.bbox.iou(&det.bbox) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
