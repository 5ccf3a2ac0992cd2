use serde::{Deserialize, Serialize};

use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::expression::ExpressionScores;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::dimensions::Dimensions;

/// One detected face in one frame.
///
/// Produced fresh for every frame and dropped once drawn; nothing carries
/// over between frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub bbox: BoundingBox,
    /// Detector confidence in `[0, 1]`.
    pub score: f64,
    pub landmarks: FaceLandmarks,
    pub expressions: ExpressionScores,
}

impl DetectionResult {
    pub fn new(bbox: BoundingBox, score: f64) -> Self {
        Self {
            bbox,
            score,
            landmarks: FaceLandmarks::default(),
            expressions: ExpressionScores::default(),
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = landmarks;
        self
    }

    pub fn with_expressions(mut self, expressions: ExpressionScores) -> Self {
        self.expressions = expressions;
        self
    }

    /// Maps box and landmarks from `from` coordinates into `to` coordinates.
    pub fn resized(&self, from: Dimensions, to: Dimensions) -> Self {
        if from == to {
            return self.clone();
        }
        let (sx, sy) = from.scale_to(to);
        Self {
            bbox: self.bbox.scaled(sx, sy),
            score: self.score,
            landmarks: self.landmarks.scaled(sx, sy),
            expressions: self.expressions.clone(),
        }
    }
}

/// Resizes a whole frame's results, e.g. from decoded video size to the
/// overlay surface size.
pub fn resize_results(
    results: &[DetectionResult],
    from: Dimensions,
    to: Dimensions,
) -> Vec<DetectionResult> {
    results.iter().map(|r| r.resized(from, to)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::expression::Expression;
    use approx::assert_relative_eq;

    fn sample() -> DetectionResult {
        DetectionResult::new(BoundingBox::new(100.0, 50.0, 200.0, 240.0), 0.92)
            .with_landmarks(FaceLandmarks::new(vec![
                Some((150.0, 120.0)),
                None,
                Some((210.0, 180.0)),
            ]))
            .with_expressions(ExpressionScores::new([
                (Expression::Happy, 0.8),
                (Expression::Neutral, 0.2),
            ]))
    }

    #[test]
    fn test_resize_same_dimensions_is_identity() {
        let d = Dimensions::new(1280, 720);
        let results = vec![sample(), sample()];
        assert_eq!(resize_results(&results, d, d), results);
    }

    #[test]
    fn test_resize_scales_box_and_landmarks() {
        let r = sample().resized(Dimensions::new(1200, 600), Dimensions::new(600, 600));
        assert_relative_eq!(r.bbox.x, 50.0);
        assert_relative_eq!(r.bbox.y, 50.0);
        assert_relative_eq!(r.bbox.width, 100.0);
        assert_relative_eq!(r.bbox.height, 240.0);
        assert_eq!(r.landmarks.points()[0], Some((75.0, 120.0)));
        assert!(r.landmarks.points()[1].is_none());
    }

    #[test]
    fn test_resize_keeps_score_and_expressions() {
        let original = sample();
        let r = original.resized(Dimensions::new(100, 100), Dimensions::new(50, 50));
        assert_relative_eq!(r.score, original.score);
        assert_eq!(r.expressions, original.expressions);
    }

    #[test]
    fn test_resize_round_trip_restores_box() {
        let a = Dimensions::new(1920, 1080);
        let b = Dimensions::new(600, 338);
        let original = sample();
        let back = original.resized(a, b).resized(b, a);
        assert_relative_eq!(back.bbox.x, original.bbox.x, epsilon = 1e-9);
        assert_relative_eq!(back.bbox.height, original.bbox.height, epsilon = 1e-9);
    }

    #[test]
    fn test_resize_empty_frame() {
        let out = resize_results(&[], Dimensions::new(10, 10), Dimensions::new(20, 20));
        assert!(out.is_empty());
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["bbox"]["x"], 100.0);
        assert_eq!(json["expressions"][0]["expression"], "neutral");
        assert_eq!(json["expressions"][1]["expression"], "happy");
        assert!(json["landmarks"][1].is_null());
    }
}
