use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::expression_classifier::ExpressionClassifier;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

/// Decorator that attaches expression scores to every detected face.
///
/// Without a classifier it passes results through untouched, so callers can
/// hold one detector type whether or not expressions are enabled. A
/// classifier error fails the whole frame.
pub struct ExpressionDetector {
    inner: Box<dyn FaceDetector>,
    classifier: Option<Box<dyn ExpressionClassifier>>,
}

impl ExpressionDetector {
    pub fn new(
        inner: Box<dyn FaceDetector>,
        classifier: Option<Box<dyn ExpressionClassifier>>,
    ) -> Self {
        Self { inner, classifier }
    }

    pub fn classifies_expressions(&self) -> bool {
        self.classifier.is_some()
    }
}

impl FaceDetector for ExpressionDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
        let faces = self.inner.detect(frame)?;
        let Some(classifier) = self.classifier.as_mut() else {
            return Ok(faces);
        };

        faces
            .into_iter()
            .map(|face| {
                let scores = classifier.classify(frame, &face.bbox)?;
                Ok(face.with_expressions(scores))
            })
            .collect()
    }
}
