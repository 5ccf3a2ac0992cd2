use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::frame::Frame;

/// Detection adapter: turns one frame into the faces found in it.
///
/// Results are in the frame's own pixel coordinates. Implementations may
/// hold per-session state (an inference session, scratch buffers), hence
/// `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>>;
}

/// Stand-in used when no detection model could be loaded: finds no faces,
/// so video still plays, just without overlays.
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
        Ok(Vec::new())
    }
}
