use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::expression::ExpressionScores;
use crate::shared::frame::Frame;

/// Scores the expression of one face, given the frame and the face's box
/// in frame coordinates.
pub trait ExpressionClassifier: Send {
    fn classify(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<ExpressionScores, Box<dyn std::error::Error>>;
}
