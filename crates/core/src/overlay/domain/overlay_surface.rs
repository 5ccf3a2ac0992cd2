use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::face_landmarks::Point;
use crate::overlay::domain::overlay_style::Color;
use crate::shared::dimensions::Dimensions;

/// A line of text anchored at its top-left corner, with the score it
/// reports. Surfaces that cannot render text draw the score instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label<'a> {
    pub text: &'a str,
    pub score: f64,
    pub anchor: Point,
    pub size: f32,
    pub color: Color,
    pub background: Color,
}

/// 2D drawing target the overlay is painted on.
///
/// Coordinates are pixels of the surface itself, origin top-left.
pub trait OverlaySurface {
    fn dimensions(&self) -> Dimensions;

    /// Makes every pixel fully transparent.
    fn clear(&mut self);

    fn stroke_rect(&mut self, rect: &BoundingBox, color: Color, line_width: f32);

    fn fill_point(&mut self, center: Point, radius: f32, color: Color);

    fn draw_label(&mut self, label: &Label<'_>);
}
