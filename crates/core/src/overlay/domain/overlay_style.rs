use crate::shared::constants::DEFAULT_MIN_EXPRESSION_SCORE;

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLUE: Color = Color::rgba(0, 0, 255, 255);
    pub const CYAN: Color = Color::rgba(0, 255, 255, 255);
    pub const MAGENTA: Color = Color::rgba(255, 0, 255, 255);
    pub const SHADOW: Color = Color::rgba(0, 0, 0, 128);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// How detection results are painted.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub box_color: Color,
    pub box_line_width: f32,
    pub landmark_color: Color,
    pub landmark_radius: f32,
    pub text_color: Color,
    pub text_background: Color,
    pub text_size: f32,
    /// Expressions scoring at or below this are not drawn.
    pub min_expression_score: f64,
    pub show_boxes: bool,
    pub show_landmarks: bool,
    pub show_expressions: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_color: Color::BLUE,
            box_line_width: 2.0,
            landmark_color: Color::MAGENTA,
            landmark_radius: 2.0,
            text_color: Color::WHITE,
            text_background: Color::SHADOW,
            text_size: 14.0,
            min_expression_score: DEFAULT_MIN_EXPRESSION_SCORE,
            show_boxes: true,
            show_landmarks: true,
            show_expressions: true,
        }
    }
}

impl OverlayStyle {
    /// Thicker strokes and opaque label backgrounds.
    pub fn high_contrast() -> Self {
        Self {
            box_color: Color::CYAN,
            box_line_width: 3.0,
            landmark_color: Color::rgba(255, 255, 0, 255),
            landmark_radius: 3.0,
            text_background: Color::rgba(0, 0, 0, 255),
            ..Self::default()
        }
    }
}
