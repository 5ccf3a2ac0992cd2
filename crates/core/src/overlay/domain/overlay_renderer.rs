use crate::detection::domain::detection_result::DetectionResult;
use crate::overlay::domain::overlay_style::OverlayStyle;
use crate::overlay::domain::overlay_surface::{Label, OverlaySurface};

/// Gap between a label and the box edge or the previous label.
const LABEL_SPACING: f64 = 2.0;

/// Paints one frame's detection results onto a surface.
///
/// Every call starts from a cleared surface, then draws all boxes (with a
/// score label), then all landmarks, then expression labels, so later
/// layers sit on top of earlier ones. Results must already be in surface
/// coordinates.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: OverlayStyle) {
        self.style = style;
    }

    pub fn render(&self, surface: &mut dyn OverlaySurface, faces: &[DetectionResult]) {
        surface.clear();
        if faces.is_empty() {
            return;
        }

        let style = &self.style;
        let line_height = style.text_size as f64 + LABEL_SPACING;

        if style.show_boxes {
            for face in faces {
                surface.stroke_rect(&face.bbox, style.box_color, style.box_line_width);

                // Above the box, or just inside it when there is no room
                let above = face.bbox.y - line_height;
                let y = if above >= 0.0 { above } else { face.bbox.y };
                let text = format!("{:.2}", face.score);
                surface.draw_label(&Label {
                    text: &text,
                    score: face.score,
                    anchor: (face.bbox.x, y),
                    size: style.text_size,
                    color: style.text_color,
                    background: style.box_color,
                });
            }
        }

        if style.show_landmarks {
            for face in faces {
                for point in face.landmarks.visible() {
                    surface.fill_point(point, style.landmark_radius, style.landmark_color);
                }
            }
        }

        if style.show_expressions {
            for face in faces {
                let mut y = face.bbox.bottom() + LABEL_SPACING;
                for expr in face.expressions.above(style.min_expression_score) {
                    let text = format!("{} ({:.2})", expr.expression, expr.score);
                    surface.draw_label(&Label {
                        text: &text,
                        score: expr.score,
                        anchor: (face.bbox.x, y),
                        size: style.text_size,
                        color: style.text_color,
                        background: style.text_background,
                    });
                    y += line_height;
                }
            }
        }
    }
}
