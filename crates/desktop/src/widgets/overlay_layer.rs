use iced::advanced::graphics::geometry;
use iced::advanced::layout;
use iced::advanced::renderer;
use iced::advanced::widget::tree::Tree;
use iced::advanced::widget::Widget;
use iced::advanced::{Layout, Renderer as _};
use iced::widget::canvas::{self, Frame, Path, Stroke};
use iced::{Element, Length, Pixels, Point, Rectangle, Renderer, Size, Theme};

use facelens_core::detection::domain::bounding_box::BoundingBox;
use facelens_core::detection::domain::detection_result::DetectionResult;
use facelens_core::detection::domain::face_landmarks;
use facelens_core::overlay::domain::overlay_renderer::OverlayRenderer;
use facelens_core::overlay::domain::overlay_style::Color;
use facelens_core::overlay::domain::overlay_surface::{Label, OverlaySurface};
use facelens_core::shared::dimensions::Dimensions;

/// Rough advance of one glyph relative to the font size, used to size
/// label backgrounds without shaping the text.
const GLYPH_WIDTH_RATIO: f32 = 0.6;
const LABEL_PADDING: f32 = 2.0;

/// Transparent layer, exactly the size the video is displayed at, that
/// paints the current frame's detection results.
pub struct OverlayLayer<'a> {
    renderer: &'a OverlayRenderer,
    faces: &'a [DetectionResult],
    dimensions: Dimensions,
}

impl<'a> OverlayLayer<'a> {
    pub fn new(
        renderer: &'a OverlayRenderer,
        faces: &'a [DetectionResult],
        dimensions: Dimensions,
    ) -> Self {
        Self {
            renderer,
            faces,
            dimensions,
        }
    }
}

impl<Message> Widget<Message, Theme, Renderer> for OverlayLayer<'_> {
    fn size(&self) -> Size<Length> {
        Size {
            width: Length::Fixed(self.dimensions.width as f32),
            height: Length::Fixed(self.dimensions.height as f32),
        }
    }

    fn layout(
        &mut self,
        _tree: &mut Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        let size = Size::new(
            self.dimensions.width as f32,
            self.dimensions.height as f32,
        );
        layout::Node::new(limits.resolve(Length::Shrink, Length::Shrink, size))
    }

    fn draw(
        &self,
        _tree: &Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: iced::mouse::Cursor,
        viewport: &Rectangle,
    ) {
        let bounds = layout.bounds();
        if bounds.intersection(viewport).is_none() {
            return;
        }

        let mut frame = Frame::new(renderer, bounds.size());
        let mut surface = CanvasSurface {
            frame: &mut frame,
            dimensions: self.dimensions,
        };
        self.renderer.render(&mut surface, self.faces);
        let geom = frame.into_geometry();

        renderer.with_translation(iced::Vector::new(bounds.x, bounds.y), |renderer| {
            geometry::Renderer::draw_geometry(renderer, geom);
        });
    }
}

impl<'a, Message: 'a> From<OverlayLayer<'a>> for Element<'a, Message> {
    fn from(layer: OverlayLayer<'a>) -> Self {
        Element::new(layer)
    }
}

pub fn overlay_layer<'a>(
    renderer: &'a OverlayRenderer,
    faces: &'a [DetectionResult],
    dimensions: Dimensions,
) -> OverlayLayer<'a> {
    OverlayLayer::new(renderer, faces, dimensions)
}

/// [`OverlaySurface`] over a canvas frame.
struct CanvasSurface<'f> {
    frame: &'f mut Frame,
    dimensions: Dimensions,
}

impl OverlaySurface for CanvasSurface<'_> {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn clear(&mut self) {
        // Each draw starts from a fresh frame, which is already empty
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, color: Color, line_width: f32) {
        let path = Path::rectangle(
            Point::new(rect.x as f32, rect.y as f32),
            Size::new(rect.width as f32, rect.height as f32),
        );
        self.frame.stroke(
            &path,
            Stroke::default()
                .with_color(to_iced(color))
                .with_width(line_width),
        );
    }

    fn fill_point(&mut self, center: face_landmarks::Point, radius: f32, color: Color) {
        let path = Path::circle(Point::new(center.0 as f32, center.1 as f32), radius);
        self.frame.fill(&path, to_iced(color));
    }

    fn draw_label(&mut self, label: &Label<'_>) {
        let (x, y) = (label.anchor.0 as f32, label.anchor.1 as f32);
        let width = label.text.chars().count() as f32 * label.size * GLYPH_WIDTH_RATIO;
        self.frame.fill_rectangle(
            Point::new(x, y),
            Size::new(width + 2.0 * LABEL_PADDING, label.size + 2.0 * LABEL_PADDING),
            to_iced(label.background),
        );
        self.frame.fill_text(canvas::Text {
            content: label.text.to_string(),
            position: Point::new(x + LABEL_PADDING, y + LABEL_PADDING),
            color: to_iced(label.color),
            size: Pixels(label.size),
            ..canvas::Text::default()
        });
    }
}

fn to_iced(color: Color) -> iced::Color {
    iced::Color::from_rgba8(color.r, color.g, color.b, color.a as f32 / 255.0)
}
