use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::face_landmarks::Point;
use crate::overlay::domain::overlay_style::Color;
use crate::overlay::domain::overlay_surface::{Label, OverlaySurface};
use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;

/// Padding around label text inside its background box.
const LABEL_PADDING: u32 = 2;

/// Width of the fallback score bar, in multiples of the label size.
const SCORE_BAR_WIDTH: f32 = 4.0;

/// Off-screen RGBA overlay drawn with `imageproc`.
///
/// Labels are rendered with the loaded font; without one, each label is a
/// bar whose filled part is proportional to its score.
pub struct RasterSurface {
    image: RgbaImage,
    font: Option<FontVec>,
}

impl RasterSurface {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            image: RgbaImage::new(dimensions.width, dimensions.height),
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    /// Reads a TrueType/OpenType font file.
    pub fn load_font(path: &Path) -> Result<FontVec, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        Ok(FontVec::try_from_vec(bytes)?)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Resizes the surface to `dimensions`, which also clears it. Returns
    /// whether the size changed.
    pub fn match_dimensions(&mut self, dimensions: Dimensions) -> bool {
        if self.dimensions() == dimensions {
            self.clear();
            return false;
        }
        self.image = RgbaImage::new(dimensions.width, dimensions.height);
        true
    }

    /// Alpha-blends the overlay onto a copy of `frame`. Sizes must match.
    pub fn composite_onto(&self, frame: &Frame) -> Result<Frame, Box<dyn std::error::Error>> {
        if frame.dimensions() != self.dimensions() {
            return Err(format!(
                "Cannot composite a {} overlay onto a {} frame",
                self.dimensions(),
                frame.dimensions()
            )
            .into());
        }

        let mut data = frame.data().to_vec();
        for (dst, src) in data.chunks_exact_mut(Frame::CHANNELS).zip(self.image.pixels()) {
            let alpha = src[3] as u32;
            if alpha == 0 {
                continue;
            }
            for c in 0..3 {
                let blended = (src[c] as u32 * alpha + dst[c] as u32 * (255 - alpha) + 127) / 255;
                dst[c] = blended as u8;
            }
        }
        Ok(Frame::new(data, frame.width(), frame.height(), frame.index()))
    }

    fn rect_within(&self, x: f64, y: f64, w: f64, h: f64) -> Option<Rect> {
        let clamped = BoundingBox::new(x, y, w, h).clamped(self.dimensions());
        let width = clamped.width.round() as u32;
        let height = clamped.height.round() as u32;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Rect::at(clamped.x.round() as i32, clamped.y.round() as i32).of_size(width, height))
    }
}

fn pixel(color: Color) -> Rgba<u8> {
    Rgba(color.to_array())
}

impl OverlaySurface for RasterSurface {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, color: Color, line_width: f32) {
        let thickness = line_width.round().max(1.0) as u32;
        // Nested one-pixel outlines, growing inwards
        for i in 0..thickness {
            let inset = i as f64;
            let Some(r) = self.rect_within(
                rect.x + inset,
                rect.y + inset,
                rect.width - 2.0 * inset,
                rect.height - 2.0 * inset,
            ) else {
                break;
            };
            draw_hollow_rect_mut(&mut self.image, r, pixel(color));
        }
    }

    fn fill_point(&mut self, center: Point, radius: f32, color: Color) {
        let r = radius.round().max(1.0) as i32;
        draw_filled_circle_mut(
            &mut self.image,
            (center.0.round() as i32, center.1.round() as i32),
            r,
            pixel(color),
        );
    }

    fn draw_label(&mut self, label: &Label<'_>) {
        let (x, y) = label.anchor;
        match &self.font {
            Some(font) => {
                let scale = PxScale::from(label.size);
                let (tw, th) = text_size(scale, font, label.text);
                let pad = LABEL_PADDING as f64;
                if let Some(bg) =
                    self.rect_within(x, y, tw as f64 + 2.0 * pad, th as f64 + 2.0 * pad)
                {
                    draw_filled_rect_mut(&mut self.image, bg, pixel(label.background));
                }
                draw_text_mut(
                    &mut self.image,
                    pixel(label.color),
                    (x + pad).round() as i32,
                    (y + pad).round() as i32,
                    scale,
                    font,
                    label.text,
                );
            }
            None => {
                let width = (label.size * SCORE_BAR_WIDTH) as f64;
                let height = (label.size / 2.0).max(2.0) as f64;
                if let Some(bg) = self.rect_within(x, y, width, height) {
                    draw_filled_rect_mut(&mut self.image, bg, pixel(label.background));
                }
                let filled = width * label.score.clamp(0.0, 1.0);
                if let Some(bar) = self.rect_within(x, y, filled, height) {
                    draw_filled_rect_mut(&mut self.image, bar, pixel(label.color));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::DetectionResult;
    use crate::overlay::domain::overlay_renderer::OverlayRenderer;

    fn surface(w: u32, h: u32) -> RasterSurface {
        RasterSurface::new(Dimensions::new(w, h))
    }

    fn is_blank(surface: &RasterSurface) -> bool {
        surface.image().pixels().all(|p| p[3] == 0)
    }

    fn label(score: f64) -> Label<'static> {
        Label {
            text: "happy (0.50)",
            score,
            anchor: (10.0, 10.0),
            size: 10.0,
            color: Color::WHITE,
            background: Color::SHADOW,
        }
    }

    #[test]
    fn test_new_surface_is_blank() {
        assert!(is_blank(&surface(20, 10)));
    }

    #[test]
    fn test_clear_erases_drawing() {
        let mut s = surface(50, 50);
        s.stroke_rect(&BoundingBox::new(5.0, 5.0, 20.0, 20.0), Color::BLUE, 2.0);
        s.fill_point((30.0, 30.0), 3.0, Color::MAGENTA);
        assert!(!is_blank(&s));
        s.clear();
        assert!(is_blank(&s));
    }

    #[test]
    fn test_stroke_rect_draws_outline_only() {
        let mut s = surface(50, 50);
        s.stroke_rect(&BoundingBox::new(10.0, 10.0, 20.0, 20.0), Color::BLUE, 2.0);
        assert_eq!(s.image().get_pixel(10, 10).0, [0, 0, 255, 255]);
        assert_eq!(s.image().get_pixel(11, 15).0, [0, 0, 255, 255]);
        assert_eq!(s.image().get_pixel(20, 20)[3], 0);
    }

    #[test]
    fn test_stroke_rect_outside_surface_is_ignored() {
        let mut s = surface(20, 20);
        s.stroke_rect(&BoundingBox::new(100.0, 100.0, 10.0, 10.0), Color::BLUE, 2.0);
        s.stroke_rect(&BoundingBox::new(5.0, 5.0, 0.0, 0.0), Color::BLUE, 2.0);
        assert!(is_blank(&s));
    }

    #[test]
    fn test_stroke_rect_partially_outside_is_clipped() {
        let mut s = surface(20, 20);
        s.stroke_rect(&BoundingBox::new(-5.0, -5.0, 15.0, 15.0), Color::BLUE, 1.0);
        assert_eq!(s.image().get_pixel(9, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_fill_point() {
        let mut s = surface(20, 20);
        s.fill_point((10.0, 10.0), 2.0, Color::MAGENTA);
        assert_eq!(s.image().get_pixel(10, 10).0, [255, 0, 255, 255]);
        assert_eq!(s.image().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_label_without_font_draws_score_bar() {
        let mut s = surface(100, 40);
        assert!(!s.has_font());
        s.draw_label(&label(0.5));
        // Bar is 40px wide; the first half is filled with the text colour
        assert_eq!(s.image().get_pixel(15, 11).0, [255, 255, 255, 255]);
        assert_eq!(s.image().get_pixel(45, 11).0, Color::SHADOW.to_array());
        assert_eq!(s.image().get_pixel(55, 11)[3], 0);
    }

    #[test]
    fn test_match_dimensions_resizes_and_clears() {
        let mut s = surface(10, 10);
        s.fill_point((5.0, 5.0), 2.0, Color::BLUE);
        assert!(s.match_dimensions(Dimensions::new(30, 20)));
        assert_eq!(s.dimensions(), Dimensions::new(30, 20));
        assert!(is_blank(&s));

        s.fill_point((5.0, 5.0), 2.0, Color::BLUE);
        assert!(!s.match_dimensions(Dimensions::new(30, 20)));
        assert!(is_blank(&s));
    }

    #[test]
    fn test_composite_blends_by_alpha() {
        let mut s = surface(2, 1);
        s.fill_point((0.0, 0.0), 1.0, Color::rgba(255, 255, 255, 255));
        let frame = Frame::filled(2, 1, [0, 0, 0], 7);
        let out = s.composite_onto(&frame).unwrap();
        assert_eq!(&out.data()[0..3], &[255, 255, 255]);
        assert_eq!(out.index(), 7);

        let mut half = surface(1, 1);
        half.fill_point((0.0, 0.0), 1.0, Color::rgba(200, 200, 200, 128));
        let out = half.composite_onto(&Frame::filled(1, 1, [0, 0, 0], 0)).unwrap();
        assert_eq!(out.data()[0], 100);
    }

    #[test]
    fn test_composite_rejects_size_mismatch() {
        let s = surface(10, 10);
        assert!(s.composite_onto(&Frame::filled(20, 10, [0, 0, 0], 0)).is_err());
    }

    #[test]
    fn test_render_zero_faces_leaves_surface_blank() {
        let mut s = surface(60, 40);
        s.fill_point((10.0, 10.0), 3.0, Color::BLUE);
        OverlayRenderer::default().render(&mut s, &[] as &[DetectionResult]);
        assert!(is_blank(&s));
    }

    #[test]
    fn test_load_font_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(RasterSurface::load_font(&path).is_err());
    }
}
