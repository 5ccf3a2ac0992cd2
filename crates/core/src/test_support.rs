//! Fakes for the domain traits, shared by unit tests across modules.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::detection::domain::bounding_box::BoundingBox;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::Point;
use crate::overlay::domain::overlay_style::Color;
use crate::overlay::domain::overlay_surface::{Label, OverlaySurface};
use crate::playback::domain::frame_sink::FrameSink;
use crate::playback::domain::playback_issue::PlaybackIssue;
use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// In-memory video of flat frames; frame `i` is filled with `i % 256`.
pub struct ScriptedReader {
    width: u32,
    height: u32,
    total: usize,
    fps: f64,
    position: Option<usize>,
    fail_open: bool,
    fail_at: Option<usize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedReader {
    pub fn new(width: u32, height: u32, total: usize) -> Self {
        Self {
            width,
            height,
            total,
            fps: 30.0,
            position: None,
            fail_open: false,
            fail_at: None,
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Decoding frame `index` returns an error.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn close_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closed)
    }
}

impl VideoReader for ScriptedReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if self.fail_open {
            return Err("Invalid data found when processing input".into());
        }
        self.position = Some(0);
        Ok(VideoMetadata {
            width: self.width,
            height: self.height,
            fps: self.fps,
            total_frames: self.total,
            codec: "scripted".to_string(),
            source_path: Some(path.to_path_buf()),
            rotation: 0,
        })
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let position = self.position.as_mut().ok_or("not opened")?;
        if Some(*position) == self.fail_at {
            return Err(format!("corrupt packet at frame {position}").into());
        }
        if *position >= self.total {
            return Ok(None);
        }
        let value = (*position % 256) as u8;
        let frame = Frame::filled(self.width, self.height, [value; 3], *position);
        *position += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.position = None;
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Clear,
    Rect(BoundingBox),
    Point(Point),
    Label { text: String, anchor: Point },
}

impl SurfaceOp {
    pub fn kind(&self) -> &'static str {
        match self {
            SurfaceOp::Clear => "clear",
            SurfaceOp::Rect(_) => "rect",
            SurfaceOp::Point(_) => "point",
            SurfaceOp::Label { .. } => "label",
        }
    }
}

/// Surface that records draw calls instead of drawing.
pub struct RecordingSurface {
    dimensions: Dimensions,
    pub ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dimensions: Dimensions::new(width, height),
            ops: Vec::new(),
        }
    }

    pub fn label_texts(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Label { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl OverlaySurface for RecordingSurface {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, _color: Color, _line_width: f32) {
        self.ops.push(SurfaceOp::Rect(*rect));
    }

    fn fill_point(&mut self, center: Point, _radius: f32, _color: Color) {
        self.ops.push(SurfaceOp::Point(center));
    }

    fn draw_label(&mut self, label: &Label<'_>) {
        self.ops.push(SurfaceOp::Label {
            text: label.text.to_string(),
            anchor: label.anchor,
        });
    }
}

/// Finds one face at a fixed spot in every frame.
pub struct StubDetector {
    face: BoundingBox,
    delay: Duration,
    fail_at: Option<usize>,
}

impl StubDetector {
    pub fn new(face: BoundingBox) -> Self {
        Self {
            face,
            delay: Duration::ZERO,
            fail_at: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl FaceDetector for StubDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
        std::thread::sleep(self.delay);
        if Some(frame.index()) == self.fail_at {
            return Err("inference session lost".into());
        }
        Ok(vec![DetectionResult::new(self.face, 0.9)])
    }
}

/// What a [`RecordingSink`] was asked to present.
#[derive(Debug, Clone, PartialEq)]
pub struct Presented {
    pub index: usize,
    pub faces: Vec<DetectionResult>,
    pub display: Dimensions,
}

/// Sink that forwards presented frames over a channel and keeps issues.
pub struct RecordingSink {
    presented: Sender<Presented>,
    pub issues: Arc<Mutex<Vec<PlaybackIssue>>>,
    pub clears: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub fn new(presented: Sender<Presented>) -> Self {
        Self {
            presented,
            issues: Arc::new(Mutex::new(Vec::new())),
            clears: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FrameSink for RecordingSink {
    fn present(
        &mut self,
        frame: &Frame,
        faces: &[DetectionResult],
        display: Dimensions,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let _ = self.presented.send(Presented {
            index: frame.index(),
            faces: faces.to_vec(),
            display,
        });
        Ok(())
    }

    fn report(&mut self, issue: PlaybackIssue) {
        self.issues.lock().unwrap().push(issue);
    }

    fn clear(&mut self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}
