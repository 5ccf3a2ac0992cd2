use std::io::Write;

use serde::Serialize;

use crate::detection::domain::detection_result::DetectionResult;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::overlay::domain::overlay_surface::OverlaySurface;
use crate::overlay::infrastructure::raster_surface::RasterSurface;
use crate::playback::domain::frame_sink::FrameSink;
use crate::playback::domain::playback_issue::PlaybackIssue;
use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;
use crate::video::domain::frame_writer::FrameWriter;

/// One line of the detections log.
#[derive(Serialize)]
struct DetectionRecord<'a> {
    frame: usize,
    faces: &'a [DetectionResult],
}

/// Running counts of the issues a sink has seen, kept instead of the
/// issues themselves so long runs stay bounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueTally {
    pub source_open: usize,
    pub detection_failed: usize,
    pub slow_detection: usize,
    pub skipped_frames: usize,
    pub dimension_mismatch: usize,
}

impl IssueTally {
    pub fn record(&mut self, issue: &PlaybackIssue) {
        match issue {
            PlaybackIssue::SourceOpen { .. } => self.source_open += 1,
            PlaybackIssue::DetectionFailed { .. } => self.detection_failed += 1,
            PlaybackIssue::SlowDetection { skipped_frames, .. } => {
                self.slow_detection += 1;
                self.skipped_frames += skipped_frames;
            }
            PlaybackIssue::DimensionMismatch { .. } => self.dimension_mismatch += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.source_open + self.detection_failed + self.slow_detection + self.dimension_mismatch
    }

    /// One-line summary, or `None` if nothing went wrong.
    pub fn summary(&self) -> Option<String> {
        if self.total() == 0 {
            return None;
        }
        Some(format!(
            "{} issue(s): {} detection failure(s), {} slow detection(s) skipping {} frame(s), \
             {} surface resize(s), {} open failure(s)",
            self.total(),
            self.detection_failed,
            self.slow_detection,
            self.skipped_frames,
            self.dimension_mismatch,
            self.source_open
        ))
    }
}

/// Headless sink: paints the overlay on an off-screen raster and writes
/// the annotated frame and/or a JSON line of detections per frame.
///
/// Written frames are scaled to the display size so they match the
/// overlay, the same way the video is shown on screen.
pub struct AnnotatingSink {
    surface: RasterSurface,
    renderer: OverlayRenderer,
    frames: Option<Box<dyn FrameWriter>>,
    detections: Option<Box<dyn Write + Send>>,
    tally: IssueTally,
    last_issue: Option<PlaybackIssue>,
    presented: usize,
}

impl AnnotatingSink {
    pub fn new(surface: RasterSurface, renderer: OverlayRenderer) -> Self {
        Self {
            surface,
            renderer,
            frames: None,
            detections: None,
            tally: IssueTally::default(),
            last_issue: None,
            presented: 0,
        }
    }

    pub fn with_frame_writer(mut self, writer: Box<dyn FrameWriter>) -> Self {
        self.frames = Some(writer);
        self
    }

    pub fn with_detection_log(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.detections = Some(writer);
        self
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn tally(&self) -> &IssueTally {
        &self.tally
    }

    pub fn last_issue(&self) -> Option<&PlaybackIssue> {
        self.last_issue.as_ref()
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    fn match_surface(&mut self, display: Dimensions) {
        let current = self.surface.dimensions();
        if current == display {
            return;
        }
        // A fresh surface is sized silently; a resize mid-playback is an issue
        if !current.is_empty() {
            self.report(PlaybackIssue::DimensionMismatch {
                surface: current,
                display,
            });
        }
        self.surface.match_dimensions(display);
    }
}

impl FrameSink for AnnotatingSink {
    fn present(
        &mut self,
        frame: &Frame,
        faces: &[DetectionResult],
        display: Dimensions,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.match_surface(display);
        self.renderer.render(&mut self.surface, faces);

        if let Some(writer) = self.frames.as_mut() {
            let annotated = self.surface.composite_onto(&frame.resized(display))?;
            writer.write(&annotated)?;
        }

        if let Some(log) = self.detections.as_mut() {
            let record = DetectionRecord {
                frame: frame.index(),
                faces,
            };
            serde_json::to_writer(&mut *log, &record)?;
            writeln!(log)?;
        }

        self.presented += 1;
        Ok(())
    }

    fn report(&mut self, issue: PlaybackIssue) {
        self.tally.record(&issue);
        self.last_issue = Some(issue);
    }

    fn clear(&mut self) {
        self.surface.clear();
        if let Some(log) = self.detections.as_mut() {
            if let Err(e) = log.flush() {
                log::warn!("Failed to flush detections: {e}");
            }
        }
    }
}

impl Drop for AnnotatingSink {
    fn drop(&mut self) {
        if let Some(log) = self.detections.as_mut() {
            let _ = log.flush();
        }
        log::info!("Presented {} frame(s)", self.presented);
        if let Some(summary) = self.tally.summary() {
            log::warn!("{summary}");
        }
    }
}
