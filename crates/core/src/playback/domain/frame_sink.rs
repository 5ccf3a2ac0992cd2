use crate::detection::domain::detection_result::DetectionResult;
use crate::playback::domain::playback_issue::PlaybackIssue;
use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;

/// Consumer that a running frame loop presents frames to.
///
/// `present` receives the decoded frame together with the faces found in
/// it, already resized to the `display` coordinate space.
pub trait FrameSink: Send {
    fn present(
        &mut self,
        frame: &Frame,
        faces: &[DetectionResult],
        display: Dimensions,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// A non-fatal condition worth surfacing to the user.
    fn report(&mut self, issue: PlaybackIssue);

    /// Blanks whatever the sink shows; called when the video is cleared.
    fn clear(&mut self);
}
