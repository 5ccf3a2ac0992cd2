use crossbeam_channel::{Receiver, Sender, TrySendError};
use iced::widget::image;

use facelens_core::detection::domain::detection_result::DetectionResult;
use facelens_core::playback::domain::frame_sink::FrameSink;
use facelens_core::playback::domain::playback_issue::PlaybackIssue;
use facelens_core::shared::dimensions::Dimensions;
use facelens_core::shared::frame::Frame;

/// A frame ready to show: decoded pixels plus faces in display space.
#[derive(Debug, Clone)]
pub struct PresentedFrame {
    pub index: usize,
    pub image: image::Handle,
    pub faces: Vec<DetectionResult>,
    pub display: Dimensions,
}

/// Receiving half, polled by the UI on every tick.
pub struct SinkReceiver {
    pub frames: Receiver<PresentedFrame>,
    pub issues: Receiver<PlaybackIssue>,
}

/// Hands presented frames from the frame loop to the UI thread.
///
/// Frames go through a bounded channel with `try_send`: when the UI has
/// not picked up the previous frame yet the new one is dropped, so the
/// loop never blocks on the UI.
pub struct ChannelSink {
    frames: Sender<PresentedFrame>,
    pending: Receiver<PresentedFrame>,
    issues: Sender<PlaybackIssue>,
    pending_issues: Receiver<PlaybackIssue>,
    dropped: usize,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, SinkReceiver) {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(capacity.max(1));
        let (issue_tx, issue_rx) = crossbeam_channel::unbounded();
        let sink = Self {
            frames: frame_tx,
            pending: frame_rx.clone(),
            issues: issue_tx,
            pending_issues: issue_rx.clone(),
            dropped: 0,
        };
        let receiver = SinkReceiver {
            frames: frame_rx,
            issues: issue_rx,
        };
        (sink, receiver)
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl FrameSink for ChannelSink {
    fn present(
        &mut self,
        frame: &Frame,
        faces: &[DetectionResult],
        display: Dimensions,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let presented = PresentedFrame {
            index: frame.index(),
            image: image::Handle::from_rgba(frame.width(), frame.height(), frame.to_rgba()),
            faces: faces.to_vec(),
            display,
        };
        match self.frames.try_send(presented) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::trace!("UI busy, dropped frame {}", frame.index());
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err("display closed".into()),
        }
    }

    fn report(&mut self, issue: PlaybackIssue) {
        let _ = self.issues.send(issue);
    }

    fn clear(&mut self) {
        // Stale frames and issues must not show up after the video is gone
        while self.pending.try_recv().is_ok() {}
        while self.pending_issues.try_recv().is_ok() {}
    }
}
