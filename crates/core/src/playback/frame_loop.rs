use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::detection::domain::detection_result::resize_results;
use crate::detection::domain::face_detector::FaceDetector;
use crate::playback::domain::frame_sink::FrameSink;
use crate::playback::domain::playback_issue::PlaybackIssue;
use crate::playback::domain::video_source::VideoSource;
use crate::playback::frame_loop_logger::FrameLoopLogger;

/// Longest uninterrupted sleep while waiting for a frame's deadline, so a
/// cancel request never waits on a long frame interval.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How iterations are spaced in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// One frame per frame interval of the video. Frames that fall behind
    /// because detection overran are skipped and reported.
    #[default]
    RealTime,
    /// Every frame, as fast as decode and detection allow.
    Unpaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Why a loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The video ran out of frames.
    Ended,
    /// Cancellation was requested.
    Cancelled,
    /// Decoding or presenting failed; the loop cannot continue.
    Failed(String),
}

/// Everything a running loop owns. Handed back when the loop stops, so
/// the next run continues from the same decode position.
pub struct LoopParts {
    pub source: VideoSource,
    pub detector: Box<dyn FaceDetector>,
    pub sink: Box<dyn FrameSink>,
    pub logger: Box<dyn FrameLoopLogger>,
}

impl std::fmt::Debug for LoopParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopParts")
            .field("source", &self.source.path())
            .finish_non_exhaustive()
    }
}

#[derive(Error, Debug)]
pub enum FrameLoopError {
    /// A loop is already running (or has finished but was not collected).
    /// The rejected parts are returned untouched.
    #[error("frame loop is already running")]
    AlreadyRunning(Box<LoopParts>),
    #[error("no video is loaded")]
    NothingLoaded(Box<LoopParts>),
    #[error("frame loop worker panicked")]
    WorkerPanicked,
}

impl FrameLoopError {
    /// Recovers the parts of a rejected start.
    pub fn into_parts(self) -> Option<LoopParts> {
        match self {
            FrameLoopError::AlreadyRunning(parts) | FrameLoopError::NothingLoaded(parts) => {
                Some(*parts)
            }
            FrameLoopError::WorkerPanicked => None,
        }
    }
}

struct Worker {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<LoopParts>,
}

/// The repeating fetch, detect, present task, run on its own thread.
///
/// At most one worker exists at a time. It checks its cancellation flag
/// before every iteration, so after [`FrameLoop::cancel`] at most the
/// frame already in flight is presented. The loop counts as running until
/// its worker has been collected with [`FrameLoop::stop`],
/// [`FrameLoop::wait`] or [`FrameLoop::try_finish`].
pub struct FrameLoop {
    pacing: Pacing,
    worker: Option<Worker>,
    exit_tx: Sender<LoopExit>,
    exit_rx: Receiver<LoopExit>,
}

impl FrameLoop {
    pub fn new(pacing: Pacing) -> Self {
        let (exit_tx, exit_rx) = crossbeam_channel::unbounded();
        Self {
            pacing,
            worker: None,
            exit_tx,
            exit_rx,
        }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn state(&self) -> LoopState {
        if self.worker.is_some() {
            LoopState::Running
        } else {
            LoopState::Idle
        }
    }

    /// Spawns the worker. Rejected while another run is uncollected, or
    /// when the source has nothing loaded.
    pub fn start(&mut self, parts: LoopParts) -> Result<(), FrameLoopError> {
        if self.worker.is_some() {
            return Err(FrameLoopError::AlreadyRunning(Box::new(parts)));
        }
        if !parts.source.is_loaded() {
            return Err(FrameLoopError::NothingLoaded(Box::new(parts)));
        }

        // Drop exits of runs that were collected through join
        while self.exit_rx.try_recv().is_ok() {}

        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = spawn_worker(parts, self.pacing, Arc::clone(&cancelled), self.exit_tx.clone());
        self.worker = Some(Worker { cancelled, handle });
        log::debug!("Frame loop started ({:?})", self.pacing);
        Ok(())
    }

    /// Requests cancellation without waiting for the worker.
    pub fn cancel(&self) {
        if let Some(worker) = &self.worker {
            worker.cancelled.store(true, Ordering::SeqCst);
        }
    }

    /// Cancels and waits for the worker. `None` when idle.
    pub fn stop(&mut self) -> Result<Option<(LoopParts, LoopExit)>, FrameLoopError> {
        self.cancel();
        self.wait()
    }

    /// Waits for the worker to finish on its own. `None` when idle.
    pub fn wait(&mut self) -> Result<Option<(LoopParts, LoopExit)>, FrameLoopError> {
        let Some(worker) = self.worker.take() else {
            return Ok(None);
        };
        let parts = worker
            .handle
            .join()
            .map_err(|_| FrameLoopError::WorkerPanicked)?;
        let exit = self
            .exit_rx
            .try_recv()
            .map_err(|_| FrameLoopError::WorkerPanicked)?;
        log::debug!("Frame loop stopped: {exit:?}");
        Ok(Some((parts, exit)))
    }

    /// Collects the worker if it has reported its exit; never blocks on a
    /// running loop.
    pub fn try_finish(&mut self) -> Result<Option<(LoopParts, LoopExit)>, FrameLoopError> {
        if self.worker.is_none() {
            return Ok(None);
        }
        match self.exit_rx.try_recv() {
            Ok(exit) => {
                let Some(worker) = self.worker.take() else {
                    return Ok(None);
                };
                let parts = worker
                    .handle
                    .join()
                    .map_err(|_| FrameLoopError::WorkerPanicked)?;
                log::debug!("Frame loop finished: {exit:?}");
                Ok(Some((parts, exit)))
            }
            Err(_) if self.worker.as_ref().is_some_and(|w| w.handle.is_finished()) => {
                // Finished without reporting: the worker panicked
                self.worker = None;
                Err(FrameLoopError::WorkerPanicked)
            }
            Err(_) => Ok(None),
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(Pacing::default())
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancelled.store(true, Ordering::SeqCst);
            let _ = worker.handle.join();
        }
    }
}

fn spawn_worker(
    mut parts: LoopParts,
    pacing: Pacing,
    cancelled: Arc<AtomicBool>,
    exit_tx: Sender<LoopExit>,
) -> JoinHandle<LoopParts> {
    std::thread::spawn(move || {
        let exit = run_loop(&mut parts, pacing, &cancelled);
        if let LoopExit::Failed(reason) = &exit {
            log::error!("Playback stopped: {reason}");
        }
        parts.logger.summary();
        let _ = exit_tx.send(exit);
        parts
    })
}

fn run_loop(parts: &mut LoopParts, pacing: Pacing, cancelled: &AtomicBool) -> LoopExit {
    let Some(display) = parts.source.display_dimensions() else {
        return LoopExit::Failed("no video is loaded".to_string());
    };
    let (interval, total) = parts
        .source
        .metadata()
        .map(|m| (m.frame_interval(), m.total_frames))
        .unwrap_or_default();

    let mut deadline = Instant::now();
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return LoopExit::Cancelled;
        }

        let started = Instant::now();
        let frame = match parts.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return LoopExit::Ended,
            Err(e) => return LoopExit::Failed(format!("decoding failed: {e}")),
        };
        parts.logger.timing("decode", millis(started.elapsed()));

        let detect_started = Instant::now();
        let faces = match parts.detector.detect(&frame) {
            Ok(faces) => faces,
            Err(e) => {
                report(
                    parts.sink.as_mut(),
                    PlaybackIssue::DetectionFailed {
                        frame_index: frame.index(),
                        reason: e.to_string(),
                    },
                );
                Vec::new()
            }
        };
        let detect_time = detect_started.elapsed();
        parts.logger.timing("detect", millis(detect_time));
        parts.logger.metric("faces", faces.len() as f64);

        let present_started = Instant::now();
        let faces = resize_results(&faces, frame.dimensions(), display);
        if let Err(e) = parts.sink.present(&frame, &faces, display) {
            return LoopExit::Failed(format!("presenting frame {} failed: {e}", frame.index()));
        }
        parts.logger.timing("present", millis(present_started.elapsed()));
        parts.logger.progress(frame.index() + 1, total);

        if pacing == Pacing::Unpaced {
            continue;
        }

        deadline += interval;
        let now = Instant::now();
        if now < deadline {
            sleep_until(deadline, cancelled);
            continue;
        }

        let behind = (now - deadline).as_secs_f64() / interval.as_secs_f64();
        let skipped_frames = behind as usize;
        for _ in 0..skipped_frames {
            match parts.source.next_frame() {
                Ok(Some(_)) => {}
                Ok(None) => return LoopExit::Ended,
                Err(e) => return LoopExit::Failed(format!("decoding failed: {e}")),
            }
        }
        if skipped_frames > 0 {
            report(
                parts.sink.as_mut(),
                PlaybackIssue::SlowDetection {
                    elapsed: detect_time,
                    budget: interval,
                    skipped_frames,
                },
            );
        }
        deadline = Instant::now();
    }
}

fn report(sink: &mut dyn FrameSink, issue: PlaybackIssue) {
    log::warn!("{issue}");
    sink.report(issue);
}

fn sleep_until(deadline: Instant, cancelled: &AtomicBool) {
    loop {
        let now = Instant::now();
        if now >= deadline || cancelled.load(Ordering::SeqCst) {
            return;
        }
        std::thread::sleep((deadline - now).min(CANCEL_POLL_INTERVAL));
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crossbeam_channel::Receiver;

    use crate::detection::domain::bounding_box::BoundingBox;
    use crate::detection::domain::detection_result::DetectionResult;
    use crate::playback::frame_loop_logger::NullFrameLoopLogger;
    use crate::shared::dimensions::Dimensions;
    use crate::shared::frame::Frame;
    use crate::test_support::{Presented, RecordingSink, ScriptedReader, StubDetector};

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    /// Blocks in `detect` until the test lets a frame through. Once the
    /// gate is dropped every frame passes straight away.
    struct GateDetector {
        gate: Receiver<()>,
    }

    impl FaceDetector for GateDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
            let _ = self.gate.recv();
            Ok(Vec::new())
        }
    }

    struct Harness {
        presented: Receiver<Presented>,
        issues: std::sync::Arc<std::sync::Mutex<Vec<PlaybackIssue>>>,
    }

    fn parts(reader: ScriptedReader, detector: Box<dyn FaceDetector>) -> (LoopParts, Harness) {
        let mut source = VideoSource::new(Box::new(reader), Dimensions::new(600, 600));
        source.load(Path::new("clip.mp4")).unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let sink = RecordingSink::new(tx);
        let harness = Harness {
            presented: rx,
            issues: sink.issues.clone(),
        };
        let parts = LoopParts {
            source,
            detector,
            sink: Box::new(sink),
            logger: Box::new(NullFrameLoopLogger),
        };
        (parts, harness)
    }

    fn next_index(harness: &Harness) -> usize {
        harness.presented.recv_timeout(RECV_TIMEOUT).unwrap().index
    }

    #[test]
    fn test_unpaced_loop_presents_every_frame_in_display_space() {
        let detector = StubDetector::new(BoundingBox::new(10.0, 10.0, 20.0, 20.0));
        let (parts, harness) = parts(ScriptedReader::new(200, 100, 5), Box::new(detector));

        let mut frame_loop = FrameLoop::new(Pacing::Unpaced);
        frame_loop.start(parts).unwrap();
        let (parts, exit) = frame_loop.wait().unwrap().unwrap();

        assert_eq!(exit, LoopExit::Ended);
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(parts.source.has_ended());

        let presented: Vec<Presented> = harness.presented.try_iter().collect();
        let indices: Vec<usize> = presented.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(presented[0].display, Dimensions::new(600, 300));
        assert_eq!(presented[0].faces[0].bbox, BoundingBox::new(30.0, 30.0, 60.0, 60.0));
    }

    #[test]
    fn test_second_start_rejected_and_stop_resumes_at_next_frame() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let (parts_a, harness) = parts(
            ScriptedReader::new(64, 64, 10),
            Box::new(GateDetector { gate: gate_rx }),
        );
        let (parts_b, _) = parts(
            ScriptedReader::new(64, 64, 10),
            Box::new(StubDetector::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0))),
        );

        let mut frame_loop = FrameLoop::new(Pacing::Unpaced);
        frame_loop.start(parts_a).unwrap();
        assert_eq!(frame_loop.state(), LoopState::Running);

        let rejected = frame_loop.start(parts_b).unwrap_err();
        assert!(matches!(rejected, FrameLoopError::AlreadyRunning(_)));
        assert!(rejected.into_parts().is_some());

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
        assert_eq!(next_index(&harness), 0);
        assert_eq!(next_index(&harness), 1);

        // The worker either sees the cancel first or finishes frame 2
        frame_loop.cancel();
        gate_tx.send(()).unwrap();
        let (parts, exit) = frame_loop.stop().unwrap().unwrap();
        assert_eq!(exit, LoopExit::Cancelled);
        let in_flight: Vec<usize> = harness.presented.try_iter().map(|p| p.index).collect();
        assert!(in_flight.is_empty() || in_flight == vec![2], "{in_flight:?}");

        frame_loop.start(parts).unwrap();
        gate_tx.send(()).unwrap();
        assert_eq!(next_index(&harness), 2 + in_flight.len());

        drop(gate_tx);
        let (_, exit) = frame_loop.stop().unwrap().unwrap();
        assert!(matches!(exit, LoopExit::Cancelled | LoopExit::Ended));
    }

    #[test]
    fn test_cancel_before_first_frame_completes_only_that_frame() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let (parts, harness) = parts(
            ScriptedReader::new(64, 64, 10),
            Box::new(GateDetector { gate: gate_rx }),
        );

        let mut frame_loop = FrameLoop::new(Pacing::Unpaced);
        frame_loop.start(parts).unwrap();
        frame_loop.cancel();
        gate_tx.send(()).unwrap();

        let (_, exit) = frame_loop.stop().unwrap().unwrap();
        assert_eq!(exit, LoopExit::Cancelled);
        let indices: Vec<usize> = harness.presented.try_iter().map(|p| p.index).collect();
        assert!(indices.len() <= 1);
    }

    #[test]
    fn test_detection_failure_is_reported_and_loop_continues() {
        let detector = StubDetector::new(BoundingBox::new(1.0, 1.0, 5.0, 5.0)).failing_at(1);
        let (parts, harness) = parts(ScriptedReader::new(64, 64, 3), Box::new(detector));

        let mut frame_loop = FrameLoop::new(Pacing::Unpaced);
        frame_loop.start(parts).unwrap();
        let (_, exit) = frame_loop.wait().unwrap().unwrap();
        assert_eq!(exit, LoopExit::Ended);

        let presented: Vec<Presented> = harness.presented.try_iter().collect();
        assert_eq!(presented.len(), 3);
        assert!(presented[1].faces.is_empty());
        assert_eq!(presented[2].faces.len(), 1);

        let issues = harness.issues.lock().unwrap();
        assert!(matches!(
            issues.as_slice(),
            [PlaybackIssue::DetectionFailed { frame_index: 1, .. }]
        ));
    }

    #[test]
    fn test_decode_failure_ends_loop() {
        let detector = StubDetector::new(BoundingBox::new(1.0, 1.0, 5.0, 5.0));
        let (parts, harness) = parts(ScriptedReader::new(64, 64, 5).failing_at(2), Box::new(detector));

        let mut frame_loop = FrameLoop::new(Pacing::Unpaced);
        frame_loop.start(parts).unwrap();
        let (_, exit) = frame_loop.wait().unwrap().unwrap();

        assert!(matches!(exit, LoopExit::Failed(ref reason) if reason.contains("frame 2")));
        assert_eq!(harness.presented.try_iter().count(), 2);
    }

    #[test]
    fn test_real_time_skips_frames_when_detection_is_slow() {
        let detector = StubDetector::new(BoundingBox::new(1.0, 1.0, 5.0, 5.0))
            .with_delay(Duration::from_millis(35));
        let reader = ScriptedReader::new(32, 32, 20).with_fps(100.0);
        let (parts, harness) = parts(reader, Box::new(detector));

        let mut frame_loop = FrameLoop::new(Pacing::RealTime);
        frame_loop.start(parts).unwrap();
        let (_, exit) = frame_loop.wait().unwrap().unwrap();
        assert_eq!(exit, LoopExit::Ended);

        let presented = harness.presented.try_iter().count();
        assert!(presented < 20, "presented {presented} frames");

        let issues = harness.issues.lock().unwrap();
        assert!(issues
            .iter()
            .any(|i| matches!(i, PlaybackIssue::SlowDetection { skipped_frames, .. } if *skipped_frames >= 2)));
    }

    #[test]
    fn test_try_finish_collects_ended_loop() {
        let detector = StubDetector::new(BoundingBox::new(1.0, 1.0, 5.0, 5.0));
        let (parts, harness) = parts(ScriptedReader::new(16, 16, 2), Box::new(detector));

        let mut frame_loop = FrameLoop::new(Pacing::Unpaced);
        frame_loop.start(parts).unwrap();
        next_index(&harness);
        next_index(&harness);

        let deadline = Instant::now() + RECV_TIMEOUT;
        let finished = loop {
            if let Some(done) = frame_loop.try_finish().unwrap() {
                break done;
            }
            assert!(Instant::now() < deadline, "loop never finished");
            std::thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(finished.1, LoopExit::Ended);
        assert_eq!(frame_loop.state(), LoopState::Idle);
    }

    #[test]
    fn test_start_without_loaded_video_is_rejected() {
        let source = VideoSource::new(Box::new(ScriptedReader::new(8, 8, 1)), Dimensions::new(600, 600));
        let (tx, _rx) = crossbeam_channel::unbounded();
        let parts = LoopParts {
            source,
            detector: Box::new(StubDetector::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0))),
            sink: Box::new(RecordingSink::new(tx)),
            logger: Box::new(NullFrameLoopLogger),
        };

        let mut frame_loop = FrameLoop::default();
        let err = frame_loop.start(parts).unwrap_err();
        assert!(matches!(err, FrameLoopError::NothingLoaded(_)));
        assert_eq!(frame_loop.state(), LoopState::Idle);
    }

    #[test]
    fn test_stop_when_idle() {
        let mut frame_loop = FrameLoop::default();
        assert!(frame_loop.stop().unwrap().is_none());
        assert!(frame_loop.try_finish().unwrap().is_none());
    }
}
