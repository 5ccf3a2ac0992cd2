use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::shared::dimensions::Dimensions;

/// A non-fatal condition observed during playback.
///
/// Issues are reported to the frame sink and logged; playback carries on
/// (or, for `SourceOpen`, simply never starts).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackIssue {
    #[error("cannot open {path}: {reason}")]
    SourceOpen { path: PathBuf, reason: String },
    #[error("face detection failed on frame {frame_index}: {reason}")]
    DetectionFailed { frame_index: usize, reason: String },
    #[error("detection took {elapsed:?} against a {budget:?} frame budget; skipped {skipped_frames} frame(s)")]
    SlowDetection {
        elapsed: Duration,
        budget: Duration,
        skipped_frames: usize,
    },
    #[error("overlay surface is {surface} but the video is displayed at {display}")]
    DimensionMismatch {
        surface: Dimensions,
        display: Dimensions,
    },
}

impl PlaybackIssue {
    pub fn source_open(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        PlaybackIssue::SourceOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
