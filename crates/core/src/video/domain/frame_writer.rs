use std::path::PathBuf;

use crate::shared::frame::Frame;

/// Persists annotated frames, one file per frame.
pub trait FrameWriter: Send {
    /// Writes `frame` and returns where it went.
    fn write(&mut self, frame: &Frame) -> Result<PathBuf, Box<dyn std::error::Error>>;
}
