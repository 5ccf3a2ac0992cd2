use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Pull-based frame source over a media file.
///
/// Callers ask for one frame at a time, so the decode position survives
/// pauses: the next `read_frame` after a pause continues where the last
/// one stopped.
pub trait VideoReader: Send {
    /// Opens a media file and returns its metadata. Reopening an already
    /// opened reader starts again from the first frame.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Next RGB frame in decode order, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the decoder and the file handle. Safe to call repeatedly.
    fn close(&mut self);
}
