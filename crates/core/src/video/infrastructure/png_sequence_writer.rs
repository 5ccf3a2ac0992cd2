use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::frame_writer::FrameWriter;

/// Writes each frame as `<dir>/frame_<index>.png` using the `image` crate.
///
/// Files are named by the frame's decode index, so frames skipped by a
/// paced loop leave gaps in the numbering.
pub struct PngSequenceWriter {
    dir: PathBuf,
}

impl PngSequenceWriter {
    /// Creates the output directory if it does not exist yet.
    pub fn new(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl FrameWriter for PngSequenceWriter {
    fn write(&mut self, frame: &Frame) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        let path = self.path_for(frame.index());
        img.save(&path)?;
        Ok(path)
    }
}
