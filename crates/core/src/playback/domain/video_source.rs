use std::path::{Path, PathBuf};

use crate::playback::domain::playback_issue::PlaybackIssue;
use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

struct LoadedVideo {
    path: PathBuf,
    metadata: VideoMetadata,
    display: Dimensions,
    ended: bool,
}

/// The selected media file, opened for decoding.
///
/// Also fixes the displayed size: the video's own size fitted inside the
/// display bounds. Overlays are drawn in that coordinate space.
pub struct VideoSource {
    reader: Box<dyn VideoReader>,
    display_bounds: Dimensions,
    loaded: Option<LoadedVideo>,
}

impl VideoSource {
    pub fn new(reader: Box<dyn VideoReader>, display_bounds: Dimensions) -> Self {
        Self {
            reader,
            display_bounds,
            loaded: None,
        }
    }

    /// Opens `path`, replacing whatever was loaded. On failure nothing is
    /// loaded afterwards.
    pub fn load(&mut self, path: &Path) -> Result<&VideoMetadata, PlaybackIssue> {
        self.clear();
        let metadata = self
            .reader
            .open(path)
            .map_err(|e| PlaybackIssue::source_open(path, e))?;
        let display = metadata.dimensions().fit_within(self.display_bounds);
        log::info!(
            "Loaded {} ({} at {:.2} fps, displayed at {})",
            path.display(),
            metadata.dimensions(),
            metadata.fps,
            display
        );
        let loaded = self.loaded.insert(LoadedVideo {
            path: path.to_path_buf(),
            metadata,
            display,
            ended: false,
        });
        Ok(&loaded.metadata)
    }

    /// Releases the decoder and the file handle.
    pub fn clear(&mut self) {
        if self.loaded.take().is_some() {
            self.reader.close();
        }
    }

    /// Reopens the current file at its first frame.
    pub fn rewind(&mut self) -> Result<(), PlaybackIssue> {
        let Some(path) = self.path().map(Path::to_path_buf) else {
            return Ok(());
        };
        self.load(&path).map(|_| ())
    }

    /// Next decoded frame. `Ok(None)` at end of stream or when nothing is loaded.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(None);
        };
        if loaded.ended {
            return Ok(None);
        }
        let frame = self.reader.read_frame()?;
        if frame.is_none() {
            loaded.ended = true;
        }
        Ok(frame)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn has_ended(&self) -> bool {
        self.loaded.as_ref().is_some_and(|l| l.ended)
    }

    pub fn path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|l| l.path.as_path())
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.loaded.as_ref().map(|l| &l.metadata)
    }

    pub fn display_dimensions(&self) -> Option<Dimensions> {
        self.loaded.as_ref().map(|l| l.display)
    }
}
