use std::path::PathBuf;
use std::time::Duration;

use crate::shared::dimensions::Dimensions;

/// Stream properties as seen by the viewer: `width` and `height` are the
/// upright size, after `rotation` has been applied to decoded pictures.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// 0 when the container does not report a frame count.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
    /// Clockwise degrees (0, 90, 180 or 270) the reader turns each picture.
    pub rotation: i32,
}

/// Frame interval used when the stream reports no usable rate.
const FALLBACK_FPS: f64 = 30.0;

impl VideoMetadata {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Time one frame stays on screen at the stream's native rate.
    pub fn frame_interval(&self) -> Duration {
        let fps = if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            FALLBACK_FPS
        };
        Duration::from_secs_f64(1.0 / fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 1920,
            height: 1080,
            fps,
            total_frames: 900,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/clip.mp4")),
            rotation: 0,
        }
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(metadata(30.0).dimensions(), Dimensions::new(1920, 1080));
    }

    #[test]
    fn test_frame_interval_from_fps() {
        assert_eq!(metadata(25.0).frame_interval(), Duration::from_millis(40));
    }

    #[test]
    fn test_frame_interval_falls_back_when_rate_unknown() {
        let expected = Duration::from_secs_f64(1.0 / 30.0);
        assert_eq!(metadata(0.0).frame_interval(), expected);
        assert_eq!(metadata(f64::NAN).frame_interval(), expected);
    }
}
