use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Each call to [`VideoReader::read_frame`] pulls packets until the decoder
/// yields one picture, converts it to RGB24 and wraps it in a [`Frame`].
/// Pictures from phone clips are turned upright using the stream's display
/// matrix (or legacy `rotate` tag), so frames and metadata report the size
/// the video is meant to be shown at.
pub struct FfmpegReader {
    state: Option<DecodeState>,
}

struct DecodeState {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    rotation: i32,
    next_index: usize,
    flushing: bool,
    done: bool,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        self.state = None;

        let input = ffmpeg_next::format::input(path)?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let total_frames = stream.frames().max(0) as usize;
        let rotation = extract_rotation(&stream);

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(format!("Video stream reports an empty frame size {width}x{height}").into());
        }

        let (shown_width, shown_height) = if rotation % 180 == 0 {
            (width, height)
        } else {
            (height, width)
        };
        let metadata = VideoMetadata {
            width: shown_width,
            height: shown_height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
            rotation,
        };

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Opened {}: {}x{} @ {:.2} fps ({}), rotated {}°",
            path.display(),
            width,
            height,
            fps,
            metadata.codec,
            rotation
        );

        self.state = Some(DecodeState {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            rotation,
            next_index: 0,
            flushing: false,
            done: false,
        });

        Ok(metadata)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let state = self.state.as_mut().ok_or("FfmpegReader: not opened")?;
        state.next_frame()
    }

    fn close(&mut self) {
        self.state = None;
    }
}

impl DecodeState {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }

        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
            if self.flushing {
                self.done = true;
                return Ok(None);
            }

            let Some((stream, packet)) = self.input.packets().next() else {
                // Drain whatever the decoder still buffers
                let _ = self.decoder.send_eof();
                self.flushing = true;
                continue;
            };
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, self.next_index);
        self.next_index += 1;
        Ok(Some(frame.rotated(self.rotation)))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

/// Clockwise turn, in degrees, that shows the stream's pictures upright:
/// 0, 90, 180 or 270. Stream side data wins over the `rotate` tag.
fn extract_rotation(stream: &ffmpeg_next::format::stream::Stream) -> i32 {
    for side_data in stream.side_data() {
        if side_data.kind() == ffmpeg_next::codec::packet::side_data::Type::DisplayMatrix {
            if let Some(angle) = parse_display_matrix(side_data.data()) {
                return normalize_rotation(angle);
            }
        }
    }

    if let Some(rotate) = stream.metadata().get("rotate") {
        if let Ok(angle) = rotate.trim().parse::<i32>() {
            return normalize_rotation(angle);
        }
    }

    0
}

/// Reads the clockwise angle out of a 3x3 display matrix: nine
/// little-endian i32 values in 16.16 fixed point.
///
/// ffmpeg's own `av_display_rotation_get` reports the counterclockwise
/// angle `-atan2(m1, m0)`; the turn needed for display is its negation.
fn parse_display_matrix(data: &[u8]) -> Option<i32> {
    if data.len() < 36 {
        return None;
    }

    let m0 = i32::from_le_bytes(data[0..4].try_into().ok()?) as f64 / 65536.0;
    let m1 = i32::from_le_bytes(data[4..8].try_into().ok()?) as f64 / 65536.0;
    if m0 == 0.0 && m1 == 0.0 {
        return None;
    }

    Some(m1.atan2(m0).to_degrees().round() as i32)
}

/// Snaps any angle to the nearest quarter turn in `0..360`.
fn normalize_rotation(angle: i32) -> i32 {
    match angle.rem_euclid(360) {
        0..=44 | 316..=359 => 0,
        45..=134 => 90,
        135..=224 => 180,
        _ => 270,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    /// Encodes `num_frames` flat grey MPEG-4 frames; frame `i` has value `i * 40`.
    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .unwrap();

        let write_packets = |encoder: &mut ffmpeg_next::encoder::Video,
                                 octx: &mut ffmpeg_next::format::context::Output| {
            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(octx).unwrap();
            }
        };

        for i in 0..num_frames {
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
            );
            let stride = rgb_frame.stride(0);
            let data = rgb_frame.data_mut(0);
            let value = ((i * 40) % 256) as u8;
            for row in 0..height as usize {
                data[row * stride..row * stride + width as usize * 3].fill(value);
            }

            let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));

            encoder.send_frame(&yuv_frame).unwrap();
            write_packets(&mut encoder, &mut octx);
        }

        encoder.send_eof().unwrap();
        write_packets(&mut encoder, &mut octx);
        octx.write_trailer().unwrap();
    }

    fn test_video(dir: &Path, num_frames: usize) -> PathBuf {
        let path = dir.join("test.mp4");
        create_test_video(&path, num_frames, 160, 120, 30);
        path
    }

    fn read_all(reader: &mut FfmpegReader) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = reader.read_frame().unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!(meta.width, 160);
        assert_eq!(meta.height, 120);
        assert!(meta.fps > 0.0);
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_unrotated_stream_reports_coded_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.mp4");
        create_test_video(&path, 1, 160, 96, 30);

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!(meta.rotation, 0);
        let frame = reader.read_frame().unwrap().unwrap();
        assert_eq!((frame.width(), frame.height()), (160, 96));
    }

    fn display_matrix(m0: i32, m1: i32) -> Vec<u8> {
        let mut data = vec![0u8; 36];
        data[0..4].copy_from_slice(&m0.to_le_bytes());
        data[4..8].copy_from_slice(&m1.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_display_matrix_portrait_phone_clip() {
        // What a phone writes for a clip held upright: [0, 1; -1, 0]
        let angle = parse_display_matrix(&display_matrix(0, 65536)).unwrap();
        assert_eq!(normalize_rotation(angle), 90);
    }

    #[test]
    fn test_parse_display_matrix_upside_down() {
        let angle = parse_display_matrix(&display_matrix(-65536, 0)).unwrap();
        assert_eq!(normalize_rotation(angle), 180);
    }

    #[test]
    fn test_parse_display_matrix_identity() {
        let angle = parse_display_matrix(&display_matrix(65536, 0)).unwrap();
        assert_eq!(normalize_rotation(angle), 0);
    }

    #[test]
    fn test_parse_display_matrix_rejects_short_or_empty() {
        assert!(parse_display_matrix(&[0u8; 20]).is_none());
        assert!(parse_display_matrix(&[0u8; 36]).is_none());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(90, 90)]
    #[case(180, 180)]
    #[case(270, 270)]
    #[case(360, 0)]
    #[case(-90, 270)]
    #[case(-180, 180)]
    #[case(45, 90)]
    #[case(44, 0)]
    #[case(315, 270)]
    #[case(316, 0)]
    fn test_normalize_rotation(#[case] angle: i32, #[case] expected: i32) {
        assert_eq!(normalize_rotation(angle), expected);
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let mut reader = FfmpegReader::new();
        assert!(reader.open(Path::new("/nonexistent/test.mp4")).is_err());
    }

    #[test]
    fn test_open_garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"definitely not a video").unwrap();
        assert!(FfmpegReader::new().open(&path).is_err());
    }

    #[test]
    fn test_reads_every_frame_then_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        let frames = read_all(&mut reader);

        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_reading_resumes_between_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 4);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        let first = reader.read_frame().unwrap().unwrap();
        let second = reader.read_frame().unwrap().unwrap();
        assert_eq!((first.index(), second.index()), (0, 1));
    }

    #[test]
    fn test_reopen_starts_from_first_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 3);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        read_all(&mut reader);
        reader.open(&path).unwrap();
        assert_eq!(reader.read_frame().unwrap().unwrap().index(), 0);
    }

    #[test]
    fn test_read_without_open_fails() {
        let mut reader = FfmpegReader::new();
        assert!(reader.read_frame().is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        reader.close();
        reader.close();
        assert!(reader.read_frame().is_err());
    }
}
