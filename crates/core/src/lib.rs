//! Video playback with live face detection overlays.
//!
//! The crate is split into bounded areas, each with a `domain` layer of
//! plain types and traits and an `infrastructure` layer that binds them to
//! ffmpeg, ONNX Runtime and raster drawing:
//!
//! - [`video`]: decoding frames from a local file.
//! - [`detection`]: the face detection adapter and its result types.
//! - [`overlay`]: painting detection results onto a drawing surface.
//! - [`playback`]: the video source, the cancellable frame loop, control
//!   visibility and the session that ties them together.

pub mod detection;
pub mod overlay;
pub mod playback;
pub mod shared;
pub mod video;

#[cfg(test)]
mod test_support;
