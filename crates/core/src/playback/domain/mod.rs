pub mod frame_sink;
pub mod playback_issue;
pub mod playback_state;
pub mod video_source;
