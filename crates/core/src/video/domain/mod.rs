pub mod frame_writer;
pub mod video_reader;
