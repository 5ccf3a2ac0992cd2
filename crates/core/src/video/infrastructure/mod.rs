pub mod ffmpeg_reader;
pub mod png_sequence_writer;
