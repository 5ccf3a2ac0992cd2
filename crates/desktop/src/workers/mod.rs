pub mod channel_sink;
pub mod detector_loader;
