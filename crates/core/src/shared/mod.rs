pub mod constants;
pub mod dimensions;
pub mod frame;
pub mod model_resolver;
pub mod video_metadata;
