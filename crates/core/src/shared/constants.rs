pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EXPRESSION_MODEL_NAME: &str = "emotion-ferplus-8.onnx";
pub const EXPRESSION_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx";

/// Side of the square box the video is fitted into for display.
pub const DEFAULT_DISPLAY_SIZE: u32 = 600;

/// Extensions offered by the file picker (the `video/*` family).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv", "webm"];

/// Expression scores below this are not drawn.
pub const DEFAULT_MIN_EXPRESSION_SCORE: f64 = 0.1;

/// Directory name used under the platform cache/config roots.
pub const APP_DIR_NAME: &str = "FaceLens";
