pub mod bounding_box;
pub mod detection_result;
pub mod detector_options;
pub mod expression;
pub mod expression_classifier;
pub mod face_detector;
pub mod face_landmarks;
