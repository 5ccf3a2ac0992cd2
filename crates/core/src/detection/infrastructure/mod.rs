pub mod detector_factory;
pub mod execution_provider;
pub mod expression_detector;
pub mod math;
pub mod onnx_blazeface_detector;
pub mod onnx_expression_classifier;
pub mod onnx_yolo_detector;
