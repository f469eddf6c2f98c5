pub mod image_preprocessor;
pub mod model_source;
pub mod msr_face_detector;
pub mod msr_postprocessor;
pub mod nms;
pub mod onnx_model;
