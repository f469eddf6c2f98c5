use ndarray::{Array4, ArrayD};

use crate::shared::frame::Frame;

use super::detection::Detection;
use super::face_detector::DetectionError;

/// NCHW float tensor fed to the detection model.
pub type ModelInput = Array4<f32>;

/// Raw model output tensors, in the model's output order.
pub type ModelOutputs = Vec<ArrayD<f32>>;

/// Converts a frame into the model's input layout.
pub trait Preprocessor: Send {
    fn preprocess(&mut self, frame: &Frame) -> Result<ModelInput, DetectionError>;

    /// `(x, y)` ratio of model input size to the last preprocessed frame size.
    fn resize_scale(&self) -> (f32, f32);
}

/// Runs the detection network.
pub trait InferenceModel: Send {
    fn run(&mut self, input: ModelInput) -> Result<ModelOutputs, DetectionError>;
}

/// Decodes raw model outputs into detections.
///
/// Results accumulate between [`clear_result`](Self::clear_result) calls and are
/// mapped back to image coordinates by [`result`](Self::result).
pub trait Postprocessor: Send {
    fn clear_result(&mut self);

    fn set_resize_scale(&mut self, scale_x: f32, scale_y: f32);

    fn postprocess(&mut self, outputs: &ModelOutputs) -> Result<(), DetectionError>;

    /// Detections scaled to, and clamped within, a `width × height` image.
    fn result(&self, width: u32, height: u32) -> Vec<Detection>;
}
