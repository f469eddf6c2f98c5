use std::time::Instant;

use crate::shared::frame::Frame;

use super::detection::Detection;
use super::detector_stages::{InferenceModel, Postprocessor, Preprocessor};
use super::face_detector::{DetectionError, FaceDetector, StageTimings};

/// Face detector composed of three stages: preprocess → infer → postprocess.
///
/// Each stage is timed independently and logged at info level together with
/// the end-to-end total. The resize scale computed by the preprocessor is
/// handed to the postprocessor before decoding, so detections come back in
/// original image coordinates.
pub struct StagedFaceDetector {
    preprocessor: Box<dyn Preprocessor>,
    model: Box<dyn InferenceModel>,
    postprocessor: Box<dyn Postprocessor>,
    last_timings: Option<StageTimings>,
}

impl StagedFaceDetector {
    pub fn new(
        preprocessor: Box<dyn Preprocessor>,
        model: Box<dyn InferenceModel>,
        postprocessor: Box<dyn Postprocessor>,
    ) -> Self {
        Self {
            preprocessor,
            model,
            postprocessor,
            last_timings: None,
        }
    }
}

impl FaceDetector for StagedFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        self.last_timings = None;
        let start = Instant::now();

        let input = self.preprocessor.preprocess(frame)?;
        let preprocess = start.elapsed();
        log::info!("Preprocess: {:.3}ms", preprocess.as_secs_f64() * 1000.0);

        let infer_start = Instant::now();
        let outputs = self.model.run(input)?;
        let infer = infer_start.elapsed();
        log::info!("Inference: {:.3}ms", infer.as_secs_f64() * 1000.0);

        let post_start = Instant::now();
        self.postprocessor.clear_result();
        let (scale_x, scale_y) = self.preprocessor.resize_scale();
        self.postprocessor.set_resize_scale(scale_x, scale_y);
        self.postprocessor.postprocess(&outputs)?;
        let detections = self.postprocessor.result(frame.width(), frame.height());
        let postprocess = post_start.elapsed();
        log::info!("Postprocess: {:.3}ms", postprocess.as_secs_f64() * 1000.0);

        let total = start.elapsed();
        log::info!(
            "Detection: {:.3}ms total, found {} face(s)",
            total.as_secs_f64() * 1000.0,
            detections.len()
        );

        self.last_timings = Some(StageTimings {
            preprocess,
            infer,
            postprocess,
            total,
        });
        Ok(detections)
    }

    fn last_timings(&self) -> Option<StageTimings> {
        self.last_timings
    }
}
