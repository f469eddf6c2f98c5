use std::time::Duration;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::model_resolver::ModelResolveError;

use super::detection::Detection;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("preprocessing failed: {0}")]
    Preprocess(String),
    #[error("model inference failed: {0}")]
    Inference(String),
    #[error("postprocessing failed: {0}")]
    Postprocess(String),
    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to load detection model: {0}")]
    ModelLoad(String),
    #[error(transparent)]
    ModelResolve(#[from] ModelResolveError),
}

/// Wall-clock durations of one detection run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub preprocess: Duration,
    pub infer: Duration,
    pub postprocess: Duration,
    /// From the start of preprocessing to the end of postprocessing.
    pub total: Duration,
}

impl StageTimings {
    /// `(stage name, duration)` pairs in execution order, total last.
    pub fn stages(&self) -> [(&'static str, Duration); 4] {
        [
            ("preprocess", self.preprocess),
            ("infer", self.infer),
            ("postprocess", self.postprocess),
            ("total", self.total),
        ]
    }
}

/// Domain interface for face detection.
///
/// Implementations may hold per-run state (e.g. result buffers), hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError>;

    /// Timings of the most recent successful [`detect`](Self::detect) call, if measured.
    fn last_timings(&self) -> Option<StageTimings> {
        None
    }
}
