use crate::detection::domain::face_detector::DetectionError;
use crate::detection::domain::staged_face_detector::StagedFaceDetector;

use super::image_preprocessor::{ImagePreprocessor, PreprocessConfig};
use super::model_source::ModelSource;
use super::msr_postprocessor::{default_anchor_stages, AnchorStage, MsrPostprocessor};
use super::onnx_model::OnnxModel;

/// Default minimum face confidence.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// Default IoU above which overlapping faces are suppressed.
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.5;

/// Default maximum number of faces reported per image.
pub const DEFAULT_TOP_K: usize = 10;

/// Parameters of the MSR face detector.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
    pub preprocess: PreprocessConfig,
    pub anchors: Vec<AnchorStage>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            preprocess: PreprocessConfig::default(),
            anchors: default_anchor_stages(),
        }
    }
}

impl DetectorConfig {
    /// Rejects thresholds outside `[0, 1]` and a zero `top_k`.
    pub fn validate(&self) -> Result<(), DetectionError> {
        for (name, value) in [
            ("score threshold", self.score_threshold),
            ("NMS threshold", self.nms_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectionError::InvalidConfig(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if self.top_k == 0 {
            return Err(DetectionError::InvalidConfig("top-k must be at least 1".into()));
        }
        if self.anchors.is_empty() {
            return Err(DetectionError::InvalidConfig("no anchor stages configured".into()));
        }
        Ok(())
    }
}

/// Builds the three-stage MSR detector around the model at `source`.
pub fn build_msr_detector(
    config: &DetectorConfig,
    source: &ModelSource,
) -> Result<StagedFaceDetector, DetectionError> {
    config.validate()?;
    let preprocessor = ImagePreprocessor::new(config.preprocess.clone())?;
    let model = OnnxModel::load(source)?;
    let postprocessor = MsrPostprocessor::new(
        config.anchors.clone(),
        config.score_threshold,
        config.nms_threshold,
        config.top_k,
    );
    Ok(StagedFaceDetector::new(
        Box::new(preprocessor),
        Box::new(model),
        Box::new(postprocessor),
    ))
}
