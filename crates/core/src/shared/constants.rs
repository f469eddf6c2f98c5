/// File name of the face detection model inside a bundled or cache directory.
pub const DETECTOR_MODEL_NAME: &str = "human_face_detect_msr.onnx";

/// Directory searched for [`DETECTOR_MODEL_NAME`] when no model is given explicitly.
///
/// Fixed at build time through `FACE_ANONYMIZER_MODEL_DIR`; falls back to `models`.
pub const BUNDLED_MODEL_DIR: &str = match option_env!("FACE_ANONYMIZER_MODEL_DIR") {
    Some(dir) => dir,
    None => "models",
};

/// Application directory name used under the platform cache directory.
pub const CACHE_APP_DIR: &str = "Face Anonymizer";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// How long the caller waits for the background task before warning (ms).
pub const DEFAULT_TASK_WAIT_MS: u64 = 1000;
