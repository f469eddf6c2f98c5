use std::fmt;
use std::path::{Path, PathBuf};

use crate::detection::domain::face_detector::DetectionError;
use crate::shared::constants::{BUNDLED_MODEL_DIR, DETECTOR_MODEL_NAME};
use crate::shared::model_resolver;

/// Where the detection model is loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelSource {
    /// Model bytes compiled into the binary (e.g. via `include_bytes!`).
    Embedded(&'static [u8]),
    /// Directory containing [`DETECTOR_MODEL_NAME`].
    Bundled(PathBuf),
    /// Explicit model file.
    File(PathBuf),
    /// Platform cache, then the bundled directory, then a download from `url`.
    Cached { url: String },
}

impl Default for ModelSource {
    fn default() -> Self {
        Self::Bundled(PathBuf::from(BUNDLED_MODEL_DIR))
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded(bytes) => write!(f, "embedded model ({} bytes)", bytes.len()),
            Self::Bundled(dir) => write!(f, "{}", dir.join(DETECTOR_MODEL_NAME).display()),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Cached { url } => write!(f, "cached {DETECTOR_MODEL_NAME} ({url})"),
        }
    }
}

/// A model ready to hand to the inference runtime.
#[derive(Debug, PartialEq, Eq)]
pub enum ResolvedModel {
    Memory(&'static [u8]),
    Path(PathBuf),
}

impl ModelSource {
    pub fn resolve(&self) -> Result<ResolvedModel, DetectionError> {
        match self {
            Self::Embedded(bytes) if bytes.is_empty() => {
                Err(DetectionError::ModelLoad("embedded model is empty".into()))
            }
            Self::Embedded(bytes) => Ok(ResolvedModel::Memory(bytes)),
            Self::Bundled(dir) => existing_file(dir.join(DETECTOR_MODEL_NAME)),
            Self::File(path) => existing_file(path.clone()),
            Self::Cached { url } => {
                let path = model_resolver::resolve(
                    DETECTOR_MODEL_NAME,
                    url,
                    Some(Path::new(BUNDLED_MODEL_DIR)),
                    None,
                )?;
                Ok(ResolvedModel::Path(path))
            }
        }
    }
}

fn existing_file(path: PathBuf) -> Result<ResolvedModel, DetectionError> {
    if path.is_file() {
        Ok(ResolvedModel::Path(path))
    } else {
        Err(DetectionError::ModelLoad(format!(
            "model file not found: {}",
            path.display()
        )))
    }
}
