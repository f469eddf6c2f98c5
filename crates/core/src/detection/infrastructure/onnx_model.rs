use ort::session::Session;

use crate::detection::domain::detector_stages::{InferenceModel, ModelInput, ModelOutputs};
use crate::detection::domain::face_detector::DetectionError;

use super::model_source::{ModelSource, ResolvedModel};

/// Detection network backed by an ONNX Runtime session.
///
/// Outputs are copied out of the session in the model's declared order.
pub struct OnnxModel {
    session: Session,
}

impl OnnxModel {
    pub fn load(source: &ModelSource) -> Result<Self, DetectionError> {
        let resolved = source.resolve()?;
        log::info!("Loading detection model from {source}");
        let session = build_session(&resolved)
            .map_err(|e| DetectionError::ModelLoad(format!("{source}: {e}")))?;
        Ok(Self { session })
    }
}

/// CoreML on macOS, DirectML on Windows; ONNX Runtime falls back to CPU
/// when a provider cannot be registered.
fn execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

fn build_session(model: &ResolvedModel) -> Result<Session, Box<dyn std::error::Error>> {
    let mut builder = Session::builder()?.with_execution_providers(execution_providers())?;
    let session = match model {
        ResolvedModel::Memory(bytes) => builder.commit_from_memory(bytes)?,
        ResolvedModel::Path(path) => builder.commit_from_file(path)?,
    };
    Ok(session)
}

impl InferenceModel for OnnxModel {
    fn run(&mut self, input: ModelInput) -> Result<ModelOutputs, DetectionError> {
        run_session(&mut self.session, input).map_err(|e| DetectionError::Inference(e.to_string()))
    }
}

fn run_session(
    session: &mut Session,
    input: ModelInput,
) -> Result<ModelOutputs, Box<dyn std::error::Error>> {
    let input_value = ort::value::Tensor::from_array(input)?;
    let outputs = session.run(ort::inputs![input_value])?;

    let mut tensors = Vec::with_capacity(outputs.len());
    for i in 0..outputs.len() {
        tensors.push(outputs[i].try_extract_array::<f32>()?.to_owned());
    }
    Ok(tensors)
}
