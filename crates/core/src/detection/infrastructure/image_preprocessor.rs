use crate::detection::domain::detector_stages::{ModelInput, Preprocessor};
use crate::detection::domain::face_detector::DetectionError;
use crate::shared::frame::{Frame, CHANNELS};

/// Input geometry and normalization of the detection model.
#[derive(Clone, Debug, PartialEq)]
pub struct PreprocessConfig {
    pub input_width: u32,
    pub input_height: u32,
    /// Per output channel, subtracted before dividing by `std`.
    pub mean: [f32; 3],
    pub std: [f32; 3],
    /// Feed channels as BGR instead of the frame's RGB.
    pub rgb_swap: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            input_width: 160,
            input_height: 120,
            mean: [0.0; 3],
            std: [1.0; 3],
            rgb_swap: true,
        }
    }
}

impl PreprocessConfig {
    fn buffer_len(&self) -> usize {
        self.input_width as usize * self.input_height as usize * CHANNELS
    }
}

/// Resized-image working memory reused across preprocessing calls.
///
/// Allocation is fallible: when it fails the buffer stays empty and the
/// preprocessor allocates per call instead.
pub struct ScratchBuffer {
    data: Option<Vec<u8>>,
}

impl ScratchBuffer {
    pub fn allocate(len: usize) -> Self {
        let mut data = Vec::new();
        match data.try_reserve_exact(len) {
            Ok(()) => {
                data.resize(len, 0);
                Self { data: Some(data) }
            }
            Err(e) => {
                log::warn!(
                    "Failed to allocate {len} byte preprocessing buffer ({e}), \
                     falling back to per-call allocation"
                );
                Self { data: None }
            }
        }
    }

    fn slice_of_len(&mut self, len: usize) -> Option<&mut [u8]> {
        self.data
            .as_mut()
            .filter(|d| d.len() == len)
            .map(|d| d.as_mut_slice())
    }
}

/// Nearest-neighbor resize to the model input, then per-channel
/// normalization into an NCHW float tensor.
pub struct ImagePreprocessor {
    config: PreprocessConfig,
    scratch: ScratchBuffer,
    scale: (f32, f32),
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig) -> Result<Self, DetectionError> {
        let scratch = ScratchBuffer::allocate(config.buffer_len());
        Self::with_scratch(config, scratch)
    }

    /// Uses `scratch` as working memory if it matches the input size.
    pub fn with_scratch(
        config: PreprocessConfig,
        scratch: ScratchBuffer,
    ) -> Result<Self, DetectionError> {
        if config.input_width == 0 || config.input_height == 0 {
            return Err(DetectionError::InvalidConfig(format!(
                "model input size must be non-zero, got {}x{}",
                config.input_width, config.input_height
            )));
        }
        if config.std.iter().any(|&s| s == 0.0) {
            return Err(DetectionError::InvalidConfig(
                "normalization std must be non-zero".into(),
            ));
        }
        Ok(Self {
            config,
            scratch,
            scale: (1.0, 1.0),
        })
    }
}

impl Preprocessor for ImagePreprocessor {
    fn preprocess(&mut self, frame: &Frame) -> Result<ModelInput, DetectionError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectionError::Preprocess(format!(
                "cannot preprocess an empty {}x{} frame",
                frame.width(),
                frame.height()
            )));
        }

        let dst_w = self.config.input_width as usize;
        let dst_h = self.config.input_height as usize;
        let len = self.config.buffer_len();

        let mut fallback;
        let resized = match self.scratch.slice_of_len(len) {
            Some(buf) => buf,
            None => {
                fallback = vec![0u8; len];
                fallback.as_mut_slice()
            }
        };
        resize_nearest(frame, resized, dst_w, dst_h);

        let order = if self.config.rgb_swap { [2, 1, 0] } else { [0, 1, 2] };
        let mut tensor = ModelInput::zeros((1, CHANNELS, dst_h, dst_w));
        for (i, px) in resized.chunks_exact(CHANNELS).enumerate() {
            let (y, x) = (i / dst_w, i % dst_w);
            for (c, &src_c) in order.iter().enumerate() {
                tensor[[0, c, y, x]] =
                    (px[src_c] as f32 - self.config.mean[c]) / self.config.std[c];
            }
        }

        self.scale = (
            dst_w as f32 / frame.width() as f32,
            dst_h as f32 / frame.height() as f32,
        );
        Ok(tensor)
    }

    fn resize_scale(&self) -> (f32, f32) {
        self.scale
    }
}

fn resize_nearest(frame: &Frame, dst: &mut [u8], dst_w: usize, dst_h: usize) {
    let src = frame.as_ndarray();
    let (src_h, src_w, _) = src.dim();

    for (i, px) in dst.chunks_exact_mut(CHANNELS).enumerate() {
        let (y, x) = (i / dst_w, i % dst_w);
        let src_y = (((y as f64 + 0.5) * src_h as f64 / dst_h as f64) as usize).min(src_h - 1);
        let src_x = (((x as f64 + 0.5) * src_w as f64 / dst_w as f64) as usize).min(src_w - 1);
        for (c, v) in px.iter_mut().enumerate() {
            *v = src[[src_y, src_x, c]];
        }
    }
}
