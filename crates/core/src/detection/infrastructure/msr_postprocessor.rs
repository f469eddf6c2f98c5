use ndarray::{ArrayD, ArrayView4, Ix4};

use crate::detection::domain::detection::Detection;
use crate::detection::domain::detector_stages::{ModelOutputs, Postprocessor};
use crate::detection::domain::face_detector::DetectionError;
use crate::shared::region::Region;

use super::nms::{greedy_nms, Candidate};

/// Anchor geometry of one detection head.
///
/// Cell `(x, y)` of the head's feature map has its anchor center at
/// `(x * stride_x + offset_x, y * stride_y + offset_y)` in model input pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorStage {
    pub stride_y: u32,
    pub stride_x: u32,
    pub offset_y: u32,
    pub offset_x: u32,
    /// `(height, width)` of each anchor placed on every cell.
    pub anchor_shapes: Vec<(u32, u32)>,
}

impl AnchorStage {
    pub fn new(
        stride_y: u32,
        stride_x: u32,
        offset_y: u32,
        offset_x: u32,
        anchor_shapes: Vec<(u32, u32)>,
    ) -> Self {
        Self {
            stride_y,
            stride_x,
            offset_y,
            offset_x,
            anchor_shapes,
        }
    }
}

/// Two heads: stride 8 with 16/32 px anchors, stride 16 with 64/128 px anchors.
pub fn default_anchor_stages() -> Vec<AnchorStage> {
    vec![
        AnchorStage::new(8, 8, 9, 9, vec![(16, 16), (32, 32)]),
        AnchorStage::new(16, 16, 9, 9, vec![(64, 64), (128, 128)]),
    ]
}

/// Decoder for multi-scale-region (MSR) face detection heads.
///
/// Expects two outputs per anchor stage, in stage order: a score map
/// `[1, H, W, A]` of logits and a box map `[1, H, W, A * 4]` of
/// `(x1, y1, x2, y2)` offsets in anchor units.
pub struct MsrPostprocessor {
    stages: Vec<AnchorStage>,
    score_threshold: f32,
    nms_threshold: f32,
    top_k: usize,
    scale: (f32, f32),
    boxes: Vec<Candidate>,
}

impl MsrPostprocessor {
    pub fn new(stages: Vec<AnchorStage>, score_threshold: f32, nms_threshold: f32, top_k: usize) -> Self {
        Self {
            stages,
            score_threshold,
            nms_threshold,
            top_k,
            scale: (1.0, 1.0),
            boxes: Vec::new(),
        }
    }

    fn decode_stage(
        &self,
        stage: &AnchorStage,
        scores: ArrayView4<f32>,
        deltas: ArrayView4<f32>,
        out: &mut Vec<Candidate>,
    ) {
        let (_, rows, cols, anchors) = scores.dim();
        for y in 0..rows {
            let cy = (y as u32 * stage.stride_y + stage.offset_y) as f64;
            for x in 0..cols {
                let cx = (x as u32 * stage.stride_x + stage.offset_x) as f64;
                for a in 0..anchors {
                    let score = sigmoid(scores[[0, y, x, a]]);
                    if score <= self.score_threshold {
                        continue;
                    }
                    let (ah, aw) = stage.anchor_shapes[a];
                    let (ah, aw) = (ah as f64, aw as f64);
                    let d = |i: usize| deltas[[0, y, x, a * 4 + i]] as f64;
                    out.push(Candidate {
                        score,
                        bbox: [
                            cx - aw / 2.0 + d(0) * aw,
                            cy - ah / 2.0 + d(1) * ah,
                            cx + aw / 2.0 + d(2) * aw,
                            cy + ah / 2.0 + d(3) * ah,
                        ],
                    });
                }
            }
        }
    }
}

impl Postprocessor for MsrPostprocessor {
    fn clear_result(&mut self) {
        self.boxes.clear();
    }

    fn set_resize_scale(&mut self, scale_x: f32, scale_y: f32) {
        self.scale = (scale_x, scale_y);
    }

    fn postprocess(&mut self, outputs: &ModelOutputs) -> Result<(), DetectionError> {
        let expected = self.stages.len() * 2;
        if outputs.len() != expected {
            return Err(DetectionError::Postprocess(format!(
                "expected {expected} model outputs, got {}",
                outputs.len()
            )));
        }

        let mut candidates = std::mem::take(&mut self.boxes);
        for (i, stage) in self.stages.iter().enumerate() {
            let scores = as_nhwc(&outputs[i * 2], "score")?;
            let deltas = as_nhwc(&outputs[i * 2 + 1], "box")?;
            check_stage_shapes(i, stage, scores, deltas)?;
            self.decode_stage(stage, scores, deltas, &mut candidates);
        }

        self.boxes = greedy_nms(candidates, self.nms_threshold as f64, self.top_k);
        Ok(())
    }

    fn result(&self, width: u32, height: u32) -> Vec<Detection> {
        let (sx, sy) = (self.scale.0 as f64, self.scale.1 as f64);
        let clamp_x = |v: f64| (v / sx).round().clamp(0.0, width as f64) as i32;
        let clamp_y = |v: f64| (v / sy).round().clamp(0.0, height as f64) as i32;

        self.boxes
            .iter()
            .map(|c| {
                Detection::new(
                    c.score,
                    Region::new(
                        clamp_x(c.bbox[0]),
                        clamp_y(c.bbox[1]),
                        clamp_x(c.bbox[2]),
                        clamp_y(c.bbox[3]),
                    ),
                )
            })
            .collect()
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn as_nhwc<'a>(output: &'a ArrayD<f32>, kind: &str) -> Result<ArrayView4<'a, f32>, DetectionError> {
    output.view().into_dimensionality::<Ix4>().map_err(|_| {
        DetectionError::Postprocess(format!(
            "{kind} output must be 4-D NHWC, got shape {:?}",
            output.shape()
        ))
    })
}

fn check_stage_shapes(
    index: usize,
    stage: &AnchorStage,
    scores: ArrayView4<f32>,
    deltas: ArrayView4<f32>,
) -> Result<(), DetectionError> {
    let (_, rows, cols, anchors) = scores.dim();
    let (_, box_rows, box_cols, box_channels) = deltas.dim();
    if anchors != stage.anchor_shapes.len() {
        return Err(DetectionError::Postprocess(format!(
            "stage {index}: score map has {anchors} anchors per cell, expected {}",
            stage.anchor_shapes.len()
        )));
    }
    if (box_rows, box_cols, box_channels) != (rows, cols, anchors * 4) {
        return Err(DetectionError::Postprocess(format!(
            "stage {index}: box map shape {:?} does not match score map {:?}",
            deltas.shape(),
            scores.shape()
        )));
    }
    Ok(())
}
