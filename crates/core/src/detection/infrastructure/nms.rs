//! Greedy non-maximum suppression over scored boxes.

/// A decoded box in model-input coordinates, `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub score: f32,
    pub bbox: [f64; 4],
}

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Keeps the highest-scoring boxes, dropping any box whose IoU with an
/// already kept box exceeds `iou_threshold`. Stops after `top_k` boxes.
///
/// Output is sorted by descending score; ties keep their input order.
pub fn greedy_nms(mut candidates: Vec<Candidate>, iou_threshold: f64, top_k: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::with_capacity(top_k.min(candidates.len()));
    for candidate in candidates {
        if kept.len() >= top_k {
            break;
        }
        if kept
            .iter()
            .all(|k| bbox_iou(&k.bbox, &candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
