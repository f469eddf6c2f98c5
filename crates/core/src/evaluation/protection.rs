//! Offline measurement of how well anonymization defeats face recognition.
//!
//! Embeddings come from an external recognizer run on both the original
//! and the anonymized image. A face counts as protected unless its
//! anonymized counterpart still matches it.

use std::fmt;

use crate::shared::region::Region;

/// Maximum distance between box centers for two faces to be paired (px).
pub const MATCH_DISTANCE_PX: f64 = 50.0;

/// Cosine similarity above which a paired face is still recognized.
pub const RECOGNITION_THRESHOLD: f32 = 0.7;

/// A face box with its recognition embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceEmbedding {
    pub region: Region,
    pub vector: Vec<f32>,
}

/// Cosine similarity of two embeddings; 0 when lengths differ or a vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtectionStatus {
    Excellent,
    Good,
    Moderate,
    Poor,
    Failed,
}

impl ProtectionStatus {
    /// Grades a protection rate given in percent.
    pub fn from_rate(rate: f64) -> Self {
        match rate {
            r if r >= 95.0 => Self::Excellent,
            r if r >= 80.0 => Self::Good,
            r if r >= 60.0 => Self::Moderate,
            r if r >= 30.0 => Self::Poor,
            _ => Self::Failed,
        }
    }
}

impl fmt::Display for ProtectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
            Self::Failed => "failed",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProtectionReport {
    pub original_faces: usize,
    pub anonymized_faces: usize,
    /// Original faces paired with a face in the anonymized image.
    pub matched: usize,
    /// Paired faces whose embeddings still match.
    pub recognized: usize,
    /// Percentage of original faces that were not recognized.
    pub protection_rate: f64,
}

impl ProtectionReport {
    pub fn status(&self) -> ProtectionStatus {
        ProtectionStatus::from_rate(self.protection_rate)
    }
}

/// Compares the faces found before and after anonymization.
///
/// Each original face is paired with the nearest anonymized face whose box
/// center lies within [`MATCH_DISTANCE_PX`]. Unpaired faces count as
/// protected. No face left in the anonymized image yields 100, even when
/// the original had none; otherwise no original faces yields 0.
pub fn evaluate(original: &[FaceEmbedding], anonymized: &[FaceEmbedding]) -> ProtectionReport {
    let mut matched = 0;
    let mut recognized = 0;

    for face in original {
        let Some(counterpart) = nearest_within(face, anonymized, MATCH_DISTANCE_PX) else {
            continue;
        };
        matched += 1;
        let similarity = cosine_similarity(&face.vector, &counterpart.vector);
        log::debug!(
            "Face at {:?} paired, similarity {similarity:.3}",
            face.region
        );
        if similarity > RECOGNITION_THRESHOLD {
            recognized += 1;
        }
    }

    let protection_rate = if anonymized.is_empty() {
        100.0
    } else if original.is_empty() {
        0.0
    } else {
        (original.len() - recognized) as f64 / original.len() as f64 * 100.0
    };

    ProtectionReport {
        original_faces: original.len(),
        anonymized_faces: anonymized.len(),
        matched,
        recognized,
        protection_rate,
    }
}

/// Mean protection rate over several methods or images, `None` if empty.
pub fn average_rate(reports: &[ProtectionReport]) -> Option<f64> {
    if reports.is_empty() {
        return None;
    }
    Some(reports.iter().map(|r| r.protection_rate).sum::<f64>() / reports.len() as f64)
}

fn nearest_within<'a>(
    face: &FaceEmbedding,
    candidates: &'a [FaceEmbedding],
    max_distance: f64,
) -> Option<&'a FaceEmbedding> {
    let (fx, fy) = face.region.center();
    candidates
        .iter()
        .map(|c| {
            let (cx, cy) = c.region.center();
            (c, (cx - fx).hypot(cy - fy))
        })
        .filter(|(_, d)| *d < max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}
