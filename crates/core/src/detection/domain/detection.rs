use crate::shared::region::Region;

/// A scored face bounding box in original image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Detector confidence, nominally in `[0, 1]`.
    pub score: f32,
    pub region: Region,
}

impl Detection {
    pub fn new(score: f32, region: Region) -> Self {
        Self { score, region }
    }
}
