use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;
use crate::transform::domain::region_transform::RegionTransform;

/// Applies one region transform to every detection of a frame.
pub struct Anonymizer {
    transform: Box<dyn RegionTransform>,
}

impl Anonymizer {
    pub fn new(transform: Box<dyn RegionTransform>) -> Self {
        Self { transform }
    }

    pub fn method(&self) -> &'static str {
        self.transform.name()
    }

    /// Transforms each detection's box in list order. Overlapping boxes see
    /// the output of earlier ones.
    pub fn anonymize(&self, frame: &mut Frame, detections: &[Detection]) {
        for detection in detections {
            let r = detection.region;
            log::info!(
                "[score: {:.6}, x1: {}, y1: {}, x2: {}, y2: {}]",
                detection.score,
                r.x1,
                r.y1,
                r.x2,
                r.y2
            );
            self.transform.apply(frame, &r);
        }
    }
}
