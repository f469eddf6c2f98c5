use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::region::Region;
use crate::transform::domain::region_transform::RegionTransform;

/// Fills the region with solid black.
pub struct BlackOut;

impl RegionTransform for BlackOut {
    fn name(&self) -> &'static str {
        "black-out"
    }

    fn apply(&self, frame: &mut Frame, region: &Region) {
        let r = region.normalized().clipped(frame.width(), frame.height());
        if r.is_empty() {
            return;
        }

        let (x1, x2) = (r.x1 as usize, r.x2 as usize);
        for y in r.y1 as usize..r.y2 as usize {
            let start = frame.offset(x1, y);
            let end = start + (x2 - x1) * CHANNELS;
            frame.data_mut()[start..end].fill(0);
        }
    }
}
