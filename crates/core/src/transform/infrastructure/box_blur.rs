use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::region::Region;
use crate::transform::domain::region_transform::RegionTransform;

/// Number of full passes over the region.
pub const DEFAULT_ITERATIONS: usize = 3;

/// Blur radius as a percentage of the region's shorter side.
const RADIUS_PERCENT: i64 = 15;

/// Smallest radius applied to any region, so small faces are still obscured.
const MIN_RADIUS: i64 = 15;

/// Window radius for a region whose shorter side is `min_dim`.
///
/// 15% of `min_dim`, raised to [`MIN_RADIUS`], then capped at a third of
/// `min_dim`. The cap wins when the two bounds disagree.
pub fn blur_radius(min_dim: i64) -> i64 {
    let radius = (min_dim * RADIUS_PERCENT / 100).max(MIN_RADIUS);
    radius.min(min_dim / 3).max(0)
}

/// Iterated box blur with a radius adapted to the region size.
///
/// Each pass walks the region row by row and replaces every pixel with the
/// mean of its square window, reading the buffer as already rewritten by the
/// current pass. The result therefore depends on the visiting order, which
/// is kept strictly row-major for reproducible output.
pub struct BoxBlur {
    iterations: usize,
}

impl BoxBlur {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }
}

impl Default for BoxBlur {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl RegionTransform for BoxBlur {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn apply(&self, frame: &mut Frame, region: &Region) {
        let region = region.normalized();
        let radius = blur_radius(region.min_dimension());

        // Centers outside the frame are never written, so only the visible
        // part of the region needs visiting.
        let visible = region.clipped(frame.width(), frame.height());
        if visible.is_empty() {
            return;
        }

        for _ in 0..self.iterations {
            blur_pass(frame, &visible, radius);
        }
    }
}

fn blur_pass(frame: &mut Frame, visible: &Region, radius: i64) {
    let max_x = frame.width() as i64 - 1;
    let max_y = frame.height() as i64 - 1;

    for y in visible.y1..visible.y2 {
        let wy1 = (y as i64 - radius).max(0);
        let wy2 = (y as i64 + radius).min(max_y);
        for x in visible.x1..visible.x2 {
            let wx1 = (x as i64 - radius).max(0);
            let wx2 = (x as i64 + radius).min(max_x);

            let mut sums = [0u64; CHANNELS];
            for wy in wy1..=wy2 {
                let start = frame.offset(wx1 as usize, wy as usize);
                let end = frame.offset(wx2 as usize, wy as usize) + CHANNELS;
                for px in frame.data()[start..end].chunks_exact(CHANNELS) {
                    sums[0] += px[0] as u64;
                    sums[1] += px[1] as u64;
                    sums[2] += px[2] as u64;
                }
            }

            let count = ((wx2 - wx1 + 1) * (wy2 - wy1 + 1)) as u64;
            let i = frame.offset(x as usize, y as usize);
            let data = frame.data_mut();
            for c in 0..CHANNELS {
                data[i + c] = (sums[c] / count) as u8;
            }
        }
    }
}
