use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::region::Region;
use crate::transform::domain::region_transform::RegionTransform;

/// Block side as a percentage of the region's shorter side.
const BLOCK_PERCENT: i64 = 10;

/// Smallest block side.
const MIN_BLOCK_SIZE: i64 = 3;

/// Mosaic block side for a region whose shorter side is `min_dim`.
pub fn block_size(min_dim: i64) -> i64 {
    (min_dim * BLOCK_PERCENT / 100).max(MIN_BLOCK_SIZE)
}

/// Block-average mosaic.
///
/// Tiles the region with square blocks anchored at `(x1, y1)`. Trailing
/// blocks are cut at the region's far edges and at the frame border; cut-off
/// pixels take no part in the average and are not written.
pub struct Pixelate;

impl RegionTransform for Pixelate {
    fn name(&self) -> &'static str {
        "pixelate"
    }

    fn apply(&self, frame: &mut Frame, region: &Region) {
        let region = region.normalized();
        let visible = region.clipped(frame.width(), frame.height());
        if visible.is_empty() {
            return;
        }
        let size = block_size(region.min_dimension());

        let columns: Vec<_> = block_spans(region.x1, visible.x1, visible.x2, size).collect();
        for (y1, y2) in block_spans(region.y1, visible.y1, visible.y2, size) {
            for &(x1, x2) in &columns {
                fill_block_with_mean(frame, &Region::new(x1, y1, x2, y2));
            }
        }
    }
}

/// Block extents along one axis for a grid anchored at `anchor`, cut to the
/// visible span `[lo, hi)`. Blocks that lie wholly before `lo` are skipped.
fn block_spans(anchor: i32, lo: i32, hi: i32, size: i64) -> impl Iterator<Item = (i32, i32)> {
    let (anchor, lo, hi) = (anchor as i64, lo as i64, hi as i64);
    let first = anchor + (lo - anchor) / size * size;
    (first..hi)
        .step_by(size as usize)
        .map(move |start| (start.max(lo) as i32, (start + size).min(hi) as i32))
}

fn fill_block_with_mean(frame: &mut Frame, block: &Region) {
    let (x1, x2) = (block.x1 as usize, block.x2 as usize);
    let rows = block.y1 as usize..block.y2 as usize;

    let mut sums = [0u64; CHANNELS];
    for y in rows.clone() {
        let start = frame.offset(x1, y);
        let end = frame.offset(x2, y);
        for px in frame.data()[start..end].chunks_exact(CHANNELS) {
            sums[0] += px[0] as u64;
            sums[1] += px[1] as u64;
            sums[2] += px[2] as u64;
        }
    }

    let count = ((x2 - x1) * rows.len()) as u64;
    let mean = sums.map(|s| (s / count) as u8);

    for y in rows {
        let start = frame.offset(x1, y);
        let end = frame.offset(x2, y);
        for px in frame.data_mut()[start..end].chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&mean);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::color::Color;
    use rstest::rstest;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut frame = Frame::filled(width, height, Color::BLACK);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                frame.set_pixel(x, y, Color::new((x * 3) as u8, (y * 2) as u8, ((x + y) % 256) as u8));
            }
        }
        frame
    }

    fn block_mean(frame: &Frame, block: &Region) -> Color {
        let mut sums = [0u32; 3];
        let mut count = 0;
        for y in block.y1..block.y2 {
            for x in block.x1..block.x2 {
                let px = frame.pixel(x, y).to_array();
                for c in 0..3 {
                    sums[c] += px[c] as u32;
                }
                count += 1;
            }
        }
        Color::new(
            (sums[0] / count) as u8,
            (sums[1] / count) as u8,
            (sums[2] / count) as u8,
        )
    }

    #[rstest]
    #[case::tiny(5, 3)]
    #[case::floor(39, 3)]
    #[case::end_to_end_face(40, 4)]
    #[case::large(255, 25)]
    #[case::empty(0, 3)]
    #[case::beyond_i32(3_000_000_000, 300_000_000)]
    fn test_block_size(#[case] min_dim: i64, #[case] expected: i64) {
        assert_eq!(block_size(min_dim), expected);
    }

    #[test]
    fn test_uniform_field_is_unchanged() {
        let mut frame = Frame::filled(160, 120, Color::WHITE);
        let original = frame.clone();
        Pixelate.apply(&mut frame, &Region::new(50, 50, 90, 90));
        assert_eq!(frame, original);
    }

    #[test]
    fn test_full_blocks_are_uniform_truncated_means() {
        let original = gradient_frame(100, 100);
        let mut frame = original.clone();
        // min_dim 40 → blocks of 4, region splits into 10x10 full blocks
        let region = Region::new(20, 30, 60, 70);
        Pixelate.apply(&mut frame, &region);

        for by in (30..70).step_by(4) {
            for bx in (20..60).step_by(4) {
                let block = Region::new(bx, by, bx + 4, by + 4);
                let expected = block_mean(&original, &block);
                for y in block.y1..block.y2 {
                    for x in block.x1..block.x2 {
                        assert_eq!(frame.pixel(x, y), expected, "pixel ({x}, {y})");
                    }
                }
            }
        }
    }

    #[test]
    fn test_partial_block_stops_at_region_edge() {
        let original = gradient_frame(50, 50);
        let mut frame = original.clone();
        // 10x10 region, block size 3: last column/row of blocks is 1 pixel wide
        let region = Region::new(5, 5, 15, 15);
        Pixelate.apply(&mut frame, &region);

        let last = Region::new(14, 14, 15, 15);
        assert_eq!(frame.pixel(14, 14), block_mean(&original, &last));
        // nothing written past x2 / y2
        for i in 0..50 {
            assert_eq!(frame.pixel(15, i), original.pixel(15, i));
            assert_eq!(frame.pixel(i, 15), original.pixel(i, 15));
        }
    }

    #[test]
    fn test_block_clipped_at_frame_border_averages_visible_pixels_only() {
        let original = gradient_frame(20, 20);
        let mut frame = original.clone();
        // min_dim 40 → block 4; grid anchored at (-2, -2)
        let region = Region::new(-2, -2, 38, 38);
        Pixelate.apply(&mut frame, &region);

        // First block covers x,y in [-2, 2) → visible part is [0, 2)²
        let visible = Region::new(0, 0, 2, 2);
        let expected = block_mean(&original, &visible);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(frame.pixel(x, y), expected);
            }
        }
        // Next block starts at x = 2
        let next = Region::new(2, 0, 6, 2);
        assert_eq!(frame.pixel(2, 0), block_mean(&original, &next));
    }

    #[test]
    fn test_pixels_outside_region_unchanged() {
        let original = gradient_frame(60, 60);
        let mut frame = original.clone();
        Pixelate.apply(&mut frame, &Region::new(10, 10, 40, 40));
        for y in 0..60 {
            for x in 0..60 {
                if !(10..40).contains(&x) || !(10..40).contains(&y) {
                    assert_eq!(frame.pixel(x, y), original.pixel(x, y));
                }
            }
        }
    }

    #[test]
    fn test_grid_anchor_is_kept_when_leading_blocks_are_off_frame() {
        let original = gradient_frame(20, 20);
        let mut frame = original.clone();
        // min_dim 40 → block 4; grid anchored at (-10, -10), so the first
        // visible block spans [-2, 2) and is cut to [0, 2).
        Pixelate.apply(&mut frame, &Region::new(-10, -10, 30, 30));

        let expected = block_mean(&original, &Region::new(0, 0, 2, 2));
        assert_eq!(frame.pixel(0, 0), expected);
        assert_eq!(frame.pixel(1, 1), expected);
        assert_eq!(frame.pixel(2, 2), block_mean(&original, &Region::new(2, 2, 6, 6)));
    }

    #[rstest]
    #[case::huge(Region::new(0, 0, 300_000_000, 300_000_000))]
    #[case::full_i32_span(Region::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX))]
    fn test_huge_region_averages_whole_frame(#[case] region: Region) {
        let original = gradient_frame(16, 16);
        let mut frame = original.clone();
        Pixelate.apply(&mut frame, &region);

        let expected = block_mean(&original, &Region::new(0, 0, 16, 16));
        assert_eq!(frame, Frame::filled(16, 16, expected));
    }

    #[rstest]
    #[case::malformed(Region::new(30, 30, 10, 10))]
    #[case::outside(Region::new(100, 100, 140, 140))]
    #[case::empty(Region::new(10, 10, 10, 30))]
    fn test_degenerate_regions_are_noop(#[case] region: Region) {
        let original = gradient_frame(50, 50);
        let mut frame = original.clone();
        Pixelate.apply(&mut frame, &region);
        assert_eq!(frame, original);
    }
}
