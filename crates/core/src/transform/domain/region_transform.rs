use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for a destructive in-place transform over one region.
///
/// Implementations clip against the frame and never fail: geometry outside
/// the image is skipped, not reported.
pub trait RegionTransform: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn apply(&self, frame: &mut Frame, region: &Region);
}
