/// An axis-aligned rectangle `[x1, x2) × [y1, y2)` in image coordinates.
///
/// The upper bounds are exclusive. A region may extend past the image; every
/// consumer clips against the frame instead of rejecting it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Region {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Widened to `i64` so that spans across the whole `i32` range fit.
    pub fn width(&self) -> i64 {
        self.x2 as i64 - self.x1 as i64
    }

    pub fn height(&self) -> i64 {
        self.y2 as i64 - self.y1 as i64
    }

    /// The shorter side, which drives every adaptive transform parameter.
    pub fn min_dimension(&self) -> i64 {
        self.width().min(self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    pub fn is_malformed(&self) -> bool {
        self.x1 > self.x2 || self.y1 > self.y2
    }

    /// Collapses inverted bounds to an empty region anchored at `(x1, y1)`.
    ///
    /// Well-formed regions come back unchanged.
    pub fn normalized(&self) -> Region {
        if !self.is_malformed() {
            return *self;
        }
        log::debug!(
            "Clamping malformed region ({}, {}, {}, {}) to empty",
            self.x1,
            self.y1,
            self.x2,
            self.y2
        );
        Region {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2.max(self.x1),
            y2: self.y2.max(self.y1),
        }
    }

    /// Intersection with a `width × height` image. May be empty.
    pub fn clipped(&self, width: u32, height: u32) -> Region {
        let w = width.min(i32::MAX as u32) as i32;
        let h = height.min(i32::MAX as u32) as i32;
        let x1 = self.x1.clamp(0, w);
        let y1 = self.y1.clamp(0, h);
        Region {
            x1,
            y1,
            x2: self.x2.clamp(x1, w),
            y2: self.y2.clamp(y1, h),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 as f64 + self.x2 as f64) / 2.0,
            (self.y1 as f64 + self.y2 as f64) / 2.0,
        )
    }
}
