/// Integer pixel rectangle used by surface-to-surface copies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub x: i64,
    /// Top edge in pixels.
    pub y: i64,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl PixelRect {
    /// Construct a rectangle from origin and size.
    pub fn new(x: i64, y: i64, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin covering `w x h`.
    pub fn from_size(w: u32, h: u32) -> Self {
        Self::new(0, 0, w, h)
    }

    /// Return `true` when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Exclusive right edge.
    pub fn right(self) -> i64 {
        self.x.saturating_add(i64::from(self.w))
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i64 {
        self.y.saturating_add(i64::from(self.h))
    }

    /// Intersection of two rectangles. Disjoint inputs yield an empty rectangle.
    pub fn intersect(self, other: Self) -> Self {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return Self::new(x0, y0, 0, 0);
        }
        Self::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32)
    }

    /// Shift the origin by `(dx, dy)`.
    pub fn translate(self, dx: i64, dy: i64) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.w,
            self.h,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
