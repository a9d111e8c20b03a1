use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid bounding box ({left}, {top})-({right}, {bottom}): corners must be strictly ordered")]
pub struct BoundingBoxError {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// An axis-aligned pixel box covering `[left, right) x [top, bottom)`.
///
/// Immutable once built; the constructor enforces `left < right` and
/// `top < bottom`, so every box covers at least one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Result<Self, BoundingBoxError> {
        if left >= right || top >= bottom {
            return Err(BoundingBoxError {
                left,
                top,
                right,
                bottom,
            });
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn from_corners(
        top_left: (i32, i32),
        bottom_right: (i32, i32),
    ) -> Result<Self, BoundingBoxError> {
        Self::new(top_left.0, top_left.1, bottom_right.0, bottom_right.1)
    }

    pub fn top_left(&self) -> (i32, i32) {
        (self.left, self.top)
    }

    pub fn bottom_right(&self) -> (i32, i32) {
        (self.right, self.bottom)
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Intersection with the `[0, width) x [0, height)` frame rectangle,
    /// or `None` when the box lies entirely outside it.
    pub fn clip(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let left = self.left.max(0);
        let top = self.top.max(0);
        let right = self.right.min(width as i32);
        let bottom = self.bottom.min(height as i32);
        BoundingBox::new(left, top, right, bottom).ok()
    }

    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        BoundingBox::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
        .ok()
    }
}
