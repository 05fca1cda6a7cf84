/// Axis-aligned pixel rectangle, top-left origin.
///
/// `x + width` and `y + height` may run past the frame; every consumer
/// must go through [`Rectangle::clamp_to`] before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A rectangle already clipped to a frame, in unsigned pixel units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClampedRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersects the rectangle with a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when nothing of the rectangle is left, which callers
    /// treat as a pass-through rather than an error.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<ClampedRect> {
        let x0 = i64::from(self.x).max(0);
        let y0 = i64::from(self.y).max(0);
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(i64::from(frame_width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(i64::from(frame_height));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(ClampedRect {
            x: x0 as usize,
            y: y0 as usize,
            w: (x1 - x0) as usize,
            h: (y1 - y0) as usize,
        })
    }
}

impl ClampedRect {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}
