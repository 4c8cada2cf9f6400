//! Axis-Aligned Geometry
//!
//! Pure bounding-box overlap and clamping. Positions are top-left corners
//! in integer canvas pixels.

/// An axis-aligned box: top-left corner plus width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aabb {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub w: i32,
    /// Height.
    pub h: i32,
}

impl Aabb {
    /// Build a square box of the given side length.
    pub const fn square(x: i32, y: i32, size: i32) -> Self {
        Self { x, y, w: size, h: size }
    }
}

/// Check whether two boxes intersect.
///
/// Strict comparisons on all four axes: boxes that merely share an edge
/// do not overlap.
#[inline]
pub fn overlaps(a: Aabb, b: Aabb) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Clamp a coordinate so a box of `size` stays inside `[0, max]`.
#[inline]
pub fn clamp_axis(pos: i32, size: i32, max: i32) -> i32 {
    pos.min(max - size).max(0)
}
