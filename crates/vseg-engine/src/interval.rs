//! Closed-interval primitives shared by every stage.

use vseg_models::{FrameRange, TimeRange};

/// A closed `[lo, hi]` interval over `u64`.
pub trait Interval {
    fn bounds(&self) -> (u64, u64);
}

impl Interval for TimeRange {
    fn bounds(&self) -> (u64, u64) {
        (self.start_ms, self.end_ms)
    }
}

impl Interval for FrameRange {
    fn bounds(&self) -> (u64, u64) {
        (self.first, self.last)
    }
}

impl Interval for (u64, u64) {
    fn bounds(&self) -> (u64, u64) {
        *self
    }
}

/// Whether `a` and `b` share an instant.
///
/// With `inclusive_touch == false` only positive-length overlap counts, so two
/// ranges meeting at a single boundary instant do not intersect. A degenerate
/// (single-instant) range still intersects a range that strictly surrounds it.
pub fn intersects<A: Interval, B: Interval>(a: &A, b: &B, inclusive_touch: bool) -> bool {
    let (a0, a1) = a.bounds();
    let (b0, b1) = b.bounds();
    if inclusive_touch {
        a0 <= b1 && b0 <= a1
    } else {
        a0 < b1 && b0 < a1
    }
}

/// Whether `inner` lies entirely within `outer`.
pub fn contains<A: Interval, B: Interval>(outer: &A, inner: &B) -> bool {
    let (o0, o1) = outer.bounds();
    let (i0, i1) = inner.bounds();
    o0 <= i0 && i1 <= o1
}
