//! Closed time and frame ranges.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed millisecond range `[start_ms, end_ms]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct TimeRange {
    /// First instant covered (inclusive).
    pub start_ms: u64,
    /// Last instant covered (inclusive).
    pub end_ms: u64,
}

impl TimeRange {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Single-instant range.
    pub fn at(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms, timestamp_ms)
    }

    /// Duration of this range in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Whether `start_ms <= end_ms`.
    pub fn is_ordered(&self) -> bool {
        self.start_ms <= self.end_ms
    }
}

/// Closed frame-number range `[first, last]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FrameRange {
    pub first: u64,
    pub last: u64,
}

impl FrameRange {
    pub fn new(first: u64, last: u64) -> Self {
        Self { first, last }
    }

    pub fn is_ordered(&self) -> bool {
        self.first <= self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_saturates() {
        assert_eq!(TimeRange::new(1000, 4000).duration_ms(), 3000);
        assert_eq!(TimeRange::new(4000, 1000).duration_ms(), 0);
        assert!(!TimeRange::new(4000, 1000).is_ordered());
    }

    #[test]
    fn test_frame_range_order() {
        assert!(FrameRange::new(10, 20).is_ordered());
        assert!(FrameRange::new(20, 20).is_ordered());
        assert!(!FrameRange::new(21, 20).is_ordered());
    }
}
