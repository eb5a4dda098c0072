//! Loudness trace models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::range::TimeRange;

/// One momentary-loudness sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoudnessPoint {
    pub timestamp_ms: u64,
    /// Momentary loudness in LUFS. May be `-inf` for digital silence.
    pub momentary_lufs: f64,
}

impl LoudnessPoint {
    pub fn new(timestamp_ms: u64, momentary_lufs: f64) -> Self {
        Self {
            timestamp_ms,
            momentary_lufs,
        }
    }
}

/// A loudness sample annotated with its change-point group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupedLoudness {
    pub timestamp_ms: u64,
    pub momentary_lufs: f64,
    /// Momentary loudness clipped to the gating floor.
    pub gated_lufs: f64,
    /// Zero-based, non-decreasing group index.
    pub group: usize,
}

/// Coarse classification of a loudness segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoudnessLabel {
    /// Gated loudness sits on the floor for the whole segment.
    AbsoluteSilent,
    Normal,
}

/// Consecutive same-group samples collapsed into a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoudnessSegment {
    pub group: usize,
    pub label: LoudnessLabel,
    pub time: TimeRange,
    /// Mean gated loudness over the segment.
    pub mean_lufs: f64,
}

impl LoudnessSegment {
    pub fn is_silent(&self) -> bool {
        self.label == LoudnessLabel::AbsoluteSilent
    }
}

/// Silent and audible time across a set of loudness segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoudnessSummary {
    pub silent_ms: u64,
    pub normal_ms: u64,
    pub silent_segments: usize,
    pub normal_segments: usize,
}

impl LoudnessSummary {
    pub fn from_segments(segments: &[LoudnessSegment]) -> Self {
        segments.iter().fold(Self::default(), |mut acc, segment| {
            let span = segment.time.duration_ms();
            if segment.is_silent() {
                acc.silent_ms += span;
                acc.silent_segments += 1;
            } else {
                acc.normal_ms += span;
                acc.normal_segments += 1;
            }
            acc
        })
    }

    /// Share of covered time that is silent; 0 when nothing is covered.
    pub fn silent_ratio(&self) -> f64 {
        match self.silent_ms + self.normal_ms {
            0 => 0.0,
            total => self.silent_ms as f64 / total as f64,
        }
    }
}
