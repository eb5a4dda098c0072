//! Change-point grouping of a momentary-loudness trace.
//!
//! Each sample is clipped to the gating floor; a jump larger than the
//! configured distance between consecutive gated samples opens a new group.
//!
//! ```text
//!   |gated(i) - gated(i-1)| > max_distance
//!   ┌──────────────────────────────────────┐
//!   │                                      ▼
//! ┌─────────┐                        ┌───────────┐
//! │ group g │                        │ group g+1 │
//! └─────────┘                        └───────────┘
//! ```

use tracing::debug;
use vseg_models::{GroupedLoudness, LoudnessLabel, LoudnessPoint, LoudnessSegment, TimeRange};

use crate::config::EngineConfig;

/// Grouped samples together with their collapsed segments.
#[derive(Debug, Clone, Default)]
pub struct LoudnessTrack {
    pub points: Vec<GroupedLoudness>,
    pub segments: Vec<LoudnessSegment>,
}

/// Streams loudness samples into change-point groups.
pub struct LoudnessSegmenter {
    floor: f64,
    max_distance: f64,
    points: Vec<GroupedLoudness>,
}

impl LoudnessSegmenter {
    pub fn new(floor: f64, max_distance: f64) -> Self {
        Self {
            floor,
            max_distance,
            points: Vec::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.gated_loudness_floor, config.max_loudness_distance)
    }

    /// Clip momentary loudness to the floor. `-inf` and NaN land on the floor.
    pub fn gate(&self, momentary_lufs: f64) -> f64 {
        momentary_lufs.max(self.floor)
    }

    /// Process one sample. Samples must arrive in timestamp order.
    ///
    /// A sample repeating the previous timestamp replaces it.
    pub fn ingest(&mut self, point: LoudnessPoint) {
        if let Some(last) = self.points.last() {
            if last.timestamp_ms == point.timestamp_ms {
                debug!(timestamp_ms = point.timestamp_ms, "Duplicate loudness timestamp, replacing");
                self.points.pop();
            }
        }

        let gated_lufs = self.gate(point.momentary_lufs);
        let group = match self.points.last() {
            None => 0,
            Some(prev) if (gated_lufs - prev.gated_lufs).abs() > self.max_distance => {
                prev.group + 1
            }
            Some(prev) => prev.group,
        };

        self.points.push(GroupedLoudness {
            timestamp_ms: point.timestamp_ms,
            momentary_lufs: point.momentary_lufs,
            gated_lufs,
            group,
        });
    }

    /// Finish the trace and collapse groups into segments.
    pub fn finalize(self) -> LoudnessTrack {
        let mut segments: Vec<LoudnessSegment> = Vec::new();
        let mut start = 0usize;

        for end in 1..=self.points.len() {
            let closes = end == self.points.len() || self.points[end].group != self.points[start].group;
            if closes {
                segments.push(self.collapse(&self.points[start..end]));
                start = end;
            }
        }

        LoudnessTrack {
            points: self.points,
            segments,
        }
    }

    fn collapse(&self, run: &[GroupedLoudness]) -> LoudnessSegment {
        let first = &run[0];
        let last = &run[run.len() - 1];
        let silent = run.iter().all(|p| p.gated_lufs <= self.floor);
        let mean_lufs = run.iter().map(|p| p.gated_lufs).sum::<f64>() / run.len() as f64;

        LoudnessSegment {
            group: first.group,
            label: if silent {
                LoudnessLabel::AbsoluteSilent
            } else {
                LoudnessLabel::Normal
            },
            time: TimeRange::new(first.timestamp_ms, last.timestamp_ms),
            mean_lufs,
        }
    }
}

/// Group and segment a whole trace in one call.
pub fn segment_loudness(points: &[LoudnessPoint], config: &EngineConfig) -> LoudnessTrack {
    let mut segmenter = LoudnessSegmenter::from_config(config);
    for point in points {
        segmenter.ingest(*point);
    }
    let track = segmenter.finalize();
    debug!(
        points = track.points.len(),
        segments = track.segments.len(),
        "Loudness trace segmented"
    );
    track
}
