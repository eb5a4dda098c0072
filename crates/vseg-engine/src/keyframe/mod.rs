//! Representative keyframe sampling per shot.
//!
//! # Policies
//!
//! | cue | policy |
//! |---|---|
//! | `Steady` | single sharpest frame |
//! | `Credits` | fixed-rate, one frame per sampling interval |
//! | `Opening` / `Content` / `Unknown` | scan-select within `duration / interval` budget |
//!
//! # Scan-select
//!
//! 1. Keep the first and last frame of the shot.
//! 2. Seed on the sharpest interior frame.
//! 3. Scan forward and backward from the seed, keeping each frame whose hash
//!    distance to the last kept frame exceeds the threshold.
//! 4. If the candidates overflow the budget, keep the sharpest ones.
//! 5. Re-sort by timestamp and merge with the boundary frames.
//!
//! Without shot segmentation, frames are split into fixed windows and each
//! window is sampled on its own.

pub mod hash;

use tracing::debug;
use vseg_models::{Frame, FrameRange, LoudnessSegment, ShotSegment, TechnicalCue, TimeRange};

use crate::config::EngineConfig;
use crate::interval::contains;
use crate::tasks::IdempotentStep;

pub use hash::HashDistance;

/// Sampling strategy for one run of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// One witness frame.
    Steady,
    /// One frame per `interval_ms`, always including the first.
    FixedRate { interval_ms: u64 },
    /// Boundary frames plus hash-diverse interior frames up to `budget`.
    ScanSelect { budget: usize },
}

/// Frame budget for a span: `max(round(duration / interval), 1)`.
pub fn frame_budget(duration_ms: u64, interval_ms: u64) -> usize {
    if interval_ms == 0 {
        return 1;
    }
    ((duration_ms as f64 / interval_ms as f64).round() as usize).max(1)
}

/// Frames whose frame number lies inside `range`. `frames` must be sorted.
pub fn frames_in_range(frames: &[Frame], range: FrameRange) -> &[Frame] {
    let lo = frames.partition_point(|f| f.frame_num < range.first);
    let hi = frames.partition_point(|f| f.frame_num <= range.last);
    if lo >= hi {
        return &[];
    }
    &frames[lo..hi]
}

/// Index of the sharpest frame; ties go to the earliest.
fn sharpest_index(frames: &[Frame]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, frame) in frames.iter().enumerate() {
        match best {
            Some(b) if frames[b].sharpness >= frame.sharpness => {}
            _ => best = Some(i),
        }
    }
    best
}

/// A fallback window produced when no shot segmentation exists.
#[derive(Debug, Clone)]
pub struct FrameWindow {
    pub frames: FrameRange,
    pub time: TimeRange,
    pub selected: Vec<Frame>,
}

/// Chooses representative frames for shots or fallback windows.
#[derive(Debug, Clone)]
pub struct KeyframeSelector {
    sampling_interval_ms: u64,
    threshold: f64,
    split_interval_ms: u64,
    collapse_silent_unknown: bool,
    hasher: HashDistance,
}

impl KeyframeSelector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            sampling_interval_ms: config.sampling_interval_ms,
            threshold: config.hamming_distance_threshold,
            split_interval_ms: config.split_interval_ms,
            collapse_silent_unknown: config.collapse_silent_unknown_shots,
            hasher: HashDistance::new(&config.canonical_hashes),
        }
    }

    /// Policy for a shot, given the asset's loudness segments.
    pub fn policy_for_shot(&self, shot: &ShotSegment, loudness: &[LoudnessSegment]) -> SamplingPolicy {
        match shot.cue {
            TechnicalCue::Steady => SamplingPolicy::Steady,
            TechnicalCue::Credits => SamplingPolicy::FixedRate {
                interval_ms: self.sampling_interval_ms,
            },
            TechnicalCue::Unknown if self.collapse_silent_unknown && is_silent(shot, loudness) => {
                debug!(shot = shot.index, "Unknown shot is silent, sampling as steady");
                SamplingPolicy::Steady
            }
            TechnicalCue::Opening | TechnicalCue::Content | TechnicalCue::Unknown => {
                SamplingPolicy::ScanSelect {
                    budget: frame_budget(shot.time.duration_ms(), self.sampling_interval_ms),
                }
            }
        }
    }

    /// Select representative frames for one shot out of the asset's frames.
    pub fn select_for_shot(
        &self,
        shot: &ShotSegment,
        frames: &[Frame],
        loudness: &[LoudnessSegment],
    ) -> Vec<Frame> {
        let shot_frames = frames_in_range(frames, shot.frames);
        if shot_frames.is_empty() {
            debug!(shot = shot.index, "Shot has no frames");
            return Vec::new();
        }

        let policy = self.policy_for_shot(shot, loudness);
        let selected = self.apply(policy, shot_frames);
        debug!(
            shot = shot.index,
            cue = %shot.cue,
            ?policy,
            frames = shot_frames.len(),
            selected = selected.len(),
            "Shot sampled"
        );
        selected
    }

    /// Run `policy` over a timestamp-ordered run of frames.
    pub fn apply(&self, policy: SamplingPolicy, frames: &[Frame]) -> Vec<Frame> {
        match policy {
            SamplingPolicy::Steady => sharpest_index(frames)
                .map(|i| vec![frames[i].clone()])
                .unwrap_or_default(),
            SamplingPolicy::FixedRate { interval_ms } => fixed_rate(frames, interval_ms),
            SamplingPolicy::ScanSelect { budget } => self.scan_select(frames, budget),
        }
    }

    fn scan_select(&self, frames: &[Frame], budget: usize) -> Vec<Frame> {
        if frames.len() <= 2 {
            return frames.to_vec();
        }

        let first = &frames[0];
        let last = &frames[frames.len() - 1];
        let interior = &frames[1..frames.len() - 1];

        if interior.len() <= 2 || budget <= 2 {
            debug!(
                interior = interior.len(),
                budget, "Interior budget exhausted, keeping boundary frames"
            );
            return vec![first.clone(), last.clone()];
        }
        let Some(seed) = sharpest_index(interior) else {
            return vec![first.clone(), last.clone()];
        };
        let remaining = budget - 2;

        let mut picked = vec![seed];
        let mut anchor = seed;
        for i in seed + 1..interior.len() {
            if self.is_distinct(&interior[anchor], &interior[i]) {
                picked.push(i);
                anchor = i;
            }
        }
        anchor = seed;
        for i in (0..seed).rev() {
            if self.is_distinct(&interior[anchor], &interior[i]) {
                picked.push(i);
                anchor = i;
            }
        }

        if picked.len() > remaining {
            picked.sort_by(|a, b| {
                interior[*b]
                    .sharpness
                    .total_cmp(&interior[*a].sharpness)
                    .then(a.cmp(b))
            });
            picked.truncate(remaining);
        }
        picked.sort_unstable();

        let mut selected = Vec::with_capacity(picked.len() + 2);
        selected.push(first.clone());
        selected.extend(picked.into_iter().map(|i| interior[i].clone()));
        selected.push(last.clone());
        selected
    }

    fn is_distinct(&self, kept: &Frame, candidate: &Frame) -> bool {
        self.hasher
            .distance(&kept.perceptual_hash, &candidate.perceptual_hash)
            > self.threshold
    }

    /// Sample the whole asset in fixed windows when no shots are available.
    pub fn select_windowed(&self, frames: &[Frame]) -> Vec<FrameWindow> {
        let Some(origin) = frames.first().map(|f| f.timestamp_ms) else {
            return Vec::new();
        };
        let split = self.split_interval_ms.max(1);
        let bucket_of = |f: &Frame| f.timestamp_ms.saturating_sub(origin) / split;

        let mut runs: Vec<&[Frame]> = Vec::new();
        let mut start = 0;
        while start < frames.len() {
            let bucket = bucket_of(&frames[start]);
            let len = frames[start..].partition_point(|f| bucket_of(f) == bucket);
            runs.push(&frames[start..start + len]);
            start += len;
        }

        let mut windows = Vec::with_capacity(runs.len());
        for (i, run) in runs.iter().enumerate() {
            let first = &run[0];
            let last = &run[run.len() - 1];
            let policy = if run.len() < 2 {
                SamplingPolicy::Steady
            } else {
                SamplingPolicy::ScanSelect {
                    budget: frame_budget(
                        last.timestamp_ms - first.timestamp_ms,
                        self.sampling_interval_ms,
                    ),
                }
            };
            // Windows meet at the next window's first frame so the timeline has no gaps.
            let end_ms = runs
                .get(i + 1)
                .map_or(last.timestamp_ms, |next| next[0].timestamp_ms);

            windows.push(FrameWindow {
                frames: FrameRange::new(first.frame_num, last.frame_num),
                time: TimeRange::new(first.timestamp_ms, end_ms),
                selected: self.apply(policy, run),
            });
        }

        debug!(windows = windows.len(), "Frames sampled in fallback windows");
        windows
    }
}

fn fixed_rate(frames: &[Frame], interval_ms: u64) -> Vec<Frame> {
    let mut selected: Vec<Frame> = Vec::new();
    for frame in frames {
        let keep = match selected.last() {
            None => true,
            Some(kept) => frame.timestamp_ms.saturating_sub(kept.timestamp_ms) >= interval_ms,
        };
        if keep {
            selected.push(frame.clone());
        }
    }
    selected
}

fn is_silent(shot: &ShotSegment, loudness: &[LoudnessSegment]) -> bool {
    loudness
        .iter()
        .any(|segment| segment.is_silent() && contains(&segment.time, &shot.time))
}

/// Per-shot selection as a resumable step.
///
/// A slot that already holds a selection is left alone.
pub struct ShotSelectionStep<'a> {
    pub selector: &'a KeyframeSelector,
    pub shots: &'a [ShotSegment],
    pub frames: &'a [Frame],
    pub loudness: &'a [LoudnessSegment],
}

impl IdempotentStep for ShotSelectionStep<'_> {
    type Output = Vec<Frame>;

    fn run(&self, index: usize, prior: Option<&Vec<Frame>>) -> Option<Vec<Frame>> {
        if prior.is_some() {
            return None;
        }
        let shot = self.shots.get(index)?;
        Some(self.selector.select_for_shot(shot, self.frames, self.loudness))
    }
}
