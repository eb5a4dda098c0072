//! Engine configuration.
//!
//! The numeric defaults are the values the segmentation heuristics were
//! tuned with. They are policy, not law: every one can be overridden from a
//! job document or the environment.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Hash token of a pure black frame.
pub const BLACK_FRAME_HASH: &str = "0000000000000000";

/// Hash token of the SMPTE colour-bar reference pattern.
pub const COLOR_BARS_HASH: &str = "zzzz0000zzzz0000";

/// Configuration for a segmentation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling interval in milliseconds.
    ///
    /// - Credits shots keep one frame per interval
    /// - Content shots derive their frame budget as `duration / interval`
    pub sampling_interval_ms: u64,

    /// Perceptual-hash distance (0-100 scale) a frame must exceed, relative
    /// to the last kept frame, to be kept during scan-select.
    pub hamming_distance_threshold: f64,

    /// Gating floor in LUFS. Momentary loudness below this is clipped to it.
    ///
    /// Default -70 LUFS is the EBU R128 absolute gate.
    pub gated_loudness_floor: f64,

    /// Gated-loudness jump (LU) between consecutive samples that opens a new
    /// loudness group.
    pub max_loudness_distance: f64,

    /// Window length for the no-shot fallback (milliseconds).
    pub split_interval_ms: u64,

    /// Hash tokens of degenerate content (black, colour bars). Any distance
    /// involving one of these is forced to 0.
    pub canonical_hashes: Vec<String>,

    /// Sample `Unknown` shots lying entirely inside an absolute-silent
    /// loudness segment with the steady (single witness frame) policy.
    /// Off by default, leaving `Unknown` shots on scan-select.
    pub collapse_silent_unknown_shots: bool,

    /// Worker count of the per-shot selection pool.
    pub worker_count: usize,

    /// Wall-clock budget for one selection pass. `None` runs to completion.
    pub deadline_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: 4000,
            hamming_distance_threshold: 0.85,
            gated_loudness_floor: -70.0,
            max_loudness_distance: 1.0,
            split_interval_ms: 120_000,
            canonical_hashes: vec![BLACK_FRAME_HASH.to_string(), COLOR_BARS_HASH.to_string()],
            collapse_silent_unknown_shots: false,
            worker_count: 4,
            deadline_ms: None,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sampling_interval_ms: env_or("VSEG_SAMPLING_INTERVAL_MS", defaults.sampling_interval_ms),
            hamming_distance_threshold: env_or(
                "VSEG_HAMMING_THRESHOLD",
                defaults.hamming_distance_threshold,
            ),
            gated_loudness_floor: env_or("VSEG_GATED_FLOOR", defaults.gated_loudness_floor),
            max_loudness_distance: env_or(
                "VSEG_MAX_LOUDNESS_DISTANCE",
                defaults.max_loudness_distance,
            ),
            split_interval_ms: env_or("VSEG_SPLIT_INTERVAL_MS", defaults.split_interval_ms),
            canonical_hashes: defaults.canonical_hashes,
            collapse_silent_unknown_shots: env_or(
                "VSEG_COLLAPSE_SILENT",
                defaults.collapse_silent_unknown_shots,
            ),
            worker_count: env_or("VSEG_WORKERS", defaults.worker_count),
            deadline_ms: std::env::var("VSEG_DEADLINE_MS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the heuristics cannot work with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.sampling_interval_ms == 0 {
            return Err(EngineError::config("sampling_interval_ms must be > 0"));
        }
        if self.split_interval_ms == 0 {
            return Err(EngineError::config("split_interval_ms must be > 0"));
        }
        if !self.hamming_distance_threshold.is_finite() || self.hamming_distance_threshold < 0.0 {
            return Err(EngineError::config(format!(
                "hamming_distance_threshold must be a non-negative number, got {}",
                self.hamming_distance_threshold
            )));
        }
        if !self.gated_loudness_floor.is_finite() {
            return Err(EngineError::config("gated_loudness_floor must be finite"));
        }
        if !self.max_loudness_distance.is_finite() || self.max_loudness_distance < 0.0 {
            return Err(EngineError::config(format!(
                "max_loudness_distance must be a non-negative number, got {}",
                self.max_loudness_distance
            )));
        }
        if self.worker_count == 0 {
            return Err(EngineError::config("worker_count must be > 0"));
        }
        Ok(())
    }

    /// Builder-style setter for the sampling interval.
    pub fn with_sampling_interval_ms(mut self, ms: u64) -> Self {
        self.sampling_interval_ms = ms;
        self
    }

    /// Builder-style setter for the hash distance threshold.
    pub fn with_hamming_threshold(mut self, threshold: f64) -> Self {
        self.hamming_distance_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    /// Builder-style setter for the loudness gating parameters.
    pub fn with_loudness_gate(mut self, floor: f64, max_distance: f64) -> Self {
        self.gated_loudness_floor = floor;
        self.max_loudness_distance = max_distance;
        self
    }

    /// Builder-style setter for the fallback window length.
    pub fn with_split_interval_ms(mut self, ms: u64) -> Self {
        self.split_interval_ms = ms;
        self
    }

    /// Builder-style setter for the silent-Unknown heuristic.
    pub fn with_silent_unknown_collapse(mut self, enabled: bool) -> Self {
        self.collapse_silent_unknown_shots = enabled;
        self
    }

    /// Builder-style setter for the selection pool.
    pub fn with_workers(mut self, worker_count: usize, deadline_ms: Option<u64>) -> Self {
        self.worker_count = worker_count;
        self.deadline_ms = deadline_ms;
        self
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
