//! Analysed video frames and shot segments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::range::{FrameRange, TimeRange};

/// A decoded frame descriptor produced by upstream frame analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Frame {
    /// Frame number within the asset.
    pub frame_num: u64,
    /// Presentation timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Fixed-length base-36 perceptual hash token.
    pub perceptual_hash: String,
    /// Laplacian-variance style sharpness score (higher is sharper).
    pub sharpness: f64,
}

impl Frame {
    pub fn new(
        frame_num: u64,
        timestamp_ms: u64,
        perceptual_hash: impl Into<String>,
        sharpness: f64,
    ) -> Self {
        Self {
            frame_num,
            timestamp_ms,
            perceptual_hash: perceptual_hash.into(),
            sharpness,
        }
    }
}

/// Technical cue classification of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalCue {
    /// Colour bars, black frames, static slates.
    Steady,
    /// End or opening credits rolls.
    Credits,
    /// Opening titles.
    Opening,
    /// Programme content.
    Content,
    /// Unclassified.
    #[default]
    #[serde(other)]
    Unknown,
}

impl TechnicalCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicalCue::Steady => "steady",
            TechnicalCue::Credits => "credits",
            TechnicalCue::Opening => "opening",
            TechnicalCue::Content => "content",
            TechnicalCue::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TechnicalCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A visually homogeneous shot as classified upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShotSegment {
    pub index: u32,
    pub frames: FrameRange,
    pub time: TimeRange,
    #[serde(default)]
    pub cue: TechnicalCue,
}

impl ShotSegment {
    pub fn new(index: u32, frames: FrameRange, time: TimeRange, cue: TechnicalCue) -> Self {
        Self {
            index,
            frames,
            time,
            cue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognised_cue_is_unknown() {
        let cue: TechnicalCue = serde_json::from_str("\"smpte_bars\"").unwrap();
        assert_eq!(cue, TechnicalCue::Unknown);

        let cue: TechnicalCue = serde_json::from_str("\"credits\"").unwrap();
        assert_eq!(cue, TechnicalCue::Credits);
    }

    #[test]
    fn test_shot_cue_defaults_to_unknown() {
        let json = r#"{"index":0,"frames":{"first":0,"last":9},"time":{"start_ms":0,"end_ms":360}}"#;
        let shot: ShotSegment = serde_json::from_str(json).unwrap();
        assert_eq!(shot.cue, TechnicalCue::Unknown);
    }
}
