//! Input and output documents exchanged with the caller.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotations;
use crate::frame::{Frame, ShotSegment};
use crate::loudness::{LoudnessPoint, LoudnessSegment, LoudnessSummary};
use crate::scene::{Chapter, Scene};

/// Fully decoded inputs for one asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SegmentationInput {
    /// Frames sorted by timestamp.
    pub frames: Vec<Frame>,
    /// Shot segmentation. `None` (or empty) selects the windowed fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<Vec<ShotSegment>>,
    #[serde(default)]
    pub loudness: Vec<LoudnessPoint>,
    #[serde(default)]
    pub annotations: Annotations,
}

/// Result artifact of a segmentation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentationOutput {
    pub loudness_segments: Vec<LoudnessSegment>,
    #[serde(default)]
    pub loudness_summary: LoudnessSummary,
    pub scenes: Vec<Scene>,
    pub chapters: Vec<Chapter>,
}

/// JSON Schema describing [`SegmentationOutput`].
pub fn output_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(SegmentationOutput)
}
