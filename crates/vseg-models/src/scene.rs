//! Scene and chapter models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::annotation::{AudioSegmentType, AudioTagTotal, FaceRef, Timed, Transcript};
use crate::frame::{Frame, TechnicalCue};
use crate::range::{FrameRange, TimeRange};

/// A scene on the asset timeline with its cross-modal annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    pub scene_id: u32,
    pub frames: FrameRange,
    pub time: TimeRange,
    /// Representative frames, ordered by timestamp.
    pub selected_frames: Vec<Frame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_segment_type: Option<AudioSegmentType>,
    #[serde(default)]
    pub transcripts: Vec<Transcript>,
    #[serde(default)]
    pub faces: Vec<FaceRef>,
    #[serde(default)]
    pub audio_tags: Vec<AudioTagTotal>,
    /// Chapter this scene was grouped into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_group: Option<u32>,
    #[serde(default)]
    pub sequence_type: TechnicalCue,
}

impl Scene {
    /// Create a scene with no annotations yet.
    pub fn new(
        scene_id: u32,
        frames: FrameRange,
        time: TimeRange,
        selected_frames: Vec<Frame>,
        sequence_type: TechnicalCue,
    ) -> Self {
        Self {
            scene_id,
            frames,
            time,
            selected_frames,
            audio_segment_type: None,
            transcripts: Vec::new(),
            faces: Vec::new(),
            audio_tags: Vec::new(),
            topic_group: None,
            sequence_type,
        }
    }
}

impl Timed for Scene {
    fn time(&self) -> TimeRange {
        self.time
    }
}

/// First and last scene ids of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SceneRange {
    pub first: u32,
    pub last: u32,
}

/// A run of consecutive scenes bounded by topic changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Chapter {
    pub chapter_id: u32,
    pub scene_range: SceneRange,
    pub time: TimeRange,
    pub frames: FrameRange,
    pub scenes: Vec<Scene>,
}
