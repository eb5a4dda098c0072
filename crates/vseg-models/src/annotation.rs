//! Timestamped annotation streams handed to the aligner.
//!
//! Every stream is expected sorted by `time.start_ms`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::range::TimeRange;

/// Anything carrying a closed time range.
pub trait Timed {
    fn time(&self) -> TimeRange;
}

impl Timed for TimeRange {
    fn time(&self) -> TimeRange {
        *self
    }
}

/// Programme structure classification of an audio segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AudioSegmentType {
    Programme,
    Recap,
    Intro,
    Rating,
}

impl AudioSegmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioSegmentType::Programme => "programme",
            AudioSegmentType::Recap => "recap",
            AudioSegmentType::Intro => "intro",
            AudioSegmentType::Rating => "rating",
        }
    }
}

impl fmt::Display for AudioSegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified audio segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioAnnotation {
    pub time: TimeRange,
    pub kind: AudioSegmentType,
}

impl Timed for AudioAnnotation {
    fn time(&self) -> TimeRange {
        self.time
    }
}

/// One dialogue turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transcript {
    pub time: TimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub text: String,
}

impl Timed for Transcript {
    fn time(&self) -> TimeRange {
        self.time
    }
}

/// Cell of the frame grid image a face was cropped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct GridCoordinates {
    pub row: u32,
    pub col: u32,
}

/// A recognised face occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceRecognition {
    pub name: String,
    pub time: TimeRange,
    pub grid_coordinates: GridCoordinates,
    pub grid_image_key: String,
}

impl Timed for FaceRecognition {
    fn time(&self) -> TimeRange {
        self.time
    }
}

/// Face reference recorded on a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceRef {
    pub name: String,
    pub grid_coordinates: GridCoordinates,
    pub grid_image_key: String,
}

impl From<&FaceRecognition> for FaceRef {
    fn from(face: &FaceRecognition) -> Self {
        Self {
            name: face.name.clone(),
            grid_coordinates: face.grid_coordinates,
            grid_image_key: face.grid_image_key.clone(),
        }
    }
}

/// An audio event tag (music, applause, laughter, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioTag {
    pub label: String,
    pub time: TimeRange,
}

impl Timed for AudioTag {
    fn time(&self) -> TimeRange {
        self.time
    }
}

/// Accumulated tag duration on a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AudioTagTotal {
    pub label: String,
    pub duration_ms: u64,
}

/// All annotation streams for one asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Annotations {
    #[serde(default)]
    pub segment_types: Vec<AudioAnnotation>,
    #[serde(default)]
    pub transcripts: Vec<Transcript>,
    #[serde(default)]
    pub faces: Vec<FaceRecognition>,
    #[serde(default)]
    pub audio_tags: Vec<AudioTag>,
    /// Topic-change intervals bounding chapters; sorted and disjoint.
    #[serde(default)]
    pub topic_changes: Vec<TimeRange>,
}
