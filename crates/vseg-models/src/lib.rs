//! Shared data models for the temporal segmentation engine.
//!
//! This crate provides Serde-serializable types for:
//! - Frames, shots and technical cues
//! - Loudness samples and segments
//! - Annotation streams (segment types, dialogue, faces, audio tags, topics)
//! - Scenes and chapters emitted by the engine

pub mod annotation;
pub mod frame;
pub mod io;
pub mod loudness;
pub mod range;
pub mod scene;

// Re-export common types
pub use annotation::{
    Annotations, AudioAnnotation, AudioSegmentType, AudioTag, AudioTagTotal, FaceRecognition,
    FaceRef, GridCoordinates, Timed, Transcript,
};
pub use frame::{Frame, ShotSegment, TechnicalCue};
pub use io::{output_schema, SegmentationInput, SegmentationOutput};
pub use loudness::{GroupedLoudness, LoudnessLabel, LoudnessPoint, LoudnessSegment, LoudnessSummary};
pub use range::{FrameRange, TimeRange};
pub use scene::{Chapter, Scene, SceneRange};
