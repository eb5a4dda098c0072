#![deny(unreachable_patterns)]
//! Temporal segmentation and representative-sampling engine.
//!
//! This crate provides:
//! - Interval primitives shared by every stage
//! - Loudness change-point grouping
//! - Per-shot keyframe selection driven by sharpness and perceptual hashes
//! - Alignment of segment-type, dialogue, face and audio-tag streams onto scenes
//! - Chapter partitioning at topic-change boundaries
//! - A deadline-bounded strided executor for resumable per-shot work
//!
//! Every stage is synchronous and deterministic. Nothing here performs I/O.

pub mod align;
pub mod chapter;
pub mod config;
pub mod error;
pub mod interval;
pub mod keyframe;
pub mod loudness;
pub mod pipeline;
pub mod scene;
pub mod tasks;

pub use align::{align, overlap_fraction};
pub use chapter::partition;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use interval::{contains, intersects, Interval};
pub use keyframe::{frame_budget, FrameWindow, KeyframeSelector, SamplingPolicy};
pub use loudness::{segment_loudness, LoudnessSegmenter, LoudnessTrack};
pub use pipeline::{validate_input, Checkpoint, RunStatus, SegmentationPipeline};
pub use scene::{build_scenes, scenes_from_windows, timeline_gaps};
pub use tasks::{first_unfinished, ExecutionReport, IdempotentStep, StridedExecutor};
