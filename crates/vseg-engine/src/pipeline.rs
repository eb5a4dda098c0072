//! End-to-end segmentation run.
//!
//! ```text
//! frames + shots ──► keyframes ──► scenes ──► align ──► chapters
//!                        ▲                      ▲
//! loudness ──────────────┘        annotations ──┘
//! ```
//!
//! Per-shot keyframe selection runs on the strided executor and can be cut
//! short by the configured deadline. An interrupted run hands back a
//! [`Checkpoint`]; passing it to [`SegmentationPipeline::resume`] only
//! computes the shots that are still missing.

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use vseg_models::{
    Frame, LoudnessSegment, LoudnessSummary, Scene, SegmentationInput, SegmentationOutput, ShotSegment,
};

use crate::align::{align, check_sorted};
use crate::chapter::{check_topics, partition};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::keyframe::{hash::is_valid_token, KeyframeSelector, ShotSelectionStep};
use crate::loudness::segment_loudness;
use crate::scene::{build_scenes, scenes_from_windows, timeline_gaps};
use crate::tasks::{ExecutionReport, StridedExecutor};

/// Per-shot selections carried between interrupted passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub selections: Vec<Option<Vec<Frame>>>,
}

impl Checkpoint {
    /// Number of shots whose selection is done.
    pub fn completed(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub enum RunStatus {
    Complete(SegmentationOutput),
    /// The deadline interrupted keyframe selection.
    Suspended {
        checkpoint: Checkpoint,
        report: ExecutionReport,
    },
}

impl RunStatus {
    pub fn into_output(self) -> Option<SegmentationOutput> {
        match self {
            RunStatus::Complete(output) => Some(output),
            RunStatus::Suspended { .. } => None,
        }
    }
}

/// Reusable segmentation pipeline bound to one configuration.
pub struct SegmentationPipeline {
    config: EngineConfig,
    selector: KeyframeSelector,
    executor: StridedExecutor,
}

impl SegmentationPipeline {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let selector = KeyframeSelector::new(&config);
        let executor = StridedExecutor::from_config(&config)?;
        Ok(Self {
            config,
            selector,
            executor,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run from scratch.
    pub fn run(&self, input: &SegmentationInput) -> EngineResult<RunStatus> {
        self.resume(input, Checkpoint::default())
    }

    /// Run, reusing any per-shot selections already in `checkpoint`.
    pub fn resume(&self, input: &SegmentationInput, checkpoint: Checkpoint) -> EngineResult<RunStatus> {
        validate_input(input)?;

        let (loudness, loudness_summary) = info_span!("loudness").in_scope(|| {
            let track = segment_loudness(&input.loudness, &self.config);
            let summary = LoudnessSummary::from_segments(&track.segments);
            info!(
                segments = track.segments.len(),
                silent_ms = summary.silent_ms,
                normal_ms = summary.normal_ms,
                silent_ratio = summary.silent_ratio(),
                "Loudness segmented"
            );
            (track, summary)
        });

        let scenes = {
            let _span = info_span!("keyframes").entered();
            match input.shots.as_deref() {
                Some(shots) if !shots.is_empty() => {
                    let mut checkpoint = checkpoint;
                    if checkpoint.selections.is_empty() {
                        checkpoint.selections = vec![None; shots.len()];
                    } else if checkpoint.selections.len() != shots.len() {
                        return Err(EngineError::invalid_input(
                            "checkpoint",
                            "selections",
                            format!(
                                "holds {} shots but input has {}",
                                checkpoint.selections.len(),
                                shots.len()
                            ),
                        ));
                    }

                    let report = self.select_keyframes(
                        shots,
                        &input.frames,
                        &loudness.segments,
                        &mut checkpoint.selections,
                    );
                    if !report.is_complete() {
                        warn!(
                            completed = checkpoint.completed(),
                            remaining = report.remaining,
                            "Keyframe selection suspended"
                        );
                        return Ok(RunStatus::Suspended { checkpoint, report });
                    }

                    let selections: Vec<Vec<Frame>> =
                        checkpoint.selections.into_iter().flatten().collect();
                    build_scenes(shots, selections)?
                }
                _ => {
                    if checkpoint.completed() > 0 {
                        return Err(EngineError::invalid_input(
                            "checkpoint",
                            "selections",
                            format!(
                                "holds {} finished shots but input has no shot segmentation",
                                checkpoint.completed()
                            ),
                        ));
                    }
                    info!(frames = input.frames.len(), "No shot segmentation, using fallback windows");
                    scenes_from_windows(self.selector.select_windowed(&input.frames))
                }
            }
        };
        log_timeline(&scenes);

        let scenes = info_span!("align").in_scope(|| align(scenes, &input.annotations))?;
        let chapters = info_span!("chapters")
            .in_scope(|| partition(scenes, &input.annotations.topic_changes))?;

        let scenes: Vec<Scene> = chapters
            .iter()
            .flat_map(|chapter| chapter.scenes.iter().cloned())
            .collect();

        Ok(RunStatus::Complete(SegmentationOutput {
            loudness_segments: loudness.segments,
            loudness_summary,
            scenes,
            chapters,
        }))
    }

    /// One executor pass of per-shot selection over `slots`.
    pub fn select_keyframes(
        &self,
        shots: &[ShotSegment],
        frames: &[Frame],
        loudness: &[LoudnessSegment],
        slots: &mut [Option<Vec<Frame>>],
    ) -> ExecutionReport {
        let step = ShotSelectionStep {
            selector: &self.selector,
            shots,
            frames,
            loudness,
        };
        self.executor.run(&step, slots)
    }
}

fn log_timeline(scenes: &[Scene]) {
    let gaps = timeline_gaps(scenes);
    if gaps.is_empty() {
        info!(scenes = scenes.len(), "Scene timeline built");
    } else {
        warn!(scenes = scenes.len(), gaps = gaps.len(), "Scene timeline has gaps");
    }
}

/// Check the structural requirements every stage relies on.
pub fn validate_input(input: &SegmentationInput) -> EngineResult<()> {
    validate_frames(&input.frames)?;
    if let Some(shots) = &input.shots {
        validate_shots(shots)?;
    }

    for (index, pair) in input.loudness.windows(2).enumerate() {
        if pair[1].timestamp_ms < pair[0].timestamp_ms {
            return Err(EngineError::Unsorted {
                stream: "loudness",
                index: index + 1,
            });
        }
    }

    let annotations = &input.annotations;
    check_sorted("segment_types", &annotations.segment_types)?;
    check_sorted("transcripts", &annotations.transcripts)?;
    check_sorted("faces", &annotations.faces)?;
    check_sorted("audio_tags", &annotations.audio_tags)?;
    check_topics(&annotations.topic_changes)?;
    Ok(())
}

fn validate_frames(frames: &[Frame]) -> EngineResult<()> {
    let Some(first) = frames.first() else {
        return Err(EngineError::invalid_input(
            "input",
            "frames",
            "at least one frame is required",
        ));
    };
    let hash_len = first.perceptual_hash.len();

    for (index, frame) in frames.iter().enumerate() {
        let record = || format!("frame[{}]", index);
        if !is_valid_token(&frame.perceptual_hash) {
            return Err(EngineError::invalid_input(
                record(),
                "perceptual_hash",
                format!("'{}' is not a base-36 token", frame.perceptual_hash),
            ));
        }
        if frame.perceptual_hash.len() != hash_len {
            return Err(EngineError::invalid_input(
                record(),
                "perceptual_hash",
                format!(
                    "length {} differs from {}",
                    frame.perceptual_hash.len(),
                    hash_len
                ),
            ));
        }
        if !frame.sharpness.is_finite() {
            return Err(EngineError::invalid_input(record(), "sharpness", "must be finite"));
        }
        if index > 0 {
            let prev = &frames[index - 1];
            if frame.timestamp_ms < prev.timestamp_ms {
                return Err(EngineError::Unsorted {
                    stream: "frames",
                    index,
                });
            }
            if frame.frame_num <= prev.frame_num {
                return Err(EngineError::invalid_input(
                    record(),
                    "frame_num",
                    format!("{} does not follow {}", frame.frame_num, prev.frame_num),
                ));
            }
        }
    }
    Ok(())
}

fn validate_shots(shots: &[ShotSegment]) -> EngineResult<()> {
    for (index, shot) in shots.iter().enumerate() {
        let record = || format!("shot[{}]", index);
        if !shot.frames.is_ordered() {
            return Err(EngineError::invalid_input(record(), "frames", "first is after last"));
        }
        if !shot.time.is_ordered() {
            return Err(EngineError::invalid_input(record(), "time", "start is after end"));
        }
        if index > 0 {
            let prev = &shots[index - 1];
            if shot.time.start_ms < prev.time.start_ms {
                return Err(EngineError::Unsorted {
                    stream: "shots",
                    index,
                });
            }
            if shot.time.start_ms < prev.time.end_ms {
                return Err(EngineError::invalid_input(
                    record(),
                    "time",
                    format!("overlaps previous shot ending at {}", prev.time.end_ms),
                ));
            }
            if shot.frames.first <= prev.frames.last {
                return Err(EngineError::invalid_input(
                    record(),
                    "frames",
                    format!("overlaps previous shot ending at frame {}", prev.frames.last),
                ));
            }
        }
    }
    Ok(())
}
