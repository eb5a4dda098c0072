//! Scene timeline construction from shots or fallback windows.

use vseg_models::{Frame, Scene, ShotSegment, TechnicalCue, TimeRange};

use crate::error::{EngineError, EngineResult};
use crate::keyframe::FrameWindow;

/// One scene per shot, carrying the shot's cue as its sequence type.
///
/// `selections[i]` holds the frames chosen for `shots[i]`.
pub fn build_scenes(shots: &[ShotSegment], selections: Vec<Vec<Frame>>) -> EngineResult<Vec<Scene>> {
    if shots.len() != selections.len() {
        return Err(EngineError::inconsistent(format!(
            "{} shots but {} frame selections",
            shots.len(),
            selections.len()
        )));
    }

    shots
        .iter()
        .zip(selections)
        .enumerate()
        .map(|(i, (shot, selected))| {
            let scene_id = u32::try_from(i)
                .map_err(|_| EngineError::invalid_input(format!("shot[{}]", i), "index", "too many shots"))?;
            Ok(Scene::new(scene_id, shot.frames, shot.time, selected, shot.cue))
        })
        .collect()
}

/// One scene per fallback window.
pub fn scenes_from_windows(windows: Vec<FrameWindow>) -> Vec<Scene> {
    windows
        .into_iter()
        .zip(0u32..)
        .map(|(window, scene_id)| {
            Scene::new(
                scene_id,
                window.frames,
                window.time,
                window.selected,
                TechnicalCue::Unknown,
            )
        })
        .collect()
}

/// Gaps between consecutive scenes, as `[previous end, next start]` ranges.
///
/// Scenes that meet at an instant or one millisecond apart are contiguous.
pub fn timeline_gaps(scenes: &[Scene]) -> Vec<TimeRange> {
    scenes
        .windows(2)
        .filter(|pair| pair[1].time.start_ms > pair[0].time.end_ms.saturating_add(1))
        .map(|pair| TimeRange::new(pair[0].time.end_ms, pair[1].time.start_ms))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vseg_models::FrameRange;

    fn make_shot(index: u32, start_ms: u64, end_ms: u64, cue: TechnicalCue) -> ShotSegment {
        ShotSegment::new(
            index,
            FrameRange::new(start_ms / 40, end_ms / 40),
            TimeRange::new(start_ms, end_ms),
            cue,
        )
    }

    #[test]
    fn test_build_scenes_from_shots() {
        let shots = vec![
            make_shot(0, 0, 2000, TechnicalCue::Steady),
            make_shot(1, 2000, 4500, TechnicalCue::Content),
        ];
        let selections = vec![vec![Frame::new(10, 400, "abc", 1.0)], Vec::new()];

        let scenes = build_scenes(&shots, selections).unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].scene_id, 0);
        assert_eq!(scenes[0].sequence_type, TechnicalCue::Steady);
        assert_eq!(scenes[0].selected_frames.len(), 1);
        assert_eq!(scenes[1].time, TimeRange::new(2000, 4500));
        assert!(timeline_gaps(&scenes).is_empty());
    }

    #[test]
    fn test_selection_count_mismatch() {
        let shots = vec![make_shot(0, 0, 2000, TechnicalCue::Content)];
        let err = build_scenes(&shots, Vec::new()).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_timeline_gaps() {
        let shots = vec![
            make_shot(0, 0, 1999, TechnicalCue::Content),
            make_shot(1, 2000, 3000, TechnicalCue::Content),
            make_shot(2, 5000, 6000, TechnicalCue::Content),
        ];
        let scenes = build_scenes(&shots, vec![Vec::new(); 3]).unwrap();
        assert_eq!(timeline_gaps(&scenes), vec![TimeRange::new(3000, 5000)]);
    }

    #[test]
    fn test_timeline_gaps_at_end_of_range() {
        let shots = vec![
            make_shot(0, u64::MAX - 10, u64::MAX, TechnicalCue::Content),
            make_shot(1, u64::MAX, u64::MAX, TechnicalCue::Content),
        ];
        let scenes = build_scenes(&shots, vec![Vec::new(); 2]).unwrap();
        assert!(timeline_gaps(&scenes).is_empty());
    }
}
