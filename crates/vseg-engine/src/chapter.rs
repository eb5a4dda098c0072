//! Groups scenes into chapters bounded by topic-change intervals.
//!
//! For each topic interval `[tmin, tmax]`, scenes are taken from the front of
//! the timeline while they start at or before `tmax`. A taken scene either
//! ends before `tmin` or intersects the interval. Whatever is left after the
//! last interval forms a trailing chapter.

use std::collections::VecDeque;

use tracing::{debug, info};
use vseg_models::{Chapter, FrameRange, Scene, SceneRange, TimeRange};

use crate::align::check_sorted;
use crate::error::{EngineError, EngineResult};
use crate::interval::intersects;

/// Fail unless topic intervals are sorted, well-formed and disjoint.
pub fn check_topics(topics: &[TimeRange]) -> EngineResult<()> {
    check_sorted("topic_changes", topics)?;
    for (index, pair) in topics.windows(2).enumerate() {
        if pair[1].start_ms <= pair[0].end_ms {
            return Err(EngineError::invalid_input(
                format!("topic_changes[{}]", index + 1),
                "time",
                format!(
                    "overlaps previous interval ending at {}",
                    pair[0].end_ms
                ),
            ));
        }
    }
    Ok(())
}

/// Partition `scenes` into chapters at topic-change boundaries.
///
/// Each scene's `topic_group` is set to the id of the chapter holding it.
pub fn partition(scenes: Vec<Scene>, topics: &[TimeRange]) -> EngineResult<Vec<Chapter>> {
    check_sorted("scenes", &scenes)?;
    check_topics(topics)?;

    let mut working: VecDeque<Scene> = scenes.into();
    let mut groups: Vec<Vec<Scene>> = Vec::new();

    for topic in topics {
        let mut group = Vec::new();
        while let Some(scene) = working.front() {
            if scene.time.start_ms > topic.end_ms {
                break;
            }
            let before = scene.time.end_ms < topic.start_ms;
            if !before && !intersects(&scene.time, topic, true) {
                return Err(EngineError::inconsistent(format!(
                    "scene {} [{}, {}] neither precedes nor intersects topic [{}, {}]",
                    scene.scene_id,
                    scene.time.start_ms,
                    scene.time.end_ms,
                    topic.start_ms,
                    topic.end_ms
                )));
            }
            if let Some(scene) = working.pop_front() {
                group.push(scene);
            }
        }

        if group.is_empty() {
            debug!(
                start_ms = topic.start_ms,
                end_ms = topic.end_ms,
                "Topic interval claimed no scenes"
            );
        } else {
            groups.push(group);
        }
    }

    if !working.is_empty() {
        groups.push(working.into());
    }

    let chapters = groups
        .into_iter()
        .zip(0u32..)
        .map(|(scenes, chapter_id)| make_chapter(chapter_id, scenes))
        .collect::<EngineResult<Vec<_>>>()?;

    info!(
        chapters = chapters.len(),
        topics = topics.len(),
        "Scenes partitioned into chapters"
    );
    Ok(chapters)
}

fn make_chapter(chapter_id: u32, mut scenes: Vec<Scene>) -> EngineResult<Chapter> {
    let (Some(first), Some(last)) = (scenes.first(), scenes.last()) else {
        return Err(EngineError::inconsistent(format!(
            "chapter {} has no scenes",
            chapter_id
        )));
    };

    let scene_range = SceneRange {
        first: first.scene_id,
        last: last.scene_id,
    };
    let time = TimeRange::new(first.time.start_ms, last.time.end_ms);
    let frames = FrameRange::new(first.frames.first, last.frames.last);

    for scene in &mut scenes {
        scene.topic_group = Some(chapter_id);
    }

    Ok(Chapter {
        chapter_id,
        scene_range,
        time,
        frames,
        scenes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vseg_models::TechnicalCue;

    fn make_scenes(bounds: &[(u64, u64)]) -> Vec<Scene> {
        bounds
            .iter()
            .zip(0u32..)
            .map(|(&(start, end), id)| {
                Scene::new(
                    id,
                    FrameRange::new(start / 40, end / 40),
                    TimeRange::new(start, end),
                    Vec::new(),
                    TechnicalCue::Content,
                )
            })
            .collect()
    }

    fn scene_ids(chapter: &Chapter) -> Vec<u32> {
        chapter.scenes.iter().map(|s| s.scene_id).collect()
    }

    #[test]
    fn test_single_topic_with_trailing_chapter() {
        let scenes = make_scenes(&[(0, 2000), (2000, 4500), (4500, 7000), (7000, 9000)]);
        let chapters = partition(scenes, &[TimeRange::new(5000, 6000)]).unwrap();

        assert_eq!(chapters.len(), 2);
        assert_eq!(scene_ids(&chapters[0]), vec![0, 1, 2]);
        assert_eq!(chapters[0].scene_range, SceneRange { first: 0, last: 2 });
        assert_eq!(chapters[0].time, TimeRange::new(0, 7000));
        assert_eq!(chapters[0].frames, FrameRange::new(0, 175));
        assert_eq!(scene_ids(&chapters[1]), vec![3]);
        assert_eq!(chapters[1].chapter_id, 1);
        assert_eq!(chapters[1].scenes[0].topic_group, Some(1));
    }

    #[test]
    fn test_no_topics_single_chapter() {
        let scenes = make_scenes(&[(0, 1000), (1000, 2000)]);
        let chapters = partition(scenes, &[]).unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(scene_ids(&chapters[0]), vec![0, 1]);
    }

    #[test]
    fn test_empty_groups_dropped() {
        let scenes = make_scenes(&[(0, 1000), (1000, 5000), (5000, 9000)]);
        let topics = vec![
            TimeRange::new(500, 800),
            TimeRange::new(2000, 2500),
            TimeRange::new(3000, 3500),
            TimeRange::new(6000, 7000),
        ];
        let chapters = partition(scenes, &topics).unwrap();
        let ids: Vec<Vec<u32>> = chapters.iter().map(scene_ids).collect();
        assert_eq!(ids, vec![vec![0], vec![1], vec![2]]);
        let chapter_ids: Vec<u32> = chapters.iter().map(|c| c.chapter_id).collect();
        assert_eq!(chapter_ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_chapters_concatenate_to_scene_list() {
        let bounds: Vec<(u64, u64)> = (0..20).map(|i| (i * 1000, (i + 1) * 1000)).collect();
        let scenes = make_scenes(&bounds);
        let topics = vec![
            TimeRange::new(2500, 2600),
            TimeRange::new(7000, 9000),
            TimeRange::new(15_500, 16_000),
        ];

        let chapters = partition(scenes.clone(), &topics).unwrap();
        let flattened: Vec<u32> = chapters
            .iter()
            .flat_map(|c| c.scenes.iter().map(|s| s.scene_id))
            .collect();
        let original: Vec<u32> = scenes.iter().map(|s| s.scene_id).collect();
        assert_eq!(flattened, original);
    }

    #[test]
    fn test_overlapping_topics_rejected() {
        let scenes = make_scenes(&[(0, 1000)]);
        let topics = vec![TimeRange::new(100, 500), TimeRange::new(400, 900)];
        let err = partition(scenes, &topics).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_unsorted_scenes_rejected() {
        let scenes = make_scenes(&[(2000, 3000), (0, 1000)]);
        let err = partition(scenes, &[]).unwrap_err();
        assert!(matches!(err, EngineError::Unsorted { stream: "scenes", .. }));
    }
}
