//! Aligns annotation streams onto the scene timeline.
//!
//! Every stream is sorted by start, so a single forward-only cursor over the
//! scenes serves a whole stream: scenes that end before the current
//! annotation starts can never match a later one.
//!
//! | stream | match rule | merge rule |
//! |---|---|---|
//! | segment types | inclusive intersect | first writer wins |
//! | transcripts | inclusive intersect | whole turn to the max-overlap scene |
//! | faces | exclusive intersect | first occurrence per name |
//! | audio tags | containment | duration summed per label |

use std::ops::Range;

use tracing::{debug, info};
use vseg_models::{
    Annotations, AudioAnnotation, AudioTag, AudioTagTotal, FaceRecognition, FaceRef, Scene, TimeRange,
    Timed, Transcript,
};

use crate::error::{EngineError, EngineResult};
use crate::interval::{contains, intersects};

/// Forward-only cursor over a time-ordered scene list.
#[derive(Debug, Default)]
struct SceneCursor {
    next: usize,
}

impl SceneCursor {
    /// Indices of scenes that may overlap `range`.
    fn window(&mut self, scenes: &[Scene], range: TimeRange) -> Range<usize> {
        while self.next < scenes.len() && scenes[self.next].time.end_ms < range.start_ms {
            self.next += 1;
        }
        let mut stop = self.next;
        while stop < scenes.len() && scenes[stop].time.start_ms <= range.end_ms {
            stop += 1;
        }
        self.next..stop
    }
}

/// Fail unless `items` are ordered by start with well-formed ranges.
pub fn check_sorted<T: Timed>(stream: &'static str, items: &[T]) -> EngineResult<()> {
    for (index, item) in items.iter().enumerate() {
        let time = item.time();
        if !time.is_ordered() {
            return Err(EngineError::invalid_input(
                format!("{}[{}]", stream, index),
                "time",
                format!("start {} is after end {}", time.start_ms, time.end_ms),
            ));
        }
        if index > 0 && items[index - 1].time().start_ms > time.start_ms {
            return Err(EngineError::Unsorted { stream, index });
        }
    }
    Ok(())
}

/// Share of `dialogue` that falls inside `scene`.
///
/// Two closed ranges either do not overlap, or one contains the other, or
/// they overlap on one side; anything else means the inputs were malformed.
pub fn overlap_fraction(scene: TimeRange, dialogue: TimeRange) -> EngineResult<f64> {
    let (tmin, tmax) = (scene.start_ms, scene.end_ms);
    let (start, end) = (dialogue.start_ms, dialogue.end_ms);

    if tmax < start || tmin > end {
        return Ok(0.0);
    }
    // Every branch below that divides has end > start.
    let span = end.saturating_sub(start) as f64;

    if tmin <= start && tmax >= end {
        Ok(1.0)
    } else if start <= tmin && end >= tmax {
        Ok((tmax - tmin) as f64 / span)
    } else if start <= tmin && tmin <= end && end <= tmax {
        Ok((tmax.min(end) - tmin) as f64 / span)
    } else if tmin <= start && start <= tmax && tmax <= end {
        Ok((tmax.min(end) - start) as f64 / span)
    } else {
        Err(EngineError::inconsistent(format!(
            "no overlap case for scene [{}, {}] and dialogue [{}, {}]",
            tmin, tmax, start, end
        )))
    }
}

/// Run every stream through the aligner.
pub fn align(scenes: Vec<Scene>, annotations: &Annotations) -> EngineResult<Vec<Scene>> {
    check_sorted("scenes", &scenes)?;

    let scenes = assign_segment_types(scenes, &annotations.segment_types)?;
    let scenes = assign_transcripts(scenes, &annotations.transcripts)?;
    let scenes = assign_faces(scenes, &annotations.faces)?;
    let scenes = accumulate_audio_tags(scenes, &annotations.audio_tags)?;

    info!(
        scenes = scenes.len(),
        typed = scenes.iter().filter(|s| s.audio_segment_type.is_some()).count(),
        with_dialogue = scenes.iter().filter(|s| !s.transcripts.is_empty()).count(),
        with_faces = scenes.iter().filter(|s| !s.faces.is_empty()).count(),
        "Annotations aligned"
    );
    Ok(scenes)
}

/// Give each untyped scene the type of the first segment touching it.
pub fn assign_segment_types(
    mut scenes: Vec<Scene>,
    segments: &[AudioAnnotation],
) -> EngineResult<Vec<Scene>> {
    check_sorted("segment_types", segments)?;
    let mut cursor = SceneCursor::default();

    for segment in segments {
        for i in cursor.window(&scenes, segment.time) {
            let scene = &mut scenes[i];
            if scene.audio_segment_type.is_none() && intersects(&scene.time, &segment.time, true) {
                scene.audio_segment_type = Some(segment.kind);
            }
        }
    }
    Ok(scenes)
}

/// Attach each dialogue turn, unsplit, to the scene holding most of it.
pub fn assign_transcripts(
    mut scenes: Vec<Scene>,
    transcripts: &[Transcript],
) -> EngineResult<Vec<Scene>> {
    check_sorted("transcripts", transcripts)?;
    let mut cursor = SceneCursor::default();

    for transcript in transcripts {
        let candidates: Vec<usize> = cursor
            .window(&scenes, transcript.time)
            .filter(|&i| intersects(&scenes[i].time, &transcript.time, true))
            .collect();

        let target = match candidates.as_slice() {
            [] => {
                debug!(
                    start_ms = transcript.time.start_ms,
                    end_ms = transcript.time.end_ms,
                    "Transcript outside scene timeline"
                );
                continue;
            }
            [only] => *only,
            [first, ..] => {
                let mut best = *first;
                let mut best_fraction = f64::NEG_INFINITY;
                for &i in &candidates {
                    let fraction = overlap_fraction(scenes[i].time, transcript.time)?;
                    if fraction > best_fraction {
                        best = i;
                        best_fraction = fraction;
                    }
                }
                best
            }
        };

        scenes[target].transcripts.push(transcript.clone());
    }
    Ok(scenes)
}

/// Record recognised faces strictly inside each scene, once per name.
pub fn assign_faces(mut scenes: Vec<Scene>, faces: &[FaceRecognition]) -> EngineResult<Vec<Scene>> {
    check_sorted("faces", faces)?;
    let mut cursor = SceneCursor::default();

    for face in faces {
        for i in cursor.window(&scenes, face.time) {
            let scene = &mut scenes[i];
            if !intersects(&scene.time, &face.time, false) {
                continue;
            }
            if scene.faces.iter().any(|f| f.name == face.name) {
                continue;
            }
            scene.faces.push(FaceRef::from(face));
        }
    }
    Ok(scenes)
}

/// Sum the duration of tags fully contained in each scene, per label.
pub fn accumulate_audio_tags(mut scenes: Vec<Scene>, tags: &[AudioTag]) -> EngineResult<Vec<Scene>> {
    check_sorted("audio_tags", tags)?;
    let mut cursor = SceneCursor::default();

    for tag in tags {
        for i in cursor.window(&scenes, tag.time) {
            let scene = &mut scenes[i];
            if !contains(&scene.time, &tag.time) {
                continue;
            }
            let duration_ms = tag.time.duration_ms();
            match scene.audio_tags.iter_mut().find(|t| t.label == tag.label) {
                Some(total) => total.duration_ms += duration_ms,
                None => scene.audio_tags.push(AudioTagTotal {
                    label: tag.label.clone(),
                    duration_ms,
                }),
            }
        }
    }
    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vseg_models::{AudioSegmentType, FrameRange, GridCoordinates, TechnicalCue};

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

    fn make_transcript(start: u64, end: u64, text: &str) -> Transcript {
        Transcript {
            time: TimeRange::new(start, end),
            speaker: None,
            text: text.to_string(),
        }
    }

    fn make_face(name: &str, start: u64, end: u64) -> FaceRecognition {
        FaceRecognition {
            name: name.to_string(),
            time: TimeRange::new(start, end),
            grid_coordinates: GridCoordinates { row: 0, col: 1 },
            grid_image_key: format!("grid/{}.jpg", start),
        }
    }

    fn make_tag(label: &str, start: u64, end: u64) -> AudioTag {
        AudioTag {
            label: label.to_string(),
            time: TimeRange::new(start, end),
        }
    }

    const TIMELINE: [(u64, u64); 4] = [(0, 2000), (2000, 4500), (4500, 7000), (7000, 9000)];

    #[test]
    fn test_overlap_fraction_cases() {
        let scene = TimeRange::new(2000, 4500);
        assert_eq!(overlap_fraction(scene, TimeRange::new(2500, 3000)).unwrap(), 1.0);
        assert!((overlap_fraction(scene, TimeRange::new(1000, 6000)).unwrap() - 0.5).abs() < 1e-9);
        assert!((overlap_fraction(scene, TimeRange::new(1500, 4000)).unwrap() - 0.8).abs() < 1e-9);
        assert!((overlap_fraction(scene, TimeRange::new(4000, 5000)).unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(overlap_fraction(scene, TimeRange::new(5000, 6000)).unwrap(), 0.0);
        assert_eq!(overlap_fraction(scene, TimeRange::at(3000)).unwrap(), 1.0);
    }

    #[test]
    fn test_overlap_fractions_partition_dialogue() {
        let scenes = make_scenes(&TIMELINE);
        let dialogue = TimeRange::new(1000, 8000);
        let total: f64 = scenes
            .iter()
            .map(|s| overlap_fraction(s.time, dialogue).unwrap())
            .sum();
        assert!((total - 1.0).abs() < 1e-9);

        let inside = TimeRange::new(2500, 4000);
        let full: Vec<f64> = scenes
            .iter()
            .map(|s| overlap_fraction(s.time, inside).unwrap())
            .collect();
        assert_eq!(full, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_transcript_goes_to_max_overlap_scene() {
        let scenes = make_scenes(&TIMELINE);
        let transcripts = vec![
            make_transcript(500, 1500, "inside first"),
            make_transcript(1000, 6000, "spans second"),
            make_transcript(1500, 4000, "mostly second"),
            make_transcript(6500, 8500, "mostly fourth"),
        ];

        let scenes = assign_transcripts(scenes, &transcripts).unwrap();
        let texts: Vec<Vec<&str>> = scenes
            .iter()
            .map(|s| s.transcripts.iter().map(|t| t.text.as_str()).collect())
            .collect();
        assert_eq!(texts[0], vec!["inside first"]);
        assert_eq!(texts[1], vec!["spans second", "mostly second"]);
        assert!(texts[2].is_empty());
        assert_eq!(texts[3], vec!["mostly fourth"]);
    }

    #[test]
    fn test_transcript_tie_goes_to_earliest_scene() {
        let scenes = make_scenes(&[(0, 2000), (2000, 4000)]);
        let transcripts = vec![make_transcript(1000, 3000, "split evenly")];
        let scenes = assign_transcripts(scenes, &transcripts).unwrap();
        assert_eq!(scenes[0].transcripts.len(), 1);
        assert!(scenes[1].transcripts.is_empty());
    }

    #[test]
    fn test_transcript_on_boundary_goes_to_containing_scene() {
        let scenes = make_scenes(&TIMELINE);
        let transcripts = vec![make_transcript(2000, 3000, "starts on cut")];
        let scenes = assign_transcripts(scenes, &transcripts).unwrap();
        assert!(scenes[0].transcripts.is_empty());
        assert_eq!(scenes[1].transcripts.len(), 1);
    }

    #[test]
    fn test_segment_type_first_writer_wins() {
        let scenes = make_scenes(&TIMELINE);
        let segments = vec![
            AudioAnnotation {
                time: TimeRange::new(0, 1000),
                kind: AudioSegmentType::Recap,
            },
            AudioAnnotation {
                time: TimeRange::new(1000, 5000),
                kind: AudioSegmentType::Programme,
            },
            AudioAnnotation {
                time: TimeRange::new(5000, 9000),
                kind: AudioSegmentType::Rating,
            },
        ];

        let scenes = assign_segment_types(scenes, &segments).unwrap();
        let kinds: Vec<Option<AudioSegmentType>> =
            scenes.iter().map(|s| s.audio_segment_type).collect();
        assert_eq!(
            kinds,
            vec![
                Some(AudioSegmentType::Recap),
                Some(AudioSegmentType::Programme),
                Some(AudioSegmentType::Programme),
                Some(AudioSegmentType::Rating),
            ]
        );
    }

    #[test]
    fn test_spanning_segment_types_every_untyped_scene() {
        let scenes = make_scenes(&[(0, 1000), (1000, 2000), (2000, 3000)]);
        let segments = vec![AudioAnnotation {
            time: TimeRange::new(0, 3000),
            kind: AudioSegmentType::Programme,
        }];

        let scenes = assign_segment_types(scenes, &segments).unwrap();
        assert!(scenes
            .iter()
            .all(|s| s.audio_segment_type == Some(AudioSegmentType::Programme)));
    }

    #[test]
    fn test_faces_use_exclusive_touch_and_dedupe() {
        let scenes = make_scenes(&TIMELINE);
        let faces = vec![
            make_face("ada", 500, 800),
            make_face("ada", 900, 1200),
            make_face("grace", 2000, 2000),
            make_face("grace", 3000, 3500),
        ];

        let scenes = assign_faces(scenes, &faces).unwrap();
        assert_eq!(scenes[0].faces.len(), 1);
        assert_eq!(scenes[0].faces[0].grid_image_key, "grid/500.jpg");
        assert_eq!(scenes[1].faces.len(), 1);
        assert_eq!(scenes[1].faces[0].name, "grace");
        assert_eq!(scenes[1].faces[0].grid_image_key, "grid/3000.jpg");
    }

    #[test]
    fn test_audio_tags_require_containment() {
        let scenes = make_scenes(&TIMELINE);
        let tags = vec![
            make_tag("music", 100, 600),
            make_tag("music", 800, 1000),
            make_tag("laughter", 1500, 2500),
            make_tag("applause", 2500, 3000),
        ];

        let scenes = accumulate_audio_tags(scenes, &tags).unwrap();
        assert_eq!(
            scenes[0].audio_tags,
            vec![AudioTagTotal {
                label: "music".to_string(),
                duration_ms: 700
            }]
        );
        assert_eq!(
            scenes[1].audio_tags,
            vec![AudioTagTotal {
                label: "applause".to_string(),
                duration_ms: 500
            }]
        );
    }

    #[test]
    fn test_unsorted_stream_rejected() {
        let scenes = make_scenes(&TIMELINE);
        let transcripts = vec![make_transcript(3000, 3500, "b"), make_transcript(1000, 1500, "a")];
        let err = assign_transcripts(scenes, &transcripts).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Unsorted {
                stream: "transcripts",
                index: 1
            }
        ));
    }

    #[test]
    fn test_align_preserves_scene_order() {
        let scenes = make_scenes(&TIMELINE);
        let annotations = Annotations {
            transcripts: vec![make_transcript(100, 200, "hi")],
            faces: vec![make_face("ada", 7100, 7200)],
            ..Default::default()
        };

        let aligned = align(scenes.clone(), &annotations).unwrap();
        let ids: Vec<u32> = aligned.iter().map(|s| s.scene_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(aligned[0].transcripts.len(), 1);
        assert_eq!(aligned[3].faces.len(), 1);
        assert_eq!(aligned[1], scenes[1]);
    }
}
