//! Job-file runs through the worker library.

use tempfile::TempDir;
use vseg_engine::EngineConfig;
use vseg_models::{Frame, FrameRange, SegmentationInput, ShotSegment, TechnicalCue, TimeRange};
use vseg_worker::{JobDocument, JobResult, JobRunner, WorkerError};

fn make_input() -> SegmentationInput {
    let frames = (0..24u64)
        .map(|i| {
            let hash = format!("{:016x}", (i + 7).wrapping_mul(0x2545_f491_4f6c_dd1d));
            Frame::new(i, i * 1000, hash, ((i * 13) % 7) as f64)
        })
        .collect();
    let shots = vec![
        ShotSegment::new(0, FrameRange::new(0, 7), TimeRange::new(0, 7000), TechnicalCue::Steady),
        ShotSegment::new(1, FrameRange::new(8, 17), TimeRange::new(8000, 17_000), TechnicalCue::Content),
        ShotSegment::new(2, FrameRange::new(18, 23), TimeRange::new(18_000, 23_000), TechnicalCue::Credits),
    ];
    SegmentationInput {
        frames,
        shots: Some(shots),
        ..Default::default()
    }
}

fn write_job(dir: &TempDir, name: &str, job: &JobDocument) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_vec(job).unwrap()).unwrap();
    path
}

#[test]
fn test_run_file_writes_complete_result() {
    let dir = TempDir::new().unwrap();
    let job = JobDocument {
        job_id: Some("asset-42".to_string()),
        input: make_input(),
        ..Default::default()
    };
    let input = write_job(&dir, "job.json", &job);
    let output = dir.path().join("result.json");

    let result = JobRunner::default().run_file(&input, &output).unwrap();
    assert!(result.is_complete());

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(written["status"], "complete");
    assert_eq!(written["output"]["scenes"].as_array().map(Vec::len), Some(3));
    assert_eq!(written["output"]["scenes"][2]["sequence_type"], "credits");
}

#[test]
fn test_suspended_job_resumes_from_written_checkpoint() {
    let dir = TempDir::new().unwrap();
    let job = JobDocument {
        config: Some(EngineConfig::default().with_workers(2, Some(0))),
        input: make_input(),
        ..Default::default()
    };
    let input = write_job(&dir, "job.json", &job);
    let output = dir.path().join("result.json");

    let result = JobRunner::default().run_file(&input, &output).unwrap();
    assert!(!result.is_complete());

    let written: JobResult = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    let checkpoint = match written {
        JobResult::Suspended {
            checkpoint,
            remaining,
            ..
        } => {
            assert_eq!(remaining, 3);
            checkpoint
        }
        other => panic!("expected suspension, got {:?}", other),
    };

    let mut resumed = JobDocument::load(&input).unwrap().resume_with(checkpoint);
    resumed.config = None;
    let resumed_path = write_job(&dir, "resume.json", &resumed);
    let result = JobRunner::default().run_file(&resumed_path, &output).unwrap();

    let straight = JobRunner::default()
        .execute(JobDocument {
            input: make_input(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(result, straight);
}

#[test]
fn test_missing_job_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = JobRunner::default()
        .run_file(&dir.path().join("absent.json"), &dir.path().join("out.json"))
        .unwrap_err();
    assert!(matches!(err, WorkerError::Io { .. }));
    assert!(err.is_retryable());
}

#[test]
fn test_malformed_job_file_is_json_error() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("job.json");
    std::fs::write(&input, b"{\"input\": {\"frames\": 3}}").unwrap();

    let err = JobRunner::default()
        .run_file(&input, &dir.path().join("out.json"))
        .unwrap_err();
    assert!(matches!(err, WorkerError::Json(_)));
}

#[test]
fn test_unsorted_frames_rejected() {
    let dir = TempDir::new().unwrap();
    let mut job = JobDocument {
        input: make_input(),
        ..Default::default()
    };
    job.input.frames.swap(3, 4);
    let input = write_job(&dir, "job.json", &job);

    let err = JobRunner::default()
        .run_file(&input, &dir.path().join("out.json"))
        .unwrap_err();
    assert!(matches!(err, WorkerError::Engine(_)));
}
