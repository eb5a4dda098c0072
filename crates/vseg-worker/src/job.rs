//! Job documents and the runner that executes them.
//!
//! A job document carries the decoded asset input, an optional config that
//! replaces the runner's base config, and an optional checkpoint from an
//! earlier suspended run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use vseg_engine::{Checkpoint, EngineConfig, RunStatus, SegmentationPipeline};
use vseg_models::{SegmentationInput, SegmentationOutput};

use crate::error::{WorkerError, WorkerResult};

/// One segmentation job as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDocument {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub config: Option<EngineConfig>,
    pub input: SegmentationInput,
    #[serde(default)]
    pub checkpoint: Option<Checkpoint>,
}

impl JobDocument {
    pub fn load(path: &Path) -> WorkerResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| WorkerError::io(path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The same job, continuing from `checkpoint`.
    pub fn resume_with(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }
}

/// Result document written next to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobResult {
    Complete {
        output: SegmentationOutput,
    },
    Suspended {
        checkpoint: Checkpoint,
        completed: usize,
        remaining: usize,
    },
}

impl JobResult {
    pub fn is_complete(&self) -> bool {
        matches!(self, JobResult::Complete { .. })
    }

    pub fn write(&self, path: &Path) -> WorkerResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json).map_err(|e| WorkerError::io(path, e))
    }
}

/// Runs job documents against a base engine configuration.
#[derive(Debug, Clone, Default)]
pub struct JobRunner {
    config: EngineConfig,
}

impl JobRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Base configuration from `VSEG_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute one job. An embedded config replaces the base config.
    pub fn execute(&self, job: JobDocument) -> WorkerResult<JobResult> {
        let job_id = job.job_id.as_deref().unwrap_or("anonymous");
        let span = info_span!("job", job_id = %job_id);
        let _guard = span.enter();

        let config = job.config.unwrap_or_else(|| self.config.clone());
        let pipeline = SegmentationPipeline::new(config)?;

        info!(
            frames = job.input.frames.len(),
            shots = job.input.shots.as_ref().map_or(0, Vec::len),
            resumed = job.checkpoint.is_some(),
            "Job started"
        );

        let status = match job.checkpoint {
            Some(checkpoint) => pipeline.resume(&job.input, checkpoint)?,
            None => pipeline.run(&job.input)?,
        };

        let result = match status {
            RunStatus::Complete(output) => {
                info!(
                    scenes = output.scenes.len(),
                    chapters = output.chapters.len(),
                    "Job complete"
                );
                JobResult::Complete { output }
            }
            RunStatus::Suspended { checkpoint, report } => {
                warn!(
                    completed = checkpoint.completed(),
                    remaining = report.remaining,
                    "Job suspended at deadline"
                );
                JobResult::Suspended {
                    completed: checkpoint.completed(),
                    remaining: report.remaining,
                    checkpoint,
                }
            }
        };
        Ok(result)
    }

    /// Load `input`, execute it and write the result to `output`.
    pub fn run_file(&self, input: &Path, output: &Path) -> WorkerResult<JobResult> {
        if input == output {
            return Err(WorkerError::job_failed(format!(
                "refusing to overwrite job document {}",
                input.display()
            )));
        }
        let job = JobDocument::load(input)?;
        let result = self.execute(job)?;
        result.write(output)?;
        Ok(result)
    }
}
