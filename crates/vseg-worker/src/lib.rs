//! File-based segmentation worker.
//!
//! This crate provides:
//! - The on-disk job document and result formats
//! - A job runner that resolves configuration and drives the pipeline
//! - Checkpoint hand-off for runs cut short by the selection deadline

pub mod error;
pub mod job;

pub use error::{WorkerError, WorkerResult};
pub use job::{JobDocument, JobResult, JobRunner};
