//! Batch export: output naming, the worker pool, and export planning.

pub mod batch;
pub mod paths;
pub mod plan;

pub use batch::{BatchExecutor, CancellationFlag, JobOutcome, ProgressEvent, DEFAULT_MAX_CONCURRENCY};
pub use paths::{allocate, destination_for, reserve, Naming};
pub use plan::Exporter;
