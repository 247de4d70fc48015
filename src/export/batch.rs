//! Concurrent batch execution of composition jobs.
//!
//! Jobs run on a dedicated pool of exactly `max_concurrency` worker threads.
//! Workers report each finished job over a channel to a single reporting
//! loop on the calling thread, so the progress callback is never invoked
//! concurrently and needs no synchronisation of its own. All workers are
//! joined before [`BatchExecutor::run`] returns.
//!
//! A failing (or panicking) job never affects its siblings: it is reported
//! as a failed [`JobOutcome`] and the batch carries on.

use crate::error::{Result, WatermarkError};
use crate::watermark::{compose, CompositionRequest};
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;
use uuid::Uuid;

/// Default number of worker threads.
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

/// Progress notification, emitted once per finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Jobs finished so far, including this one
    pub completed: usize,
    pub total: usize,
    pub success: bool,
    /// `"Saved: <path>"` or `"Error (<file>): <reason>"`
    pub message: String,
    /// Index of the job in the submitted list
    pub job_id: usize,
}

/// Final result of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job_id: usize,
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub success: bool,
    pub message: String,
}

/// Shared flag asking a running batch not to start any more jobs.
///
/// Jobs already running are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bounded worker pool for composition jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    max_concurrency: usize,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl BatchExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self { max_concurrency }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every job and return one outcome per job, in completion order.
    ///
    /// `on_progress` is called exactly once per job, from the calling thread.
    ///
    /// # Errors
    ///
    /// [`WatermarkError::Config`] if `max_concurrency` is 0 or the worker
    /// pool cannot be started. Per-job failures are never errors.
    pub fn run<F>(&self, jobs: Vec<CompositionRequest>, on_progress: F) -> Result<Vec<JobOutcome>>
    where
        F: FnMut(ProgressEvent),
    {
        self.run_with_cancel(jobs, &CancellationFlag::new(), on_progress)
    }

    /// Like [`run`](Self::run); once `cancel` is set, jobs that have not
    /// started yet are reported as failed instead of being executed.
    pub fn run_with_cancel<F>(
        &self,
        jobs: Vec<CompositionRequest>,
        cancel: &CancellationFlag,
        on_progress: F,
    ) -> Result<Vec<JobOutcome>>
    where
        F: FnMut(ProgressEvent),
    {
        self.execute(jobs, cancel, compose, on_progress)
    }

    fn execute<W, F>(
        &self,
        jobs: Vec<CompositionRequest>,
        cancel: &CancellationFlag,
        worker: W,
        mut on_progress: F,
    ) -> Result<Vec<JobOutcome>>
    where
        W: Fn(&CompositionRequest) -> Result<PathBuf> + Sync,
        F: FnMut(ProgressEvent),
    {
        if self.max_concurrency == 0 {
            return Err(WatermarkError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        let total = jobs.len();
        let batch_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(
            batch_id = %batch_id,
            total,
            max_concurrency = self.max_concurrency,
            "Starting batch"
        );

        let completed = AtomicUsize::new(0);
        let mut outcomes = Vec::with_capacity(total);

        ThreadPoolBuilder::new()
            .num_threads(self.max_concurrency)
            .thread_name(|i| format!("inkstamp-worker-{}", i))
            .build_scoped(
                |thread| thread.run(),
                |pool| {
                    pool.in_place_scope(|scope| {
                        let (tx, rx) = mpsc::channel::<JobOutcome>();

                        for (job_id, request) in jobs.into_iter().enumerate() {
                            let tx = tx.clone();
                            let worker = &worker;
                            scope.spawn(move |_| {
                                let outcome = run_job(job_id, request, cancel, worker, batch_id);
                                // The receiver outlives every worker
                                let _ = tx.send(outcome);
                            });
                        }
                        drop(tx);

                        for outcome in rx {
                            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                            on_progress(ProgressEvent {
                                completed: done,
                                total,
                                success: outcome.success,
                                message: outcome.message.clone(),
                                job_id: outcome.job_id,
                            });
                            outcomes.push(outcome);
                        }
                    })
                },
            )
            .map_err(|e| WatermarkError::Config(format!("Failed to start worker pool: {}", e)))?;

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            batch_id = %batch_id,
            total,
            succeeded,
            failed = total - succeeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );

        Ok(outcomes)
    }
}

fn run_job<W>(
    job_id: usize,
    request: CompositionRequest,
    cancel: &CancellationFlag,
    worker: &W,
    batch_id: Uuid,
) -> JobOutcome
where
    W: Fn(&CompositionRequest) -> Result<PathBuf>,
{
    let span = tracing::debug_span!("job", batch_id = %batch_id, job_id);
    let _enter = span.enter();

    let name = display_name(&request.source_path);

    let result: std::result::Result<PathBuf, String> = if cancel.is_cancelled() {
        Err("cancelled".to_string())
    } else {
        match catch_unwind(AssertUnwindSafe(|| worker(&request))) {
            Ok(Ok(path)) => Ok(path),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(format!("job panicked: {}", panic_message(payload.as_ref()))),
        }
    };

    match result {
        Ok(path) => {
            tracing::debug!(source = %request.source_path.display(), destination = %path.display(), "Job succeeded");
            JobOutcome {
                job_id,
                source_path: request.source_path,
                message: format!("Saved: {}", path.display()),
                destination_path: path,
                success: true,
            }
        }
        Err(reason) => {
            tracing::warn!(source = %request.source_path.display(), error = %reason, "Job failed");
            JobOutcome {
                job_id,
                source_path: request.source_path,
                destination_path: request.destination_path,
                success: false,
                message: format!("Error ({}): {}", name, reason),
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
