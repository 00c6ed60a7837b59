use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::pipeline::domain::combined_result::FailedVideo;
use crate::pipeline::domain::video_result::{VideoResult, VideoTask};
use crate::pipeline::video_worker::{VideoWorker, WorkerOutcome};
use crate::shared::constants::MAX_WORKERS;

/// Why a video produced no result.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TaskFailure {
    #[error("could not open video: {0}")]
    StreamOpen(String),
    #[error("cancelled")]
    Cancelled,
    #[error("{0}")]
    Fault(String),
    #[error("worker panicked: {0}")]
    Panicked(String),
}

#[derive(Debug)]
pub enum TaskStatus {
    Succeeded(VideoResult),
    Failed(TaskFailure),
}

/// Result of one task, tagged with the video it belongs to.
#[derive(Debug)]
pub struct TaskOutcome {
    pub video: PathBuf,
    pub status: TaskStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorConfig {
    /// Explicit worker count; still clamped to `[1, videos]`.
    pub workers: Option<usize>,
    /// Upper bound when the count is derived from the hardware.
    pub max_workers: usize,
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self {
            workers: None,
            max_workers: MAX_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a run produced, in completion order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub successes: Vec<VideoResult>,
    pub failures: Vec<(PathBuf, TaskFailure)>,
    pub requested: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.requested - self.successes.len()
    }

    pub fn failed_videos(&self) -> Vec<FailedVideo> {
        self.failures
            .iter()
            .map(|(video, failure)| FailedVideo {
                video_file: video.clone(),
                reason: failure.to_string(),
            })
            .collect()
    }
}

/// Number of concurrent workers for `videos` videos.
///
/// Without an override this is `min(videos, cores, cap)`, which is 0 only
/// for an empty batch. An override is honoured but kept within
/// `[1, max(videos, 1)]`.
pub fn worker_count(videos: usize, cores: usize, cap: usize, requested: Option<usize>) -> usize {
    match requested {
        Some(n) => n.clamp(1, videos.max(1)),
        None => videos.min(cores.max(1)).min(cap.max(1)),
    }
}

/// Runs each video through exactly one worker on a fixed pool of threads.
///
/// Tasks are queued up front; each pool thread pulls the next task when it
/// is free. Outcomes are collected as tasks finish, and a task that fails or
/// panics is recorded without affecting the others.
pub struct Orchestrator {
    worker: VideoWorker,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(worker: VideoWorker, config: OrchestratorConfig) -> Self {
        Self { worker, config }
    }

    pub fn worker_count(&self, videos: usize) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        worker_count(videos, cores, self.config.max_workers, self.config.workers)
    }

    pub fn run(&self, tasks: Vec<VideoTask>) -> RunReport {
        let started = Instant::now();
        let requested = tasks.len();
        let workers = self.worker_count(requested);
        let mut report = RunReport {
            requested,
            workers,
            ..RunReport::default()
        };
        if tasks.is_empty() {
            return report;
        }

        log::info!(
            "Starting concurrent processing of {requested} videos with {workers} workers..."
        );
        log::info!(
            "Videos to process: {:?}",
            tasks.iter().map(|t| display_name(&t.path)).collect::<Vec<_>>()
        );

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<VideoTask>();
        for task in tasks {
            if job_tx.send(task).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded::<TaskOutcome>();
        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let outcome_tx = outcome_tx.clone();
                let worker = &self.worker;
                scope.spawn(move || {
                    for task in job_rx {
                        if outcome_tx.send(run_task(worker, task)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(outcome_tx);

            for outcome in outcome_rx {
                record(&mut report, outcome);
            }
        });

        report.elapsed = started.elapsed();
        report
    }
}

fn run_task(worker: &VideoWorker, task: VideoTask) -> TaskOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| worker.run(&task)));
    let status = match result {
        Ok(Ok(WorkerOutcome::Completed(video_result))) => TaskStatus::Succeeded(video_result),
        Ok(Ok(WorkerOutcome::NotOpened(reason))) => {
            TaskStatus::Failed(TaskFailure::StreamOpen(reason))
        }
        Ok(Ok(WorkerOutcome::Cancelled)) => TaskStatus::Failed(TaskFailure::Cancelled),
        Ok(Err(e)) => TaskStatus::Failed(TaskFailure::Fault(e.to_string())),
        Err(payload) => TaskStatus::Failed(TaskFailure::Panicked(panic_message(payload.as_ref()))),
    };
    TaskOutcome {
        video: task.path,
        status,
    }
}

fn record(report: &mut RunReport, outcome: TaskOutcome) {
    let name = display_name(&outcome.video);
    match outcome.status {
        TaskStatus::Succeeded(result) => {
            log::info!("✓ [{name}] Processing completed successfully");
            report.successes.push(result);
        }
        TaskStatus::Failed(failure) => {
            log::error!("✗ [{name}] Processing failed: {failure}");
            report.failures.push((outcome.video, failure));
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
