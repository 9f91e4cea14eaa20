//! Extraction engine: runs planned jobs through the external encoder
//!
//! A run moves `Idle -> Running -> {Completed, Aborted}`. Jobs are executed
//! one at a time on a background task. A failing job is recorded and the run
//! moves on; only cancellation stops a run early.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{ExtractionJob, JobFailure, JobOutcome, RunResult};
use crate::ports::{EncodePort, EncodeProcess, FsPort};
use crate::utils::Utils;

pub mod command;
pub mod progress;

use command::{progress_token, EncodeCommand, DEFAULT_ENCODER};
use progress::{CancelToken, RunEvent};

/// Encoder output lines kept for failure diagnostics
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Default per-job upper bound
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(300);

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Encoder executable
    pub program: String,
    /// Jobs running longer than this are killed and recorded as timeouts
    pub job_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_ENCODER.to_string(),
            job_timeout: Some(DEFAULT_JOB_TIMEOUT),
        }
    }
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunResult),
    Aborted { succeeded: usize, attempted: usize },
}

/// Handle to an active run
pub struct RunHandle {
    cancel: CancelToken,
    join: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Token that cancels this run when triggered
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Kill the in-flight job and stop the run
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to end
    pub async fn wait(self) -> Result<RunOutcome, DomainError> {
        self.join
            .await
            .map_err(|e| DomainError::Spawn(format!("Extraction worker failed: {}", e)))
    }
}

/// Sequential extraction engine. One run at a time per instance.
pub struct ExtractionEngine {
    encoder: Arc<dyn EncodePort>,
    fs: Arc<dyn FsPort>,
    config: EngineConfig,
    state: Arc<Mutex<EngineState>>,
}

impl ExtractionEngine {
    pub fn new(encoder: Arc<dyn EncodePort>, fs: Arc<dyn FsPort>, config: EngineConfig) -> Self {
        Self {
            encoder,
            fs,
            config,
            state: Arc::new(Mutex::new(EngineState::Idle)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        *lock_state(&self.state)
    }

    /// Start a run in the background.
    ///
    /// Fails without touching any job if a run is already active or the
    /// output directory cannot be prepared.
    pub async fn start(
        &self,
        jobs: Vec<ExtractionJob>,
        output_dir: &Path,
        events: UnboundedSender<RunEvent>,
    ) -> Result<RunHandle, DomainError> {
        {
            let mut state = lock_state(&self.state);
            if *state == EngineState::Running {
                return Err(DomainError::EngineBusy);
            }
            *state = EngineState::Running;
        }

        if let Err(e) = self.prepare_output_dir(output_dir).await {
            error!("Cannot prepare output directory: {}", e);
            *lock_state(&self.state) = EngineState::Idle;
            return Err(e);
        }

        let cancel = CancelToken::new();
        let worker = RunWorker {
            encoder: Arc::clone(&self.encoder),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            cancel: cancel.clone(),
            events,
            output_dir: output_dir.to_path_buf(),
        };

        info!(
            "Starting extraction of {} job(s) into {}",
            jobs.len(),
            output_dir.display()
        );
        let join = tokio::spawn(worker.run(jobs));

        Ok(RunHandle { cancel, join })
    }

    /// Start a run and wait for it to end
    pub async fn run(
        &self,
        jobs: Vec<ExtractionJob>,
        output_dir: &Path,
        events: UnboundedSender<RunEvent>,
    ) -> Result<RunOutcome, DomainError> {
        self.start(jobs, output_dir, events).await?.wait().await
    }

    async fn prepare_output_dir(&self, output_dir: &Path) -> Result<(), DomainError> {
        let unavailable =
            |e: DomainError| DomainError::OutputDirUnavailable(format!("{}: {}", output_dir.display(), e));

        self.fs.create_dir_all(output_dir).await.map_err(unavailable)?;
        self.fs.ensure_writable(output_dir).await.map_err(unavailable)
    }
}

fn lock_state(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// How a single launched job ended
enum JobRun {
    Finished(JobOutcome),
    Cancelled,
}

/// Background side of a run
struct RunWorker {
    encoder: Arc<dyn EncodePort>,
    config: EngineConfig,
    state: Arc<Mutex<EngineState>>,
    cancel: CancelToken,
    events: UnboundedSender<RunEvent>,
    output_dir: PathBuf,
}

impl RunWorker {
    async fn run(self, jobs: Vec<ExtractionJob>) -> RunOutcome {
        let total = jobs.len();
        let mut succeeded = 0;

        self.emit(RunEvent::Started { total });

        for (index, job) in jobs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return self.abort(succeeded, index, total);
            }

            let name = job.segment.name.clone();
            let duration_ms = job.segment.duration_ms();
            if duration_ms <= 0 {
                warn!("Skipping segment {}: non-positive duration", name);
                self.emit(RunEvent::JobFailed {
                    index,
                    total,
                    name,
                    failure: JobFailure::InvalidDuration { duration_ms },
                });
                continue;
            }

            self.emit(RunEvent::JobStarted {
                index,
                total,
                label: job.label(),
            });

            match self.run_job(index, job, &name).await {
                JobRun::Finished(JobOutcome::Succeeded) => {
                    succeeded += 1;
                    self.emit(RunEvent::JobSucceeded {
                        index,
                        total,
                        name,
                        percent: Utils::progress_percent(index + 1, total),
                    });
                }
                JobRun::Finished(JobOutcome::Failed(failure)) => {
                    warn!("Segment {} failed: {}", name, failure);
                    self.emit(RunEvent::JobFailed {
                        index,
                        total,
                        name,
                        failure,
                    });
                }
                JobRun::Cancelled => return self.abort(succeeded, index + 1, total),
            }
        }

        let result = RunResult {
            succeeded,
            total,
            output_dir: self.output_dir.clone(),
            finished_at: Utc::now(),
        };
        *lock_state(&self.state) = EngineState::Completed;
        info!("{}", result.summary());
        self.emit(RunEvent::Completed(result.clone()));
        RunOutcome::Completed(result)
    }

    async fn run_job(&self, index: usize, job: &ExtractionJob, name: &str) -> JobRun {
        let command = EncodeCommand::for_job(&self.config.program, job);
        debug!(%command, "Launching encoder");

        let mut process = match self.encoder.launch(&command).await {
            Ok(process) => process,
            Err(e) => {
                return JobRun::Finished(JobOutcome::Failed(JobFailure::Spawn {
                    message: e.to_string(),
                }))
            }
        };

        let deadline = self.config.job_timeout.map(|limit| Instant::now() + limit);
        let timeout = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timeout);

        let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    Self::kill(&mut process, name).await;
                    return JobRun::Cancelled;
                }
                _ = &mut timeout => {
                    Self::kill(&mut process, name).await;
                    return JobRun::Finished(JobOutcome::Failed(self.timeout_failure()));
                }
                line = process.next_line() => match line {
                    Some(line) => self.observe_line(index, name, line, &mut tail),
                    None => break,
                },
            }
        }

        let exit = tokio::select! {
            _ = self.cancel.cancelled() => {
                Self::kill(&mut process, name).await;
                return JobRun::Cancelled;
            }
            _ = &mut timeout => {
                Self::kill(&mut process, name).await;
                return JobRun::Finished(JobOutcome::Failed(self.timeout_failure()));
            }
            exit = process.wait() => exit,
        };

        match exit {
            Ok(0) => JobRun::Finished(JobOutcome::Succeeded),
            Ok(code) => JobRun::Finished(JobOutcome::Failed(JobFailure::ExitCode {
                code,
                output: Vec::from(tail).join("\n"),
            })),
            Err(e) => JobRun::Finished(JobOutcome::Failed(JobFailure::Spawn {
                message: e.to_string(),
            })),
        }
    }

    fn observe_line(&self, index: usize, name: &str, line: String, tail: &mut VecDeque<String>) {
        if let Some(token) = progress_token(&line) {
            self.emit(RunEvent::Progress {
                index,
                name: name.to_string(),
                elapsed: token.to_string(),
            });
        }

        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        if tail.len() == DIAGNOSTIC_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line.to_string());
    }

    fn timeout_failure(&self) -> JobFailure {
        JobFailure::Timeout {
            seconds: self.config.job_timeout.map(|t| t.as_secs()).unwrap_or_default(),
        }
    }

    async fn kill(process: &mut Box<dyn EncodeProcess>, name: &str) {
        if let Err(e) = process.kill().await {
            warn!("Failed to stop encoder for {}: {}", name, e);
        }
    }

    fn abort(&self, succeeded: usize, attempted: usize, total: usize) -> RunOutcome {
        *lock_state(&self.state) = EngineState::Aborted;
        info!(
            "Extraction cancelled after {}/{} job(s), {} succeeded",
            attempted, total, succeeded
        );
        self.emit(RunEvent::Aborted {
            succeeded,
            attempted,
            total,
        });
        RunOutcome::Aborted {
            succeeded,
            attempted,
        }
    }

    fn emit(&self, event: RunEvent) {
        debug!("{}", event.status_line());
        // The receiver may already be gone; the run still finishes
        let _ = self.events.send(event);
    }
}
