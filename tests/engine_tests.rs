//! Integration tests for the extraction engine driven by a fake encoder

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use splitx_cli::adapters::FsLocalAdapter;
use splitx_cli::domain::errors::DomainError;
use splitx_cli::domain::model::{ExtractionJob, JobFailure, Segment, TimeOffset};
use splitx_cli::engine::command::EncodeCommand;
use splitx_cli::engine::progress::RunEvent;
use splitx_cli::engine::{EngineConfig, EngineState, ExtractionEngine, RunOutcome};
use splitx_cli::ports::{EncodePort, EncodeProcess};
use splitx_cli::utils::path::NameSanitizer;

// Test utilities

/// What the fake encoder does for one output file
#[derive(Debug, Clone, Copy)]
enum Behavior {
    /// Print a progress line, then exit with the code; exit 0 writes the output file
    Exit(i32),
    /// Never produce output or exit until killed
    Hang,
    /// Fail to start at all
    SpawnFail,
}

/// Encoder stand-in keyed by output file stem
#[derive(Default)]
struct FakeEncoder {
    behaviors: HashMap<String, Behavior>,
    launches: Mutex<Vec<EncodeCommand>>,
    killed: Arc<AtomicBool>,
}

impl FakeEncoder {
    fn with(behaviors: &[(&str, Behavior)]) -> Self {
        Self {
            behaviors: behaviors
                .iter()
                .map(|(name, behavior)| (name.to_string(), *behavior))
                .collect(),
            ..Self::default()
        }
    }

    fn launched(&self) -> Vec<EncodeCommand> {
        self.launches.lock().unwrap().clone()
    }
}

#[async_trait]
impl EncodePort for FakeEncoder {
    async fn launch(&self, command: &EncodeCommand) -> Result<Box<dyn EncodeProcess>, DomainError> {
        let output = PathBuf::from(command.args.last().unwrap());
        let stem = output.file_stem().unwrap().to_string_lossy().to_string();
        let behavior = self.behaviors.get(&stem).copied().unwrap_or(Behavior::Exit(0));

        if let Behavior::SpawnFail = behavior {
            return Err(DomainError::Spawn("ffmpeg: No such file or directory".to_string()));
        }

        self.launches.lock().unwrap().push(command.clone());
        Ok(Box::new(FakeProcess {
            behavior,
            output,
            lines: vec![
                "Input #0, mov,mp4,m4a,3gp,3g2,mj2".to_string(),
                "frame=   30 fps=0.0 q=-1.0 size=     256kB time=00:00:01.00 bitrate=2097.2kbits/s".to_string(),
                "Conversion failed!".to_string(),
            ],
            killed: Arc::clone(&self.killed),
        }))
    }
}

struct FakeProcess {
    behavior: Behavior,
    output: PathBuf,
    lines: Vec<String>,
    killed: Arc<AtomicBool>,
}

#[async_trait]
impl EncodeProcess for FakeProcess {
    async fn next_line(&mut self) -> Option<String> {
        if let Behavior::Hang = self.behavior {
            std::future::pending::<()>().await;
        }
        if self.lines.is_empty() {
            None
        } else {
            Some(self.lines.remove(0))
        }
    }

    async fn wait(&mut self) -> Result<i32, DomainError> {
        match self.behavior {
            Behavior::Exit(0) => {
                std::fs::write(&self.output, b"segment").unwrap();
                Ok(0)
            }
            Behavior::Exit(code) => Ok(code),
            _ => std::future::pending().await,
        }
    }

    async fn kill(&mut self) -> Result<(), DomainError> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn job(dir: &Path, index: usize, start_ms: u64, end_ms: u64, name: &str) -> ExtractionJob {
    ExtractionJob {
        segment: Segment {
            index,
            start: TimeOffset::from_millis(start_ms),
            end: TimeOffset::from_millis(end_ms),
            name: name.to_string(),
        },
        crop: None,
        input_path: PathBuf::from("input.mp4"),
        output_path: NameSanitizer::output_path(dir, name, "mp4"),
    }
}

fn engine(encoder: Arc<FakeEncoder>, timeout: Option<Duration>) -> ExtractionEngine {
    ExtractionEngine::new(
        encoder,
        Arc::new(FsLocalAdapter::new()),
        EngineConfig {
            program: "ffmpeg".to_string(),
            job_timeout: timeout,
        },
    )
}

fn drain(rx: &mut mpsc::UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// End-to-end runs

#[tokio::test]
async fn test_single_successful_job() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(FakeEncoder::default());
    let engine = engine(Arc::clone(&encoder), None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = engine
        .run(vec![job(dir.path(), 0, 0, 2000, "Intro")], dir.path(), tx)
        .await
        .unwrap();

    let RunOutcome::Completed(result) = outcome else {
        panic!("run did not complete");
    };
    assert_eq!((result.succeeded, result.total), (1, 1));
    assert_eq!(result.output_dir, dir.path());
    assert!(dir.path().join("Intro.mp4").exists());
    assert_eq!(engine.state(), EngineState::Completed);

    let events = drain(&mut rx);
    assert!(events.contains(&RunEvent::Progress {
        index: 0,
        name: "Intro".to_string(),
        elapsed: "00:00:01.00".to_string(),
    }));
    assert!(events.iter().any(|e| e.progress_percent() == Some(100)));
    assert!(matches!(events.last(), Some(RunEvent::Completed(_))));

    let args = encoder.launched()[0].args_lossy();
    assert_eq!(&args[..6], ["-ss", "00:00:00", "-i", "input.mp4", "-t", "2.000"]);
}

#[tokio::test]
async fn test_failing_job_is_recorded_and_named() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(FakeEncoder::with(&[("Intro", Behavior::Exit(1))]));
    let engine = engine(encoder, None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = engine
        .run(vec![job(dir.path(), 0, 0, 2000, "Intro")], dir.path(), tx)
        .await
        .unwrap();

    let RunOutcome::Completed(result) = outcome else {
        panic!("run did not complete");
    };
    assert_eq!((result.succeeded, result.total), (0, 1));
    assert!(!result.is_complete_success());
    assert!(result.summary().starts_with("Only 0/1"));

    let failure = drain(&mut rx)
        .into_iter()
        .find(|e| matches!(e, RunEvent::JobFailed { .. }))
        .unwrap();
    let status = failure.status_line();
    assert!(status.contains("Intro"), "{}", status);
    assert!(status.contains("Conversion failed!"), "{}", status);
}

#[tokio::test]
async fn test_failure_reports_the_name_as_typed() {
    let dir = TempDir::new().unwrap();
    // The encoder sees the sanitized file stem
    let encoder = Arc::new(FakeEncoder::with(&[("Intro_ Part 1_2", Behavior::Exit(1))]));
    let engine = engine(encoder, None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    engine
        .run(vec![job(dir.path(), 0, 0, 2000, "Intro: Part 1/2")], dir.path(), tx)
        .await
        .unwrap();

    let events = drain(&mut rx);
    assert!(events.contains(&RunEvent::JobStarted {
        index: 0,
        total: 1,
        label: "Intro_ Part 1_2".to_string(),
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        RunEvent::Progress { name, .. } if name == "Intro: Part 1/2"
    )));

    let failure = events
        .iter()
        .find(|e| matches!(e, RunEvent::JobFailed { .. }))
        .unwrap();
    let status = failure.status_line();
    assert!(status.contains("Failed to cut segment Intro: Part 1/2:"), "{}", status);
}

#[tokio::test]
async fn test_failures_do_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(FakeEncoder::with(&[
        ("b", Behavior::SpawnFail),
        ("c", Behavior::Exit(69)),
    ]));
    let engine = engine(Arc::clone(&encoder), None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let jobs = vec![
        job(dir.path(), 0, 0, 1000, "a"),
        job(dir.path(), 1, 1000, 2000, "b"),
        job(dir.path(), 2, 2000, 3000, "c"),
        job(dir.path(), 3, 3000, 4000, "d"),
    ];
    let outcome = engine.run(jobs, dir.path(), tx).await.unwrap();

    let RunOutcome::Completed(result) = outcome else {
        panic!("run did not complete");
    };
    assert_eq!((result.succeeded, result.total), (2, 4));

    let events = drain(&mut rx);
    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::JobSucceeded { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![25, 100]);

    let failures: Vec<&JobFailure> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::JobFailed { failure, .. } => Some(failure),
            _ => None,
        })
        .collect();
    assert!(matches!(failures[0], JobFailure::Spawn { .. }));
    assert!(matches!(failures[1], JobFailure::ExitCode { code: 69, .. }));
}

#[tokio::test]
async fn test_non_positive_duration_is_skipped_without_launch() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(FakeEncoder::default());
    let engine = engine(Arc::clone(&encoder), None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let jobs = vec![
        job(dir.path(), 0, 5000, 5000, "empty"),
        job(dir.path(), 1, 0, 1000, "ok"),
    ];
    let outcome = engine.run(jobs, dir.path(), tx).await.unwrap();

    let RunOutcome::Completed(result) = outcome else {
        panic!("run did not complete");
    };
    assert_eq!((result.succeeded, result.total), (1, 2));
    assert_eq!(encoder.launched().len(), 1);
    assert!(drain(&mut rx).iter().any(|e| matches!(
        e,
        RunEvent::JobFailed {
            failure: JobFailure::InvalidDuration { duration_ms: 0 },
            ..
        }
    )));
}

#[tokio::test]
async fn test_timeout_kills_job_and_run_continues() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(FakeEncoder::with(&[("slow", Behavior::Hang)]));
    let engine = engine(Arc::clone(&encoder), Some(Duration::from_millis(50)));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let jobs = vec![
        job(dir.path(), 0, 0, 1000, "slow"),
        job(dir.path(), 1, 1000, 2000, "fast"),
    ];
    let outcome = tokio::time::timeout(Duration::from_secs(5), engine.run(jobs, dir.path(), tx))
        .await
        .unwrap()
        .unwrap();

    let RunOutcome::Completed(result) = outcome else {
        panic!("run did not complete");
    };
    assert_eq!((result.succeeded, result.total), (1, 2));
    assert!(encoder.killed.load(Ordering::SeqCst));
    assert!(!dir.path().join("slow.mp4").exists());
    assert!(drain(&mut rx).iter().any(|e| matches!(
        e,
        RunEvent::JobFailed {
            failure: JobFailure::Timeout { .. },
            ..
        }
    )));
}

// Cancellation

#[tokio::test]
async fn test_cancel_after_first_job() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(FakeEncoder::with(&[("two", Behavior::Hang)]));
    let engine = engine(Arc::clone(&encoder), None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let jobs = vec![
        job(dir.path(), 0, 0, 1000, "one"),
        job(dir.path(), 1, 1000, 2000, "two"),
        job(dir.path(), 2, 2000, 3000, "three"),
    ];
    let handle = engine.start(jobs, dir.path(), tx).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        if matches!(event, RunEvent::JobStarted { index: 1, .. }) {
            handle.cancel();
        }
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            break;
        }
    }
    let outcome = handle.wait().await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            succeeded: 1,
            attempted: 2
        }
    );
    assert_eq!(engine.state(), EngineState::Aborted);
    assert!(!events.iter().any(|e| matches!(e, RunEvent::Completed(_))));
    assert!(matches!(events.last(), Some(RunEvent::Aborted { .. })));

    assert!(encoder.killed.load(Ordering::SeqCst));
    assert_eq!(encoder.launched().len(), 2);
    assert!(dir.path().join("one.mp4").exists());
    assert!(!dir.path().join("two.mp4").exists());
    assert!(!dir.path().join("three.mp4").exists());
}

// Engine-level failures

#[tokio::test]
async fn test_second_run_while_running_is_rejected() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(FakeEncoder::with(&[("stuck", Behavior::Hang)]));
    let engine = engine(encoder, None);

    let (tx, _rx) = mpsc::unbounded_channel();
    let handle = engine
        .start(vec![job(dir.path(), 0, 0, 1000, "stuck")], dir.path(), tx)
        .await
        .unwrap();
    assert_eq!(engine.state(), EngineState::Running);

    let (tx2, _rx2) = mpsc::unbounded_channel();
    let second = engine
        .start(vec![job(dir.path(), 0, 0, 1000, "other")], dir.path(), tx2)
        .await;
    assert!(matches!(second, Err(DomainError::EngineBusy)));

    handle.cancel();
    handle.wait().await.unwrap();

    let (tx3, _rx3) = mpsc::unbounded_channel();
    let third = engine
        .run(vec![job(dir.path(), 0, 0, 1000, "other")], dir.path(), tx3)
        .await
        .unwrap();
    assert!(matches!(third, RunOutcome::Completed(_)));
}

#[tokio::test]
async fn test_unusable_output_dir_is_fatal() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();
    let output_dir = blocker.join("clips");

    let encoder = Arc::new(FakeEncoder::default());
    let engine = engine(Arc::clone(&encoder), None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let result = engine
        .start(vec![job(&output_dir, 0, 0, 1000, "a")], &output_dir, tx)
        .await;

    assert!(matches!(result, Err(DomainError::OutputDirUnavailable(_))));
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(encoder.launched().is_empty());
    assert!(drain(&mut rx).is_empty());
}
