//! Run events and cancellation for extraction runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::domain::model::{JobFailure, RunResult};

/// Event emitted by a running extraction, in order, on the run's channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// Run accepted, output directory ready
    Started { total: usize },
    /// A job's encoder is about to be launched; `label` is the output file stem
    JobStarted {
        index: usize,
        total: usize,
        label: String,
    },
    /// Encoder reported an elapsed-time token
    Progress {
        index: usize,
        name: String,
        elapsed: String,
    },
    /// Job exited cleanly
    JobSucceeded {
        index: usize,
        total: usize,
        name: String,
        percent: u8,
    },
    /// Job was skipped or its encoder failed; the run continues
    JobFailed {
        index: usize,
        total: usize,
        name: String,
        failure: JobFailure,
    },
    /// Every job was attempted
    Completed(RunResult),
    /// Run was cancelled; no result is produced
    Aborted {
        succeeded: usize,
        attempted: usize,
        total: usize,
    },
}

impl RunEvent {
    /// Human-readable status line
    pub fn status_line(&self) -> String {
        match self {
            RunEvent::Started { total } => format!("Starting extraction of {} segment(s)", total),
            RunEvent::JobStarted {
                index,
                total,
                label,
            } => format!("Cutting segment {}/{}: {}", index + 1, total, label),
            RunEvent::Progress {
                index,
                name,
                elapsed,
            } => format!("Segment {} ({}): time={}", index + 1, name, elapsed),
            RunEvent::JobSucceeded {
                index, total, name, ..
            } => format!("Finished segment {}/{}: {}", index + 1, total, name),
            RunEvent::JobFailed { name, failure, .. } => {
                format!("Failed to cut segment {}: {}", name, failure)
            }
            RunEvent::Completed(result) => result.summary(),
            RunEvent::Aborted {
                succeeded,
                attempted,
                total,
            } => format!(
                "Cancelled after {} of {} segment(s); {} succeeded",
                attempted, total, succeeded
            ),
        }
    }

    /// Overall progress carried by this event, if any
    pub fn progress_percent(&self) -> Option<u8> {
        match self {
            RunEvent::JobSucceeded { percent, .. } => Some(*percent),
            RunEvent::Completed(_) => Some(100),
            _ => None,
        }
    }

    /// Terminal events end the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::Completed(_) | RunEvent::Aborted { .. })
    }

    /// One JSON object per event, stamped with the time it was rendered
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Stamped<'a> {
            timestamp: DateTime<Utc>,
            status: String,
            #[serde(flatten)]
            event: &'a RunEvent,
        }

        serde_json::to_string(&Stamped {
            timestamp: Utc::now(),
            status: self.status_line(),
            event: self,
        })
    }
}

/// Cancellation flag shared between the caller and the run's worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
        self.inner.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_status_lines() {
        let started = RunEvent::JobStarted {
            index: 0,
            total: 3,
            label: "Intro".to_string(),
        };
        assert_eq!(started.status_line(), "Cutting segment 1/3: Intro");

        let failed = RunEvent::JobFailed {
            index: 1,
            total: 3,
            name: "Main".to_string(),
            failure: JobFailure::ExitCode {
                code: 1,
                output: "No such file".to_string(),
            },
        };
        assert!(failed.status_line().contains("Main"));
        assert!(failed.status_line().contains("No such file"));
        assert_eq!(failed.progress_percent(), None);
    }

    #[test]
    fn test_terminal_events() {
        let result = RunResult {
            succeeded: 1,
            total: 2,
            output_dir: PathBuf::from("out"),
            finished_at: Utc::now(),
        };
        let completed = RunEvent::Completed(result);
        assert!(completed.is_terminal());
        assert!(completed.status_line().starts_with("Only 1/2"));
        assert!(!RunEvent::Started { total: 2 }.is_terminal());
    }

    #[test]
    fn test_json_line_is_tagged() {
        let event = RunEvent::JobSucceeded {
            index: 0,
            total: 1,
            name: "Intro".to_string(),
            percent: 100,
        };
        let line = event.to_json_line().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "job_succeeded");
        assert_eq!(value["percent"], 100);
        assert_eq!(value["status"], "Finished segment 1/1: Intro");
        assert!(value["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_cancel_token_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_set() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .unwrap();
    }
}
