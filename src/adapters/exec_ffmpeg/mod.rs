//! FFmpeg execution adapter
//!
//! Runs the encoder as a child process and merges stdout and stderr into a
//! single line stream. FFmpeg rewrites its status line with carriage returns,
//! so both `\r` and `\n` end a line.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::errors::*;
use crate::engine::command::{EncodeCommand, DEFAULT_ENCODER};
use crate::ports::*;

/// FFmpeg-based encoder adapter
pub struct FfmpegAdapter {
    program: String,
}

impl FfmpegAdapter {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// First line of `ffmpeg -version`
    pub async fn version(&self) -> Result<String, DomainError> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DomainError::Spawn(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(DomainError::Spawn(format!(
                "{} -version exited with {}",
                self.program, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

impl Default for FfmpegAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODER)
    }
}

#[async_trait]
impl EncodePort for FfmpegAdapter {
    async fn launch(&self, command: &EncodeCommand) -> Result<Box<dyn EncodeProcess>, DomainError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DomainError::Spawn(format!("{}: {}", command.program, e)))?;

        debug!(pid = ?child.id(), "Encoder started");

        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx));
        }

        Ok(Box::new(FfmpegProcess { child, lines: rx }))
    }
}

/// A running encoder child process
pub struct FfmpegProcess {
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl EncodeProcess for FfmpegProcess {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    async fn wait(&mut self) -> Result<i32, DomainError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| DomainError::Spawn(format!("Failed to wait for encoder: {}", e)))?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn kill(&mut self) -> Result<(), DomainError> {
        self.child
            .kill()
            .await
            .map_err(|e| DomainError::Spawn(format!("Failed to kill encoder: {}", e)))
    }
}

/// Forward `\r`/`\n` terminated lines until the stream closes
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let consumed = match reader.fill_buf().await {
            Ok([]) | Err(_) => break,
            Ok(available) => {
                for &byte in available {
                    if byte == b'\n' || byte == b'\r' {
                        flush(&mut pending, &tx);
                    } else {
                        pending.push(byte);
                    }
                }
                available.len()
            }
        };
        reader.consume(consumed);
    }

    flush(&mut pending, &tx);
}

fn flush(pending: &mut Vec<u8>, tx: &mpsc::UnboundedSender<String>) {
    if pending.is_empty() {
        return;
    }
    let _ = tx.send(String::from_utf8_lossy(pending).to_string());
    pending.clear();
}
