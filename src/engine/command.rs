//! Encoder command construction and output parsing

use std::ffi::OsString;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::model::ExtractionJob;
use crate::utils::time::TimeCodec;

/// Default encoder executable name, resolved through `PATH`
pub const DEFAULT_ENCODER: &str = "ffmpeg";

/// A fully built encoder invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl EncodeCommand {
    /// Build the invocation for one job.
    ///
    /// Seeking happens before the input so the encoder jumps straight to the
    /// start offset. Without a crop every stream is copied as-is; with a crop
    /// the video is re-encoded through the crop filter and audio is copied.
    pub fn for_job(program: &str, job: &ExtractionJob) -> Self {
        let duration_ms = job.segment.duration_ms().max(0) as u64;

        let mut args: Vec<OsString> = vec![
            "-ss".into(),
            TimeCodec::format(job.segment.start.as_millis()).into(),
            "-i".into(),
            job.input_path.clone().into_os_string(),
            "-t".into(),
            TimeCodec::format_seconds(duration_ms).into(),
        ];

        match &job.crop {
            Some(region) => {
                args.push("-vf".into());
                args.push(region.filter_arg().into());
                args.push("-c:a".into());
                args.push("copy".into());
            }
            None => {
                args.push("-c".into());
                args.push("copy".into());
            }
        }

        args.push("-avoid_negative_ts".into());
        args.push("make_zero".into());
        args.push("-y".into());
        args.push(job.output_path.clone().into_os_string());

        Self {
            program: program.to_string(),
            args,
        }
    }

    /// Arguments as lossy strings, for logs and assertions
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect()
    }
}

impl fmt::Display for EncodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args_lossy() {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Elapsed-time token from an encoder status line, e.g. `00:00:01.50`
/// from `frame=  30 fps=0.0 q=-1.0 size=  256kB time=00:00:01.50 bitrate=...`
pub fn progress_token(line: &str) -> Option<&str> {
    let start = line.find("time=")? + "time=".len();
    let rest = line[start..].trim_start();
    let token = rest.split_whitespace().next()?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
