// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::utils::time::TimeCodec;

/// Absolute position inside a video, in whole milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOffset(u64);

impl TimeOffset {
    /// Largest offset a timecode may name; differences of two offsets stay
    /// representable as a signed millisecond count
    pub const MAX_MILLIS: u64 = i64::MAX as u64;

    /// Create from milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", TimeCodec::format(self.0))
    }
}

impl FromStr for TimeOffset {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeCodec::parse(s)
    }
}

/// Explicit start/end pair used by the explicit-range segment model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOffset,
    pub end: TimeOffset,
}

impl TimeRange {
    /// Create a range, rejecting `end <= start`
    pub fn new(start: TimeOffset, end: TimeOffset) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::InvalidRange {
                start_ms: start.as_millis(),
                end_ms: end.as_millis(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse `START-END` where both sides are timecodes
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let (start, end) = text.split_once('-').ok_or_else(|| {
            DomainError::format(text, "range must be written as START-END")
        })?;
        Self::new(TimeCodec::parse(start)?, TimeCodec::parse(end)?)
    }

    pub fn duration_ms(&self) -> u64 {
        self.end.as_millis() - self.start.as_millis()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Metadata of the loaded video's primary stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub width: u32,
    pub height: u32,
    pub duration_ms: u64,
}

impl VideoMeta {
    /// Create video metadata with validation
    pub fn new(width: u32, height: u32, duration_ms: u64) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::InvalidVideoBounds { width, height });
        }
        Ok(Self {
            width,
            height,
            duration_ms,
        })
    }

    /// Get aspect ratio
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for VideoMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} pixels, {}",
            self.width,
            self.height,
            TimeCodec::format(self.duration_ms)
        )
    }
}

/// Which rule set turns stored cut entries into segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentModel {
    /// Segments are the gaps between consecutive cut points
    #[default]
    Adjacent,
    /// Segments are explicit start/end ranges
    Ranges,
}

impl SegmentModel {
    /// Parse segment model from string
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "adjacent" | "points" | "adjacent-pair" => Ok(SegmentModel::Adjacent),
            "ranges" | "range" | "explicit" => Ok(SegmentModel::Ranges),
            other => Err(DomainError::BadArgs(format!(
                "Invalid segment model: {}. Valid models: adjacent, ranges",
                other
            ))),
        }
    }
}

impl fmt::Display for SegmentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentModel::Adjacent => write!(f, "adjacent"),
            SegmentModel::Ranges => write!(f, "ranges"),
        }
    }
}

/// One contiguous range to extract into its own file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start: TimeOffset,
    pub end: TimeOffset,
    pub name: String,
}

impl Segment {
    /// Signed duration in milliseconds; explicit ranges keep this positive,
    /// hand-built segments may not
    pub fn duration_ms(&self) -> i64 {
        let (start, end) = (self.start.as_millis(), self.end.as_millis());
        if end >= start {
            i64::try_from(end - start).unwrap_or(i64::MAX)
        } else {
            i64::try_from(start - end).map_or(i64::MIN, |ms| -ms)
        }
    }

    /// List label such as `01. 00:00:01 - 00:00:03`
    pub fn display_label(&self) -> String {
        format!("{:02}. {} - {}", self.index + 1, self.start, self.end)
    }
}

/// Axis-aligned rectangle in video pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Parse `X:Y:W:H` (commas are accepted as separators too)
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let parts: Vec<&str> = text.split([':', ',']).map(str::trim).collect();
        if parts.len() != 4 {
            return Err(DomainError::BadArgs(format!(
                "Invalid crop '{}'. Expected X:Y:WIDTH:HEIGHT",
                text
            )));
        }
        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                DomainError::BadArgs(format!("Invalid crop value '{}' in '{}'", part, text))
            })?;
        }
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    /// Right edge, computed without overflow
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Bottom edge, computed without overflow
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Filter argument in `width:height:x:y` order
    pub fn filter_arg(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// A single frozen unit of work for the extraction engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionJob {
    pub segment: Segment,
    pub crop: Option<CropRegion>,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl ExtractionJob {
    /// Name used in status lines, the sanitized output stem
    pub fn label(&self) -> String {
        self.output_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| self.segment.name.clone())
    }
}

/// Why a job did not produce its output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobFailure {
    InvalidDuration { duration_ms: i64 },
    Spawn { message: String },
    ExitCode { code: i32, output: String },
    Timeout { seconds: u64 },
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailure::InvalidDuration { duration_ms } => {
                write!(f, "invalid duration ({} ms)", duration_ms)
            }
            JobFailure::Spawn { message } => write!(f, "could not start encoder: {}", message),
            JobFailure::ExitCode { code, output } => {
                write!(f, "encoder exited with code {}: {}", code, output)
            }
            JobFailure::Timeout { seconds } => write!(f, "timed out after {} s", seconds),
        }
    }
}

/// Final outcome of a single job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    Failed(JobFailure),
}

/// Tally emitted once when every job has been attempted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub succeeded: usize,
    pub total: usize,
    pub output_dir: PathBuf,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn is_complete_success(&self) -> bool {
        self.succeeded == self.total
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// User-facing summary line, distinguishing partial failure
    pub fn summary(&self) -> String {
        if self.is_complete_success() {
            format!(
                "Done! Successfully cut {}/{} segments into {}",
                self.succeeded,
                self.total,
                self.output_dir.display()
            )
        } else {
            format!(
                "Only {}/{} segments were cut successfully",
                self.succeeded, self.total
            )
        }
    }
}
