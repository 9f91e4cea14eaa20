//! SplitX video splitter library
//!
//! Segment planning and extraction orchestration: a cut list and an optional
//! crop become one ffmpeg job per named segment, run sequentially with
//! per-job outcomes and a final tally.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{CropRegion, ExtractionJob, RunResult, Segment, SegmentModel, TimeOffset, VideoMeta};
pub use error::{SplitXError, SplitXResult};
