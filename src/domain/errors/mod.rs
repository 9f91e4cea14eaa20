// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Which frame axis a crop check failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "x + width"),
            Axis::Vertical => write!(f, "y + height"),
        }
    }
}

/// Domain-specific error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Timecode could not be parsed
    #[error("Invalid timecode '{input}': {reason}")]
    Format { input: String, reason: String },

    /// Cut point or range already present in the store
    #[error("Duplicate cut: {0}")]
    Duplicate(String),

    /// Range whose end does not come after its start
    #[error("Invalid range: end ({end_ms} ms) must be after start ({start_ms} ms)")]
    InvalidRange { start_ms: u64, end_ms: u64 },

    /// Not enough cut points or ranges to form a segment
    #[error("Need at least {required} cut entries to form a segment, have {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    /// Segment name list does not line up with the derived segments
    #[error("Expected {expected} segment names but got {actual}")]
    NameCountMismatch { expected: usize, actual: usize },

    /// A segment name is blank after trimming
    #[error("Segment name at position {index} is empty")]
    EmptyName { index: usize },

    /// Crop rectangle leaves the frame
    #[error("Crop exceeds the video frame: {axis} = {extent} > {limit}")]
    CropOutOfBounds { axis: Axis, extent: u64, limit: u32 },

    /// Crop rectangle has no area
    #[error("Crop width and height must be at least 1 (got {width}x{height})")]
    EmptyCrop { width: u32, height: u32 },

    /// Video dimensions are unusable
    #[error("Invalid video bounds {width}x{height}")]
    InvalidVideoBounds { width: u32, height: u32 },

    /// An operation needed a loaded video
    #[error("No video loaded")]
    NoVideoLoaded,

    /// Operation does not belong to the configured segment model
    #[error("Operation '{operation}' is not available in the {model} segment model")]
    ModelMismatch { operation: String, model: String },

    /// An extraction run is already active on this engine
    #[error("An extraction run is already in progress")]
    EngineBusy,

    /// Output directory could not be created or written
    #[error("Output directory unavailable: {0}")]
    OutputDirUnavailable(String),

    /// External process could not be started
    #[error("Failed to launch external tool: {0}")]
    Spawn(String),

    /// Media probe failed
    #[error("Probe failed: {0}")]
    ProbeFail(String),

    /// File system failure
    #[error("File system error: {0}")]
    FsFail(String),

    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),
}

impl DomainError {
    /// Shorthand for a timecode format failure
    pub fn format(input: &str, reason: impl Into<String>) -> Self {
        DomainError::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
