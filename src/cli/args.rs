//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::errors::DomainError;

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments shared by the plan and split commands
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Segment model: adjacent (cut points) or ranges (start-end pairs)
    #[arg(long)]
    pub model: Option<String>,

    /// Cut point timecode (HH:MM:SS, MM:SS or seconds); repeatable
    #[arg(long = "cut", value_name = "TIMECODE")]
    pub cuts: Vec<String>,

    /// Explicit range START-END; repeatable
    #[arg(long = "range", value_name = "START-END")]
    pub ranges: Vec<String>,

    /// Segment names, comma separated, one per segment
    #[arg(long, conflicts_with = "names_file")]
    pub names: Option<String>,

    /// File with one segment name per line (blank lines are ignored)
    #[arg(long)]
    pub names_file: Option<PathBuf>,

    /// Crop rectangle in video pixels, X:Y:WIDTH:HEIGHT
    #[arg(long, conflicts_with_all = ["preset", "select"])]
    pub crop: Option<String>,

    /// Crop preset: 16:9, 4:3, 1:1 or center
    #[arg(long, conflicts_with = "select")]
    pub preset: Option<String>,

    /// Crop selection in preview coordinates, X,Y,WIDTH,HEIGHT
    #[arg(long, requires = "view", allow_hyphen_values = true)]
    pub select: Option<String>,

    /// Preview size the selection was drawn on, WIDTHxHEIGHT
    #[arg(long)]
    pub view: Option<String>,

    /// Output directory
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// Output container extension
    #[arg(long)]
    pub container: Option<String>,

    /// Per-segment timeout in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Known frame size WIDTHxHEIGHT; skips probing the input
    #[arg(long)]
    pub video_size: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(text: &str) -> Result<(u32, u32), DomainError> {
    let invalid = || DomainError::BadArgs(format!("Invalid size '{}'. Expected WIDTHxHEIGHT", text));
    let (width, height) = text.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = width.trim().parse().map_err(|_| invalid())?;
    let height = height.trim().parse().map_err(|_| invalid())?;
    Ok((width, height))
}
