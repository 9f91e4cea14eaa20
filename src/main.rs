//! SplitX video splitter
//!
//! Splits one video into several named files, one per marked segment, with an
//! optional crop shared by every segment. Encoding is delegated to ffmpeg.
//!
//! # Usage
//!
//! ```bash
//! splitter inspect -i talk.mp4
//! splitter plan -i talk.mp4 --cut 0 --cut 00:01:30 --cut 00:04:00 --names "Intro,Talk"
//! splitter split -i talk.mp4 --model ranges --range 00:00:10-00:00:40 --names Clip --preset 1:1
//! ```

use clap::Parser;
use tracing::error;

use splitx_cli::cli::{exit_code_for, run, Cli};

/// Main entry point for the SplitX CLI application
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    };

    std::process::exit(code);
}
