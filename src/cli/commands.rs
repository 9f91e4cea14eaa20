//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::SplitterConfig;
use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::session::EditSession;
use crate::app::split_interactor::SplitInteractor;
use crate::cli::args::{parse_size, InspectArgs, SplitArgs};
use crate::cli::{EXIT_ABORTED, EXIT_PARTIAL_FAILURE};
use crate::domain::model::{CropRegion, ExtractionJob, TimeOffset, TimeRange, VideoMeta};
use crate::engine::progress::RunEvent;
use crate::engine::RunOutcome;
use crate::planner::crop::{CropPreset, ViewRect, ViewTransform};
use crate::utils::path::NameSanitizer;

/// Execute the inspect command
pub async fn inspect(container: &DefaultAppContainer, args: &InspectArgs) -> Result<i32> {
    info!("Inspecting {}", args.input.display());

    let report = container
        .split_interactor()
        .inspect(&args.input)
        .await
        .context("Failed to inspect input file")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File:       {}", report.path.display());
        println!("Size:       {}", report.size);
        println!("Frame:      {}x{}", report.meta.width, report.meta.height);
        println!("Duration:   {}", TimeOffset::from_millis(report.meta.duration_ms));
        println!("Aspect:     {:.3}", report.meta.aspect_ratio());
    }
    Ok(0)
}

/// Planned job with the exact encoder invocation
#[derive(Debug, Serialize)]
struct PlannedJob<'a> {
    label: String,
    #[serde(flatten)]
    job: &'a ExtractionJob,
    command: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    input: &'a Path,
    meta: VideoMeta,
    crop: Option<CropRegion>,
    output_dir: &'a Path,
    jobs: Vec<PlannedJob<'a>>,
}

/// Execute the plan command: validate everything, run nothing
pub async fn plan(container: &DefaultAppContainer, args: &SplitArgs, config: &SplitterConfig) -> Result<i32> {
    let interactor = container.split_interactor();
    let session = build_session(&interactor, args, config).await?;
    let jobs = interactor
        .plan(&session, &config.output_dir)
        .context("Failed to plan segments")?;
    let commands = interactor.commands(&jobs);

    if args.json {
        let report = PlanReport {
            input: &args.input,
            meta: session.meta()?,
            crop: session.crop().region(),
            output_dir: &config.output_dir,
            jobs: jobs
                .iter()
                .zip(&commands)
                .map(|(job, command)| PlannedJob {
                    label: job.segment.display_label(),
                    job,
                    command: std::iter::once(command.program.clone())
                        .chain(command.args_lossy())
                        .collect(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    match session.crop().region() {
        Some(region) => println!("Crop: {}", region),
        None => println!("Crop: none"),
    }
    for (job, command) in jobs.iter().zip(&commands) {
        println!("{} -> {}", job.segment.display_label(), job.output_path.display());
        println!("    {}", command);
    }
    Ok(0)
}

/// Execute the split command. Ctrl-C cancels the run.
pub async fn split(container: &DefaultAppContainer, args: &SplitArgs, config: &SplitterConfig) -> Result<i32> {
    let interactor = container.split_interactor();
    let session = build_session(&interactor, args, config).await?;
    let jobs = interactor
        .plan(&session, &config.output_dir)
        .context("Failed to plan segments")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = interactor
        .execute(jobs, &config.output_dir, tx)
        .await
        .context("Failed to start extraction")?;

    let cancel = handle.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling extraction");
            cancel.cancel();
        }
    });

    while let Some(event) = rx.recv().await {
        render_event(&event, args.json)?;
        if event.is_terminal() {
            break;
        }
    }

    let outcome = handle.wait().await;
    interrupt.abort();

    Ok(match outcome? {
        RunOutcome::Completed(result) if result.is_complete_success() => 0,
        RunOutcome::Completed(_) => EXIT_PARTIAL_FAILURE,
        RunOutcome::Aborted { .. } => EXIT_ABORTED,
    })
}

/// Execute the check command
pub async fn check(container: &DefaultAppContainer) -> Result<i32> {
    let encoder = container.encoder();
    let version = encoder
        .version()
        .await
        .with_context(|| format!("Encoder '{}' is not usable", encoder.program()))?;
    println!("{}", version);
    Ok(0)
}

fn render_event(event: &RunEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", event.to_json_line()?);
        return Ok(());
    }

    match event {
        // Per-line encoder progress is only interesting to machines
        RunEvent::Progress { .. } => {}
        RunEvent::JobFailed { .. } => eprintln!("{}", event.status_line()),
        _ => match event.progress_percent() {
            Some(percent) => println!("[{:>3}%] {}", percent, event.status_line()),
            None => println!("{}", event.status_line()),
        },
    }
    Ok(())
}

/// Load the video and apply cut, name and crop flags in that order
async fn build_session(
    interactor: &SplitInteractor,
    args: &SplitArgs,
    config: &SplitterConfig,
) -> Result<EditSession> {
    let mut session = EditSession::new(config.segment_model);

    let known_meta = match &args.video_size {
        Some(size) => {
            let (width, height) = parse_size(size)?;
            Some(VideoMeta::new(width, height, 0)?)
        }
        None => None,
    };
    let meta = interactor
        .load_video(&mut session, &args.input, known_meta)
        .await
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    for cut in &args.cuts {
        let point: TimeOffset = cut.parse()?;
        session.cuts_mut().add_point(point)?;
    }
    for range in &args.ranges {
        let range = TimeRange::parse(range)?;
        session.cuts_mut().add_range(range.start, range.end)?;
    }

    if let Some(path) = &args.names_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read names file {}", path.display()))?;
        session.set_names_from_text(&text);
    } else if let Some(names) = &args.names {
        session.set_names(NameSanitizer::parse_name_list(names));
    }

    if let Some(crop) = &args.crop {
        session.crop_mut().set_numeric(CropRegion::parse(crop)?);
    } else if let Some(preset) = &args.preset {
        session.crop_mut().apply_preset(CropPreset::parse(preset)?)?;
    } else if let Some(select) = &args.select {
        let view = args.view.as_deref().unwrap_or_default();
        let (view_w, view_h) = parse_size(view)?;
        let transform = ViewTransform::fit(view_w as f64, view_h as f64, meta.width, meta.height)?;
        session
            .crop_mut()
            .update_from_view_rect(ViewRect::parse(select)?, &transform)?;
    }

    Ok(session)
}
