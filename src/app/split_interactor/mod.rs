// Split interactor - Orchestrates loading, planning and extracting segments

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::app::session::EditSession;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::command::EncodeCommand;
use crate::engine::progress::RunEvent;
use crate::engine::{ExtractionEngine, RunHandle};
use crate::planner::SegmentJobPlanner;
use crate::ports::*;
use crate::utils::Utils;

/// Result of inspecting an input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectReport {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size: String,
    pub meta: VideoMeta,
}

/// Interactor for the split use case
pub struct SplitInteractor {
    probe_port: Arc<dyn ProbePort>,
    fs_port: Arc<dyn FsPort>,
    planner: SegmentJobPlanner,
    engine: ExtractionEngine,
}

impl SplitInteractor {
    /// Create new split interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        fs_port: Arc<dyn FsPort>,
        planner: SegmentJobPlanner,
        engine: ExtractionEngine,
    ) -> Self {
        Self {
            probe_port,
            fs_port,
            planner,
            engine,
        }
    }

    pub fn engine(&self) -> &ExtractionEngine {
        &self.engine
    }

    /// Check the file is present and non-empty, then probe it
    pub async fn inspect(&self, path: &Path) -> Result<InspectReport, DomainError> {
        let size_bytes = self.check_input(path).await?;
        let meta = self.probe_port.probe_video(path).await?;
        Ok(InspectReport {
            path: path.to_path_buf(),
            size_bytes,
            size: Utils::format_file_size(size_bytes),
            meta,
        })
    }

    /// Attach a video to the session. With `known_meta` the probe is skipped.
    pub async fn load_video(
        &self,
        session: &mut EditSession,
        path: &Path,
        known_meta: Option<VideoMeta>,
    ) -> Result<VideoMeta, DomainError> {
        self.check_input(path).await?;
        let meta = match known_meta {
            Some(meta) => meta,
            None => self.probe_port.probe_video(path).await?,
        };
        session.load_video(path, meta)?;
        Ok(meta)
    }

    /// Freeze the session into jobs. Nothing is produced unless every check passes.
    pub fn plan(
        &self,
        session: &EditSession,
        output_dir: &Path,
    ) -> Result<Vec<ExtractionJob>, DomainError> {
        let segments = session.segments()?;
        self.planner.plan(
            session.video_path()?,
            &session.meta()?,
            &segments,
            session.crop().region(),
            output_dir,
        )
    }

    /// Encoder invocations for a plan, in run order
    pub fn commands(&self, jobs: &[ExtractionJob]) -> Vec<EncodeCommand> {
        jobs.iter()
            .map(|job| EncodeCommand::for_job(&self.engine.config().program, job))
            .collect()
    }

    /// Start extracting in the background
    pub async fn execute(
        &self,
        jobs: Vec<ExtractionJob>,
        output_dir: &Path,
        events: UnboundedSender<RunEvent>,
    ) -> Result<RunHandle, DomainError> {
        info!("Extracting {} segment(s)", jobs.len());
        self.engine.start(jobs, output_dir, events).await
    }

    async fn check_input(&self, path: &Path) -> Result<u64, DomainError> {
        if !self.fs_port.file_exists(path).await? {
            return Err(DomainError::FsFail(format!(
                "Input file does not exist: {}",
                path.display()
            )));
        }
        let size = self.fs_port.file_size(path).await?;
        if size == 0 {
            return Err(DomainError::FsFail(format!(
                "Input file is empty: {}",
                path.display()
            )));
        }
        Ok(size)
    }
}
