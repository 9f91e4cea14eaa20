use std::sync::Arc;

use crate::adapters::{FfmpegAdapter, FfprobeAdapter, FsLocalAdapter, SplitterConfig};
use crate::app::split_interactor::SplitInteractor;
use crate::engine::{EngineConfig, ExtractionEngine};
use crate::planner::SegmentJobPlanner;
use crate::ports::{EncodePort, FsPort, ProbePort};

pub trait AppContainer: Send + Sync {
    fn split_interactor(&self) -> Arc<SplitInteractor>;
    fn encoder(&self) -> Arc<FfmpegAdapter>;
}

pub struct DefaultAppContainer {
    split_interactor: Arc<SplitInteractor>,
    encoder: Arc<FfmpegAdapter>,
}

impl DefaultAppContainer {
    pub fn new(config: &SplitterConfig) -> Self {
        let probe_port = Arc::new(FfprobeAdapter::new(&config.ffprobe_path));
        let encoder = Arc::new(FfmpegAdapter::new(&config.ffmpeg_path));
        let fs_port = Arc::new(FsLocalAdapter::new());

        let engine = ExtractionEngine::new(
            Arc::clone(&encoder) as Arc<dyn EncodePort>,
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            EngineConfig {
                program: config.ffmpeg_path.clone(),
                job_timeout: config.job_timeout(),
            },
        );

        let split_interactor = Arc::new(SplitInteractor::new(
            probe_port as Arc<dyn ProbePort>,
            fs_port as Arc<dyn FsPort>,
            SegmentJobPlanner::new(&config.container),
            engine,
        ));

        Self {
            split_interactor,
            encoder,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn split_interactor(&self) -> Arc<SplitInteractor> {
        Arc::clone(&self.split_interactor)
    }

    fn encoder(&self) -> Arc<FfmpegAdapter> {
        Arc::clone(&self.encoder)
    }
}
