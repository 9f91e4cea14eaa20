// Edit session - Owns the loaded video, its cut list and its crop selection

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::planner::crop::CropMapper;
use crate::planner::cut_points::CutPointStore;
use crate::utils::path::NameSanitizer;

/// Everything the user has marked on one video.
///
/// Loading a new video resets the cut list and the crop so that stale
/// selections never leak across videos.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    video_path: Option<PathBuf>,
    meta: Option<VideoMeta>,
    cuts: CutPointStore,
    crop: CropMapper,
    names: Vec<String>,
}

impl EditSession {
    pub fn new(model: SegmentModel) -> Self {
        Self {
            cuts: CutPointStore::new(model),
            ..Self::default()
        }
    }

    /// Attach a video, clearing cuts, names and crop
    pub fn load_video(&mut self, path: &Path, meta: VideoMeta) -> Result<(), DomainError> {
        self.crop.set_video_bounds(meta.width, meta.height, false)?;
        self.cuts.clear();
        self.names.clear();
        self.video_path = Some(path.to_path_buf());
        self.meta = Some(meta);
        info!("Loaded {} ({})", path.display(), meta);
        Ok(())
    }

    pub fn video_path(&self) -> Result<&Path, DomainError> {
        self.video_path.as_deref().ok_or(DomainError::NoVideoLoaded)
    }

    pub fn meta(&self) -> Result<VideoMeta, DomainError> {
        self.meta.ok_or(DomainError::NoVideoLoaded)
    }

    pub fn cuts(&self) -> &CutPointStore {
        &self.cuts
    }

    pub fn cuts_mut(&mut self) -> &mut CutPointStore {
        &mut self.cuts
    }

    pub fn crop(&self) -> &CropMapper {
        &self.crop
    }

    pub fn crop_mut(&mut self) -> &mut CropMapper {
        &mut self.crop
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn set_names(&mut self, names: Vec<String>) {
        self.names = names;
    }

    /// One name per line; blank lines are ignored
    pub fn set_names_from_text(&mut self, text: &str) {
        self.names = NameSanitizer::parse_names(text);
    }

    /// Segments derived from the cut list and the current names
    pub fn segments(&self) -> Result<Vec<Segment>, DomainError> {
        self.cuts.segments(&self.names)
    }
}
