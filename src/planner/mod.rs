//! Segment planning: cut point storage, crop mapping and job construction

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{CropRegion, ExtractionJob, Segment, VideoMeta};
use crate::domain::rules::CropBoundsRule;
use crate::utils::path::NameSanitizer;

pub mod crop;
pub mod cut_points;

/// Default container extension for extracted segments
pub const DEFAULT_CONTAINER: &str = "mp4";

/// Turns validated segments into frozen extraction jobs
#[derive(Debug, Clone)]
pub struct SegmentJobPlanner {
    container_ext: String,
}

impl Default for SegmentJobPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER)
    }
}

impl SegmentJobPlanner {
    /// Create a planner writing files with the given extension
    pub fn new(container_ext: &str) -> Self {
        Self {
            container_ext: container_ext.trim_start_matches('.').to_string(),
        }
    }

    pub fn container_ext(&self) -> &str {
        &self.container_ext
    }

    /// Build one job per segment. A crop, when present, is checked against
    /// the frame and then shared by every job.
    pub fn plan(
        &self,
        video_path: &Path,
        meta: &VideoMeta,
        segments: &[Segment],
        crop: Option<CropRegion>,
        output_dir: &Path,
    ) -> Result<Vec<ExtractionJob>, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::InsufficientPoints {
                required: 1,
                actual: 0,
            });
        }

        if let Some(region) = &crop {
            CropBoundsRule::validate(region, meta)?;
        }

        info!(
            "Planning {} segment(s) from {} into {}",
            segments.len(),
            video_path.display(),
            output_dir.display()
        );

        let jobs: Vec<ExtractionJob> = segments
            .iter()
            .map(|segment| ExtractionJob {
                segment: segment.clone(),
                crop,
                input_path: video_path.to_path_buf(),
                output_path: NameSanitizer::output_path(
                    output_dir,
                    &segment.name,
                    &self.container_ext,
                ),
            })
            .collect();

        self.warn_on_collisions(&jobs);

        for job in &jobs {
            debug!(
                index = job.segment.index,
                output = %job.output_path.display(),
                "{}",
                job.segment.display_label()
            );
        }

        Ok(jobs)
    }

    /// Later jobs overwrite earlier ones with the same output path
    fn warn_on_collisions(&self, jobs: &[ExtractionJob]) {
        let mut seen: HashMap<&Path, usize> = HashMap::new();
        for job in jobs {
            if let Some(first) = seen.insert(job.output_path.as_path(), job.segment.index) {
                warn!(
                    "Segments {} and {} both write {}; the later one wins",
                    first + 1,
                    job.segment.index + 1,
                    job.output_path.display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::cut_points::CutPointStore;
    use super::*;
    use crate::domain::errors::Axis;
    use crate::domain::model::{SegmentModel, TimeOffset};

    fn meta() -> VideoMeta {
        VideoMeta::new(1920, 1080, 60_000).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    fn adjacent(points: &[u64]) -> CutPointStore {
        let mut store = CutPointStore::new(SegmentModel::Adjacent);
        for &ms in points {
            store.add_point(TimeOffset::from_millis(ms)).unwrap();
        }
        store
    }

    #[test]
    fn test_plan_builds_one_job_per_segment() {
        let store = adjacent(&[1000, 3000, 5000]);
        let segments = store.segments(&names(&["Intro", "Main"])).unwrap();
        let planner = SegmentJobPlanner::default();

        let jobs = planner
            .plan(Path::new("in.mp4"), &meta(), &segments, None, Path::new("out"))
            .unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].output_path, Path::new("out").join("Intro.mp4"));
        assert_eq!(jobs[1].segment.start, TimeOffset::from_millis(3000));
        assert!(jobs.iter().all(|job| job.crop.is_none()));
    }

    #[test]
    fn test_plan_rejects_name_mismatch_before_any_job() {
        let store = adjacent(&[0, 1000, 2000, 3000]);
        let result = store.segments(&names(&["a", "b"]));
        assert_eq!(
            result,
            Err(DomainError::NameCountMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_plan_rejects_out_of_bounds_crop() {
        let segments = adjacent(&[0, 1000]).segments(&names(&["a"])).unwrap();
        let planner = SegmentJobPlanner::default();

        let result = planner.plan(
            Path::new("in.mp4"),
            &meta(),
            &segments,
            Some(CropRegion::new(1900, 0, 100, 100)),
            Path::new("out"),
        );

        assert_eq!(
            result,
            Err(DomainError::CropOutOfBounds {
                axis: Axis::Horizontal,
                extent: 2000,
                limit: 1920
            })
        );
    }

    #[test]
    fn test_plan_shares_crop_across_jobs() {
        let segments = adjacent(&[0, 1000, 2000]).segments(&names(&["a", "b"])).unwrap();
        let crop = CropRegion::new(0, 0, 640, 360);

        let jobs = SegmentJobPlanner::new(".mkv")
            .plan(Path::new("in.mp4"), &meta(), &segments, Some(crop), Path::new("out"))
            .unwrap();

        assert!(jobs.iter().all(|job| job.crop == Some(crop)));
        assert_eq!(jobs[1].output_path, Path::new("out").join("b.mkv"));
    }

    #[test]
    fn test_plan_keeps_colliding_names() {
        let segments = adjacent(&[0, 1000, 2000]).segments(&names(&["a/b", "a:b"])).unwrap();

        let jobs = SegmentJobPlanner::default()
            .plan(Path::new("in.mp4"), &meta(), &segments, None, Path::new("out"))
            .unwrap();

        assert_eq!(jobs[0].output_path, jobs[1].output_path);
    }

    #[test]
    fn test_plan_requires_segments() {
        let result = SegmentJobPlanner::default().plan(
            Path::new("in.mp4"),
            &meta(),
            &[],
            None,
            Path::new("out"),
        );
        assert!(matches!(result, Err(DomainError::InsufficientPoints { .. })));
    }
}
