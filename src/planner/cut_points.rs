//! Cut point storage and segment derivation
//!
//! Two segment models are supported. In the adjacent model the store holds a
//! strictly increasing list of cut points and every pair of neighbours is a
//! segment. In the range model the store holds explicit start/end pairs and
//! each pair is a segment. Both derive segments through [`SegmentSource`].

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{Segment, SegmentModel, TimeOffset, TimeRange};
use crate::domain::rules::SegmentNameRule;

/// Something that can turn its stored cut entries into named segments
pub trait SegmentSource {
    /// Number of stored entries (points or ranges)
    fn len(&self) -> usize;

    /// Minimum number of entries needed to form one segment
    fn min_required(&self) -> usize;

    /// Spans in segment order
    fn spans(&self) -> Vec<(TimeOffset, TimeOffset)>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derive the segment list, attaching names positionally
    fn segments(&self, names: &[String]) -> Result<Vec<Segment>, DomainError> {
        if self.len() < self.min_required() {
            return Err(DomainError::InsufficientPoints {
                required: self.min_required(),
                actual: self.len(),
            });
        }

        let spans = self.spans();
        SegmentNameRule::validate(names, spans.len())?;

        Ok(spans
            .into_iter()
            .zip(names)
            .enumerate()
            .map(|(index, ((start, end), name))| Segment {
                index,
                start,
                end,
                name: name.trim().to_string(),
            })
            .collect())
    }
}

/// Sorted, duplicate-free cut points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutPoints {
    points: Vec<TimeOffset>,
}

impl CutPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a point, keeping the list ascending
    pub fn add(&mut self, point: TimeOffset) -> Result<(), DomainError> {
        match self.points.binary_search(&point) {
            Ok(_) => Err(DomainError::Duplicate(format!(
                "cut point {} ({} ms) already exists",
                point,
                point.as_millis()
            ))),
            Err(position) => {
                self.points.insert(position, point);
                Ok(())
            }
        }
    }

    pub fn points(&self) -> &[TimeOffset] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl SegmentSource for CutPoints {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn min_required(&self) -> usize {
        2
    }

    fn spans(&self) -> Vec<(TimeOffset, TimeOffset)> {
        self.points
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }
}

/// Explicit ranges in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeRanges {
    ranges: Vec<TimeRange>,
}

impl TimeRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a range; identical ranges are rejected, overlaps are allowed
    pub fn add(&mut self, start: TimeOffset, end: TimeOffset) -> Result<(), DomainError> {
        let range = TimeRange::new(start, end)?;
        if self.ranges.contains(&range) {
            return Err(DomainError::Duplicate(format!("range {} already exists", range)));
        }
        self.ranges.push(range);
        Ok(())
    }

    /// Ranges ordered by start then end, for display. Storage order is untouched.
    pub fn sorted_by_start(&self) -> Vec<TimeRange> {
        let mut sorted = self.ranges.clone();
        sorted.sort_by_key(|range| (range.start, range.end));
        sorted
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

impl SegmentSource for TimeRanges {
    fn len(&self) -> usize {
        self.ranges.len()
    }

    fn min_required(&self) -> usize {
        1
    }

    fn spans(&self) -> Vec<(TimeOffset, TimeOffset)> {
        self.ranges.iter().map(|range| (range.start, range.end)).collect()
    }
}

/// The session's cut list, configured for one segment model
#[derive(Debug, Clone, PartialEq)]
pub enum CutPointStore {
    Adjacent(CutPoints),
    Ranges(TimeRanges),
}

impl CutPointStore {
    /// Create an empty store for the given model
    pub fn new(model: SegmentModel) -> Self {
        match model {
            SegmentModel::Adjacent => CutPointStore::Adjacent(CutPoints::new()),
            SegmentModel::Ranges => CutPointStore::Ranges(TimeRanges::new()),
        }
    }

    pub fn model(&self) -> SegmentModel {
        match self {
            CutPointStore::Adjacent(_) => SegmentModel::Adjacent,
            CutPointStore::Ranges(_) => SegmentModel::Ranges,
        }
    }

    /// Add a single cut point (adjacent model only)
    pub fn add_point(&mut self, point: TimeOffset) -> Result<(), DomainError> {
        match self {
            CutPointStore::Adjacent(points) => {
                points.add(point)?;
                debug!(point_ms = point.as_millis(), total = points.len(), "Added cut point");
                Ok(())
            }
            CutPointStore::Ranges(_) => Err(self.mismatch("add_point")),
        }
    }

    /// Add an explicit range (range model only)
    pub fn add_range(&mut self, start: TimeOffset, end: TimeOffset) -> Result<(), DomainError> {
        match self {
            CutPointStore::Ranges(ranges) => {
                ranges.add(start, end)?;
                debug!(
                    start_ms = start.as_millis(),
                    end_ms = end.as_millis(),
                    total = ranges.len(),
                    "Added range"
                );
                Ok(())
            }
            CutPointStore::Adjacent(_) => Err(self.mismatch("add_range")),
        }
    }

    /// Empty the store unconditionally
    pub fn clear(&mut self) {
        match self {
            CutPointStore::Adjacent(points) => points.clear(),
            CutPointStore::Ranges(ranges) => ranges.clear(),
        }
    }

    /// Number of segments the current entries would produce
    pub fn segment_count(&self) -> usize {
        self.source().spans().len()
    }

    pub fn len(&self) -> usize {
        self.source().len()
    }

    pub fn is_empty(&self) -> bool {
        self.source().is_empty()
    }

    /// Derive named segments
    pub fn segments(&self, names: &[String]) -> Result<Vec<Segment>, DomainError> {
        self.source().segments(names)
    }

    /// Unnamed segment list labels such as `01. 00:00:01 - 00:00:03`
    pub fn display_lines(&self) -> Vec<String> {
        let spans = match self {
            CutPointStore::Adjacent(points) => points.spans(),
            CutPointStore::Ranges(ranges) => ranges
                .sorted_by_start()
                .into_iter()
                .map(|range| (range.start, range.end))
                .collect(),
        };
        spans
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| format!("{:02}. {} - {}", i + 1, start, end))
            .collect()
    }

    fn source(&self) -> &dyn SegmentSource {
        match self {
            CutPointStore::Adjacent(points) => points as &dyn SegmentSource,
            CutPointStore::Ranges(ranges) => ranges as &dyn SegmentSource,
        }
    }

    fn mismatch(&self, operation: &str) -> DomainError {
        DomainError::ModelMismatch {
            operation: operation.to_string(),
            model: self.model().to_string(),
        }
    }
}

impl Default for CutPointStore {
    fn default() -> Self {
        Self::new(SegmentModel::default())
    }
}
