// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Bounds rules for crop regions that did not come through the interactive mapper
pub struct CropBoundsRule;

impl CropBoundsRule {
    /// Check a crop region against the frame it will be applied to
    pub fn validate(crop: &CropRegion, meta: &VideoMeta) -> Result<(), DomainError> {
        if crop.right() > meta.width as u64 {
            return Err(DomainError::CropOutOfBounds {
                axis: Axis::Horizontal,
                extent: crop.right(),
                limit: meta.width,
            });
        }

        if crop.bottom() > meta.height as u64 {
            return Err(DomainError::CropOutOfBounds {
                axis: Axis::Vertical,
                extent: crop.bottom(),
                limit: meta.height,
            });
        }

        if crop.width < 1 || crop.height < 1 {
            return Err(DomainError::EmptyCrop {
                width: crop.width,
                height: crop.height,
            });
        }

        Ok(())
    }
}

/// Rules for segment naming
pub struct SegmentNameRule;

impl SegmentNameRule {
    /// Names must line up one-to-one with segments and be non-blank
    pub fn validate(names: &[String], expected: usize) -> Result<(), DomainError> {
        if names.len() != expected {
            return Err(DomainError::NameCountMismatch {
                expected,
                actual: names.len(),
            });
        }

        if let Some(index) = names.iter().position(|name| name.trim().is_empty()) {
            return Err(DomainError::EmptyName { index });
        }

        Ok(())
    }
}
