//! Crop selection mapping between preview (view) space and video pixels

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::CropRegion;

/// Rectangle in view coordinates, as drawn on a preview surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Parse `X,Y,W,H`
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let values: Vec<f64> = text
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid selection '{}'", text)))?;
        match values.as_slice() {
            [x, y, width, height] => Ok(Self::new(*x, *y, *width, *height)),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid selection '{}'. Expected X,Y,WIDTH,HEIGHT",
                text
            ))),
        }
    }
}

/// Affine view-to-video mapping: `video = view * scale + offset` per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewTransform {
    /// View space is already video space
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Transform for a preview of `view_w x view_h` that shows the whole
    /// frame aspect-fitted and centered (letterboxed or pillarboxed)
    pub fn fit(view_w: f64, view_h: f64, video_w: u32, video_h: u32) -> Result<Self, DomainError> {
        if !(view_w > 0.0 && view_h > 0.0) {
            return Err(DomainError::BadArgs(format!(
                "Invalid view size {}x{}",
                view_w, view_h
            )));
        }
        if video_w == 0 || video_h == 0 {
            return Err(DomainError::InvalidVideoBounds {
                width: video_w,
                height: video_h,
            });
        }

        let display_scale = (view_w / video_w as f64).min(view_h / video_h as f64);
        let pad_x = (view_w - video_w as f64 * display_scale) / 2.0;
        let pad_y = (view_h - video_h as f64 * display_scale) / 2.0;
        let scale = 1.0 / display_scale;

        Ok(Self {
            scale_x: scale,
            scale_y: scale,
            offset_x: -pad_x * scale,
            offset_y: -pad_y * scale,
        })
    }

    /// Candidate pixel rectangle, truncated toward zero, not yet clamped
    fn apply(&self, rect: &ViewRect) -> (i64, i64, i64, i64) {
        (
            (rect.x * self.scale_x + self.offset_x).trunc() as i64,
            (rect.y * self.scale_y + self.offset_y).trunc() as i64,
            (rect.width * self.scale_x).trunc() as i64,
            (rect.height * self.scale_y).trunc() as i64,
        )
    }
}

/// Preset crop shapes, always centered within the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropPreset {
    Widescreen,
    Standard,
    Square,
    Center80,
}

impl CropPreset {
    /// Parse preset name
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "16:9" => Ok(CropPreset::Widescreen),
            "4:3" => Ok(CropPreset::Standard),
            "1:1" | "square" => Ok(CropPreset::Square),
            "center" | "center-80%" | "center80" => Ok(CropPreset::Center80),
            other => Err(DomainError::BadArgs(format!(
                "Invalid crop preset: {}. Valid presets: 16:9, 4:3, 1:1, center",
                other
            ))),
        }
    }

    /// Region for a frame of `width x height`, computed from the frame alone
    pub fn compute(&self, width: u32, height: u32) -> CropRegion {
        let (w, h) = (width as u64, height as u64);
        let (crop_w, crop_h) = match self {
            CropPreset::Widescreen => Self::fit_ratio(w, h, 16, 9),
            CropPreset::Standard => Self::fit_ratio(w, h, 4, 3),
            CropPreset::Square => {
                let side = w.min(h);
                (side, side)
            }
            CropPreset::Center80 => ((w * 4 / 5).max(1), (h * 4 / 5).max(1)),
        };
        let crop_w = crop_w.clamp(1, w.max(1));
        let crop_h = crop_h.clamp(1, h.max(1));

        CropRegion::new(
            ((w - crop_w.min(w)) / 2) as u32,
            ((h - crop_h.min(h)) / 2) as u32,
            crop_w as u32,
            crop_h as u32,
        )
    }

    /// Largest `num:den` box that fits the frame
    fn fit_ratio(w: u64, h: u64, num: u64, den: u64) -> (u64, u64) {
        if w * den > h * num {
            (h * num / den, h)
        } else {
            (w, w * den / num)
        }
    }
}

/// Owns the crop selection for the loaded video and keeps it inside the frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropMapper {
    bounds: Option<(u32, u32)>,
    region: Option<CropRegion>,
}

impl CropMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a newly loaded video. With `default_selection` the region
    /// starts as a centered box of half the frame size.
    pub fn set_video_bounds(
        &mut self,
        width: u32,
        height: u32,
        default_selection: bool,
    ) -> Result<Option<CropRegion>, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::InvalidVideoBounds { width, height });
        }

        self.bounds = Some((width, height));
        self.region = None;

        if default_selection {
            let crop_w = (width / 2).max(1);
            let crop_h = (height / 2).max(1);
            self.region = Some(CropRegion::new(
                (width - crop_w) / 2,
                (height - crop_h) / 2,
                crop_w,
                crop_h,
            ));
        }

        Ok(self.region)
    }

    /// Map a view-space rectangle into the frame, clamp it, store it and return it
    pub fn update_from_view_rect(
        &mut self,
        rect: ViewRect,
        transform: &ViewTransform,
    ) -> Result<CropRegion, DomainError> {
        let (width, height) = self.bounds.ok_or(DomainError::NoVideoLoaded)?;
        let region = Self::clamp(transform.apply(&rect), width, height);
        debug!(?rect, ?region, "Crop selection updated");
        self.region = Some(region);
        Ok(region)
    }

    /// Replace the selection with pixel values typed in directly, clamped like any drag
    pub fn set_pixels(&mut self, region: CropRegion) -> Result<CropRegion, DomainError> {
        let rect = ViewRect::new(
            region.x as f64,
            region.y as f64,
            region.width as f64,
            region.height as f64,
        );
        self.update_from_view_rect(rect, &ViewTransform::identity())
    }

    /// Store typed-in values verbatim. Unlike drags these are not clamped;
    /// job planning rejects them if they leave the frame.
    pub fn set_numeric(&mut self, region: CropRegion) {
        debug!(?region, "Crop set numerically");
        self.region = Some(region);
    }

    /// Replace the selection with a preset computed from the frame bounds
    pub fn apply_preset(&mut self, preset: CropPreset) -> Result<CropRegion, DomainError> {
        let (width, height) = self.bounds.ok_or(DomainError::NoVideoLoaded)?;
        self.set_pixels(preset.compute(width, height))
    }

    /// Drop the crop entirely; extraction then emits no crop filter
    pub fn disable(&mut self) {
        self.region = None;
    }

    pub fn region(&self) -> Option<CropRegion> {
        self.region
    }

    pub fn bounds(&self) -> Option<(u32, u32)> {
        self.bounds
    }

    fn clamp(candidate: (i64, i64, i64, i64), width: u32, height: u32) -> CropRegion {
        let (x, y, w, h) = candidate;
        let (max_w, max_h) = (width as i64, height as i64);

        let x = x.clamp(0, max_w - 1);
        let y = y.clamp(0, max_h - 1);
        let w = w.clamp(1, max_w - x);
        let h = h.clamp(1, max_h - y);

        CropRegion::new(x as u32, y as u32, w as u32, h as u32)
    }
}
