// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement: perspective crop of a captured still to the detected
// document quadrilateral.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument};

use crate::geometry::CropCoordinates;

/// Collinearity threshold (px²) used to reject crops that cannot be warped.
const CROP_COLLINEAR_EPSILON: f64 = 1.0;

/// Turns a captured still plus its document corners into a flat page.
pub struct ScanEnhancer {
    /// The working image (kept as `DynamicImage` for flexibility).
    image: DynamicImage,
}

impl ScanEnhancer {
    /// Create an enhancer from raw image bytes (JPEG, PNG, TIFF, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| {
            ScanwerkError::Resource(format!("failed to decode scan image: {}", err))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            "Scan image loaded"
        );
        Ok(Self { image })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Warp the quadrilateral `corners` (in this image's pixel space) onto an
    /// upright rectangle.
    ///
    /// The output is as wide as the mean of the top and bottom edges and as
    /// tall as the mean of the left and right edges, so the page keeps its
    /// apparent resolution.
    ///
    /// # Errors
    ///
    /// `Geometry` if the corners do not form a valid quadrilateral or admit
    /// no projective transform.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn crop_to(self, corners: &CropCoordinates) -> Result<Self> {
        if !corners.is_valid(CROP_COLLINEAR_EPSILON) {
            return Err(ScanwerkError::Geometry(format!(
                "crop corners do not form a convex quadrilateral: {:?}",
                corners
            )));
        }

        let (out_w, out_h) = output_size(corners);
        let w = out_w as f32;
        let h = out_h as f32;

        let src: [(f32, f32); 4] = [
            corners.top_left.into(),
            corners.top_right.into(),
            corners.bottom_right.into(),
            corners.bottom_left.into(),
        ];
        let dest: [(f32, f32); 4] = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

        let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
            ScanwerkError::Geometry("no projective transform for crop corners".into())
        })?;

        let rgba_input = self.image.to_rgba8();
        let default_pixel = Rgba([255u8, 255, 255, 255]);
        let mut output = RgbaImage::new(out_w, out_h);
        warp_into(&rgba_input, &projection, Interpolation::Bilinear, default_pixel, &mut output);

        debug!(out_w, out_h, "Perspective crop applied");
        Ok(Self {
            image: DynamicImage::ImageRgba8(output),
        })
    }
}

/// Output dimensions for a crop: mean lengths of opposite edges.
fn output_size(corners: &CropCoordinates) -> (u32, u32) {
    let top = corners.top_left.distance(&corners.top_right);
    let bottom = corners.bottom_left.distance(&corners.bottom_right);
    let left = corners.top_left.distance(&corners.bottom_left);
    let right = corners.top_right.distance(&corners.bottom_right);
    let width = ((top + bottom) / 2.0).round().max(1.0) as u32;
    let height = ((left + right) / 2.0).round().max(1.0) as u32;
    (width, height)
}
