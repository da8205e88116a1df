// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between the analysis, preview and capture resolutions.
//
// Downsampling for analysis does not have to keep the preview's or the
// capture's aspect ratio once rotation is involved, so x and y are scaled
// independently.

use scanwerk_core::Rotation;
use serde::{Deserialize, Serialize};

use crate::geometry::{CropCoordinates, Point};

/// Pixel dimensions of a coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSpace {
    pub width: f64,
    pub height: f64,
}

impl CoordinateSpace {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The same space after a quarter-turn rotation.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        if rotation.swaps_axes() {
            Self::new(self.height, self.width)
        } else {
            *self
        }
    }
}

impl From<(u32, u32)> for CoordinateSpace {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// Scale every corner of `quad` by `sx` horizontally and `sy` vertically.
///
/// `map(&map(&q, sx, sy), 1.0 / sx, 1.0 / sy)` returns `q` up to rounding.
pub fn map(quad: &CropCoordinates, sx: f64, sy: f64) -> CropCoordinates {
    quad.map_points(|p| p.scale(sx, sy))
}

/// Rotate `quad`, expressed in `space`, clockwise by `rotation`.
///
/// Corners are relabelled afterwards so that "top left" still means top
/// left in the rotated space.
pub fn rotate(quad: &CropCoordinates, rotation: Rotation, space: CoordinateSpace) -> CropCoordinates {
    let turn = |p: &Point| match rotation {
        Rotation::Deg0 => *p,
        Rotation::Deg90 => Point::new(space.height - p.y, p.x),
        Rotation::Deg180 => Point::new(space.width - p.x, space.height - p.y),
        Rotation::Deg270 => Point::new(p.y, space.width - p.x),
    };
    CropCoordinates::from_unordered(quad.corners().map(|p| turn(&p)))
}

/// A fixed mapping from one coordinate space to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pub from: CoordinateSpace,
    pub to: CoordinateSpace,
}

impl CoordinateMapper {
    pub fn between(from: CoordinateSpace, to: CoordinateSpace) -> Self {
        Self { from, to }
    }

    pub fn scale_x(&self) -> f64 {
        self.to.width / self.from.width
    }

    pub fn scale_y(&self) -> f64 {
        self.to.height / self.from.height
    }

    /// Map `quad` from `self.from` into `self.to`.
    pub fn apply(&self, quad: &CropCoordinates) -> CropCoordinates {
        map(quad, self.scale_x(), self.scale_y())
    }

    /// Map `quad` from `self.to` back into `self.from`.
    pub fn inverse(&self, quad: &CropCoordinates) -> CropCoordinates {
        map(quad, 1.0 / self.scale_x(), 1.0 / self.scale_y())
    }

    /// The mapper going the other way.
    pub fn reversed(&self) -> Self {
        Self::between(self.to, self.from)
    }
}
