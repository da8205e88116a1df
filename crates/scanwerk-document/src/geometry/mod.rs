// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry primitives: points, segments, infinite lines and the labelled
// document quadrilateral.

pub mod line;
pub mod point;
pub mod quad;
pub mod segment;

pub use line::InfiniteLine;
pub use point::Point;
pub use quad::CropCoordinates;
pub use segment::{BoundingBox, DEFAULT_INTERSECTION_TOLERANCE, Segment};
