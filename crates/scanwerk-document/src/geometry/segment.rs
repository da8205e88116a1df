// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line segments as reported by the vision primitive.

use serde::{Deserialize, Serialize};

use super::line::InfiniteLine;
use super::point::Point;

/// Default margin (px) an intersection may fall outside a segment's extent.
pub const DEFAULT_INTERSECTION_TOLERANCE: f64 = 20.0;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Grow the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// A finite stroke between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Convenience constructor from raw coordinates.
    pub const fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    pub fn midpoint(&self) -> Point {
        Point::new((self.start.x + self.end.x) / 2.0, (self.start.y + self.end.y) / 2.0)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            min_x: self.start.x.min(self.end.x),
            min_y: self.start.y.min(self.end.y),
            max_x: self.start.x.max(self.end.x),
            max_y: self.start.y.max(self.end.y),
        }
    }

    /// The infinite line carrying this segment; `None` for zero-length segments.
    pub fn to_line(&self) -> Option<InfiniteLine> {
        InfiniteLine::through(&self.start, &self.end)
    }

    /// Bounded intersection with `other`.
    ///
    /// The crossing of the two carrying lines is accepted only if it lies
    /// inside both segments' bounding boxes grown by `tolerance`. Parallel
    /// and zero-length segments never intersect.
    pub fn intersection(&self, other: &Segment, tolerance: f64) -> Option<Point> {
        let point = self.to_line()?.intersection(&other.to_line()?)?;
        let inside = self.bounding_box().expand(tolerance).contains(&point)
            && other.bounding_box().expand(tolerance).contains(&point);
        inside.then_some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_and_midpoint() {
        let s = Segment::from_coords(0.0, 0.0, 30.0, 40.0);
        assert_eq!(s.length(), 50.0);
        assert_eq!(s.midpoint(), Point::new(15.0, 20.0));
    }

    #[test]
    fn touching_endpoints_intersect() {
        let top = Segment::from_coords(0.0, 0.0, 100.0, 0.0);
        let right = Segment::from_coords(100.0, 0.0, 100.0, 150.0);
        let p = top
            .intersection(&right, DEFAULT_INTERSECTION_TOLERANCE)
            .expect("corner");
        assert!(p.approx_eq(&Point::new(100.0, 0.0), 1e-9));
    }

    #[test]
    fn short_gap_within_tolerance_is_accepted() {
        // The strokes stop 10px short of the corner they imply.
        let top = Segment::from_coords(0.0, 0.0, 90.0, 0.0);
        let right = Segment::from_coords(100.0, 10.0, 100.0, 150.0);
        let p = top
            .intersection(&right, DEFAULT_INTERSECTION_TOLERANCE)
            .expect("corner within margin");
        assert!(p.approx_eq(&Point::new(100.0, 0.0), 1e-9));
    }

    #[test]
    fn far_crossing_is_rejected() {
        // Nearly parallel strokes whose lines meet far to the right.
        let a = Segment::from_coords(0.0, 0.0, 100.0, 0.0);
        let b = Segment::from_coords(0.0, 10.0, 100.0, 9.0);
        assert!(a.to_line().and_then(|l| l.intersection(&b.to_line()?)).is_some());
        assert!(a.intersection(&b, DEFAULT_INTERSECTION_TOLERANCE).is_none());
    }

    #[test]
    fn crossing_outside_only_one_box_is_rejected() {
        let long = Segment::from_coords(0.0, 50.0, 200.0, 50.0);
        // Vertical stroke ending 40px above the long segment.
        let short = Segment::from_coords(100.0, 0.0, 100.0, 10.0);
        assert!(long.intersection(&short, DEFAULT_INTERSECTION_TOLERANCE).is_none());
        assert!(long.intersection(&short, 45.0).is_some());
    }

    #[test]
    fn parallel_segments_never_intersect() {
        let a = Segment::from_coords(0.0, 0.0, 100.0, 50.0);
        let b = Segment::from_coords(0.0, 5.0, 100.0, 55.0);
        assert!(a.intersection(&b, 1_000.0).is_none());
    }

    #[test]
    fn vertical_segment_converts_without_division() {
        let v = Segment::from_coords(25.0, 0.0, 25.0, 80.0);
        assert_eq!(v.to_line(), Some(InfiniteLine::Vertical { x: 25.0 }));

        let diagonal = Segment::from_coords(0.0, 0.0, 50.0, 50.0);
        let p = v
            .intersection(&diagonal, DEFAULT_INTERSECTION_TOLERANCE)
            .expect("crossing");
        assert!(p.approx_eq(&Point::new(25.0, 25.0), 1e-9));
    }

    #[test]
    fn zero_length_segment_has_no_line() {
        let dot = Segment::from_coords(4.0, 4.0, 4.0, 4.0);
        assert!(dot.to_line().is_none());
        let other = Segment::from_coords(0.0, 0.0, 10.0, 10.0);
        assert!(dot.intersection(&other, 100.0).is_none());
    }
}
