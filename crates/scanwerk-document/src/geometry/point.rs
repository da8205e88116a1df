// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Points in image pixel space (origin top-left, y grows downwards).

use serde::{Deserialize, Serialize};

/// A position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_to(other.x, other.y)
    }

    /// Euclidean distance to an arbitrary position.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }

    /// Twice the signed area of the triangle `self, a, b`.
    ///
    /// Positive when `self -> a -> b` turns clockwise on screen (y down).
    pub fn cross(&self, a: &Point, b: &Point) -> f64 {
        (a.x - self.x) * (b.y - self.y) - (a.y - self.y) * (b.x - self.x)
    }

    /// Whether `self`, `a` and `b` lie on one line: the triangle they span
    /// has an area of at most `epsilon`.
    pub fn is_collinear(&self, a: &Point, b: &Point, epsilon: f64) -> bool {
        (self.cross(a, b) / 2.0).abs() <= epsilon
    }

    /// Clamp into the rectangle `[0, width] x [0, height]`.
    pub fn clamp(&self, width: f64, height: f64) -> Point {
        Point::new(self.x.clamp(0.0, width.max(0.0)), self.y.clamp(0.0, height.max(0.0)))
    }

    /// Scale each axis independently.
    pub fn scale(&self, sx: f64, sy: f64) -> Point {
        Point::new(self.x * sx, self.y * sy)
    }

    pub fn approx_eq(&self, other: &Point, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x as f32, p.y as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance_to(3.0, 0.0), 4.0);
    }

    #[test]
    fn collinear_points_have_no_area() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(50.0, 50.0);
        let c = Point::new(100.0, 100.4);
        assert!(a.is_collinear(&b, &c, 15.0));
        assert!(!a.is_collinear(&b, &Point::new(100.0, 0.0), 15.0));
    }

    #[test]
    fn clamp_keeps_points_inside() {
        let p = Point::new(-12.0, 260.0).clamp(250.0, 200.0);
        assert_eq!(p, Point::new(0.0, 200.0));
    }

    #[test]
    fn cross_sign_follows_screen_orientation() {
        // (0,0) -> (10,0) -> (10,10) is clockwise on screen.
        let o = Point::new(0.0, 0.0);
        assert!(o.cross(&Point::new(10.0, 0.0), &Point::new(10.0, 10.0)) > 0.0);
    }
}
