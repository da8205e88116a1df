// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelled document quadrilateral.

use serde::{Deserialize, Serialize};

use super::point::Point;

/// Four labelled corners approximating a document's outline in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropCoordinates {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl CropCoordinates {
    pub const fn new(
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Label four unordered corners.
    ///
    /// The two corners with the smallest y form the top edge and the smaller
    /// x of each pair is the left corner. For a convex outline the two
    /// topmost corners are always adjacent, so the labelled ring is convex too.
    pub fn from_unordered(corners: [Point; 4]) -> Self {
        let mut by_y = corners;
        by_y.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        let (top, bottom) = by_y.split_at(2);
        let (tl, tr) = if top[0].x <= top[1].x {
            (top[0], top[1])
        } else {
            (top[1], top[0])
        };
        let (bl, br) = if bottom[0].x <= bottom[1].x {
            (bottom[0], bottom[1])
        } else {
            (bottom[1], bottom[0])
        };
        Self::new(tl, tr, bl, br)
    }

    /// Corners in drawing order: TL, TR, BR, BL.
    pub fn corners(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Enclosed area (shoelace formula over the drawing order).
    pub fn area(&self) -> f64 {
        polygon_area(&self.corners())
    }

    /// Whether TL, TR, BR, BL is a convex, non-degenerate polygon.
    pub fn is_convex(&self) -> bool {
        is_convex_ring(&self.corners())
    }

    /// Check every invariant a detected document outline must satisfy:
    /// non-zero area, no three corners collinear (triangle area above
    /// `collinear_epsilon`), and labels consistent with the corners'
    /// relative positions.
    pub fn is_valid(&self, collinear_epsilon: f64) -> bool {
        let c = self.corners();
        if c.iter().any(|p| !p.is_finite()) {
            return false;
        }
        if self.area() <= collinear_epsilon {
            return false;
        }
        for skip in 0..4 {
            let rest: Vec<&Point> = (0..4).filter(|&i| i != skip).map(|i| &c[i]).collect();
            if rest[0].is_collinear(rest[1], rest[2], collinear_epsilon) {
                return false;
            }
        }
        self.is_convex()
            && self.top_left.x < self.top_right.x
            && self.bottom_left.x < self.bottom_right.x
            && self.top_left.y < self.bottom_left.y
            && self.top_right.y < self.bottom_right.y
    }

    /// Apply `f` to every corner, keeping labels.
    pub fn map_points(&self, f: impl Fn(&Point) -> Point) -> Self {
        Self::new(
            f(&self.top_left),
            f(&self.top_right),
            f(&self.bottom_left),
            f(&self.bottom_right),
        )
    }

    /// Clamp every corner into `[0, width] x [0, height]`.
    pub fn clamp(&self, width: f64, height: f64) -> Self {
        self.map_points(|p| p.clamp(width, height))
    }

    pub fn approx_eq(&self, other: &CropCoordinates, epsilon: f64) -> bool {
        self.top_left.approx_eq(&other.top_left, epsilon)
            && self.top_right.approx_eq(&other.top_right, epsilon)
            && self.bottom_left.approx_eq(&other.bottom_left, epsilon)
            && self.bottom_right.approx_eq(&other.bottom_right, epsilon)
    }
}

/// Shoelace area of a closed polygon.
pub fn polygon_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    let mut twice = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    twice.abs() / 2.0
}

/// Every turn has the same non-zero direction.
///
/// For four vertices this rules out both bow-ties and reflex corners; longer
/// rings would also need a winding check.
pub fn is_convex_ring(ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..n {
        let turn = ring[i].cross(&ring[(i + 1) % n], &ring[(i + 2) % n]);
        if turn == 0.0 || (sign != 0.0 && turn.signum() != sign) {
            return false;
        }
        sign = turn.signum();
    }
    true
}
