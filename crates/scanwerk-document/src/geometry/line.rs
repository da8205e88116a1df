// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Infinite lines in slope/intercept form, with vertical lines as their own
// variant so no slope is ever computed from a zero run.

use std::f64::consts::FRAC_PI_2;

use super::point::Point;

/// Runs shorter than this are treated as vertical.
pub const VERTICAL_EPSILON: f64 = 1e-9;

/// Lines whose run is at most this fraction of their rise are treated as
/// vertical. The x drift this ignores stays under a thousandth of a pixel
/// over any image-sized rise, and it caps slopes at 1e6.
pub const STEEP_RATIO: f64 = 1e-6;

/// Angular tolerance (radians) for parallel/perpendicular tests.
pub const ANGLE_EPSILON: f64 = 1e-9;

/// An unbounded straight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfiniteLine {
    /// `y = slope * x + intercept`
    Sloped { slope: f64, intercept: f64 },
    /// `x = x`
    Vertical { x: f64 },
}

impl InfiniteLine {
    /// Line through two points. Returns `None` when the points coincide.
    ///
    /// Near-vertical pairs become [`Vertical`](Self::Vertical) through their
    /// mean x rather than a sloped line with an enormous intercept.
    pub fn through(a: &Point, b: &Point) -> Option<Self> {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        if dx.abs() <= VERTICAL_EPSILON.max(STEEP_RATIO * dy.abs()) {
            if dy.abs() <= VERTICAL_EPSILON {
                return None;
            }
            return Some(Self::Vertical { x: (a.x + b.x) / 2.0 });
        }
        let slope = dy / dx;
        Some(Self::Sloped {
            slope,
            intercept: a.y - slope * a.x,
        })
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Self::Vertical { .. })
    }

    /// y on the line at `x`; `None` for vertical lines.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        match *self {
            Self::Sloped { slope, intercept } => Some(slope * x + intercept),
            Self::Vertical { .. } => None,
        }
    }

    /// x on the line at `y`; `None` for horizontal lines (no unique answer).
    pub fn x_at(&self, y: f64) -> Option<f64> {
        match *self {
            Self::Sloped { slope, intercept } => {
                if slope.abs() <= VERTICAL_EPSILON {
                    None
                } else {
                    Some((y - intercept) / slope)
                }
            }
            Self::Vertical { x } => Some(x),
        }
    }

    /// Inclination in `[-π/2, π/2]`.
    fn inclination(&self) -> f64 {
        match *self {
            Self::Sloped { slope, .. } => slope.atan(),
            Self::Vertical { .. } => FRAC_PI_2,
        }
    }

    /// Acute angle between the two lines, in `[0, π/2]` radians.
    pub fn angle_between(&self, other: &InfiniteLine) -> f64 {
        let diff = (self.inclination() - other.inclination()).abs() % std::f64::consts::PI;
        if diff > FRAC_PI_2 {
            std::f64::consts::PI - diff
        } else {
            diff
        }
    }

    pub fn is_parallel(&self, other: &InfiniteLine) -> bool {
        match (self, other) {
            (Self::Vertical { .. }, Self::Vertical { .. }) => true,
            (Self::Sloped { slope: a, .. }, Self::Sloped { slope: b, .. }) if a == b => true,
            _ => self.angle_between(other) <= ANGLE_EPSILON,
        }
    }

    pub fn is_perpendicular(&self, other: &InfiniteLine) -> bool {
        (self.angle_between(other) - FRAC_PI_2).abs() <= ANGLE_EPSILON
    }

    /// Where the two lines cross, or `None` if they are parallel.
    pub fn intersection(&self, other: &InfiniteLine) -> Option<Point> {
        if self.is_parallel(other) {
            return None;
        }
        let point = match (*self, *other) {
            (Self::Vertical { x }, line) | (line, Self::Vertical { x }) => {
                Point::new(x, line.y_at(x)?)
            }
            (
                Self::Sloped { slope: m1, intercept: b1 },
                Self::Sloped { slope: m2, intercept: b2 },
            ) => {
                let x = (b2 - b1) / (m1 - m2);
                Point::new(x, m1 * x + b1)
            }
        };
        point.is_finite().then_some(point)
    }

    /// Whether `point` lies within `epsilon` (perpendicular distance) of the line.
    pub fn contains(&self, point: &Point, epsilon: f64) -> bool {
        self.distance_to(point) <= epsilon
    }

    /// Perpendicular distance from `point` to the line.
    pub fn distance_to(&self, point: &Point) -> f64 {
        match *self {
            Self::Sloped { slope, intercept } => {
                (slope * point.x - point.y + intercept).abs() / slope.hypot(1.0)
            }
            Self::Vertical { x } => (point.x - x).abs(),
        }
    }
}
