// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral resolver: turns raw line segments into one labelled
// four-corner document outline.

use scanwerk_core::DetectorConfig;
use tracing::{debug, instrument};

use super::graph::IntersectionGraph;
use crate::geometry::quad::{is_convex_ring, polygon_area};
use crate::geometry::{CropCoordinates, DEFAULT_INTERSECTION_TOLERANCE, Point, Segment};

/// Outcome of one resolution, with the counts behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub corners: Option<CropCoordinates>,
    pub node_count: usize,
    pub edge_count: usize,
    /// 4-cycles scored. Cycles with a collinear wedge are pruned while the
    /// graph is walked and never counted.
    pub candidates: usize,
}

/// Selects the best document quadrilateral from a set of segments.
///
/// ## Pipeline
///
/// 1. Intersect every pair of segments (bounded by `tolerance`)
/// 2. Merge crossings within `merge_radius`
/// 3. Build the [`IntersectionGraph`]
/// 4. Walk its 4-cycles, pruning paths through three collinear corners as
///    soon as the third corner is reached, and dropping non-convex cycles
/// 5. Keep the cycle enclosing the largest area and label its corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadResolver {
    pub tolerance: f64,
    pub merge_radius: f64,
    pub collinear_epsilon: f64,
}

impl Default for QuadResolver {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_INTERSECTION_TOLERANCE,
            merge_radius: 2.0,
            collinear_epsilon: 1.0,
        }
    }
}

impl QuadResolver {
    pub fn new(tolerance: f64, merge_radius: f64, collinear_epsilon: f64) -> Self {
        Self {
            tolerance,
            merge_radius,
            collinear_epsilon,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(
            config.intersection_tolerance,
            config.merge_radius,
            config.collinear_epsilon,
        )
    }

    /// Resolve segments to a labelled quadrilateral, or `None` when the
    /// evidence does not contain four usable corners.
    pub fn resolve(&self, segments: &[Segment]) -> Option<CropCoordinates> {
        self.resolve_detailed(segments).corners
    }

    #[instrument(level = "debug", skip_all, fields(segments = segments.len()))]
    pub fn resolve_detailed(&self, segments: &[Segment]) -> Resolution {
        let graph = IntersectionGraph::build(segments, self.tolerance, self.merge_radius);
        let mut resolution = Resolution {
            corners: None,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            candidates: 0,
        };

        if graph.node_count() < 4 {
            debug!(nodes = graph.node_count(), "too few intersections for a quadrilateral");
            return resolution;
        }

        let nodes = graph.nodes();
        let eps = self.collinear_epsilon;
        let mut candidates = 0;
        let mut best: Option<([Point; 4], f64)> = None;
        graph.for_each_four_cycle(
            |a, m, c| !nodes[a].is_collinear(&nodes[m], &nodes[c], eps),
            |cycle| {
                candidates += 1;
                let ring = cycle.map(|id| nodes[id]);
                if !self.is_usable(&ring) {
                    return;
                }
                let area = polygon_area(&ring);
                if best.is_none_or(|(_, best_area)| area > best_area) {
                    best = Some((ring, area));
                }
            },
        );
        resolution.candidates = candidates;

        let Some((ring, area)) = best else {
            debug!(candidates, "no valid 4-cycle in intersection graph");
            return resolution;
        };

        let labelled = CropCoordinates::from_unordered(ring);
        if !labelled.is_valid(self.collinear_epsilon) {
            debug!(?labelled, "best candidate failed corner labelling");
            return resolution;
        }

        debug!(
            area,
            nodes = resolution.node_count,
            candidates = resolution.candidates,
            "quadrilateral resolved"
        );
        resolution.corners = Some(labelled);
        resolution
    }

    /// Convex, non-degenerate, and no three corners on one line.
    fn is_usable(&self, ring: &[Point; 4]) -> bool {
        if !is_convex_ring(ring) {
            return false;
        }
        for skip in 0..4 {
            let [a, b, c] = [(skip + 1) % 4, (skip + 2) % 4, (skip + 3) % 4].map(|i| ring[i]);
            if a.is_collinear(&b, &c, self.collinear_epsilon) {
                return false;
            }
        }
        true
    }
}
