// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Intersection graph: nodes are accepted segment crossings, edges join two
// crossings that lie on the same input segment.
//
// The graph is rebuilt for every frame and thrown away once the frame's
// quadrilateral has been chosen.

use std::collections::VecDeque;

use tracing::trace;

use crate::geometry::{Point, Segment};

/// Index of a node in an [`IntersectionGraph`].
pub type NodeId = usize;

/// Undirected graph of segment intersections.
#[derive(Debug, Clone, Default)]
pub struct IntersectionGraph {
    nodes: Vec<Point>,
    /// Sorted, duplicate-free neighbour lists.
    adjacency: Vec<Vec<NodeId>>,
    edge_count: usize,
}

impl IntersectionGraph {
    /// Build the graph for one frame.
    ///
    /// Every unordered pair of segments is intersected with the bounded test
    /// (`tolerance` px outside both bounding boxes). A crossing closer than
    /// `merge_radius` to an existing node reuses that node. Afterwards each
    /// segment links every pair of nodes found on it.
    pub fn build(segments: &[Segment], tolerance: f64, merge_radius: f64) -> Self {
        let mut graph = Self::default();
        let mut on_segment: Vec<Vec<NodeId>> = vec![Vec::new(); segments.len()];

        for i in 0..segments.len() {
            for j in (i + 1)..segments.len() {
                let Some(point) = segments[i].intersection(&segments[j], tolerance) else {
                    continue;
                };
                let id = graph.insert_node(point, merge_radius);
                for seg in [i, j] {
                    if !on_segment[seg].contains(&id) {
                        on_segment[seg].push(id);
                    }
                }
            }
        }

        for ids in &on_segment {
            for (k, &a) in ids.iter().enumerate() {
                for &b in &ids[k + 1..] {
                    graph.add_edge(a, b);
                }
            }
        }

        trace!(
            segments = segments.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "intersection graph built"
        );
        graph
    }

    fn insert_node(&mut self, point: Point, merge_radius: f64) -> NodeId {
        if let Some(existing) = self
            .nodes
            .iter()
            .position(|node| node.distance(&point) <= merge_radius)
        {
            return existing;
        }
        self.nodes.push(point);
        self.adjacency.push(Vec::new());
        self.nodes.len() - 1
    }

    fn add_edge(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        if let Err(pos) = self.adjacency[a].binary_search(&b) {
            self.adjacency[a].insert(pos, b);
            if let Err(pos) = self.adjacency[b].binary_search(&a) {
                self.adjacency[b].insert(pos, a);
            }
            self.edge_count += 1;
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Point> {
        self.nodes.get(id)
    }

    /// Neighbours of `id` in ascending order; empty for unknown ids.
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// Depth-first path from `from` to `to`, using an explicit stack.
    ///
    /// Neighbours are explored in ascending id order. The path is not
    /// necessarily the shortest; see [`bfs_path`](Self::bfs_path).
    pub fn dfs_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        if from >= self.node_count() || to >= self.node_count() {
            return None;
        }
        let mut visited = vec![false; self.node_count()];
        let mut parent: Vec<Option<NodeId>> = vec![None; self.node_count()];
        let mut stack = vec![from];

        while let Some(node) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            if node == to {
                return Some(self.trace_back(&parent, from, to));
            }
            // Reverse so the smallest neighbour is popped first.
            for &next in self.neighbors(node).iter().rev() {
                if !visited[next] {
                    parent[next] = Some(node);
                    stack.push(next);
                }
            }
        }
        None
    }

    /// Shortest (fewest edges) path from `from` to `to`.
    pub fn bfs_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        if from >= self.node_count() || to >= self.node_count() {
            return None;
        }
        let mut visited = vec![false; self.node_count()];
        let mut parent: Vec<Option<NodeId>> = vec![None; self.node_count()];
        let mut queue = VecDeque::from([from]);
        visited[from] = true;

        while let Some(node) = queue.pop_front() {
            if node == to {
                return Some(self.trace_back(&parent, from, to));
            }
            for &next in self.neighbors(node) {
                if !visited[next] {
                    visited[next] = true;
                    parent[next] = Some(node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn trace_back(&self, parent: &[Option<NodeId>], from: NodeId, to: NodeId) -> Vec<NodeId> {
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            match parent[current] {
                Some(prev) => {
                    path.push(prev);
                    current = prev;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Every simple 4-cycle, each reported once as `[a, b, c, d]` with `a`
    /// the smallest id and `b < d`.
    pub fn four_cycles(&self) -> Vec<[NodeId; 4]> {
        let mut cycles = Vec::new();
        self.for_each_four_cycle(|_, _, _| true, |cycle| cycles.push(cycle));
        cycles
    }

    /// Visit 4-cycles without collecting them.
    ///
    /// Cycles are assembled from wedges `a - m - c` (path of two edges with
    /// `a` the smallest id); two wedges sharing both ends close a cycle.
    /// `keep_wedge(a, m, c)` can reject a wedge before any cycle is built
    /// from it, so every visited cycle has both of its wedges accepted.
    /// Each surviving cycle is visited once, as `[a, b, c, d]` with `b < d`.
    pub fn for_each_four_cycle(
        &self,
        mut keep_wedge: impl FnMut(NodeId, NodeId, NodeId) -> bool,
        mut visit: impl FnMut([NodeId; 4]),
    ) {
        // Middle nodes of the accepted wedges from the current `a`, by far end.
        let mut middles: Vec<Vec<NodeId>> = vec![Vec::new(); self.node_count()];
        let mut far_ends: Vec<NodeId> = Vec::new();

        for a in 0..self.node_count() {
            for &m in self.neighbors(a) {
                if m < a {
                    continue;
                }
                for &c in self.neighbors(m) {
                    if c <= a || !keep_wedge(a, m, c) {
                        continue;
                    }
                    if middles[c].is_empty() {
                        far_ends.push(c);
                    }
                    middles[c].push(m);
                }
            }

            for c in far_ends.drain(..) {
                // Ascending: middles were gathered in neighbour order.
                let found = &middles[c];
                for (k, &b) in found.iter().enumerate() {
                    for &d in &found[k + 1..] {
                        visit([a, b, c, d]);
                    }
                }
                middles[c].clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DEFAULT_INTERSECTION_TOLERANCE;

    fn rectangle_segments() -> Vec<Segment> {
        vec![
            Segment::from_coords(0.0, 0.0, 100.0, 0.0),
            Segment::from_coords(100.0, 0.0, 100.0, 150.0),
            Segment::from_coords(100.0, 150.0, 0.0, 150.0),
            Segment::from_coords(0.0, 150.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn rectangle_builds_a_single_cycle() {
        let graph = IntersectionGraph::build(&rectangle_segments(), DEFAULT_INTERSECTION_TOLERANCE, 2.0);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.four_cycles().len(), 1);
        for id in 0..4 {
            assert_eq!(graph.neighbors(id).len(), 2);
        }
    }

    #[test]
    fn near_duplicate_crossings_merge() {
        // Three lines through (almost) the same point.
        let segments = vec![
            Segment::from_coords(0.0, 50.0, 100.0, 50.0),
            Segment::from_coords(50.0, 0.0, 50.0, 100.0),
            Segment::from_coords(0.0, 0.5, 100.0, 100.5),
        ];
        let graph = IntersectionGraph::build(&segments, DEFAULT_INTERSECTION_TOLERANCE, 2.0);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn parallel_pair_yields_no_nodes() {
        let segments = vec![
            Segment::from_coords(0.0, 0.0, 100.0, 0.0),
            Segment::from_coords(0.0, 40.0, 100.0, 40.0),
        ];
        let graph = IntersectionGraph::build(&segments, DEFAULT_INTERSECTION_TOLERANCE, 2.0);
        assert_eq!(graph.node_count(), 0);
        assert!(graph.four_cycles().is_empty());
    }

    #[test]
    fn traversals_find_paths_around_the_rectangle() {
        let graph = IntersectionGraph::build(&rectangle_segments(), DEFAULT_INTERSECTION_TOLERANCE, 2.0);
        let start = 0;
        // The node opposite `start` is the one it is not adjacent to.
        let opposite = (1..4).find(|&n| !graph.has_edge(start, n)).expect("opposite corner");

        let bfs = graph.bfs_path(start, opposite).expect("bfs path");
        assert_eq!(bfs.len(), 3);
        assert_eq!(bfs.first(), Some(&start));
        assert_eq!(bfs.last(), Some(&opposite));

        let dfs = graph.dfs_path(start, opposite).expect("dfs path");
        assert_eq!(dfs.first(), Some(&start));
        assert_eq!(dfs.last(), Some(&opposite));
        for pair in dfs.windows(2) {
            assert!(graph.has_edge(pair[0], pair[1]));
        }
    }

    #[test]
    fn disconnected_nodes_have_no_path() {
        // Two separate crosses far apart.
        let segments = vec![
            Segment::from_coords(0.0, 10.0, 20.0, 10.0),
            Segment::from_coords(10.0, 0.0, 10.0, 20.0),
            Segment::from_coords(200.0, 210.0, 220.0, 210.0),
            Segment::from_coords(210.0, 200.0, 210.0, 220.0),
        ];
        let graph = IntersectionGraph::build(&segments, DEFAULT_INTERSECTION_TOLERANCE, 2.0);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.dfs_path(0, 1).is_none());
        assert!(graph.bfs_path(0, 1).is_none());
        assert_eq!(graph.bfs_path(0, 0), Some(vec![0]));
    }

    #[test]
    fn cycles_are_reported_once_in_canonical_form() {
        // Complete graph on four nodes: three distinct 4-cycles.
        let segments = vec![
            Segment::from_coords(0.0, 0.0, 100.0, 0.0),
            Segment::from_coords(100.0, 0.0, 100.0, 100.0),
            Segment::from_coords(100.0, 100.0, 0.0, 100.0),
            Segment::from_coords(0.0, 100.0, 0.0, 0.0),
            Segment::from_coords(0.0, 0.0, 100.0, 100.0),
            Segment::from_coords(100.0, 0.0, 0.0, 100.0),
        ];
        let graph = IntersectionGraph::build(&segments, DEFAULT_INTERSECTION_TOLERANCE, 2.0);
        // Corners plus the centre crossing of the diagonals.
        assert_eq!(graph.node_count(), 5);

        let cycles = graph.four_cycles();
        for &[a, b, c, d] in &cycles {
            assert!(a < b && a < c && a < d && b < d, "{:?}", [a, b, c, d]);
            assert!(graph.has_edge(a, b) && graph.has_edge(b, c));
            assert!(graph.has_edge(c, d) && graph.has_edge(d, a));
        }
        let mut sorted = cycles.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), cycles.len());
    }

    #[test]
    fn rejected_wedges_never_reach_the_visitor() {
        let graph = IntersectionGraph::build(&rectangle_segments(), DEFAULT_INTERSECTION_TOLERANCE, 2.0);
        let mut visited = 0;
        graph.for_each_four_cycle(|_, _, _| false, |_| visited += 1);
        assert_eq!(visited, 0);
        graph.for_each_four_cycle(|_, _, _| true, |_| visited += 1);
        assert_eq!(visited, 1);
    }

    #[test]
    fn unknown_nodes_are_handled() {
        let graph = IntersectionGraph::default();
        assert!(graph.neighbors(7).is_empty());
        assert!(graph.bfs_path(0, 1).is_none());
        assert!(graph.dfs_path(0, 1).is_none());
    }
}
