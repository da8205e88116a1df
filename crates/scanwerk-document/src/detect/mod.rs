// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary detection: intersection graph and quadrilateral resolution.

pub mod graph;
pub mod resolver;

pub use graph::{IntersectionGraph, NodeId};
pub use resolver::{QuadResolver, Resolution};
