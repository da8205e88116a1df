// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document: Document boundary detection for the Scanwerk scanner.
//
// Provides geometry primitives (points, segments, lines, quadrilaterals), the
// intersection graph and quadrilateral resolver, coordinate mapping between
// analysis and capture resolutions, frame decoding/downsampling, and the
// single-slot detection pipeline that feeds results to the camera preview.

pub mod detect;
pub mod geometry;
pub mod image;
pub mod mapper;
pub mod scan;

// Re-export the primary types so callers can use `scanwerk_document::QuadResolver` etc.
pub use detect::{IntersectionGraph, QuadResolver, Resolution};
pub use geometry::{CropCoordinates, InfiniteLine, Point, Segment};
pub use crate::image::processor::ImageProcessor;
pub use mapper::{CoordinateMapper, CoordinateSpace};
pub use scan::{
    Detection, DetectionSession, FrameAnalyzer, FrameConsumer, HoughVision, OutputSpace,
    ScanEnhancer, SessionStats, SubmitOutcome, VisionPrimitive,
};
