// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: vision primitives, per-frame analysis, the single-slot
// detection worker and the perspective crop.

pub mod analyzer;
pub mod enhance;
pub mod vision;
pub mod worker;

pub use analyzer::{AnalysisFrame, Detection, FrameAnalyzer, OutputSpace};
pub use enhance::ScanEnhancer;
pub use vision::{HoughVision, VisionPrimitive};
pub use worker::{DetectionSession, FrameConsumer, SessionStats, SubmitOutcome};
