// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detector configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanwerkError};
use crate::types::Rotation;

/// What the single-slot worker does with a frame that arrives while its
/// mailbox is already occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DropPolicy {
    /// Keep the waiting frame, discard the new arrival.
    #[default]
    DropNewest,
    /// Replace the waiting frame with the new arrival.
    DropOldest,
}

/// Persistent detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Width in pixels frames are downsampled to before detection.
    pub analysis_width: u32,
    /// Mounting angle of the sensor; sources stamp it onto the frames they emit.
    pub sensor_rotation: Rotation,
    /// How far (px) an intersection may fall outside a segment's bounding box.
    pub intersection_tolerance: f64,
    /// Intersections closer than this (px) collapse into one graph node.
    pub merge_radius: f64,
    /// Triangle area (px²) below which three corners count as collinear.
    pub collinear_epsilon: f64,
    /// Longest a single detection may hold the in-flight slot.
    pub detection_timeout_ms: u64,
    /// Frames that waited longer than this in the mailbox are discarded.
    pub max_frame_age_ms: u64,
    pub drop_policy: DropPolicy,
    /// Canny hysteresis thresholds for the built-in line detector.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Hough vote threshold as a fraction of the analysis image's shorter side.
    pub hough_vote_fraction: f64,
    pub hough_suppression_radius: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            analysis_width: 250,
            sensor_rotation: Rotation::Deg90,
            intersection_tolerance: 20.0,
            merge_radius: 2.0,
            collinear_epsilon: 1.0,
            detection_timeout_ms: 1500,
            max_frame_age_ms: 500,
            drop_policy: DropPolicy::DropNewest,
            canny_low: 30.0,
            canny_high: 90.0,
            hough_vote_fraction: 0.2,
            hough_suppression_radius: 8,
        }
    }
}

impl DetectorConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.analysis_width < 16 {
            return Err(ScanwerkError::Config(format!(
                "analysis_width must be at least 16, got {}",
                self.analysis_width
            )));
        }
        if !(self.intersection_tolerance >= 0.0) {
            return Err(ScanwerkError::Config(format!(
                "intersection_tolerance must be non-negative, got {}",
                self.intersection_tolerance
            )));
        }
        if !(self.merge_radius > 0.0) {
            return Err(ScanwerkError::Config(format!(
                "merge_radius must be positive, got {}",
                self.merge_radius
            )));
        }
        if !(self.collinear_epsilon > 0.0) {
            return Err(ScanwerkError::Config(format!(
                "collinear_epsilon must be positive, got {}",
                self.collinear_epsilon
            )));
        }
        if self.detection_timeout_ms == 0 {
            return Err(ScanwerkError::Config("detection_timeout_ms must be non-zero".into()));
        }
        if self.canny_low > self.canny_high {
            return Err(ScanwerkError::Config(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        Ok(())
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection_timeout_ms)
    }

    pub fn max_frame_age(&self) -> Duration {
        Duration::from_millis(self.max_frame_age_ms)
    }
}
