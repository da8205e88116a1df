// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk detection pipeline.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a camera detection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clockwise quarter-turn rotation.
///
/// Camera sensors are mounted at a fixed angle to the display; frames carry
/// the rotation needed to bring them upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Snap an arbitrary angle to the nearest quarter turn.
    pub fn from_degrees(degrees: i32) -> Self {
        let snapped = ((degrees as f64 / 90.0).round() as i32).rem_euclid(4);
        match snapped {
            1 => Self::Deg90,
            2 => Self::Deg180,
            3 => Self::Deg270,
            _ => Self::Deg0,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg0,
            Self::Deg90 => Self::Deg270,
            Self::Deg180 => Self::Deg180,
            Self::Deg270 => Self::Deg90,
        }
    }

    /// Whether width and height trade places.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Pixel layout of a camera frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Packed 8-bit RGBA, `width * height * 4` bytes.
    Rgba8,
    /// 8-bit luminance (the Y plane of a YUV frame), `width * height` bytes.
    Luma8,
    /// A compressed still (JPEG, PNG, ...); dimensions come from the decoder.
    Encoded,
}

impl PixelFormat {
    /// Bytes per pixel for raw formats.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Rgba8 => Some(4),
            Self::Luma8 => Some(1),
            Self::Encoded => None,
        }
    }
}

/// One frame delivered by the camera.
///
/// Frames are ephemeral: they live for one detection cycle and are never
/// persisted.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Monotonic sequence number assigned by the frame source.
    pub sequence: u64,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Rotation needed to bring the sensor image upright.
    pub rotation: Rotation,
    pub captured_at: Instant,
}

impl CameraFrame {
    pub fn new(
        sequence: u64,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        rotation: Rotation,
    ) -> Self {
        Self {
            sequence,
            data,
            width,
            height,
            format,
            rotation,
            captured_at: Instant::now(),
        }
    }
}

/// Classification of pipeline errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Skip the current frame; the next frame is an independent attempt.
    Recoverable,
    /// Continuing is unsafe; tear the pipeline down.
    Fatal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_snaps_to_quarter_turns() {
        assert_eq!(Rotation::from_degrees(0), Rotation::Deg0);
        assert_eq!(Rotation::from_degrees(89), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(180), Rotation::Deg180);
        assert_eq!(Rotation::from_degrees(-90), Rotation::Deg270);
        assert_eq!(Rotation::from_degrees(360), Rotation::Deg0);
    }

    #[test]
    fn rotation_inverse_round_trips() {
        for r in [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            let total = (r.degrees() + r.inverse().degrees()) % 360;
            assert_eq!(total, 0);
        }
    }

    #[test]
    fn raw_formats_report_pixel_size() {
        assert_eq!(PixelFormat::Rgba8.bytes_per_pixel(), Some(4));
        assert_eq!(PixelFormat::Luma8.bytes_per_pixel(), Some(1));
        assert_eq!(PixelFormat::Encoded.bytes_per_pixel(), None);
    }
}
