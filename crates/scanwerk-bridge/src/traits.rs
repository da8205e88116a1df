// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for frame producers.

use scanwerk_core::CameraFrame;
use scanwerk_core::error::Result;

/// A stream of preview frames.
///
/// Platforms without a camera service return
/// `ScanwerkError::PlatformUnavailable`.
pub trait FrameSource {
    /// Block until the next frame is available.
    /// Returns Ok(None) once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<CameraFrame>>;
}
