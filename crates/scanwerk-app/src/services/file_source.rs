// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame source that replays image files from disk as camera frames.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use scanwerk_bridge::FrameSource;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{CameraFrame, PixelFormat, Rotation};
use tracing::debug;

/// Replays a list of image files, one frame per file.
///
/// Files are passed on still encoded; decoding happens in the detection
/// worker like any other compressed frame.
pub struct ImageFileSource {
    pending: VecDeque<PathBuf>,
    rotation: Rotation,
    next_sequence: u64,
}

impl ImageFileSource {
    /// `rotation` is stamped onto every frame, as a camera stamps its
    /// mounting angle.
    pub fn new(paths: impl IntoIterator<Item = PathBuf>, rotation: Rotation) -> Self {
        Self {
            pending: paths.into_iter().collect(),
            rotation,
            next_sequence: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn read_frame(&self, path: &Path, sequence: u64) -> Result<CameraFrame> {
        let data = std::fs::read(path)?;
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            ScanwerkError::Resource(format!("{}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), sequence, width, height, "frame read from file");
        Ok(CameraFrame::new(
            sequence,
            data,
            width,
            height,
            PixelFormat::Encoded,
            self.rotation,
        ))
    }
}

impl FrameSource for ImageFileSource {
    /// A file that cannot be read is reported once and skipped; the next
    /// call moves on to the following file.
    fn next_frame(&mut self) -> Result<Option<CameraFrame>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.read_frame(&path, sequence).map(Some)
    }
}
