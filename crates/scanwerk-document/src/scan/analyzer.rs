// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame analyzer: one camera frame in, one optional document quadrilateral
// out.
//
// Detection runs on a small upright copy of the frame; the result is mapped
// back into whatever space the caller draws or crops in. All intermediate
// bitmaps are owned locals and are dropped on every exit path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::GrayImage;
use scanwerk_core::error::Result;
use scanwerk_core::{CameraFrame, DetectorConfig, Rotation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::detect::QuadResolver;
use crate::geometry::CropCoordinates;
use crate::image::ImageProcessor;
use crate::mapper::{self, CoordinateMapper, CoordinateSpace};
use crate::scan::vision::VisionPrimitive;

/// Coordinate space the caller wants corners reported in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSpace {
    /// The downsampled image detection ran on.
    Analysis,
    /// Full frame resolution, upright.
    #[default]
    Native,
    /// Full frame resolution in the sensor's own orientation.
    Sensor,
    /// An arbitrary upright surface, e.g. a preview view.
    Custom { width: u32, height: u32 },
}

/// A frame prepared for detection.
#[derive(Debug, Clone)]
pub struct AnalysisFrame {
    pub sequence: u64,
    /// Upright, downsampled luminance image.
    pub image: GrayImage,
    /// Upright full-resolution dimensions.
    pub native: CoordinateSpace,
    /// Rotation that was applied to bring the frame upright.
    pub rotation: Rotation,
}

impl AnalysisFrame {
    pub fn space(&self) -> CoordinateSpace {
        CoordinateSpace::from(self.image.dimensions())
    }

    /// Analysis pixels per native pixel.
    pub fn scale(&self) -> f64 {
        self.image.width() as f64 / self.native.width
    }
}

/// Result of analysing one frame.
#[derive(Debug, Clone)]
pub struct Detection {
    pub sequence: u64,
    /// Labelled corners in `output_space`, or `None` if no document was found.
    pub corners: Option<CropCoordinates>,
    /// The upright analysis image, for previews and debugging overlays.
    pub preview: GrayImage,
    pub analysis_space: CoordinateSpace,
    pub output_space: CoordinateSpace,
    pub elapsed: Duration,
}

/// Prepares frames and runs the vision primitive and resolver over them.
#[derive(Clone)]
pub struct FrameAnalyzer {
    vision: Arc<dyn VisionPrimitive>,
    resolver: QuadResolver,
    analysis_width: u32,
}

impl std::fmt::Debug for FrameAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameAnalyzer")
            .field("resolver", &self.resolver)
            .field("analysis_width", &self.analysis_width)
            .finish_non_exhaustive()
    }
}

impl FrameAnalyzer {
    pub fn new(vision: Arc<dyn VisionPrimitive>, config: &DetectorConfig) -> Self {
        Self {
            vision,
            resolver: QuadResolver::from_config(config),
            analysis_width: config.analysis_width,
        }
    }

    pub fn analysis_width(&self) -> u32 {
        self.analysis_width
    }

    /// Decode, rotate upright and downsample `frame`.
    #[instrument(level = "debug", skip_all, fields(sequence = frame.sequence))]
    pub fn prepare(&self, frame: &CameraFrame) -> Result<AnalysisFrame> {
        let upright = ImageProcessor::from_frame(frame)?.rotate(frame.rotation);
        let native = CoordinateSpace::from((upright.width(), upright.height()));
        let image = upright.downsample_to_width(self.analysis_width).into_luma();
        debug!(
            native_w = native.width,
            native_h = native.height,
            analysis_w = image.width(),
            analysis_h = image.height(),
            "Frame prepared"
        );
        Ok(AnalysisFrame {
            sequence: frame.sequence,
            image,
            native,
            rotation: frame.rotation,
        })
    }

    /// Run the full pipeline on `frame`, reporting corners in `target`.
    ///
    /// A frame without a document is `Ok` with `corners: None`; only
    /// failures of decoding or of the vision primitive are errors.
    #[instrument(skip_all, fields(sequence = frame.sequence))]
    pub fn analyze(&self, frame: &CameraFrame, target: OutputSpace) -> Result<Detection> {
        let started = Instant::now();
        let prepared = self.prepare(frame)?;
        let analysis_space = prepared.space();

        let corners = match self.vision.detect(&prepared.image)? {
            Some(segments) => self.resolver.resolve(&segments),
            None => {
                debug!("Vision primitive found no line evidence");
                None
            }
        };

        let (corners, output_space) = self.to_output(corners, &prepared, target);
        let elapsed = started.elapsed();
        debug!(found = corners.is_some(), ?elapsed, "Frame analysed");

        Ok(Detection {
            sequence: prepared.sequence,
            corners,
            preview: prepared.image,
            analysis_space,
            output_space,
            elapsed,
        })
    }

    fn to_output(
        &self,
        corners: Option<CropCoordinates>,
        prepared: &AnalysisFrame,
        target: OutputSpace,
    ) -> (Option<CropCoordinates>, CoordinateSpace) {
        let analysis = prepared.space();
        let upright_target = match target {
            OutputSpace::Analysis => analysis,
            OutputSpace::Native | OutputSpace::Sensor => prepared.native,
            OutputSpace::Custom { width, height } => CoordinateSpace::from((width, height)),
        };
        let to_upright = CoordinateMapper::between(analysis, upright_target);
        let upright = corners.map(|q| {
            to_upright
                .apply(&q)
                .clamp(upright_target.width, upright_target.height)
        });

        if target != OutputSpace::Sensor {
            return (upright, upright_target);
        }
        let undo = prepared.rotation.inverse();
        let sensor = upright_target.rotated(undo);
        (
            upright.map(|q| mapper::rotate(&q, undo, upright_target)),
            sensor,
        )
    }
}
