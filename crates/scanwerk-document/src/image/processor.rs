// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decoding, quarter-turn rotation and downsampling of camera
// frames ahead of boundary detection. Operates on in-memory images using the
// `image` crate.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgba};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{CameraFrame, PixelFormat, Rotation};
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let gray = ImageProcessor::from_frame(&frame)?
///     .rotate(Rotation::Deg90)
///     .downsample_to_width(250)
///     .into_luma();
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            ScanwerkError::Resource(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap the pixel buffer of a camera frame.
    ///
    /// Raw buffers must be exactly `width * height * bytes_per_pixel` long.
    pub fn from_frame(frame: &CameraFrame) -> Result<Self> {
        let image = match frame.format {
            PixelFormat::Encoded => return Self::from_bytes(&frame.data),
            PixelFormat::Rgba8 => {
                check_buffer_len(frame)?;
                ImageBuffer::<Rgba<u8>, _>::from_raw(frame.width, frame.height, frame.data.clone())
                    .map(DynamicImage::ImageRgba8)
            }
            PixelFormat::Luma8 => {
                check_buffer_len(frame)?;
                ImageBuffer::<Luma<u8>, _>::from_raw(frame.width, frame.height, frame.data.clone())
                    .map(DynamicImage::ImageLuma8)
            }
        };
        image.map(Self::from_dynamic).ok_or_else(|| {
            ScanwerkError::Resource(format!(
                "frame {} buffer does not fit {}x{}",
                frame.sequence, frame.width, frame.height
            ))
        })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the processor and return an 8-bit luminance image.
    pub fn into_luma(self) -> GrayImage {
        match self.image {
            DynamicImage::ImageLuma8(gray) => gray,
            other => other.to_luma8(),
        }
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate clockwise by a quarter-turn multiple. Lossless.
    #[instrument(skip(self), level = "debug")]
    pub fn rotate(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::Deg0 => self.image,
            Rotation::Deg90 => self.image.rotate90(),
            Rotation::Deg180 => self.image.rotate180(),
            Rotation::Deg270 => self.image.rotate270(),
        };
        Self { image }
    }

    /// Scale down to `target_width`, preserving the aspect ratio.
    ///
    /// Images already at or below the target width are returned unchanged.
    /// The height never drops below one pixel.
    #[instrument(skip(self), level = "debug", fields(target_width))]
    pub fn downsample_to_width(self, target_width: u32) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        if target_width == 0 || w <= target_width {
            return self;
        }
        let target_height = ((h as f64 * target_width as f64 / w as f64).round() as u32).max(1);
        let resized = self
            .image
            .resize_exact(target_width, target_height, FilterType::Triangle);
        debug!(
            from_w = w,
            from_h = h,
            new_w = resized.width(),
            new_h = resized.height(),
            "Downsample complete"
        );
        Self { image: resized }
    }
}

fn check_buffer_len(frame: &CameraFrame) -> Result<()> {
    let bpp = frame.format.bytes_per_pixel().unwrap_or(1);
    let expected = (frame.width as usize)
        .checked_mul(frame.height as usize)
        .and_then(|px| px.checked_mul(bpp))
        .ok_or_else(|| {
            ScanwerkError::Resource(format!(
                "frame dimensions {}x{} overflow",
                frame.width, frame.height
            ))
        })?;
    if frame.width == 0 || frame.height == 0 || frame.data.len() != expected {
        return Err(ScanwerkError::Resource(format!(
            "frame {}: expected {} bytes for {}x{} {:?}, got {}",
            frame.sequence,
            expected,
            frame.width,
            frame.height,
            frame.format,
            frame.data.len()
        )));
    }
    Ok(())
}
