// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vision primitives: the line-segment source the boundary resolver runs on.
//
// On device this is usually a platform vision service; `HoughVision` is the
// portable implementation built from `imageproc` (blur, Canny, Hough).

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use scanwerk_core::DetectorConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, instrument};

use crate::geometry::{Point, Segment};

/// Finds straight edge segments in an analysis-resolution image.
///
/// `Ok(None)` means the image holds no usable line evidence. A session runs
/// one call at a time on the blocking pool, but a call left running by a
/// stopped session can overlap the next session's, so implementations must
/// be `Send + Sync`.
pub trait VisionPrimitive: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Result<Option<Vec<Segment>>>;
}

impl<F> VisionPrimitive for F
where
    F: Fn(&GrayImage) -> Result<Option<Vec<Segment>>> + Send + Sync,
{
    fn detect(&self, image: &GrayImage) -> Result<Option<Vec<Segment>>> {
        self(image)
    }
}

/// Upper bound on segments handed to the resolver per frame.
const MAX_SEGMENTS: usize = 48;

/// Edge-and-Hough line finder.
///
/// ## Pipeline
///
/// 1. Gaussian blur for noise reduction
/// 2. Canny edge detection
/// 3. Hough line detection, vote threshold proportional to the short side
/// 4. Clip each polar line to the image rectangle
/// 5. Keep the lines best supported by edge pixels, up to the per-frame cap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughVision {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Fraction of the shorter image side a line must collect in votes.
    pub vote_fraction: f64,
    pub suppression_radius: u32,
}

impl Default for HoughVision {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

impl HoughVision {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            blur_sigma: 1.0,
            canny_low: config.canny_low,
            canny_high: config.canny_high,
            vote_fraction: config.hough_vote_fraction,
            suppression_radius: config.hough_suppression_radius,
        }
    }
}

impl VisionPrimitive for HoughVision {
    #[instrument(level = "debug", skip_all, fields(width = image.width(), height = image.height()))]
    fn detect(&self, image: &GrayImage) -> Result<Option<Vec<Segment>>> {
        let (w, h) = image.dimensions();
        if w < 2 || h < 2 {
            return Err(ScanwerkError::Detection(format!(
                "image too small for line detection: {}x{}",
                w, h
            )));
        }

        let blurred = gaussian_blur_f32(image, self.blur_sigma);
        let edges = canny(&blurred, self.canny_low, self.canny_high);

        let vote_threshold = ((w.min(h) as f64 * self.vote_fraction) as u32).max(10);
        let options = LineDetectionOptions {
            vote_threshold,
            suppression_radius: self.suppression_radius,
        };
        let lines = detect_lines(&edges, options);
        debug!(line_count = lines.len(), vote_threshold, "Hough lines detected");

        if lines.is_empty() {
            return Ok(None);
        }

        let clipped: Vec<Segment> = lines
            .iter()
            .filter_map(|line| clip_polar_line(line, w, h))
            .collect();
        let segments = strongest(&edges, clipped, MAX_SEGMENTS);
        if segments.is_empty() {
            return Ok(None);
        }
        Ok(Some(segments))
    }
}

/// Clip the polar line `x cos(theta) + y sin(theta) = r` to the image
/// rectangle. Returns `None` if it misses the image.
fn clip_polar_line(line: &PolarLine, width: u32, height: u32) -> Option<Segment> {
    let theta = (line.angle_in_degrees as f64).to_radians();
    let (sin, cos) = theta.sin_cos();
    let r = line.r as f64;
    let max_x = (width - 1) as f64;
    let max_y = (height - 1) as f64;

    let mut hits: Vec<Point> = Vec::with_capacity(4);
    if sin.abs() > 1e-9 {
        for x in [0.0, max_x] {
            hits.push(Point::new(x, (r - x * cos) / sin));
        }
    }
    if cos.abs() > 1e-9 {
        for y in [0.0, max_y] {
            hits.push(Point::new((r - y * sin) / cos, y));
        }
    }
    hits.retain(|p| p.x >= -0.5 && p.x <= max_x + 0.5 && p.y >= -0.5 && p.y <= max_y + 0.5);

    // Corners hit twice; keep the two hits farthest apart.
    let mut best: Option<(Point, Point, f64)> = None;
    for (i, a) in hits.iter().enumerate() {
        for b in &hits[i + 1..] {
            let d = a.distance(b);
            if best.is_none_or(|(_, _, best_d)| d > best_d) {
                best = Some((*a, *b, d));
            }
        }
    }
    match best {
        Some((a, b, d)) if d >= 1.0 => Some(Segment::new(a.clamp(max_x, max_y), b.clamp(max_x, max_y))),
        _ => None,
    }
}

/// The `limit` segments with the most edge support, strongest first.
///
/// Hough output is ordered by angle rather than by votes, so capping it
/// directly would favour one orientation.
fn strongest(edges: &GrayImage, segments: Vec<Segment>, limit: usize) -> Vec<Segment> {
    if segments.len() <= limit {
        return segments;
    }
    let mut ranked: Vec<(u32, Segment)> = segments
        .into_iter()
        .map(|segment| (edge_support(edges, &segment), segment))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    debug!(
        kept = limit,
        discarded = ranked.len() - limit,
        "Capping Hough lines by edge support"
    );
    ranked.into_iter().take(limit).map(|(_, segment)| segment).collect()
}

/// Samples along `segment`, one per pixel of length, that have an edge
/// pixel within one pixel of them.
fn edge_support(edges: &GrayImage, segment: &Segment) -> u32 {
    let (w, h) = edges.dimensions();
    let is_edge = |x: i64, y: i64| {
        x >= 0 && y >= 0 && x < w as i64 && y < h as i64 && edges.get_pixel(x as u32, y as u32)[0] > 0
    };

    let steps = segment.length().ceil().max(1.0) as u32;
    let (dx, dy) = (segment.end.x - segment.start.x, segment.end.y - segment.start.y);
    let mut support = 0;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let cx = (segment.start.x + dx * t).round() as i64;
        let cy = (segment.start.y + dy * t).round() as i64;
        if (-1..=1).any(|oy| (-1..=1).any(|ox| is_edge(cx + ox, cy + oy))) {
            support += 1;
        }
    }
    support
}
