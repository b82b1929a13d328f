use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::otsu_level;
use imageproc::edges::canny;
use imageproc::geometry::min_area_rect;
use imageproc::hough::{detect_lines, LineDetectionOptions};
use imageproc::point::Point;
use serde::Serialize;

use crate::classification::config::DocumentConfig;
use crate::shared::image_buffer::ImageBuffer;
use crate::shared::signal::Signal;

/// Below this side length edge and contour analysis is meaningless.
const MIN_ANALYSIS_SIDE: u32 = 3;

/// Polar angle of a horizontal line's normal in the Hough accumulator.
const HORIZONTAL_NORMAL_DEGREES: u32 = 90;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DocumentScore {
    pub horizontal_lines: u32,
    pub rectangles: u32,
    /// Share of the working image covered by the counted rectangles.
    pub rectangle_coverage: f64,
    /// Width over height of the source image.
    pub aspect_ratio: f64,
    pub confidence: f64,
}

/// Page-structure detector: long horizontal text/rule lines, ink blobs that
/// are close to rectangles, and a page-like aspect ratio.
pub struct DocumentDetector {
    config: DocumentConfig,
}

impl DocumentDetector {
    pub fn new(config: DocumentConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, image: &ImageBuffer) -> Signal<DocumentScore> {
        if image.is_empty() {
            return Signal::Absent;
        }

        let aspect_ratio = image.width() as f64 / image.height() as f64;
        let gray = working_copy(image.to_gray(), self.config.max_dimension);

        let (horizontal_lines, rectangles, rectangle_coverage) =
            if gray.width() < MIN_ANALYSIS_SIDE || gray.height() < MIN_ANALYSIS_SIDE {
                (0, 0, 0.0)
            } else {
                let (count, covered) = self.count_rectangles(&gray);
                let area = gray.width() as f64 * gray.height() as f64;
                (self.count_horizontal_lines(&gray), count, covered / area)
            };

        let aspect_ok = self.config.aspect_ratio.contains(aspect_ratio);
        let confidence = self.confidence(horizontal_lines, rectangles, aspect_ok);
        if !(confidence.is_finite() && rectangle_coverage.is_finite()) {
            return Signal::Absent;
        }

        let is_document = horizontal_lines > self.config.min_horizontal_lines
            && rectangles > self.config.min_rectangles
            && aspect_ok;
        log::debug!(
            "document: lines={horizontal_lines} rects={rectangles} aspect={aspect_ratio:.2} -> {is_document}"
        );

        Signal::from_decision(
            is_document,
            DocumentScore {
                horizontal_lines,
                rectangles,
                rectangle_coverage: rectangle_coverage.min(1.0),
                aspect_ratio,
                confidence,
            },
        )
    }

    fn count_horizontal_lines(&self, gray: &GrayImage) -> u32 {
        let edges = canny(gray, self.config.canny_low, self.config.canny_high);
        let options = LineDetectionOptions {
            vote_threshold: self.config.line_vote_threshold,
            suppression_radius: self.config.line_suppression_radius,
        };
        let tolerance = self.config.horizontal_tolerance_degrees;
        detect_lines(&edges, options)
            .iter()
            .filter(|line| line.angle_in_degrees.abs_diff(HORIZONTAL_NORMAL_DEGREES) <= tolerance)
            .count() as u32
    }

    /// Counts dark top-level blobs that fill most of their minimum-area
    /// bounding rectangle. Returns the count and the area they cover.
    fn count_rectangles(&self, gray: &GrayImage) -> (u32, f64) {
        let level = otsu_level(gray);
        let mut ink = gray.clone();
        for p in ink.pixels_mut() {
            p.0[0] = if p.0[0] <= level { 255 } else { 0 };
        }

        let mut count = 0;
        let mut covered = 0.0;
        for contour in find_contours::<i32>(&ink) {
            if contour.parent.is_some() || contour.border_type != BorderType::Outer {
                continue;
            }
            let area = polygon_area(&contour.points);
            if area < self.config.min_rectangle_area || area <= 0.0 {
                continue;
            }
            let bounding = polygon_area(&min_area_rect(&contour.points));
            if bounding > 0.0 && area / bounding >= self.config.min_rectangularity {
                count += 1;
                covered += area;
            }
        }
        (count, covered)
    }

    fn confidence(&self, lines: u32, rectangles: u32, aspect_ok: bool) -> f64 {
        if !aspect_ok {
            return 0.0;
        }
        let saturation = |found: u32, minimum: u32| {
            (found as f64 / (2.0 * (minimum as f64 + 1.0))).min(1.0)
        };
        let lines = saturation(lines, self.config.min_horizontal_lines);
        let rectangles = saturation(rectangles, self.config.min_rectangles);
        (lines + rectangles) / 2.0
    }
}

/// Grayscale copy whose longer side is at most `max_dimension`.
pub(crate) fn working_copy(gray: GrayImage, max_dimension: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let longer = w.max(h);
    if longer <= max_dimension {
        return gray;
    }
    let scale = max_dimension as f64 / longer as f64;
    let nw = ((w as f64 * scale).round() as u32).max(1);
    let nh = ((h as f64 * scale).round() as u32).max(1);
    imageops::resize(&gray, nw, nh, FilterType::Triangle)
}

/// Shoelace area of a closed polygon, always non-negative.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice.unsigned_abs() as f64 / 2.0
}
