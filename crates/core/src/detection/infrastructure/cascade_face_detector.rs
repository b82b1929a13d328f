use std::path::Path;

use image::imageops::{self, FilterType};

use crate::classification::config::FaceDetectionConfig;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::haar_cascade::{CascadeError, HaarCascade, IntegralImage};
use crate::detection::infrastructure::rect_grouping::{group_rectangles, Rect, GROUP_EPS};
use crate::scene::document_detector::working_copy;
use crate::shared::face_region::FaceRegion;
use crate::shared::image_buffer::ImageBuffer;

/// Smallest pyramid step; guarantees the scan terminates.
const MIN_SCALE_STEP: f64 = 1.01;

/// Multi-scale sliding-window face detector over a Haar cascade.
///
/// The image is shrunk by `scale_factor` per pyramid level while the cascade
/// window stays fixed, raw hits are mapped back to full resolution, and
/// hits agreeing on the same face are merged.
pub struct CascadeFaceDetector {
    cascade: HaarCascade,
    config: FaceDetectionConfig,
}

impl CascadeFaceDetector {
    pub fn new(cascade: HaarCascade, config: FaceDetectionConfig) -> Self {
        Self { cascade, config }
    }

    pub fn from_file(path: &Path, config: FaceDetectionConfig) -> Result<Self, CascadeError> {
        Ok(Self::new(HaarCascade::from_file(path)?, config))
    }

    fn raw_hits(&self, gray: &image::GrayImage, min_size: f64) -> Vec<Rect> {
        let (win_w, win_h) = self.cascade.window_size();
        let (width, height) = gray.dimensions();
        let scale_step = self.config.scale_factor.max(MIN_SCALE_STEP);
        let mut hits = Vec::new();

        let mut factor = 1.0f64;
        loop {
            let window_w = (win_w as f64 * factor).round() as u32;
            let window_h = (win_h as f64 * factor).round() as u32;
            let scaled_w = (width as f64 / factor).round() as u32;
            let scaled_h = (height as f64 / factor).round() as u32;
            if window_w > width || window_h > height || scaled_w < win_w || scaled_h < win_h {
                break;
            }
            if (window_w.min(window_h) as f64) < min_size {
                factor *= scale_step;
                continue;
            }

            let integral = if scaled_w == width && scaled_h == height {
                IntegralImage::new(gray)
            } else {
                let scaled = imageops::resize(gray, scaled_w, scaled_h, FilterType::Triangle);
                IntegralImage::new(&scaled)
            };
            let step = if factor > 2.0 { 1 } else { 2 };
            for y in (0..=scaled_h - win_h).step_by(step) {
                for x in (0..=scaled_w - win_w).step_by(step) {
                    if self.cascade.accepts(&integral, x, y) {
                        hits.push(Rect::new(
                            (x as f64 * factor).round() as i32,
                            (y as f64 * factor).round() as i32,
                            window_w as i32,
                            window_h as i32,
                        ));
                    }
                }
            }
            factor *= scale_step;
        }
        hits
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&self, image: &ImageBuffer) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
        if image.is_empty() {
            return Ok(Vec::new());
        }

        let gray = working_copy(image.to_gray(), self.config.max_dimension);
        let to_source = image.width() as f64 / gray.width() as f64;
        let min_size = self.config.min_face_fraction * gray.width().min(gray.height()) as f64;

        let hits = self.raw_hits(&gray, min_size);
        let grouped = group_rectangles(&hits, self.config.min_neighbors, GROUP_EPS);
        log::debug!("cascade: {} raw hits, {} faces", hits.len(), grouped.len());

        let scale = |v: i32| (v as f64 * to_source).round() as i64;
        Ok(grouped
            .iter()
            .filter_map(|r| {
                FaceRegion::clamped(
                    scale(r.x),
                    scale(r.y),
                    scale(r.width),
                    scale(r.height),
                    image.width(),
                    image.height(),
                )
            })
            .collect())
    }
}
