use ndarray::Axis;
use serde::Serialize;

use crate::classification::config::NatureConfig;
use crate::scene::color::rgb_to_hsv8;
use crate::shared::image_buffer::ImageBuffer;
use crate::shared::signal::Signal;

/// Shares of the image classified as vegetation green and sky blue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NatureScore {
    pub green_fraction: f64,
    pub blue_fraction: f64,
}

impl NatureScore {
    pub fn combined(&self) -> f64 {
        self.green_fraction + self.blue_fraction
    }
}

/// Outdoor color-signature detector.
///
/// Every pixel falls into at most one band (green is checked first), so the
/// two fractions never double count.
pub struct NatureDetector {
    config: NatureConfig,
}

impl NatureDetector {
    pub fn new(config: NatureConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, image: &ImageBuffer) -> Signal<NatureScore> {
        if image.is_empty() {
            return Signal::Absent;
        }

        let Ok(pixels) = image.as_ndarray() else {
            return Signal::Absent;
        };

        let mut green = 0u64;
        let mut blue = 0u64;
        for px in pixels.lanes(Axis(2)) {
            let hsv = rgb_to_hsv8(px[0], px[1], px[2]);
            if self.config.green.contains(hsv) {
                green += 1;
            } else if self.config.blue.contains(hsv) {
                blue += 1;
            }
        }

        let total = image.area() as f64;
        let score = NatureScore {
            green_fraction: green as f64 / total,
            blue_fraction: blue as f64 / total,
        };
        Signal::from_decision(self.is_nature(&score), score)
    }

    fn is_nature(&self, score: &NatureScore) -> bool {
        if score.combined() >= self.config.combined_threshold {
            return true;
        }
        self.config.single_class_threshold.is_some_and(|single| {
            score.green_fraction >= single || score.blue_fraction >= single
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn detector() -> NatureDetector {
        NatureDetector::new(NatureConfig::default())
    }

    /// Top `rows` rows in `top`, the rest in `bottom`.
    fn split(width: u32, height: u32, rows: u32, top: [u8; 3], bottom: [u8; 3]) -> ImageBuffer {
        let data = (0..height)
            .flat_map(|y| {
                let color = if y < rows { top } else { bottom };
                (0..width).flat_map(move |_| color)
            })
            .collect();
        ImageBuffer::new(data, width, height).unwrap()
    }

    #[test]
    fn test_all_green_is_nature() {
        let signal = detector().score(&ImageBuffer::filled(20, 20, [0, 255, 0]));
        assert!(signal.is_positive());
        let score = signal.score().unwrap();
        assert_relative_eq!(score.green_fraction, 1.0);
        assert_relative_eq!(score.blue_fraction, 0.0);
    }

    #[test]
    fn test_all_sky_blue_is_nature() {
        let signal = detector().score(&ImageBuffer::filled(20, 20, [70, 130, 230]));
        assert!(signal.is_positive());
        assert_relative_eq!(signal.score().unwrap().blue_fraction, 1.0);
    }

    #[test]
    fn test_all_red_is_negative_with_zero_fractions() {
        let signal = detector().score(&ImageBuffer::filled(20, 20, [255, 0, 0]));
        assert_eq!(
            signal,
            Signal::Negative(NatureScore {
                green_fraction: 0.0,
                blue_fraction: 0.0
            })
        );
    }

    #[test]
    fn test_mid_gray_is_negative() {
        let signal = detector().score(&ImageBuffer::filled(20, 20, [128, 128, 128]));
        assert!(!signal.is_positive());
        assert!(!signal.is_absent());
    }

    #[test]
    fn test_dark_green_below_value_band_is_ignored() {
        // value 30 is under the band's lower bound of 40
        let signal = detector().score(&ImageBuffer::filled(10, 10, [0, 30, 0]));
        assert_relative_eq!(signal.score().unwrap().green_fraction, 0.0);
    }

    #[test]
    fn test_combined_green_and_blue_reach_threshold() {
        // 20% sky, 20% foliage, 60% red
        let mut data = Vec::new();
        for y in 0..10 {
            let color = match y {
                0..=1 => [0, 0, 255],
                2..=3 => [0, 255, 0],
                _ => [255, 0, 0],
            };
            for _ in 0..10 {
                data.extend_from_slice(&color);
            }
        }
        let signal = detector().score(&ImageBuffer::new(data, 10, 10).unwrap());
        assert!(signal.is_positive());
        assert_relative_eq!(signal.score().unwrap().combined(), 0.4);
    }

    #[test]
    fn test_below_combined_threshold_is_negative() {
        let image = split(10, 10, 3, [0, 255, 0], [255, 0, 0]);
        let signal = detector().score(&image);
        assert!(!signal.is_positive());
        assert_relative_eq!(signal.score().unwrap().green_fraction, 0.3);
    }

    #[test]
    fn test_single_class_rule_is_opt_in() {
        let image = split(10, 10, 3, [0, 255, 0], [255, 0, 0]);
        let config = NatureConfig {
            combined_threshold: 0.4,
            single_class_threshold: Some(0.3),
            ..NatureConfig::default()
        };
        assert!(NatureDetector::new(config).score(&image).is_positive());
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let image = split(20, 20, 7, [0, 255, 0], [255, 0, 0]);
        let signal = detector().score(&image);
        assert_relative_eq!(signal.score().unwrap().combined(), 0.35);
        assert!(signal.is_positive());
    }

    #[test]
    fn test_zero_area_is_absent() {
        let image = ImageBuffer::new(Vec::new(), 0, 0).unwrap();
        assert!(detector().score(&image).is_absent());
    }

    #[test]
    fn test_single_pixel_image() {
        let signal = detector().score(&ImageBuffer::filled(1, 1, [0, 200, 0]));
        assert!(signal.is_positive());
    }
}
