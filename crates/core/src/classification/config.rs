//! Thresholds for every detector, validated once before any image is seen.
//!
//! All structs deserialize with `#[serde(default)]`, so a JSON file only
//! needs the fields it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("{field} range is inverted: {min} > {max}")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClassifierConfig {
    pub face: FaceDetectionConfig,
    pub person: PersonConfig,
    pub document: DocumentConfig,
    pub nature: NatureConfig,
}

impl ClassifierConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.face.validate()?;
        self.person.validate()?;
        self.document.validate()?;
        self.nature.validate()
    }
}

/// Parameters of the multi-scale cascade face search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionConfig {
    /// Growth of the search window between pyramid levels.
    pub scale_factor: f64,
    /// A face is accepted only when more raw window hits than this agree.
    pub min_neighbors: u32,
    /// Smallest face searched for, as a fraction of the shorter image side.
    pub min_face_fraction: f64,
    /// Longer side of the working copy the pyramid is built from.
    pub max_dimension: u32,
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_face_fraction: 0.04,
            max_dimension: 800,
        }
    }
}

impl FaceDetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale_factor.is_finite() && self.scale_factor >= 1.01) {
            return Err(ConfigError::OutOfRange {
                field: "face.scale_factor",
                value: self.scale_factor,
                expected: "a finite number >= 1.01",
            });
        }
        check_fraction("face.min_face_fraction", self.min_face_fraction)?;
        check_positive_dimension("face.max_dimension", self.max_dimension)
    }
}

/// Selfie versus group decision thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonConfig {
    /// Minimum face-area share of the frame for a lone face to be a selfie.
    pub selfie_prominence: f64,
    /// Maximum offset of the face centre from the frame centre, as a
    /// fraction of the frame size on each axis.
    pub centering_tolerance: f64,
}

impl Default for PersonConfig {
    fn default() -> Self {
        Self {
            selfie_prominence: 0.08,
            centering_tolerance: 0.25,
        }
    }
}

impl PersonConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("person.selfie_prominence", self.selfie_prominence)?;
        if !(0.0..=0.5).contains(&self.centering_tolerance) {
            return Err(ConfigError::OutOfRange {
                field: "person.centering_tolerance",
                value: self.centering_tolerance,
                expected: "between 0.0 and 0.5",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRange {
    pub min: f64,
    pub max: f64,
}

impl AspectRange {
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.min && ratio <= self.max
    }
}

/// Text-line and page-shape thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// A document needs strictly more near-horizontal lines than this.
    pub min_horizontal_lines: u32,
    /// Maximum deviation from horizontal, in degrees.
    pub horizontal_tolerance_degrees: u32,
    /// Edge pixels a line must collect in the Hough accumulator.
    pub line_vote_threshold: u32,
    /// Radius of non-maximum suppression in the Hough accumulator.
    pub line_suppression_radius: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// A document needs strictly more near-rectangular blobs than this.
    pub min_rectangles: u32,
    /// Minimum blob area in working-resolution pixels.
    pub min_rectangle_area: f64,
    /// Blob area over its minimum enclosing rectangle area.
    pub min_rectangularity: f64,
    /// Accepted width / height ratios.
    pub aspect_ratio: AspectRange,
    pub max_dimension: u32,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            min_horizontal_lines: 3,
            horizontal_tolerance_degrees: 10,
            line_vote_threshold: 100,
            line_suppression_radius: 8,
            canny_low: 50.0,
            canny_high: 150.0,
            min_rectangles: 2,
            min_rectangle_area: 1000.0,
            min_rectangularity: 0.85,
            aspect_ratio: AspectRange { min: 0.7, max: 1.4 },
            max_dimension: 1024,
        }
    }
}

impl DocumentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizontal_tolerance_degrees > 90 {
            return Err(ConfigError::OutOfRange {
                field: "document.horizontal_tolerance_degrees",
                value: self.horizontal_tolerance_degrees as f64,
                expected: "at most 90",
            });
        }
        if self.line_vote_threshold == 0 {
            return Err(ConfigError::OutOfRange {
                field: "document.line_vote_threshold",
                value: 0.0,
                expected: "at least 1",
            });
        }
        let low = self.canny_low as f64;
        let high = self.canny_high as f64;
        if !(low.is_finite() && low >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "document.canny_low",
                value: low,
                expected: "a non-negative number",
            });
        }
        if !high.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "document.canny_high",
                value: high,
                expected: "a finite number",
            });
        }
        if low > high {
            return Err(ConfigError::InvertedRange {
                field: "document.canny",
                min: low,
                max: high,
            });
        }
        if !(self.min_rectangle_area.is_finite() && self.min_rectangle_area >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "document.min_rectangle_area",
                value: self.min_rectangle_area,
                expected: "a non-negative number",
            });
        }
        check_fraction("document.min_rectangularity", self.min_rectangularity)?;
        let range = self.aspect_ratio;
        if !(range.min.is_finite() && range.min > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "document.aspect_ratio.min",
                value: range.min,
                expected: "a positive number",
            });
        }
        if !range.max.is_finite() || range.min > range.max {
            return Err(ConfigError::InvertedRange {
                field: "document.aspect_ratio",
                min: range.min,
                max: range.max,
            });
        }
        check_positive_dimension("document.max_dimension", self.max_dimension)
    }
}

/// Inclusive band in OpenCV-style HSV: hue 0..=180, saturation and value 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBand {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.upper[0] > 180 {
            return Err(ConfigError::OutOfRange {
                field,
                value: self.upper[0] as f64,
                expected: "a hue of at most 180",
            });
        }
        for i in 0..3 {
            if self.lower[i] > self.upper[i] {
                return Err(ConfigError::InvertedRange {
                    field,
                    min: self.lower[i] as f64,
                    max: self.upper[i] as f64,
                });
            }
        }
        Ok(())
    }
}

/// Vegetation and sky color-share thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatureConfig {
    pub green: HsvBand,
    pub blue: HsvBand,
    /// Nature when green + blue shares reach this value.
    pub combined_threshold: f64,
    /// When set, either share alone reaching this value also counts.
    pub single_class_threshold: Option<f64>,
}

impl Default for NatureConfig {
    fn default() -> Self {
        Self {
            green: HsvBand {
                lower: [40, 40, 40],
                upper: [80, 255, 255],
            },
            blue: HsvBand {
                lower: [100, 50, 50],
                upper: [130, 255, 255],
            },
            combined_threshold: 0.35,
            single_class_threshold: None,
        }
    }
}

impl NatureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.green.validate("nature.green")?;
        self.blue.validate("nature.blue")?;
        check_fraction("nature.combined_threshold", self.combined_threshold)?;
        if let Some(single) = self.single_class_threshold {
            check_fraction("nature.single_class_threshold", single)?;
        }
        Ok(())
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "between 0.0 and 1.0",
        });
    }
    Ok(())
}

fn check_positive_dimension(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::OutOfRange {
            field,
            value: 0.0,
            expected: "at least 1",
        });
    }
    Ok(())
}
