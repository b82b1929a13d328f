//! Boosted Haar-feature cascade in the OpenCV XML storage format.
//!
//! Only upright (non-tilted) HAAR features with stump or small tree weak
//! classifiers are supported, which covers the stock frontal-face models.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::GrayImage;
use roxmltree::{Document, Node};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to read cascade {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cascade XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("cascade is missing <{0}>")]
    MissingElement(&'static str),
    #[error("invalid number {value:?} in <{element}>")]
    InvalidNumber { element: &'static str, value: String },
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
    #[error("weak classifier refers to {what} {index}, only {available} present")]
    BadIndex {
        what: &'static str,
        index: i64,
        available: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct WeightedRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    weight: f64,
}

#[derive(Debug, Clone)]
struct Feature {
    rects: Vec<WeightedRect>,
}

/// Tree node. A child `> 0` is another node index; `<= 0` is the negated
/// index of a leaf value.
#[derive(Debug, Clone, Copy)]
struct TreeNode {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f64,
}

#[derive(Debug, Clone)]
struct WeakClassifier {
    nodes: Vec<TreeNode>,
    leaves: Vec<f64>,
}

#[derive(Debug, Clone)]
struct Stage {
    threshold: f64,
    classifiers: Vec<WeakClassifier>,
}

#[derive(Debug, Clone)]
pub struct HaarCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<Feature>,
}

impl HaarCascade {
    pub fn from_file(path: &Path) -> Result<Self, CascadeError> {
        let text = fs::read_to_string(path).map_err(|source| CascadeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cascade = Self::parse(&text)?;
        log::info!(
            "Loaded cascade {} ({} stages, {} features)",
            path.display(),
            cascade.stages.len(),
            cascade.features.len()
        );
        Ok(cascade)
    }

    pub fn parse(xml: &str) -> Result<Self, CascadeError> {
        let doc = Document::parse(xml)?;
        let root = doc
            .descendants()
            .find(|n| n.has_tag_name("cascade"))
            .ok_or(CascadeError::MissingElement("cascade"))?;

        let stage_type = text(child(root, "stageType")?);
        if stage_type != "BOOST" {
            return Err(CascadeError::Unsupported(format!("stage type {stage_type}")));
        }
        let feature_type = text(child(root, "featureType")?);
        if feature_type != "HAAR" {
            return Err(CascadeError::Unsupported(format!("feature type {feature_type}")));
        }

        let window_width: u32 = number(child(root, "width")?, "width")?;
        let window_height: u32 = number(child(root, "height")?, "height")?;
        if window_width < 3 || window_height < 3 {
            return Err(CascadeError::Unsupported(format!(
                "window {window_width}x{window_height}"
            )));
        }

        let features = items(child(root, "features")?)
            .map(parse_feature)
            .collect::<Result<Vec<_>, _>>()?;
        let stages = items(child(root, "stages")?)
            .map(parse_stage)
            .collect::<Result<Vec<_>, _>>()?;

        let cascade = Self {
            window_width,
            window_height,
            stages,
            features,
        };
        cascade.check_indices()?;
        Ok(cascade)
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Runs every stage on the window whose top-left corner is `(x, y)`.
    ///
    /// The caller guarantees the window lies inside the integral image.
    pub fn accepts(&self, integral: &IntegralImage, x: u32, y: u32) -> bool {
        let norm = self.variance_norm(integral, x, y);
        self.stages.iter().all(|stage| {
            let sum: f64 = stage
                .classifiers
                .iter()
                .map(|weak| self.evaluate_tree(weak, integral, x, y, norm))
                .sum();
            sum >= stage.threshold
        })
    }

    fn variance_norm(&self, integral: &IntegralImage, x: u32, y: u32) -> f64 {
        let (w, h) = (self.window_width - 2, self.window_height - 2);
        let area = (w * h) as f64;
        let sum = integral.sum(x + 1, y + 1, w, h) as f64;
        let sqsum = integral.squared_sum(x + 1, y + 1, w, h) as f64;
        let nf = area * sqsum - sum * sum;
        if nf > 0.0 {
            nf.sqrt()
        } else {
            1.0
        }
    }

    fn evaluate_tree(
        &self,
        weak: &WeakClassifier,
        integral: &IntegralImage,
        x: u32,
        y: u32,
        norm: f64,
    ) -> f64 {
        let mut idx = 0i32;
        loop {
            let node = &weak.nodes[idx as usize];
            let value = self.feature_value(node.feature, integral, x, y) / norm;
            idx = if value < node.threshold { node.left } else { node.right };
            if idx <= 0 {
                return weak.leaves[(-idx) as usize];
            }
        }
    }

    fn feature_value(&self, feature: usize, integral: &IntegralImage, x: u32, y: u32) -> f64 {
        self.features[feature]
            .rects
            .iter()
            .map(|r| r.weight * integral.sum(x + r.x, y + r.y, r.width, r.height) as f64)
            .sum()
    }

    fn check_indices(&self) -> Result<(), CascadeError> {
        for feature in &self.features {
            for r in &feature.rects {
                if r.x + r.width > self.window_width || r.y + r.height > self.window_height {
                    return Err(CascadeError::Unsupported(format!(
                        "feature rect {}x{}+{}+{} outside window",
                        r.width, r.height, r.x, r.y
                    )));
                }
            }
        }
        for weak in self.stages.iter().flat_map(|s| &s.classifiers) {
            for (at, node) in weak.nodes.iter().enumerate() {
                if node.feature >= self.features.len() {
                    return Err(CascadeError::BadIndex {
                        what: "feature",
                        index: node.feature as i64,
                        available: self.features.len(),
                    });
                }
                for child in [node.left, node.right] {
                    let (what, index, available) = if child > 0 {
                        ("node", child as i64, weak.nodes.len())
                    } else {
                        ("leaf", -(child as i64), weak.leaves.len())
                    };
                    // Children must point forward so evaluation terminates.
                    let backwards = child > 0 && child as usize <= at;
                    if backwards || index as usize >= available {
                        return Err(CascadeError::BadIndex {
                            what,
                            index,
                            available,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Summed-area tables of pixel values and squared pixel values, one row and
/// column larger than the image.
pub struct IntegralImage {
    stride: usize,
    sum: Vec<u64>,
    squared: Vec<u64>,
}

impl IntegralImage {
    pub fn new(gray: &GrayImage) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut squared = vec![0u64; stride * (h + 1)];
        for y in 0..h {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let v = gray.get_pixel(x as u32, y as u32).0[0] as u64;
                row += v;
                row_sq += v * v;
                let at = (y + 1) * stride + x + 1;
                sum[at] = sum[at - stride] + row;
                squared[at] = squared[at - stride] + row_sq;
            }
        }
        Self {
            stride,
            sum,
            squared,
        }
    }

    pub fn sum(&self, x: u32, y: u32, width: u32, height: u32) -> u64 {
        Self::rect(&self.sum, self.stride, x, y, width, height)
    }

    pub fn squared_sum(&self, x: u32, y: u32, width: u32, height: u32) -> u64 {
        Self::rect(&self.squared, self.stride, x, y, width, height)
    }

    fn rect(table: &[u64], stride: usize, x: u32, y: u32, width: u32, height: u32) -> u64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + width as usize, y0 + height as usize);
        table[y1 * stride + x1] + table[y0 * stride + x0]
            - table[y0 * stride + x1]
            - table[y1 * stride + x0]
    }
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &'static str) -> Result<Node<'a, 'i>, CascadeError> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .ok_or(CascadeError::MissingElement(name))
}

/// Element children of an OpenCV sequence node (`<_>` entries).
fn items<'a, 'i: 'a>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(|n| n.is_element())
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

fn number<T: FromStr>(node: Node, element: &'static str) -> Result<T, CascadeError> {
    let raw = text(node);
    raw.parse().map_err(|_| CascadeError::InvalidNumber {
        element,
        value: raw.to_string(),
    })
}

fn numbers<T: FromStr>(node: Node, element: &'static str) -> Result<Vec<T>, CascadeError> {
    text(node)
        .split_whitespace()
        .map(|raw| {
            raw.parse().map_err(|_| CascadeError::InvalidNumber {
                element,
                value: raw.to_string(),
            })
        })
        .collect()
}

fn parse_feature(node: Node) -> Result<Feature, CascadeError> {
    if let Ok(tilted) = child(node, "tilted") {
        if number::<i32>(tilted, "tilted")? != 0 {
            return Err(CascadeError::Unsupported("tilted features".to_string()));
        }
    }
    let rects = items(child(node, "rects")?)
        .map(|r| {
            let v: Vec<f64> = numbers(r, "rects")?;
            match v.as_slice() {
                &[x, y, w, h, weight] if x >= 0.0 && y >= 0.0 && w >= 0.0 && h >= 0.0 => {
                    Ok(WeightedRect {
                        x: x as u32,
                        y: y as u32,
                        width: w as u32,
                        height: h as u32,
                        weight,
                    })
                }
                _ => Err(CascadeError::InvalidNumber {
                    element: "rects",
                    value: text(r).to_string(),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Feature { rects })
}

fn parse_stage(node: Node) -> Result<Stage, CascadeError> {
    let threshold = number(child(node, "stageThreshold")?, "stageThreshold")?;
    let classifiers = items(child(node, "weakClassifiers")?)
        .map(parse_weak_classifier)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage {
        threshold,
        classifiers,
    })
}

fn parse_weak_classifier(node: Node) -> Result<WeakClassifier, CascadeError> {
    let raw: Vec<f64> = numbers(child(node, "internalNodes")?, "internalNodes")?;
    let leaves: Vec<f64> = numbers(child(node, "leafValues")?, "leafValues")?;
    if raw.is_empty() || raw.len() % 4 != 0 {
        return Err(CascadeError::InvalidNumber {
            element: "internalNodes",
            value: format!("{} values", raw.len()),
        });
    }
    let nodes = raw
        .chunks_exact(4)
        .map(|n| {
            if n[2] < 0.0 {
                return Err(CascadeError::BadIndex {
                    what: "feature",
                    index: n[2] as i64,
                    available: 0,
                });
            }
            Ok(TreeNode {
                left: n[0] as i32,
                right: n[1] as i32,
                feature: n[2] as usize,
                threshold: n[3],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WeakClassifier { nodes, leaves })
}
