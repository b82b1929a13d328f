//! Clustering of raw sliding-window hits into final detections.

use crate::detection::infrastructure::math::partition;

/// Relative tolerance under which two hits count as the same face.
pub const GROUP_EPS: f64 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    fn right(&self) -> i32 {
        self.x + self.width
    }

    fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

fn similar(a: &Rect, b: &Rect, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    (a.x - b.x).abs() as f64 <= delta
        && (a.y - b.y).abs() as f64 <= delta
        && (a.right() - b.right()).abs() as f64 <= delta
        && (a.bottom() - b.bottom()).abs() as f64 <= delta
}

/// Groups overlapping hits, averages each group, and keeps groups with more
/// than `min_neighbors` members.
///
/// A surviving group is also dropped when it sits inside a stronger group.
/// With `min_neighbors == 0` the hits are returned untouched.
pub fn group_rectangles(hits: &[Rect], min_neighbors: u32, eps: f64) -> Vec<Rect> {
    if min_neighbors == 0 || hits.is_empty() {
        return hits.to_vec();
    }

    let (labels, classes) = partition(hits, |a, b| similar(a, b, eps));
    let mut sums = vec![[0i64; 4]; classes];
    let mut counts = vec![0u32; classes];
    for (hit, &label) in hits.iter().zip(&labels) {
        let sum = &mut sums[label];
        sum[0] += hit.x as i64;
        sum[1] += hit.y as i64;
        sum[2] += hit.width as i64;
        sum[3] += hit.height as i64;
        counts[label] += 1;
    }

    let averaged: Vec<Rect> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, &n)| {
            let mean = |v: i64| (v as f64 / n as f64).round() as i32;
            Rect::new(mean(sum[0]), mean(sum[1]), mean(sum[2]), mean(sum[3]))
        })
        .collect();

    let mut kept = Vec::new();
    for (i, r1) in averaged.iter().enumerate() {
        let n1 = counts[i];
        if n1 <= min_neighbors {
            continue;
        }
        let swallowed = averaged.iter().enumerate().any(|(j, r2)| {
            let n2 = counts[j];
            if j == i || n2 <= min_neighbors {
                return false;
            }
            let dx = (r2.width as f64 * eps).round() as i32;
            let dy = (r2.height as f64 * eps).round() as i32;
            let inside = r1.x >= r2.x - dx
                && r1.y >= r2.y - dy
                && r1.right() <= r2.right() + dx
                && r1.bottom() <= r2.bottom() + dy;
            inside && (n2 > n1.max(3) || n1 < 3)
        });
        if !swallowed {
            kept.push(*r1);
        }
    }
    kept
}
