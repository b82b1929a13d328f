use serde::Serialize;

/// A detected face rectangle in image pixel coordinates.
///
/// Always non-empty and fully contained in the image it was detected in;
/// the only way to build one is through [`FaceRegion::clamped`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FaceRegion {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl FaceRegion {
    /// Clips a possibly out-of-bounds rectangle to the image.
    ///
    /// Returns `None` when nothing of the rectangle remains inside.
    pub fn clamped(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        let x1 = x.clamp(0, image_width as i64);
        let y1 = y.clamp(0, image_height as i64);
        let x2 = (x + width).clamp(0, image_width as i64);
        let y2 = (y + height).clamp(0, image_height as i64);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Share of the image area covered by this face, in `[0, 1]`.
    pub fn area_fraction(&self, image_width: u32, image_height: u32) -> f64 {
        let image_area = image_width as f64 * image_height as f64;
        if image_area <= 0.0 {
            return 0.0;
        }
        (self.area() as f64 / image_area).min(1.0)
    }
}
