use image::{GrayImage, Luma, RgbImage};
use ndarray::{ArrayView3, ShapeError};
use thiserror::Error;

/// Number of interleaved channels in every buffer. Channel order is R, G, B.
pub const CHANNELS: usize = 3;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("pixel data has {actual} bytes, expected {expected} for {width}x{height} RGB")]
pub struct BufferSizeError {
    pub width: u32,
    pub height: u32,
    pub expected: usize,
    pub actual: usize,
}

/// A decoded photo: contiguous 8-bit RGB bytes in row-major order.
///
/// Detectors only ever borrow the buffer. Zero-area buffers are allowed
/// here and handled by each detector as "no signal".
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, BufferSizeError> {
        let expected = (width as usize) * (height as usize) * CHANNELS;
        if data.len() != expected {
            return Err(BufferSizeError {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Buffer filled with a single color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = rgb.iter().copied().cycle().take(pixels * CHANNELS).collect();
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
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

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `(height, width, channel)` view over the pixel bytes.
    pub fn as_ndarray(&self) -> Result<ArrayView3<'_, u8>, ShapeError> {
        ArrayView3::from_shape(self.shape(), &self.data)
    }

    /// ITU-R BT.601 luma, rounded to the nearest integer.
    pub fn to_gray(&self) -> GrayImage {
        let width = self.width as usize;
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let i = (y as usize * width + x as usize) * CHANNELS;
            Luma([luma(self.data[i], self.data[i + 1], self.data[i + 2])])
        })
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let buffer = ImageBuffer::new(data.clone(), 2, 2).unwrap();
        assert_eq!(buffer.width(), 2);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.area(), 4);
        assert_eq!(buffer.data(), &data[..]);
    }

    #[test]
    fn test_mismatched_data_length_is_rejected() {
        let err = ImageBuffer::new(vec![0u8; 10], 2, 2).unwrap_err();
        assert_eq!(err.expected, 12);
        assert_eq!(err.actual, 10);
    }

    #[test]
    fn test_zero_area_is_allowed() {
        let buffer = ImageBuffer::new(Vec::new(), 0, 5).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.area(), 0);
    }

    #[test]
    fn test_filled_repeats_color() {
        let buffer = ImageBuffer::filled(3, 2, [10, 20, 30]);
        assert_eq!(buffer.data().len(), 18);
        assert!(buffer.data().chunks(3).all(|px| px == [10, 20, 30]));
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let buffer = ImageBuffer::new(data, 2, 2).unwrap();
        let arr = buffer.as_ndarray().unwrap();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_to_gray_uses_bt601_weights() {
        let buffer = ImageBuffer::new(vec![255, 0, 0, 0, 255, 0, 0, 0, 255], 3, 1).unwrap();
        let gray = buffer.to_gray();
        assert_eq!(gray.get_pixel(0, 0).0, [76]);
        assert_eq!(gray.get_pixel(1, 0).0, [150]);
        assert_eq!(gray.get_pixel(2, 0).0, [29]);
    }

    #[test]
    fn test_from_rgb_image_keeps_layout() {
        let image = RgbImage::from_pixel(4, 3, image::Rgb([1, 2, 3]));
        let buffer = ImageBuffer::from_rgb_image(image);
        assert_eq!((buffer.width(), buffer.height()), (4, 3));
        assert_eq!(&buffer.data()[33..], &[1, 2, 3]);
    }
}
