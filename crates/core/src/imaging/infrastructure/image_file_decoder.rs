use std::path::Path;

use crate::imaging::domain::image_decoder::{DecodeError, ImageDecoder};
use crate::shared::image_buffer::ImageBuffer;

/// Decodes any format the `image` crate was built with and converts it to
/// 8-bit RGB, dropping alpha.
#[derive(Debug, Default)]
pub struct ImageFileDecoder;

impl ImageFileDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> Result<ImageBuffer, DecodeError> {
        let rgb = image::open(path)
            .map_err(|source| DecodeError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        let buffer = ImageBuffer::from_rgb_image(rgb);
        if buffer.is_empty() {
            return Err(DecodeError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_decodes_png_to_rgb() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("leaf.png");
        image::RgbImage::from_pixel(8, 6, image::Rgb([10, 200, 30]))
            .save(&path)
            .unwrap();

        let buffer = ImageFileDecoder::new().decode(&path).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (8, 6));
        assert_eq!(&buffer.data()[..3], &[10, 200, 30]);
    }

    #[test]
    fn test_drops_alpha_channel() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("overlay.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 0]))
            .save(&path)
            .unwrap();

        let buffer = ImageFileDecoder::new().decode(&path).unwrap();
        assert_eq!(buffer.data().len(), 4 * 4 * 3);
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            ImageFileDecoder::new().decode(&path),
            Err(DecodeError::Image { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let err = ImageFileDecoder::new()
            .decode(&tmp.path().join("missing.png"))
            .unwrap_err();
        assert!(err.to_string().contains("missing.png"));
    }
}
