use crate::shared::face_region::FaceRegion;
use crate::shared::image_buffer::ImageBuffer;

/// Domain interface for face detection.
///
/// Detection over a still image carries no state between calls, so
/// implementations take `&self` and can be shared across worker threads.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &ImageBuffer) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>>;
}
