use serde::Serialize;

use crate::classification::config::PersonConfig;
use crate::shared::face_region::FaceRegion;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonVerdict {
    Selfie,
    People,
    None,
}

/// Decides selfie vs. group from the detected faces.
///
/// A selfie is exactly one face that is both prominent (its share of the
/// frame reaches `selfie_prominence`) and centred (its centre lies within
/// `centering_tolerance` of the frame centre on both axes, as a fraction of
/// that axis). Any other non-empty face set is people.
pub fn classify(
    faces: &[FaceRegion],
    width: u32,
    height: u32,
    config: &PersonConfig,
) -> PersonVerdict {
    match faces {
        [] => PersonVerdict::None,
        [face] if is_selfie(face, width, height, config) => PersonVerdict::Selfie,
        _ => PersonVerdict::People,
    }
}

fn is_selfie(face: &FaceRegion, width: u32, height: u32, config: &PersonConfig) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    let prominent = face.area_fraction(width, height) >= config.selfie_prominence;
    let (cx, cy) = face.center();
    let dx = (cx / width as f64 - 0.5).abs();
    let dy = (cy / height as f64 - 0.5).abs();
    let centred = dx <= config.centering_tolerance && dy <= config.centering_tolerance;
    log::debug!(
        "person: prominence={:.3} offset=({dx:.3}, {dy:.3})",
        face.area_fraction(width, height)
    );
    prominent && centred
}
