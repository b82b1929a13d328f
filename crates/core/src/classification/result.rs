use serde::Serialize;

use crate::detection::domain::person_classifier::PersonVerdict;
use crate::scene::document_detector::DocumentScore;
use crate::scene::nature_detector::NatureScore;
use crate::shared::category::Category;
use crate::shared::face_region::FaceRegion;
use crate::shared::signal::Signal;

/// Face detector output together with the selfie/people decision made on it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceScore {
    pub faces: Vec<FaceRegion>,
    pub verdict: PersonVerdict,
}

/// Per-detector evidence behind a classification.
///
/// `None` means the detector never ran because an earlier rule matched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub document: Option<Signal<DocumentScore>>,
    pub faces: Option<Signal<FaceScore>>,
    pub nature: Option<Signal<NatureScore>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub diagnostics: Diagnostics,
}

impl ClassificationResult {
    /// Faces found, 0 when face detection was skipped or failed.
    pub fn face_count(&self) -> usize {
        self.diagnostics
            .faces
            .as_ref()
            .and_then(Signal::score)
            .map_or(0, |score| score.faces.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_faces(faces: Option<Signal<FaceScore>>) -> ClassificationResult {
        ClassificationResult {
            category: Category::Unknown,
            diagnostics: Diagnostics {
                faces,
                ..Diagnostics::default()
            },
        }
    }

    #[test]
    fn test_face_count_when_not_evaluated() {
        assert_eq!(with_faces(None).face_count(), 0);
        assert_eq!(with_faces(Some(Signal::Absent)).face_count(), 0);
    }

    #[test]
    fn test_face_count_reads_score() {
        let faces = vec![
            FaceRegion::clamped(0, 0, 10, 10, 50, 50).unwrap(),
            FaceRegion::clamped(20, 20, 10, 10, 50, 50).unwrap(),
        ];
        let result = with_faces(Some(Signal::Positive(FaceScore {
            faces,
            verdict: PersonVerdict::People,
        })));
        assert_eq!(result.face_count(), 2);
    }

    #[test]
    fn test_serializes_category_and_skipped_detectors() {
        let json = serde_json::to_value(with_faces(None)).unwrap();
        assert_eq!(json["category"], "unknown");
        assert!(json["diagnostics"]["faces"].is_null());
    }
}
