use crate::classification::config::{ClassifierConfig, ConfigError, PersonConfig};
use crate::classification::result::{ClassificationResult, Diagnostics, FaceScore};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::person_classifier::{self, PersonVerdict};
use crate::scene::document_detector::DocumentDetector;
use crate::scene::nature_detector::NatureDetector;
use crate::shared::category::Category;
use crate::shared::image_buffer::ImageBuffer;
use crate::shared::signal::Signal;

/// Fixed-precedence decision engine: document, then faces, then nature,
/// then unknown. The first detector that fires decides.
///
/// Holds only read-only configuration and stateless detectors, so one
/// policy can classify from many threads at once.
pub struct ClassificationPolicy {
    document: DocumentDetector,
    faces: Box<dyn FaceDetector>,
    person: PersonConfig,
    nature: NatureDetector,
}

impl ClassificationPolicy {
    /// Validates every threshold before accepting any image.
    pub fn new(
        config: ClassifierConfig,
        faces: Box<dyn FaceDetector>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            document: DocumentDetector::new(config.document),
            faces,
            person: config.person,
            nature: NatureDetector::new(config.nature),
        })
    }

    /// Never fails: a detector that errors counts as "no signal" and the
    /// decision falls through to the next rule.
    pub fn classify(&self, image: &ImageBuffer) -> ClassificationResult {
        let mut diagnostics = Diagnostics::default();

        let document = self.document.score(image);
        let is_document = document.is_positive();
        diagnostics.document = Some(document);
        if is_document {
            return Self::decided(Category::Document, diagnostics);
        }

        let faces = self.face_signal(image);
        let verdict = faces.score().map(|score| score.verdict);
        diagnostics.faces = Some(faces);
        match verdict {
            Some(PersonVerdict::Selfie) => return Self::decided(Category::Selfie, diagnostics),
            Some(PersonVerdict::People) => return Self::decided(Category::People, diagnostics),
            Some(PersonVerdict::None) | None => {}
        }

        let nature = self.nature.score(image);
        let is_nature = nature.is_positive();
        diagnostics.nature = Some(nature);
        if is_nature {
            return Self::decided(Category::Nature, diagnostics);
        }

        Self::decided(Category::Unknown, diagnostics)
    }

    fn face_signal(&self, image: &ImageBuffer) -> Signal<FaceScore> {
        if image.is_empty() {
            return Signal::Absent;
        }
        match self.faces.detect(image) {
            Ok(faces) => {
                let (width, height) = (image.width(), image.height());
                let verdict = person_classifier::classify(&faces, width, height, &self.person);
                Signal::from_decision(verdict != PersonVerdict::None, FaceScore { faces, verdict })
            }
            Err(e) => {
                log::warn!("Face detection failed, treating as no faces: {e}");
                Signal::Absent
            }
        }
    }

    fn decided(category: Category, diagnostics: Diagnostics) -> ClassificationResult {
        log::debug!("classified as {category}");
        ClassificationResult {
            category,
            diagnostics,
        }
    }
}
