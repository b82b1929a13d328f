use std::path::Path;
use std::time::Instant;

use crate::classification::policy::ClassificationPolicy;
use crate::imaging::domain::image_decoder::ImageDecoder;
use crate::organize::domain::photo_store::{OrganizeError, PhotoStore};
use crate::organize::infrastructure::source_scanner::scan_source;
use crate::pipeline::organize_summary::{FileRecord, OrganizeSummary};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::category::Category;
use crate::shared::constants::IMAGE_EXTENSIONS;

/// Batch pipeline over a folder: scan → decode → classify → store.
///
/// One bad file never stops the batch. Undecodable files are filed as
/// unknown; copy failures are logged and left out of the category counts.
pub struct OrganizePhotosUseCase {
    decoder: Box<dyn ImageDecoder>,
    policy: ClassificationPolicy,
    store: Box<dyn PhotoStore>,
    logger: Box<dyn PipelineLogger>,
}

impl OrganizePhotosUseCase {
    pub fn new(
        decoder: Box<dyn ImageDecoder>,
        policy: ClassificationPolicy,
        store: Box<dyn PhotoStore>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            decoder,
            policy,
            store,
            logger,
        }
    }

    pub fn execute(&mut self, source_dir: &Path) -> Result<OrganizeSummary, OrganizeError> {
        let files = scan_source(source_dir, IMAGE_EXTENSIONS)?;
        let mut summary = OrganizeSummary::new(self.store.root());
        if files.is_empty() {
            log::warn!("No image files found in {}", source_dir.display());
            return Ok(summary);
        }
        self.logger
            .info(&format!("Found {} image files to process", files.len()));

        let total = files.len();
        for (i, path) in files.iter().enumerate() {
            summary.record(self.process(path));
            self.logger.progress(i + 1, total);
        }

        self.logger.summary();
        Ok(summary)
    }

    fn process(&mut self, path: &Path) -> FileRecord {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.logger.info(&format!("Processing: {name}"));

        let t0 = Instant::now();
        let decoded = self.decoder.decode(path);
        self.logger.timing("decode", elapsed_ms(t0));

        let (category, diagnostics) = match decoded {
            Ok(image) => {
                let t0 = Instant::now();
                let result = self.policy.classify(&image);
                self.logger.timing("classify", elapsed_ms(t0));
                self.logger.metric("faces", result.face_count() as f64);
                (result.category, Some(result.diagnostics))
            }
            Err(e) => {
                log::warn!("Could not load image, filing as unknown: {e}");
                (Category::Unknown, None)
            }
        };

        let t0 = Instant::now();
        let destination = match self.store.store(path, category) {
            Ok(dest) => {
                self.logger.info(&format!("  -> Classified as: {category}"));
                Some(dest)
            }
            Err(e) => {
                log::error!("{e}");
                None
            }
        };
        self.logger.timing("store", elapsed_ms(t0));

        FileRecord {
            source: path.to_path_buf(),
            destination,
            category,
            diagnostics,
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
