//! Heuristic photo classification into document, selfie, people, nature and
//! unknown, plus the building blocks for sorting a folder of photos by
//! category.

pub mod shared {
    pub mod category;
    pub mod constants;
    pub mod face_region;
    pub mod image_buffer;
    pub mod signal;
}

pub mod classification {
    pub mod config;
    pub mod policy;
    pub mod result;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
        pub mod person_classifier;
    }
    pub mod infrastructure;
}

pub mod scene {
    pub mod color;
    pub mod document_detector;
    pub mod nature_detector;
}

pub mod imaging {
    pub mod domain {
        pub mod image_decoder;
    }
    pub mod infrastructure {
        pub mod image_file_decoder;
    }
}

pub mod organize {
    pub mod domain {
        pub mod photo_store;
    }
    pub mod infrastructure {
        pub mod category_folder_store;
        pub mod source_scanner;
    }
}

pub mod pipeline {
    pub mod organize_photos_use_case;
    pub mod organize_summary;
    pub mod pipeline_logger;
}

pub use classification::config::{ClassifierConfig, ConfigError};
pub use classification::policy::ClassificationPolicy;
pub use classification::result::ClassificationResult;
pub use shared::category::Category;
pub use shared::image_buffer::ImageBuffer;
