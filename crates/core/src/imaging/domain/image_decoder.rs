use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::image_buffer::ImageBuffer;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("cannot decode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("decoded {path} has no pixels")]
    Empty { path: PathBuf },
}

/// Turns an image file into an RGB pixel buffer.
///
/// Unreadable, corrupt and unsupported files are rejected here so the
/// classifier only ever sees valid buffers.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<ImageBuffer, DecodeError>;
}
