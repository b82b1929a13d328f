use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::category::Category;

#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("source directory not found: {0}")]
    MissingSource(PathBuf),
    #[error("failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create category folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} has no file name")]
    NoFileName(PathBuf),
}

/// Destination for classified photos, one bucket per category.
pub trait PhotoStore: Send + Sync {
    /// Places `source` into the bucket for `category` and returns where it
    /// went. Never overwrites an existing file.
    fn store(&self, source: &Path, category: Category) -> Result<PathBuf, OrganizeError>;

    fn root(&self) -> &Path;
}
