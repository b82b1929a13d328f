use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{APP_DIR_NAME, CASCADE_MODEL_NAME, CASCADE_MODEL_URL};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Locate the face cascade.
///
/// An explicit path wins and must exist. Otherwise `models_dir` (if given)
/// and then the user cache are searched, and the cascade is downloaded into
/// the cache on first use.
pub fn resolve_cascade(
    explicit: Option<&Path>,
    models_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(ModelResolveError::NotFound(path.to_path_buf())),
        None => resolve(
            CASCADE_MODEL_NAME,
            CASCADE_MODEL_URL,
            &model_cache_dir()?,
            models_dir,
            progress,
        ),
    }
}

/// Find `name` in `bundled_dir`, then in `cache_dir`, and download it from
/// `url` into `cache_dir` when neither has it.
pub fn resolve(
    name: &str,
    url: &str,
    cache_dir: &Path,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let found = bundled_dir
        .into_iter()
        .chain(Some(cache_dir))
        .map(|dir| dir.join(name))
        .find(|path| path.is_file());
    if let Some(path) = found {
        log::debug!("Using model {}", path.display());
        return Ok(path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    let dest = cache_dir.join(name);
    log::info!("Downloading {name} to {}", dest.display());
    download(url, &dest, progress)?;
    Ok(dest)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/SnapSort/models/`
/// - Linux: `$XDG_CACHE_HOME/SnapSort/models/` or `~/.cache/SnapSort/models/`
/// - Windows: `%LOCALAPPDATA%/SnapSort/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();
    base.map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Writer that reports the running byte count after every write.
struct ProgressWriter<W> {
    inner: W,
    written: u64,
    total: u64,
    progress: Option<ProgressFn>,
}

impl<W: Write> Write for ProgressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        if let Some(cb) = &self.progress {
            cb(self.written, self.total);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Stream `url` into `<dest>.part` and rename it into place once complete.
/// The partial file is removed on failure.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let partial = dest.with_extension("part");
    let write_err = |source: io::Error| ModelResolveError::Write {
        path: partial.clone(),
        source,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let streamed = fs::File::create(&partial)
        .map_err(write_err)
        .and_then(|file| {
            let mut writer = ProgressWriter {
                inner: BufWriter::new(file),
                written: 0,
                total: response.content_length().unwrap_or(0),
                progress,
            };
            io::copy(&mut response, &mut writer).map_err(write_err)?;
            writer.flush().map_err(write_err)
        })
        .and_then(|()| {
            fs::rename(&partial, dest).map_err(|source| ModelResolveError::Write {
                path: dest.to_path_buf(),
                source,
            })
        });

    if streamed.is_err() {
        let _ = fs::remove_file(&partial);
    }
    streamed
}
