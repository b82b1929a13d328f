use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::organize::domain::photo_store::{OrganizeError, PhotoStore};
use crate::shared::category::Category;

/// Copies photos into `<root>/<category>/`, leaving sources untouched.
///
/// All five category folders are created up front so the output layout is
/// the same whatever the batch contains. Name clashes are resolved as
/// `<stem>_1.<ext>`, `<stem>_2.<ext>`, ... Copies keep the source's
/// modification time.
pub struct CategoryFolderStore {
    root: PathBuf,
    dry_run: bool,
    /// Destinations handed out by a dry run, which never reach the disk.
    planned: Mutex<HashSet<PathBuf>>,
}

impl CategoryFolderStore {
    pub fn create(root: &Path) -> Result<Self, OrganizeError> {
        for category in Category::ALL {
            let dir = root.join(category.as_str());
            fs::create_dir_all(&dir).map_err(|source| OrganizeError::CreateFolder {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self {
            root: root.to_path_buf(),
            dry_run: false,
            planned: Mutex::new(HashSet::new()),
        })
    }

    /// Computes the destinations a real run would use without writing
    /// anything. Existing files under `root` still count as collisions.
    pub fn dry_run(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            dry_run: true,
            planned: Mutex::new(HashSet::new()),
        }
    }

    fn free_destination(
        dir: &Path,
        source: &Path,
        planned: &HashSet<PathBuf>,
    ) -> Result<PathBuf, OrganizeError> {
        let taken = |path: &Path| path.exists() || planned.contains(path);
        let name = source
            .file_name()
            .ok_or_else(|| OrganizeError::NoFileName(source.to_path_buf()))?;
        let candidate = dir.join(name);
        if !taken(&candidate) {
            return Ok(candidate);
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = source.extension().map(|e| e.to_string_lossy().into_owned());
        let mut counter = 1u32;
        loop {
            let file_name = match &ext {
                Some(ext) => format!("{stem}_{counter}.{ext}"),
                None => format!("{stem}_{counter}"),
            };
            let candidate = dir.join(file_name);
            if !taken(&candidate) {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}

impl PhotoStore for CategoryFolderStore {
    fn store(&self, source: &Path, category: Category) -> Result<PathBuf, OrganizeError> {
        let dir = self.root.join(category.as_str());
        // Pick and claim the name under one lock so concurrent stores never collide.
        let mut planned = self.planned.lock().unwrap_or_else(PoisonError::into_inner);
        let destination = Self::free_destination(&dir, source, &planned)?;
        if self.dry_run {
            planned.insert(destination.clone());
        } else {
            copy_with_mtime(source, &destination).map_err(|e| OrganizeError::Copy {
                from: source.to_path_buf(),
                to: destination.clone(),
                source: e,
            })?;
        }
        Ok(destination)
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

fn copy_with_mtime(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    let modified = fs::metadata(source)?.modified()?;
    fs::File::options()
        .write(true)
        .open(destination)?
        .set_modified(modified)
}
