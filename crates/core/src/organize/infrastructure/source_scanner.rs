use std::fs;
use std::path::{Path, PathBuf};

use crate::organize::domain::photo_store::OrganizeError;

/// Lists the top-level files of `dir` whose extension is one of
/// `extensions` (compared case-insensitively), sorted by path.
///
/// Subdirectories are not descended into.
pub fn scan_source(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, OrganizeError> {
    if !dir.is_dir() {
        return Err(OrganizeError::MissingSource(dir.to_path_buf()));
    }
    let list_error = |source| OrganizeError::List {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_error)? {
        let path = entry.map_err(list_error)?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    log::debug!("Found {} image files in {}", files.len(), dir.display());
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::IMAGE_EXTENSIONS;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::lower("a.jpg", true)]
    #[case::upper("a.JPEG", true)]
    #[case::mixed("a.Png", true)]
    #[case::webp("a.webp", true)]
    #[case::tif("a.tif", true)]
    #[case::text("a.txt", false)]
    #[case::no_extension("jpg", false)]
    fn test_has_extension(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(has_extension(Path::new(name), IMAGE_EXTENSIONS), expected);
    }

    #[test]
    fn test_scan_lists_images_sorted_and_skips_subdirs() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt"] {
            fs::write(tmp.path().join(name), b"").unwrap();
        }
        let nested = tmp.path().join("nested.jpg");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("c.jpg"), b"").unwrap();

        let files = scan_source(tmp.path(), IMAGE_EXTENSIONS).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
    }

    #[test]
    fn test_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let err = scan_source(&tmp.path().join("nope"), IMAGE_EXTENSIONS).unwrap_err();
        assert!(matches!(err, OrganizeError::MissingSource(_)));
    }

    #[test]
    fn test_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_source(tmp.path(), IMAGE_EXTENSIONS).unwrap().is_empty());
    }
}
