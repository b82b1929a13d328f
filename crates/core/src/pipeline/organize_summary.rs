use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classification::result::Diagnostics;
use crate::shared::category::Category;

const RULE_WIDTH: usize = 50;

/// What happened to one source file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileRecord {
    pub source: PathBuf,
    /// `None` when copying failed.
    pub destination: Option<PathBuf>,
    pub category: Category,
    /// `None` when the file could not be decoded.
    pub diagnostics: Option<Diagnostics>,
}

/// Totals for one organize run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct OrganizeSummary {
    counts: [usize; 5],
    undecodable: usize,
    failed_copies: usize,
    output_root: PathBuf,
    files: Vec<FileRecord>,
}

impl OrganizeSummary {
    pub fn new(output_root: &Path) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, record: FileRecord) {
        if record.diagnostics.is_none() {
            self.undecodable += 1;
        }
        if record.destination.is_some() {
            self.counts[record.category.index()] += 1;
        } else {
            self.failed_copies += 1;
        }
        self.files.push(record);
    }

    /// Files successfully placed in `category`.
    pub fn count(&self, category: Category) -> usize {
        self.counts[category.index()]
    }

    /// Files placed in any category.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Files that could not be decoded (they are filed as unknown).
    pub fn undecodable(&self) -> usize {
        self.undecodable
    }

    pub fn failed_copies(&self) -> usize {
        self.failed_copies
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}\nCLASSIFICATION SUMMARY\n{rule}");
        for category in Category::ALL {
            let name = title_case(category.as_str());
            let _ = writeln!(out, "{name}: {} images", self.count(category));
        }
        let _ = writeln!(out, "Total processed: {} images", self.total());
        if self.undecodable > 0 {
            let _ = writeln!(out, "Undecodable (filed as unknown): {}", self.undecodable);
        }
        if self.failed_copies > 0 {
            let _ = writeln!(out, "Failed to copy: {}", self.failed_copies);
        }
        let _ = write!(out, "\nOutput folder: {}", self.output_root.display());
        out
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, category: Category, copied: bool, decoded: bool) -> FileRecord {
        FileRecord {
            source: PathBuf::from(name),
            destination: copied.then(|| PathBuf::from("out").join(category.as_str()).join(name)),
            category,
            diagnostics: decoded.then(Diagnostics::default),
        }
    }

    #[test]
    fn test_counts_only_successful_copies() {
        let mut summary = OrganizeSummary::new(Path::new("out"));
        summary.record(record("a.jpg", Category::Nature, true, true));
        summary.record(record("b.jpg", Category::Nature, true, true));
        summary.record(record("c.jpg", Category::Selfie, false, true));

        assert_eq!(summary.count(Category::Nature), 2);
        assert_eq!(summary.count(Category::Selfie), 0);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failed_copies(), 1);
        assert_eq!(summary.files().len(), 3);
    }

    #[test]
    fn test_undecodable_files_are_counted_as_unknown() {
        let mut summary = OrganizeSummary::new(Path::new("out"));
        summary.record(record("broken.jpg", Category::Unknown, true, false));
        assert_eq!(summary.count(Category::Unknown), 1);
        assert_eq!(summary.undecodable(), 1);
    }

    #[test]
    fn test_render_block() {
        let mut summary = OrganizeSummary::new(Path::new("organized_photos"));
        summary.record(record("doc.png", Category::Document, true, true));
        summary.record(record("x.png", Category::Unknown, true, false));

        let text = summary.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(50));
        assert_eq!(lines[1], "CLASSIFICATION SUMMARY");
        assert_eq!(lines[3], "Document: 1 images");
        assert_eq!(lines[4], "Selfie: 0 images");
        assert_eq!(lines[7], "Unknown: 1 images");
        assert_eq!(lines[8], "Total processed: 2 images");
        assert!(text.contains("Undecodable (filed as unknown): 1"));
        assert!(!text.contains("Failed to copy"));
        assert!(text.ends_with("Output folder: organized_photos"));
    }

    #[test]
    fn test_records_serialize_for_reports() {
        let mut summary = OrganizeSummary::new(Path::new("out"));
        summary.record(record("a.jpg", Category::People, true, true));
        let json = serde_json::to_value(summary.files()).unwrap();
        assert_eq!(json[0]["category"], "people");
        assert_eq!(json[0]["destination"], "out/people/a.jpg");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("nature"), "Nature");
        assert_eq!(title_case(""), "");
    }
}
