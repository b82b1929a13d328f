use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of classifying one photo.
///
/// [`Category::as_str`] doubles as the destination folder name, so the
/// identifiers must stay lowercase ASCII and stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Document,
    Selfie,
    People,
    Nature,
    Unknown,
}

impl Category {
    /// All categories in precedence order.
    pub const ALL: [Category; 5] = [
        Category::Document,
        Category::Selfie,
        Category::People,
        Category::Nature,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Selfie => "selfie",
            Category::People => "people",
            Category::Nature => "nature",
            Category::Unknown => "unknown",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Category::Document => 0,
            Category::Selfie => 1,
            Category::People => 2,
            Category::Nature => 3,
            Category::Unknown => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
