use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Semantic file-type bucket derived from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Images,
    Documents,
    Spreadsheets,
    Presentations,
    Audio,
    Video,
    Archives,
    Code,
    Data,
    Other,
}

/// Extension table, without the leading dot. Each extension appears once.
static CATEGORY_EXTENSIONS: [(Category, &[&str]); 9] = [
    (
        Category::Images,
        &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "svg"],
    ),
    (
        Category::Documents,
        &["pdf", "doc", "docx", "txt", "md", "rtf", "odt"],
    ),
    (Category::Spreadsheets, &["xls", "xlsx", "csv", "ods"]),
    (Category::Presentations, &["ppt", "pptx", "odp"]),
    (Category::Audio, &["mp3", "wav", "flac", "aac", "ogg", "m4a"]),
    (
        Category::Video,
        &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"],
    ),
    (Category::Archives, &["zip", "rar", "7z", "tar", "gz", "bz2"]),
    (
        Category::Code,
        &["py", "js", "html", "css", "cpp", "java", "php", "rb"],
    ),
    (
        Category::Data,
        &["json", "xml", "yaml", "sql", "db", "sqlite"],
    ),
];

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Images,
        Category::Documents,
        Category::Spreadsheets,
        Category::Presentations,
        Category::Audio,
        Category::Video,
        Category::Archives,
        Category::Code,
        Category::Data,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Documents => "documents",
            Category::Spreadsheets => "spreadsheets",
            Category::Presentations => "presentations",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Archives => "archives",
            Category::Code => "code",
            Category::Data => "data",
            Category::Other => "other",
        }
    }

    /// Extensions mapped to this category. `Other` has none.
    pub fn extensions(&self) -> &'static [&'static str] {
        CATEGORY_EXTENSIONS
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, extensions)| *extensions)
            .unwrap_or(&[])
    }

    /// Category of a bare extension (no dot). Matching ignores case.
    pub fn from_extension(extension: &str) -> Category {
        let extension = extension.to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.extensions().contains(&extension.as_str()))
            .unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|category| category.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Lowercased extension of `path`, if it has one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

pub fn categorize(path: &Path) -> Category {
    match extension_of(path) {
        Some(extension) => Category::from_extension(&extension),
        None => Category::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_categorize_known_extensions() {
        assert_eq!(categorize(Path::new("/p/holiday.JPG")), Category::Images);
        assert_eq!(categorize(Path::new("report.pdf")), Category::Documents);
        assert_eq!(categorize(Path::new("budget.xlsx")), Category::Spreadsheets);
        assert_eq!(categorize(Path::new("deck.pptx")), Category::Presentations);
        assert_eq!(categorize(Path::new("song.flac")), Category::Audio);
        assert_eq!(categorize(Path::new("clip.webm")), Category::Video);
        assert_eq!(categorize(Path::new("backup.tar.gz")), Category::Archives);
        assert_eq!(categorize(Path::new("main.py")), Category::Code);
        assert_eq!(categorize(Path::new("config.yaml")), Category::Data);
    }

    #[test]
    fn test_categorize_unknown_or_missing_extension() {
        assert_eq!(categorize(Path::new("binary.exe")), Category::Other);
        assert_eq!(categorize(Path::new("Makefile")), Category::Other);
        assert_eq!(categorize(Path::new(".bashrc")), Category::Other);
    }

    #[test]
    fn test_each_extension_maps_to_one_category() {
        let mut seen = HashSet::new();
        for (_, extensions) in CATEGORY_EXTENSIONS.iter() {
            for ext in extensions.iter() {
                assert!(seen.insert(*ext), "extension '{}' listed twice", ext);
            }
        }
        assert!(Category::Other.extensions().is_empty());
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("pictures".parse::<Category>().is_err());
    }
}
