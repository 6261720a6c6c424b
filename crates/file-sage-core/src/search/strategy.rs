use super::SearchQuery;
use crate::category::Category;
use crate::scanner::{DirectoryScanner, FileEntry};
use chrono::Duration;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions whose contents the content strategy is allowed to read.
const TEXT_EXTENSIONS: [&str; 7] = ["txt", "md", "py", "js", "html", "css", "json"];
/// Files above this size are never opened by the content strategy.
pub const CONTENT_SCAN_LIMIT: u64 = 1024 * 1024;

/// Keyword to category, checked in this order. Only the first hit counts.
const TYPE_KEYWORDS: [(&str, Category); 14] = [
    ("photo", Category::Images),
    ("picture", Category::Images),
    ("image", Category::Images),
    ("document", Category::Documents),
    ("doc", Category::Documents),
    ("text", Category::Documents),
    ("music", Category::Audio),
    ("song", Category::Audio),
    ("audio", Category::Audio),
    ("video", Category::Video),
    ("movie", Category::Video),
    ("code", Category::Code),
    ("script", Category::Code),
    ("program", Category::Code),
];

const RECENT_KEYWORDS: [&str; 4] = ["today", "recent", "new", "latest"];
const OLD_KEYWORDS: [&str; 3] = ["old", "archive", "backup"];
const RECENT_DAYS: i64 = 7;
const OLD_DAYS: i64 = 90;

const LARGE_KEYWORDS: [&str; 3] = ["large", "big", "huge"];
const SMALL_KEYWORDS: [&str; 2] = ["small", "tiny"];
pub const LARGE_FILE_BYTES: u64 = 10 * 1024 * 1024;
pub const SMALL_FILE_BYTES: u64 = 100 * 1024;

/// One independent way of turning a query into candidate files.
///
/// Strategies never see zero-byte files and hold no state, so they can run in
/// any order or in parallel with identical results.
pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// False when the query cannot produce matches, letting callers skip the walk.
    fn is_active(&self, _query: &SearchQuery) -> bool {
        true
    }

    fn accepts(&self, query: &SearchQuery, entry: &FileEntry) -> bool;

    /// Candidate files under `roots`, in discovery order.
    fn find(
        &self,
        query: &SearchQuery,
        scanner: &DirectoryScanner,
        roots: &[PathBuf],
    ) -> Vec<FileEntry> {
        if !self.is_active(query) {
            return Vec::new();
        }
        scanner
            .scan(roots)
            .filter(|entry| !entry.is_placeholder())
            .filter(|entry| self.accepts(query, entry))
            .collect()
    }
}

/// The five built-in strategies in their fixed merge order.
pub fn default_strategies() -> Vec<Box<dyn SearchStrategy>> {
    vec![
        Box::new(FilenameStrategy),
        Box::new(ContentKeywordStrategy),
        Box::new(TypeKeywordStrategy),
        Box::new(DateContextStrategy),
        Box::new(SizeContextStrategy),
    ]
}

pub struct FilenameStrategy;

impl SearchStrategy for FilenameStrategy {
    fn name(&self) -> &'static str {
        "filename"
    }

    fn accepts(&self, query: &SearchQuery, entry: &FileEntry) -> bool {
        entry.file_name_lower().contains(query.lower())
    }
}

pub struct ContentKeywordStrategy;

impl ContentKeywordStrategy {
    fn is_readable(entry: &FileEntry) -> bool {
        entry.size <= CONTENT_SCAN_LIMIT
            && entry
                .extension()
                .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl SearchStrategy for ContentKeywordStrategy {
    fn name(&self) -> &'static str {
        "content"
    }

    fn accepts(&self, query: &SearchQuery, entry: &FileEntry) -> bool {
        if !Self::is_readable(entry) {
            return false;
        }
        match read_text_lossy(&entry.path) {
            Some(content) => content.to_lowercase().contains(query.lower()),
            None => false,
        }
    }
}

/// Decode a small file as UTF-8, dropping bytes that do not decode.
fn read_text_lossy(path: &Path) -> Option<String> {
    let mut bytes = Vec::new();
    let read = File::open(path).and_then(|file| file.take(CONTENT_SCAN_LIMIT).read_to_end(&mut bytes));
    if let Err(err) = read {
        debug!("Skipping content of {}: {}", path.display(), err);
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).replace(char::REPLACEMENT_CHARACTER, ""))
}

pub struct TypeKeywordStrategy;

impl TypeKeywordStrategy {
    /// Category named by the first type keyword found in the query.
    pub fn target_category(query: &SearchQuery) -> Option<Category> {
        TYPE_KEYWORDS
            .iter()
            .find(|(keyword, _)| query.lower().contains(keyword))
            .map(|(_, category)| *category)
    }
}

impl SearchStrategy for TypeKeywordStrategy {
    fn name(&self) -> &'static str {
        "type"
    }

    fn is_active(&self, query: &SearchQuery) -> bool {
        Self::target_category(query).is_some()
    }

    fn accepts(&self, query: &SearchQuery, entry: &FileEntry) -> bool {
        Self::target_category(query) == Some(entry.category())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Recent,
    Old,
}

pub struct DateContextStrategy;

impl DateContextStrategy {
    /// Recent keywords win when both kinds appear.
    pub fn bucket(query: &SearchQuery) -> Option<DateBucket> {
        if query.mentions_any(&RECENT_KEYWORDS) {
            Some(DateBucket::Recent)
        } else if query.mentions_any(&OLD_KEYWORDS) {
            Some(DateBucket::Old)
        } else {
            None
        }
    }
}

impl SearchStrategy for DateContextStrategy {
    fn name(&self) -> &'static str {
        "date"
    }

    fn is_active(&self, query: &SearchQuery) -> bool {
        Self::bucket(query).is_some()
    }

    fn accepts(&self, query: &SearchQuery, entry: &FileEntry) -> bool {
        match Self::bucket(query) {
            Some(DateBucket::Recent) => entry.modified > query.now() - Duration::days(RECENT_DAYS),
            Some(DateBucket::Old) => entry.modified < query.now() - Duration::days(OLD_DAYS),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBucket {
    Large,
    Small,
}

pub struct SizeContextStrategy;

impl SizeContextStrategy {
    /// Large keywords win when both kinds appear.
    pub fn bucket(query: &SearchQuery) -> Option<SizeBucket> {
        if query.mentions_any(&LARGE_KEYWORDS) {
            Some(SizeBucket::Large)
        } else if query.mentions_any(&SMALL_KEYWORDS) {
            Some(SizeBucket::Small)
        } else {
            None
        }
    }
}

impl SearchStrategy for SizeContextStrategy {
    fn name(&self) -> &'static str {
        "size"
    }

    fn is_active(&self, query: &SearchQuery) -> bool {
        Self::bucket(query).is_some()
    }

    fn accepts(&self, query: &SearchQuery, entry: &FileEntry) -> bool {
        match Self::bucket(query) {
            Some(SizeBucket::Large) => entry.size > LARGE_FILE_BYTES,
            Some(SizeBucket::Small) => entry.size > 0 && entry.size < SMALL_FILE_BYTES,
            None => false,
        }
    }
}
