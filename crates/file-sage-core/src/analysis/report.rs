use super::insights::{generate_suggestions, Suggestion};
use crate::category::Category;
use crate::error::Error;
use crate::scanner::FileEntry;
use crate::search::round_to;
use chrono::{DateTime, Local, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
/// Documents up to this size get word and line counts.
const TEXT_STATS_LIMIT: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub count: usize,
    pub size_bytes: u64,
}

impl CategoryStats {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MIB
    }
}

/// When files of a category tend to be touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityPattern {
    /// Local hour (0-23) with the most modifications; ties go to the earlier hour.
    pub most_active_hour: u32,
    pub total_files: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub total_files: usize,
    pub total_size: u64,
    pub total_size_mb: f64,
    pub categories: BTreeMap<Category, CategoryStats>,
    pub category_sizes_mb: BTreeMap<Category, f64>,
    pub suggestions: Vec<Suggestion>,
    pub activity: BTreeMap<Category, ActivityPattern>,
    pub analyzed_at: DateTime<Utc>,
    /// True when cancellation cut the scan short and the counts are partial.
    pub cancelled: bool,
}

/// Running category totals for one analysis. Zero-byte files are ignored.
#[derive(Debug, Default)]
pub struct CategoryTally {
    stats: BTreeMap<Category, CategoryStats>,
    hours: BTreeMap<Category, [usize; 24]>,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, entry: &FileEntry) {
        if entry.is_placeholder() {
            return;
        }
        let category = entry.category();
        let stats = self.stats.entry(category).or_default();
        stats.count += 1;
        stats.size_bytes += entry.size;

        let hour = entry.modified.with_timezone(&Local).hour() as usize;
        self.hours.entry(category).or_insert([0; 24])[hour] += 1;
    }

    pub fn merge(&mut self, other: CategoryTally) {
        for (category, theirs) in other.stats {
            let mine = self.stats.entry(category).or_default();
            mine.count += theirs.count;
            mine.size_bytes += theirs.size_bytes;
        }
        for (category, theirs) in other.hours {
            let mine = self.hours.entry(category).or_insert([0; 24]);
            for (slot, count) in mine.iter_mut().zip(theirs) {
                *slot += count;
            }
        }
    }

    pub fn stats(&self) -> &BTreeMap<Category, CategoryStats> {
        &self.stats
    }

    pub fn finish(self, analyzed_at: DateTime<Utc>, cancelled: bool) -> AnalysisReport {
        let total_files = self.stats.values().map(|s| s.count).sum();
        let total_size: u64 = self.stats.values().map(|s| s.size_bytes).sum();
        let suggestions = generate_suggestions(&self.stats);

        let category_sizes_mb = self
            .stats
            .iter()
            .map(|(category, stats)| (*category, round_to(stats.size_mb(), 2)))
            .collect();

        let activity = self
            .hours
            .iter()
            .map(|(category, hours)| {
                let (most_active_hour, _) = hours
                    .iter()
                    .enumerate()
                    .fold((0, 0), |best, (hour, count)| {
                        if *count > best.1 {
                            (hour, *count)
                        } else {
                            best
                        }
                    });
                (
                    *category,
                    ActivityPattern {
                        most_active_hour: most_active_hour as u32,
                        total_files: hours.iter().sum(),
                    },
                )
            })
            .collect();

        AnalysisReport {
            total_files,
            total_size,
            total_size_mb: round_to(total_size as f64 / BYTES_PER_MIB, 2),
            categories: self.stats,
            category_sizes_mb,
            suggestions,
            activity,
            analyzed_at,
            cancelled,
        }
    }
}

/// Details of a single file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDetail {
    pub filename: String,
    pub size: u64,
    pub size_mb: f64,
    pub category: Category,
    pub extension: Option<String>,
    pub modified: String,
    pub created: Option<String>,
    pub word_count: Option<usize>,
    pub line_count: Option<usize>,
}

impl FileDetail {
    pub fn inspect(path: &Path) -> Result<Self, Error> {
        let metadata = fs::metadata(path)?;
        let entry = FileEntry::from_metadata(path, &metadata)?;
        let category = entry.category();

        let created = metadata
            .created()
            .ok()
            .map(|time| DateTime::<Utc>::from(time).to_rfc3339());

        let (word_count, line_count) =
            if category == Category::Documents && entry.size <= TEXT_STATS_LIMIT {
                match fs::read(path) {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes);
                        (
                            Some(text.split_whitespace().count()),
                            Some(text.lines().count()),
                        )
                    }
                    Err(_) => (None, None),
                }
            } else {
                (None, None)
            };

        Ok(Self {
            filename: entry.file_name(),
            size: entry.size,
            size_mb: round_to(entry.size_mb(), 2),
            category,
            extension: entry.extension(),
            modified: entry.modified.to_rfc3339(),
            created,
            word_count,
            line_count,
        })
    }
}

/// Result of analyzing one explicit path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PathAnalysis {
    File(FileDetail),
    Directory(AnalysisReport),
}
