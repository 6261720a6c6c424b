use super::SearchQuery;
use crate::analysis::PreferenceStore;
use crate::category::Category;
use crate::scanner::FileEntry;
use serde::Serialize;
use std::cmp::Ordering;

const EXACT_NAME_SCORE: f64 = 10.0;
const PARTIAL_NAME_SCORE: f64 = 5.0;
const WORD_SCORE: f64 = 2.0;
const WEEK_RECENCY_SCORE: f64 = 1.0;
const MONTH_RECENCY_SCORE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub entry: FileEntry,
    pub score: f64,
}

/// Additive relevance score of one file for `query`.
pub fn score(entry: &FileEntry, query: &SearchQuery, preferences: &PreferenceStore) -> f64 {
    let name = entry.file_name_lower();
    let mut score = 0.0;

    if name == query.lower() {
        score += EXACT_NAME_SCORE;
    } else if name.contains(query.lower()) {
        score += PARTIAL_NAME_SCORE;
    }

    score += query.words().filter(|word| name.contains(word)).count() as f64 * WORD_SCORE;

    let days_old = (query.now() - entry.modified).num_days();
    if days_old < 7 {
        score += WEEK_RECENCY_SCORE;
    } else if days_old < 30 {
        score += MONTH_RECENCY_SCORE;
    }

    if let Some(preference) = preferences.get(entry.category()) {
        let parent = entry.parent_dir().to_string_lossy();
        if !preference.preferred_location.is_empty()
            && parent.contains(preference.preferred_location.as_str())
        {
            score += preference.confidence;
        }
    }

    score
}

/// Score, filter and order merged candidates.
///
/// Entries scoring zero or less are dropped. The sort is stable, so equal
/// scores keep their merge order.
pub fn rank(
    entries: Vec<FileEntry>,
    query: &SearchQuery,
    preferences: &PreferenceStore,
) -> Vec<ScoredResult> {
    let mut scored: Vec<ScoredResult> = entries
        .into_iter()
        .filter_map(|entry| {
            let score = score(&entry, query, preferences);
            (score > 0.0).then_some(ScoredResult { entry, score })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

/// A ranked result in the shape handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub filename: String,
    pub path: String,
    pub full_path: String,
    pub size: u64,
    pub size_mb: f64,
    pub modified: String,
    pub category: Category,
    pub relevance_score: f64,
}

impl From<&ScoredResult> for SearchHit {
    fn from(result: &ScoredResult) -> Self {
        let entry = &result.entry;
        Self {
            filename: entry.file_name(),
            path: entry.parent_dir().to_string_lossy().into_owned(),
            full_path: entry.path.to_string_lossy().into_owned(),
            size: entry.size,
            size_mb: round_to(entry.size_mb(), 2),
            modified: entry.modified.to_rfc3339(),
            category: entry.category(),
            relevance_score: round_to(result.score, 2),
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::OrganizationPreference;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn entry(path: &str, days_old: i64) -> FileEntry {
        FileEntry::new(path, 1000, now() - Duration::days(days_old))
    }

    fn query(raw: &str) -> SearchQuery {
        SearchQuery::with_now(raw, now())
    }

    #[test]
    fn test_exact_name_outranks_partial_name() {
        let prefs = PreferenceStore::new();
        let ranked = rank(
            vec![entry("/d/report.pdf.bak", 100), entry("/d/report.pdf", 100)],
            &query("report.pdf"),
            &prefs,
        );
        assert_eq!(ranked[0].entry.file_name(), "report.pdf");
        assert_eq!(ranked[0].score, EXACT_NAME_SCORE + WORD_SCORE);
        assert_eq!(ranked[1].score, PARTIAL_NAME_SCORE + WORD_SCORE);
    }

    #[test]
    fn test_word_bonus_stacks_per_word() {
        let prefs = PreferenceStore::new();
        let s = score(&entry("/d/tax_return_2023.pdf", 100), &query("tax 2023"), &prefs);
        assert_eq!(s, 2.0 * WORD_SCORE);
    }

    #[test]
    fn test_recency_buckets_are_exclusive() {
        let prefs = PreferenceStore::new();
        let q = query("zzz");
        assert_eq!(score(&entry("/d/a.txt", 3), &q, &prefs), WEEK_RECENCY_SCORE);
        assert_eq!(score(&entry("/d/a.txt", 20), &q, &prefs), MONTH_RECENCY_SCORE);
        assert_eq!(score(&entry("/d/a.txt", 45), &q, &prefs), 0.0);
    }

    #[test]
    fn test_zero_scores_are_dropped() {
        let prefs = PreferenceStore::new();
        let ranked = rank(vec![entry("/d/unrelated.txt", 400)], &query("invoice"), &prefs);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let prefs = PreferenceStore::new();
        let ranked = rank(
            vec![entry("/d/b_notes.txt", 100), entry("/d/a_notes.txt", 100)],
            &query("notes"),
            &prefs,
        );
        let names: Vec<_> = ranked.iter().map(|r| r.entry.file_name()).collect();
        assert_eq!(names, vec!["b_notes.txt", "a_notes.txt"]);
    }

    #[test]
    fn test_preferred_location_bonus() {
        let prefs = PreferenceStore::new();
        prefs.insert(OrganizationPreference::new(Category::Images, "Pictures", 0.8, now()));

        let q = query("beach");
        let home = score(&entry("/home/u/Pictures/beach.jpg", 100), &q, &prefs);
        let downloads = score(&entry("/home/u/Downloads/beach.jpg", 100), &q, &prefs);
        assert!((home - downloads - 0.8).abs() < 1e-9);

        // the bonus is per category
        let doc = score(&entry("/home/u/Pictures/beach.pdf", 100), &q, &prefs);
        assert_eq!(doc, downloads);
    }

    #[test]
    fn test_search_hit_rounds_values() {
        let result = ScoredResult {
            entry: FileEntry::new("/d/movie.mp4", 15 * 1024 * 1024 + 5000, now()),
            score: 1.23456,
        };
        let hit = SearchHit::from(&result);
        assert_eq!(hit.filename, "movie.mp4");
        assert_eq!(hit.path, "/d");
        assert_eq!(hit.size_mb, 15.0);
        assert_eq!(hit.relevance_score, 1.23);
        assert_eq!(hit.category, Category::Video);
    }
}
