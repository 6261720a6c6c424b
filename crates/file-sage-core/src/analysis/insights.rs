use super::report::CategoryStats;
use crate::category::Category;
use serde::Serialize;
use std::collections::BTreeMap;

const STORAGE_WARNING_BYTES: u64 = 1024 * 1024 * 1024;
const UNCATEGORIZED_LIMIT: usize = 20;
const ARCHIVE_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    StorageOptimization,
    Organization,
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub message: String,
    pub priority: Priority,
}

/// Up to three suggestions from fixed thresholds over category totals.
pub fn generate_suggestions(stats: &BTreeMap<Category, CategoryStats>) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    let total_size: u64 = stats.values().map(|s| s.size_bytes).sum();
    if total_size > STORAGE_WARNING_BYTES {
        if let Some((category, largest)) = largest_category(stats) {
            suggestions.push(Suggestion {
                kind: SuggestionKind::StorageOptimization,
                message: format!(
                    "Your {} files are using {:.1}MB. Consider archiving old files.",
                    category,
                    largest.size_mb()
                ),
                priority: Priority::Medium,
            });
        }
    }

    let uncategorized = count_of(stats, Category::Other);
    if uncategorized > UNCATEGORIZED_LIMIT {
        suggestions.push(Suggestion {
            kind: SuggestionKind::Organization,
            message: format!(
                "You have {} uncategorized files. I can help organize them automatically.",
                uncategorized
            ),
            priority: Priority::High,
        });
    }

    let archives = count_of(stats, Category::Archives);
    if archives > ARCHIVE_LIMIT {
        suggestions.push(Suggestion {
            kind: SuggestionKind::Cleanup,
            message: format!(
                "You have {} archive files. Some might be safe to remove after extraction.",
                archives
            ),
            priority: Priority::Low,
        });
    }

    suggestions
}

/// Category with the most bytes; the first in category order wins a tie.
fn largest_category(
    stats: &BTreeMap<Category, CategoryStats>,
) -> Option<(Category, &CategoryStats)> {
    stats.iter().fold(None, |best, (category, current)| match best {
        Some((_, top)) if top.size_bytes >= current.size_bytes => best,
        _ => Some((*category, current)),
    })
}

fn count_of(stats: &BTreeMap<Category, CategoryStats>, category: Category) -> usize {
    stats.get(&category).map(|s| s.count).unwrap_or(0)
}
