use crate::category::Category;
use crate::error::Error;
use crate::scanner::FileEntry;
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Where files of one category usually live, and how sure we are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationPreference {
    pub category: Category,
    pub preferred_location: String,
    pub confidence: f64,
    pub learned_at: DateTime<Utc>,
}

impl OrganizationPreference {
    pub fn new(
        category: Category,
        preferred_location: &str,
        confidence: f64,
        learned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            preferred_location: preferred_location.to_string(),
            confidence: confidence.clamp(0.0, 1.0),
            learned_at,
        }
    }
}

/// The learned preference table, one record per category.
///
/// Records are swapped whole on insert, so concurrent readers see either the
/// old or the new record for a category and never a mix.
#[derive(Debug, Default)]
pub struct PreferenceStore {
    table: DashMap<Category, OrganizationPreference>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    preferences: BTreeMap<String, StoredPreference>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPreference {
    preferred_location: String,
    confidence: f64,
    learned_at: DateTime<Utc>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<OrganizationPreference> {
        self.table.get(&category).map(|record| record.value().clone())
    }

    pub fn insert(&self, preference: OrganizationPreference) {
        self.table.insert(preference.category, preference);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Copy of the table ordered by category.
    pub fn snapshot(&self) -> BTreeMap<Category, OrganizationPreference> {
        self.table
            .iter()
            .map(|record| (*record.key(), record.value().clone()))
            .collect()
    }

    /// Load a table saved by [`PreferenceStore::save`]. A missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let store = Self::new();
        if !path.exists() {
            debug!("No preference file at {}", path.display());
            return Ok(store);
        }

        let raw = fs::read_to_string(path)?;
        let file: PreferenceFile = toml::from_str(&raw)?;
        for (name, stored) in file.preferences {
            match name.parse::<Category>() {
                Ok(category) => store.insert(OrganizationPreference::new(
                    category,
                    &stored.preferred_location,
                    stored.confidence,
                    stored.learned_at,
                )),
                Err(e) => warn!("Ignoring stored preference: {}", e),
            }
        }
        info!("Loaded {} preferences from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let file = PreferenceFile {
            preferences: self
                .snapshot()
                .into_values()
                .map(|pref| {
                    (
                        pref.category.to_string(),
                        StoredPreference {
                            preferred_location: pref.preferred_location,
                            confidence: pref.confidence,
                            learned_at: pref.learned_at,
                        },
                    )
                })
                .collect(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(&file)?)?;
        debug!("Saved {} preferences to {}", self.len(), path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LocationTally {
    count: usize,
    first_seen: usize,
}

/// Accumulates where each category's files live during a full analysis.
///
/// The preferred location of a category is the most common name of the
/// directory directly containing its files; ties go to the name seen first.
#[derive(Debug, Default)]
pub struct PreferenceLearner {
    locations: AHashMap<Category, AHashMap<String, LocationTally>>,
    totals: AHashMap<Category, usize>,
    observed: usize,
}

impl PreferenceLearner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, entry: &FileEntry) {
        if entry.is_placeholder() {
            return;
        }
        let Some(location) = entry.parent_name() else {
            return;
        };

        let category = entry.category();
        let order = self.observed;
        self.observed += 1;
        *self.totals.entry(category).or_default() += 1;
        self.locations
            .entry(category)
            .or_default()
            .entry(location)
            .or_insert_with(|| LocationTally {
                count: 0,
                first_seen: order,
            })
            .count += 1;
    }

    /// Fold another learner's observations into this one. `other` is treated
    /// as having been observed after everything already here.
    pub fn merge(&mut self, other: PreferenceLearner) {
        let offset = self.observed;
        self.observed += other.observed;
        for (category, total) in other.totals {
            *self.totals.entry(category).or_default() += total;
        }
        for (category, tallies) in other.locations {
            let mine = self.locations.entry(category).or_default();
            for (location, tally) in tallies {
                let slot = mine.entry(location).or_insert_with(|| LocationTally {
                    count: 0,
                    first_seen: offset + tally.first_seen,
                });
                slot.count += tally.count;
            }
        }
    }

    /// One preference per observed category, ordered by category.
    pub fn learn(&self, learned_at: DateTime<Utc>) -> Vec<OrganizationPreference> {
        let mut learned: Vec<OrganizationPreference> = self
            .locations
            .iter()
            .filter_map(|(category, tallies)| {
                let total = *self.totals.get(category)?;
                let (location, tally) = tallies.iter().max_by(|a, b| {
                    a.1.count
                        .cmp(&b.1.count)
                        .then(b.1.first_seen.cmp(&a.1.first_seen))
                })?;
                Some(OrganizationPreference::new(
                    *category,
                    location,
                    tally.count as f64 / total as f64,
                    learned_at,
                ))
            })
            .collect();
        learned.sort_by_key(|pref| pref.category);
        learned
    }

    /// Replace the store's records for every observed category. Categories
    /// with no observations keep whatever record they had.
    pub fn apply(&self, store: &PreferenceStore, learned_at: DateTime<Utc>) -> usize {
        let learned = self.learn(learned_at);
        let count = learned.len();
        for preference in learned {
            debug!(
                "{} usually stored in {} ({:.0}% confidence)",
                preference.category,
                preference.preferred_location,
                preference.confidence * 100.0
            );
            store.insert(preference);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn file(path: &str, size: u64) -> FileEntry {
        FileEntry::new(path, size, at())
    }

    #[test]
    fn test_confidence_is_share_of_most_common_location() {
        let mut learner = PreferenceLearner::new();
        for path in [
            "/h/Pictures/a.jpg",
            "/h/Pictures/b.png",
            "/h/Pictures/c.gif",
            "/h/Downloads/d.jpg",
        ] {
            learner.observe(&file(path, 10));
        }
        let learned = learner.learn(at());
        assert_eq!(learned.len(), 1);
        assert_eq!(learned[0].category, Category::Images);
        assert_eq!(learned[0].preferred_location, "Pictures");
        assert!((learned[0].confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_single_location_gives_full_confidence() {
        let mut learner = PreferenceLearner::new();
        learner.observe(&file("/h/Music/a.mp3", 10));
        learner.observe(&file("/h/Music/b.flac", 10));
        let learned = learner.learn(at());
        assert_eq!(learned[0].confidence, 1.0);
    }

    #[test]
    fn test_ties_go_to_first_seen_location() {
        let mut learner = PreferenceLearner::new();
        learner.observe(&file("/h/Desktop/a.pdf", 10));
        learner.observe(&file("/h/Documents/b.pdf", 10));
        assert_eq!(learner.learn(at())[0].preferred_location, "Desktop");
    }

    #[test]
    fn test_zero_byte_files_are_not_observed() {
        let mut learner = PreferenceLearner::new();
        learner.observe(&file("/h/Downloads/empty.jpg", 0));
        learner.observe(&file("/h/Pictures/real.jpg", 10));
        let learned = learner.learn(at());
        assert_eq!(learned[0].preferred_location, "Pictures");
        assert_eq!(learned[0].confidence, 1.0);
    }

    #[test]
    fn test_merge_matches_sequential_observation() {
        let mut first = PreferenceLearner::new();
        first.observe(&file("/h/Desktop/a.pdf", 10));
        let mut second = PreferenceLearner::new();
        second.observe(&file("/h/Documents/b.pdf", 10));
        second.observe(&file("/h/Documents/c.pdf", 10));

        first.merge(second);
        let learned = first.learn(at());
        assert_eq!(learned[0].preferred_location, "Documents");
        assert!((learned[0].confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_keeps_unobserved_categories() {
        let store = PreferenceStore::new();
        store.insert(OrganizationPreference::new(Category::Video, "Videos", 0.5, at()));
        store.insert(OrganizationPreference::new(Category::Images, "Old", 0.5, at()));

        let mut learner = PreferenceLearner::new();
        learner.observe(&file("/h/Pictures/a.jpg", 10));
        assert_eq!(learner.apply(&store, at()), 1);

        assert_eq!(store.get(Category::Images).unwrap().preferred_location, "Pictures");
        assert_eq!(store.get(Category::Video).unwrap().preferred_location, "Videos");
    }

    #[test]
    fn test_save_and_load_preferences() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("prefs/preferences.toml");

        let store = PreferenceStore::new();
        store.insert(OrganizationPreference::new(Category::Images, "Pictures", 0.8, at()));
        store.insert(OrganizationPreference::new(Category::Audio, "Music", 1.0, at()));
        store.save(&path).unwrap();

        let loaded = PreferenceStore::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_load_skips_unknown_categories_and_missing_files() {
        let tmp = tempdir().unwrap();
        assert!(PreferenceStore::load(&tmp.path().join("none.toml")).unwrap().is_empty());

        let path = tmp.path().join("prefs.toml");
        fs::write(
            &path,
            r#"
[preferences.images]
preferred_location = "Pictures"
confidence = 0.9
learned_at = "2024-06-01T12:00:00Z"

[preferences.holograms]
preferred_location = "Space"
confidence = 1.0
learned_at = "2024-06-01T12:00:00Z"
"#,
        )
        .unwrap();
        let loaded = PreferenceStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(Category::Images).unwrap().confidence, 0.9);
    }
}
