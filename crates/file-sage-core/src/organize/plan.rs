use crate::analysis::PreferenceStore;
use crate::category::Category;
use crate::scanner::FileEntry;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    Move,
}

/// A proposed relocation of one file. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub file: PathBuf,
    pub file_name: String,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub category: Category,
    pub action: PlanAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationPlan {
    pub source_dir: PathBuf,
    pub files_analyzed: usize,
    pub entries: Vec<PlanEntry>,
    pub dry_run: bool,
}

impl OrganizationPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns learned preferences into move proposals. Touches no files.
///
/// A preferred location is a directory name; it resolves to
/// `library_root/<name>`, or to a sibling of the source directory when no
/// library root is set.
pub struct OrganizationPlanner<'a> {
    preferences: &'a PreferenceStore,
    library_root: Option<PathBuf>,
}

impl<'a> OrganizationPlanner<'a> {
    pub fn new(preferences: &'a PreferenceStore) -> Self {
        Self {
            preferences,
            library_root: None,
        }
    }

    pub fn with_library_root(mut self, root: Option<PathBuf>) -> Self {
        self.library_root = root;
        self
    }

    /// Plan moves for the immediate files of `source_dir`.
    pub fn plan(&self, source_dir: &Path, files: &[FileEntry], dry_run: bool) -> OrganizationPlan {
        let candidates: Vec<&FileEntry> = files.iter().filter(|f| !f.is_placeholder()).collect();
        let entries = candidates
            .iter()
            .filter_map(|file| self.plan_entry(source_dir, file))
            .collect();

        OrganizationPlan {
            source_dir: source_dir.to_path_buf(),
            files_analyzed: candidates.len(),
            entries,
            dry_run,
        }
    }

    fn plan_entry(&self, source_dir: &Path, file: &FileEntry) -> Option<PlanEntry> {
        let category = file.category();
        let preference = self.preferences.get(category)?;
        let location = preference.preferred_location.as_str();
        if location.is_empty() {
            return None;
        }

        let current_dir = file.parent_dir();
        if current_dir.file_name().is_some_and(|name| name == location) {
            return None;
        }

        let target_dir = self.resolve_location(source_dir, location);
        if target_dir == current_dir {
            return None;
        }

        Some(PlanEntry {
            file: file.path.clone(),
            file_name: file.file_name(),
            source_dir: current_dir.to_path_buf(),
            target_dir,
            category,
            action: PlanAction::Move,
        })
    }

    fn resolve_location(&self, source_dir: &Path, location: &str) -> PathBuf {
        let base = match &self.library_root {
            Some(root) => root.as_path(),
            None => source_dir.parent().unwrap_or(source_dir),
        };
        base.join(location)
    }
}
