mod insights;
mod preferences;
mod report;

pub use insights::{generate_suggestions, Priority, Suggestion, SuggestionKind};
pub use preferences::{OrganizationPreference, PreferenceLearner, PreferenceStore};
pub use report::{
    ActivityPattern, AnalysisReport, CategoryStats, CategoryTally, FileDetail, PathAnalysis,
};
