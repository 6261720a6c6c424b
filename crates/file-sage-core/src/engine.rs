use crate::analysis::{
    AnalysisReport, CategoryTally, FileDetail, PathAnalysis, PreferenceLearner, PreferenceStore,
};
use crate::config::{canonical_roots, AppConfig};
use crate::error::Error;
use crate::organize::{execute_plan, ExecutionReport, OrganizationPlan, OrganizationPlanner};
use crate::progress::ProgressReporter;
use crate::scanner::{list_directory, CancelToken, DirectoryScanner, FileEntry};
use crate::search::{
    default_strategies, merge_results, rank, round_to, ScoredResult, SearchHit, SearchQuery,
    SearchStrategy,
};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Entry point for search, analysis and organization over live directories.
///
/// The preference table is the only state kept between calls. It is shared
/// behind an `Arc` so a host can persist it or hand it to another engine.
pub struct FileSageEngine {
    config: AppConfig,
    preferences: Arc<PreferenceStore>,
    strategies: Vec<Box<dyn SearchStrategy>>,
    cancel: CancelToken,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub total_found: usize,
    pub search_time: f64,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizeOutcome {
    pub plan: OrganizationPlan,
    pub execution: Option<ExecutionReport>,
}

impl FileSageEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            preferences: Arc::new(PreferenceStore::new()),
            strategies: default_strategies(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_preferences(mut self, preferences: Arc<PreferenceStore>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn SearchStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Cancelling this token stops any running scan between files.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn save_preferences(&self) -> Result<(), Error> {
        self.preferences
            .save(Path::new(&self.config.preferences_path))
    }

    /// Search `roots` (or the configured roots when empty) and return the
    /// top `max_results` hits.
    pub fn search(
        &self,
        query: &str,
        roots: &[PathBuf],
        reporter: &dyn ProgressReporter,
    ) -> SearchOutcome {
        self.search_with_query(&SearchQuery::new(query), roots, reporter)
    }

    pub fn search_with_query(
        &self,
        query: &SearchQuery,
        roots: &[PathBuf],
        reporter: &dyn ProgressReporter,
    ) -> SearchOutcome {
        let start = Instant::now();
        let scanner = self.scanner();
        let ranked = self.rank_candidates(query, roots, &scanner, reporter);
        let cancelled = scanner.is_cancelled();

        let results: Vec<SearchHit> = ranked
            .iter()
            .take(self.config.max_results)
            .map(SearchHit::from)
            .collect();

        let search_time = start.elapsed().as_secs_f64();
        info!(
            "Search '{}' found {} ranked files in {:.3}s",
            query.raw(),
            ranked.len(),
            search_time
        );

        SearchOutcome {
            query: query.raw().to_string(),
            total_found: results.len(),
            results,
            search_time: round_to(search_time, 3),
            cancelled,
        }
    }

    /// Every ranked candidate for `query`, without truncation.
    pub fn rank_candidates(
        &self,
        query: &SearchQuery,
        roots: &[PathBuf],
        scanner: &DirectoryScanner,
        reporter: &dyn ProgressReporter,
    ) -> Vec<ScoredResult> {
        let roots = self.resolve_roots(roots);
        let active: Vec<&dyn SearchStrategy> = self
            .strategies
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| s.is_active(query))
            .collect();
        debug!(
            "Active strategies: {:?}",
            active.iter().map(|s| s.name()).collect::<Vec<_>>()
        );

        // One walk per root; each entry is offered to every active strategy.
        let per_root: Vec<Vec<Vec<FileEntry>>> = scanner.fold_roots(
            &roots,
            reporter,
            || vec![Vec::new(); active.len()],
            |buckets: &mut Vec<Vec<FileEntry>>, entry: FileEntry| {
                if entry.is_placeholder() {
                    return;
                }
                for (bucket, strategy) in buckets.iter_mut().zip(active.iter()) {
                    if strategy.accepts(query, &entry) {
                        bucket.push(entry.clone());
                    }
                }
            },
        );

        // Strategy-major, root-minor: the order a sequential run would produce.
        let result_sets = (0..active.len()).map(|index| {
            per_root
                .iter()
                .flat_map(|buckets| buckets[index].iter().cloned())
                .collect::<Vec<FileEntry>>()
        });
        let merged = merge_results(result_sets);

        let rank_start = Instant::now();
        let ranked = rank(merged, query, &self.preferences);
        reporter.on_rank_complete(ranked.len(), rank_start.elapsed().as_secs_f64());
        ranked
    }

    /// Full analysis of `roots` (or the configured roots when empty). Category
    /// preferences are relearned from what was observed unless the scan was
    /// cancelled.
    pub fn analyze(&self, roots: &[PathBuf], reporter: &dyn ProgressReporter) -> AnalysisReport {
        let roots = self.resolve_roots(roots);
        info!("Analyzing {} directories", roots.len());
        let scanner = self.scanner();

        let per_root = scanner.fold_roots(
            &roots,
            reporter,
            || (CategoryTally::new(), PreferenceLearner::new()),
            |acc: &mut (CategoryTally, PreferenceLearner), entry: FileEntry| {
                acc.0.observe(&entry);
                acc.1.observe(&entry);
            },
        );

        let mut tally = CategoryTally::new();
        let mut learner = PreferenceLearner::new();
        for (root_tally, root_learner) in per_root {
            tally.merge(root_tally);
            learner.merge(root_learner);
        }

        let now = Utc::now();
        let cancelled = scanner.is_cancelled();
        if cancelled {
            warn!("Analysis cancelled; keeping previous preferences");
        } else {
            let learned = learner.apply(&self.preferences, now);
            reporter.on_learn_complete(learned);
            info!("Learned preferences for {} categories", learned);
        }

        let report = tally.finish(now, cancelled);
        info!(
            "Analysis complete: {} files, {} bytes",
            report.total_files, report.total_size
        );
        report
    }

    /// Analyze one explicit file or directory. Preferences are not updated.
    pub fn analyze_path(
        &self,
        path: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<PathAnalysis, Error> {
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        if path.is_file() {
            return Ok(PathAnalysis::File(FileDetail::inspect(path)?));
        }

        let scanner = self.scanner();
        let roots = [path.to_path_buf()];
        let mut tally = CategoryTally::new();
        let per_root = scanner.fold_roots(
            &roots,
            reporter,
            CategoryTally::new,
            |root_tally: &mut CategoryTally, entry: FileEntry| root_tally.observe(&entry),
        );
        for root_tally in per_root {
            tally.merge(root_tally);
        }
        Ok(PathAnalysis::Directory(
            tally.finish(Utc::now(), scanner.is_cancelled()),
        ))
    }

    /// Plan (and unless `dry_run`, execute) moves for the immediate files of
    /// `source`, defaulting to the configured organize source.
    pub fn organize(
        &self,
        source: Option<&Path>,
        dry_run: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<OrganizeOutcome, Error> {
        let plan = self.plan_organization(source, dry_run)?;
        let execution = if dry_run {
            None
        } else {
            Some(self.execute(&plan, reporter))
        };
        Ok(OrganizeOutcome { plan, execution })
    }

    pub fn plan_organization(
        &self,
        source: Option<&Path>,
        dry_run: bool,
    ) -> Result<OrganizationPlan, Error> {
        let source = match source {
            Some(path) => path.to_path_buf(),
            None => self.config.organize_source(),
        };
        if !source.is_dir() {
            return Err(Error::PathNotFound(source));
        }

        let files = list_directory(&source)?;
        let plan = OrganizationPlanner::new(&self.preferences)
            .with_library_root(self.config.library_root())
            .plan(&source, &files, dry_run);
        info!(
            "Planned {} moves for {} files in {}",
            plan.entries.len(),
            plan.files_analyzed,
            source.display()
        );
        Ok(plan)
    }

    pub fn execute(
        &self,
        plan: &OrganizationPlan,
        reporter: &dyn ProgressReporter,
    ) -> ExecutionReport {
        execute_plan(plan, reporter)
    }

    fn scanner(&self) -> DirectoryScanner {
        let token = match self.config.search_timeout() {
            Some(timeout) => self.cancel.with_timeout(timeout),
            None => self.cancel.clone(),
        };
        DirectoryScanner::new()
            .with_ignore_patterns(&self.config.ignore_patterns)
            .with_cancel_token(token)
    }

    fn resolve_roots(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        if roots.is_empty() {
            self.config.roots()
        } else {
            canonical_roots(roots.iter().cloned())
        }
    }
}
