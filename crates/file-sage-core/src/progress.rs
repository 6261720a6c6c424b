/// Trait for reporting search and analysis progress.
///
/// The CLI implements this with indicatif spinners. All methods have default
/// no-op implementations and may be called from rayon worker threads.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _roots: usize) {}
    fn on_scan_progress(&self, _files_seen: usize, _current_path: &str) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_rank_complete(&self, _ranked: usize, _duration_secs: f64) {}
    fn on_learn_complete(&self, _categories: usize) {}
    fn on_move(&self, _moved: usize, _total: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
