use file_sage_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif.
///
/// - Scan phase: spinner (file count unknown upfront)
/// - Move phase: progress bar over the planned moves
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars(TICK_CHARS));
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, roots: usize) {
        self.set_bar(spinner(format!("Scanning {} directories...", roots)));
    }

    fn on_scan_progress(&self, files_seen: usize, _current_path: &str) {
        // throttled; the steady tick keeps the spinner moving
        if files_seen % 100 == 0 {
            self.with_bar(|pb| pb.set_message(format!("Scanning... {} files seen", files_seen)));
        }
    }

    fn on_scan_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} files in {:.2}s",
            total_files, duration_secs
        );
    }

    fn on_rank_complete(&self, ranked: usize, duration_secs: f64) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Ranked {} matches in {:.3}s",
            ranked, duration_secs
        );
    }

    fn on_learn_complete(&self, categories: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Learned preferences for {} categories",
            categories
        );
    }

    fn on_move(&self, moved: usize, total: usize) {
        if moved == 1 {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "  {spinner:.cyan} Moving [{bar:30.cyan/dim}] {pos}/{len} files",
            ) {
                pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
            }
            self.set_bar(pb);
        }
        self.with_bar(|pb| pb.set_position(moved as u64));
        if moved == total {
            self.finish_bar();
        }
    }
}
