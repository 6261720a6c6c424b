use super::{CancelToken, FileEntry};
use crate::progress::ProgressReporter;
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

/// Recursive file walker over a set of roots.
///
/// Unreadable directories and files are logged and skipped; a single bad path
/// never ends the walk. Symlinks are not followed. Entries come back sorted by
/// file name within each directory, so discovery order is stable between runs.
/// The scanner itself does not drop zero-byte files.
#[derive(Debug, Clone, Default)]
pub struct DirectoryScanner {
    ignore_patterns: Vec<Pattern>,
    cancel: CancelToken,
}

impl DirectoryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_patterns(mut self, ignore_globs: &[String]) -> Self {
        self.ignore_patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Lazily walk every root in order. Missing roots yield nothing.
    pub fn scan<'a>(&'a self, roots: &'a [PathBuf]) -> impl Iterator<Item = FileEntry> + 'a {
        roots.iter().flat_map(move |root| self.scan_root(root))
    }

    /// Lazily walk a single root. Cancellation is checked before every entry.
    pub fn scan_root<'a>(&'a self, root: &Path) -> Box<dyn Iterator<Item = FileEntry> + Send + 'a> {
        let Some(root) = resolve_root(root) else {
            return Box::new(std::iter::empty());
        };

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_ignored(entry.path()));

        Box::new(
            walker
                .take_while(move |_| !self.cancel.is_cancelled())
                .filter_map(|result| match result {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        debug!("Skipping unreadable path: {}", err);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| entry_to_file(&entry)),
        )
    }

    /// Walk each root on its own rayon worker and fold its entries into a
    /// per-root accumulator. The returned accumulators follow `roots` order.
    pub fn fold_roots<A, I, F>(
        &self,
        roots: &[PathBuf],
        reporter: &dyn ProgressReporter,
        init: I,
        fold: F,
    ) -> Vec<A>
    where
        A: Send,
        I: Fn() -> A + Sync,
        F: Fn(&mut A, FileEntry) + Sync,
    {
        reporter.on_scan_start(roots.len());
        let start = Instant::now();
        let seen = AtomicUsize::new(0);

        let accumulators: Vec<A> = roots
            .par_iter()
            .map(|root| {
                let mut acc = init();
                for entry in self.scan_root(root) {
                    let count = seen.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_scan_progress(count, &entry.path.to_string_lossy());
                    fold(&mut acc, entry);
                }
                debug!("Finished walking {}", root.display());
                acc
            })
            .collect();

        if self.is_cancelled() {
            warn!(
                "Scan cancelled after {} files; returning partial results",
                seen.load(Ordering::Relaxed)
            );
        }
        reporter.on_scan_complete(seen.load(Ordering::Relaxed), start.elapsed().as_secs_f64());
        accumulators
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }
}

/// Regular files directly inside `dir`, sorted by name. Subdirectories and
/// symlinks are left out; entries that vanish mid-listing are skipped.
pub fn list_directory(dir: &Path) -> io::Result<Vec<FileEntry>> {
    let mut files: Vec<FileEntry> = fs::read_dir(dir)?
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Error reading entry in {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|entry| {
            entry
                .file_type()
                .map(|file_type| file_type.is_file())
                .unwrap_or(false)
        })
        .filter_map(|entry| {
            let path = entry.path();
            match FileEntry::from_path(&path) {
                Ok(file) => Some(file),
                Err(err) => {
                    debug!("Error getting metadata for {}: {}", path.display(), err);
                    None
                }
            }
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn resolve_root(root: &Path) -> Option<PathBuf> {
    if !root.is_dir() {
        debug!("Skipping missing root {}", root.display());
        return None;
    }
    match fs::canonicalize(root) {
        Ok(path) => Some(path),
        Err(err) => {
            warn!("Cannot resolve root {}: {}", root.display(), err);
            None
        }
    }
}

fn entry_to_file(entry: &DirEntry) -> Option<FileEntry> {
    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(err) => {
            debug!("Error getting metadata for {}: {}", entry.path().display(), err);
            return None;
        }
    };
    match FileEntry::from_metadata(entry.path(), &metadata) {
        Ok(file) => Some(file),
        Err(err) => {
            debug!("No modification time for {}: {}", entry.path().display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn names(files: &[FileEntry]) -> Vec<String> {
        files.iter().map(|f| f.file_name()).collect()
    }

    #[test]
    fn test_scan_walks_nested_directories_in_name_order() {
        let tmp = tempdir().unwrap();
        write(&tmp.path().join("b.txt"), "b");
        write(&tmp.path().join("a/nested.txt"), "nested");
        write(&tmp.path().join("c.txt"), "");

        let roots = vec![tmp.path().to_path_buf()];
        let scanner = DirectoryScanner::new();
        let files: Vec<FileEntry> = scanner.scan(&roots).collect();

        // zero-byte files are still reported by the scanner
        assert_eq!(names(&files), vec!["nested.txt", "b.txt", "c.txt"]);
        assert!(files.iter().all(|f| f.path.is_absolute()));
    }

    #[test]
    fn test_scan_skips_missing_roots() {
        let tmp = tempdir().unwrap();
        write(&tmp.path().join("keep.txt"), "keep");

        let roots = vec![tmp.path().join("does-not-exist"), tmp.path().to_path_buf()];
        let files: Vec<FileEntry> = DirectoryScanner::new().scan(&roots).collect();
        assert_eq!(names(&files), vec!["keep.txt"]);
    }

    #[test]
    fn test_scan_applies_ignore_patterns() {
        let tmp = tempdir().unwrap();
        write(&tmp.path().join("cache/blob.bin"), "x");
        write(&tmp.path().join("keep.txt"), "keep");

        let roots = vec![tmp.path().to_path_buf()];
        let scanner = DirectoryScanner::new().with_ignore_patterns(&["**/cache".to_string()]);
        let files: Vec<FileEntry> = scanner.scan(&roots).collect();
        assert_eq!(names(&files), vec!["keep.txt"]);
    }

    #[test]
    fn test_cancelled_scan_yields_nothing_further() {
        let tmp = tempdir().unwrap();
        for i in 0..5 {
            write(&tmp.path().join(format!("f{}.txt", i)), "data");
        }
        let roots = vec![tmp.path().to_path_buf()];
        let token = CancelToken::new();
        let scanner = DirectoryScanner::new().with_cancel_token(token.clone());

        let mut iter = scanner.scan(&roots);
        assert!(iter.next().is_some());
        token.cancel();
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_fold_roots_keeps_root_order() {
        let tmp = tempdir().unwrap();
        write(&tmp.path().join("one/a.txt"), "a");
        write(&tmp.path().join("two/b.txt"), "b");

        let roots = vec![tmp.path().join("two"), tmp.path().join("one")];
        let per_root = DirectoryScanner::new().fold_roots(
            &roots,
            &SilentReporter,
            Vec::new,
            |files: &mut Vec<FileEntry>, entry: FileEntry| files.push(entry),
        );
        let files: Vec<FileEntry> = per_root.into_iter().flatten().collect();
        assert_eq!(names(&files), vec!["b.txt", "a.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_does_not_stop_the_walk() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let locked = tmp.path().join("locked");
        write(&locked.join("hidden.txt"), "hidden");
        write(&tmp.path().join("open/visible.txt"), "visible");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            // running with privileges that ignore permissions
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let roots = vec![tmp.path().to_path_buf()];
        let files: Vec<FileEntry> = DirectoryScanner::new().scan(&roots).collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(names(&files), vec!["visible.txt"]);
    }

    #[test]
    fn test_list_directory_is_not_recursive() {
        let tmp = tempdir().unwrap();
        write(&tmp.path().join("top.jpg"), "jpg");
        write(&tmp.path().join("sub/deep.jpg"), "jpg");

        let files = list_directory(tmp.path()).unwrap();
        assert_eq!(names(&files), vec!["top.jpg"]);
    }
}
