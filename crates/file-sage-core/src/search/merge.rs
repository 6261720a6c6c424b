use crate::scanner::FileEntry;
use ahash::AHashSet;
use std::path::PathBuf;

/// Union of per-strategy results, keeping the first occurrence of each path.
///
/// Scanned paths are canonical (roots are canonicalized and symlinks are not
/// followed), so path equality is canonical-path equality.
pub fn merge_results<I>(result_sets: I) -> Vec<FileEntry>
where
    I: IntoIterator<Item = Vec<FileEntry>>,
{
    let mut seen: AHashSet<PathBuf> = AHashSet::new();
    let mut merged = Vec::new();

    for set in result_sets {
        for entry in set {
            if seen.insert(entry.path.clone()) {
                merged.push(entry);
            }
        }
    }

    merged
}
