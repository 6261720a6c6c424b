use super::plan::{OrganizationPlan, PlanEntry};
use crate::progress::ProgressReporter;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Upper bound on numeric suffixes tried when a target name is taken.
const MAX_RENAME_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveStatus {
    Moved,
    /// Moved under a suffixed name because the original name was taken.
    Renamed,
    /// Not attempted because the plan is a dry run.
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveOutcome {
    pub file: PathBuf,
    pub destination: Option<PathBuf>,
    #[serde(flatten)]
    pub status: MoveStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub moved: usize,
    pub renamed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<MoveOutcome>,
}

/// Carry out a plan. Dry-run plans are reported as skipped without touching
/// the filesystem. A failed move is recorded and the remaining moves go on.
pub fn execute_plan(plan: &OrganizationPlan, reporter: &dyn ProgressReporter) -> ExecutionReport {
    let mut report = ExecutionReport::default();
    let total = plan.entries.len();

    if plan.dry_run {
        debug!("Dry run: {} moves not executed", total);
        report.skipped = total;
        report.outcomes = plan
            .entries
            .iter()
            .map(|entry| MoveOutcome {
                file: entry.file.clone(),
                destination: Some(entry.target_dir.join(&entry.file_name)),
                status: MoveStatus::Skipped,
            })
            .collect();
        return report;
    }

    for (index, entry) in plan.entries.iter().enumerate() {
        let outcome = execute_entry(entry);
        match &outcome.status {
            MoveStatus::Moved => report.moved += 1,
            MoveStatus::Renamed => report.renamed += 1,
            MoveStatus::Skipped => report.skipped += 1,
            MoveStatus::Failed { .. } => report.failed += 1,
        }
        report.outcomes.push(outcome);
        reporter.on_move(index + 1, total);
    }

    info!(
        "Organization executed: {} moved, {} renamed, {} failed",
        report.moved, report.renamed, report.failed
    );
    report
}

fn execute_entry(entry: &PlanEntry) -> MoveOutcome {
    let failed = |reason: String| {
        error!("Couldn't move {}: {}", entry.file.display(), reason);
        MoveOutcome {
            file: entry.file.clone(),
            destination: None,
            status: MoveStatus::Failed { reason },
        }
    };

    if !entry.file.is_file() {
        return failed("source file no longer exists".to_string());
    }
    if let Err(e) = fs::create_dir_all(&entry.target_dir) {
        return failed(format!("cannot create {}: {}", entry.target_dir.display(), e));
    }

    let wanted = entry.target_dir.join(&entry.file_name);
    let (destination, status) = if wanted.exists() {
        match unique_destination(&wanted) {
            Some(path) => (path, MoveStatus::Renamed),
            None => return failed(format!("no free name for {}", wanted.display())),
        }
    } else {
        (wanted, MoveStatus::Moved)
    };

    match move_file(&entry.file, &destination) {
        Ok(()) => {
            debug!("Moved {} to {}", entry.file.display(), destination.display());
            MoveOutcome {
                file: entry.file.clone(),
                destination: Some(destination),
                status,
            }
        }
        Err(e) => failed(e.to_string()),
    }
}

/// `name_1.ext`, `name_2.ext`, ... next to `wanted`, whichever is free first.
fn unique_destination(wanted: &Path) -> Option<PathBuf> {
    let parent = wanted.parent().unwrap_or(Path::new("."));
    let stem = wanted
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let ext = wanted
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..=MAX_RENAME_ATTEMPTS)
        .map(|counter| parent.join(format!("{}_{}{}", stem, counter, ext)))
        .find(|candidate| !candidate.exists())
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    if let Err(rename_err) = fs::rename(source, destination) {
        warn!(
            "Rename of {} failed ({}), copying instead",
            source.display(),
            rename_err
        );
        fs::copy(source, destination)?;
        if let Err(remove_err) = fs::remove_file(source) {
            // leave exactly one copy behind
            if let Err(cleanup_err) = fs::remove_file(destination) {
                error!(
                    "Copied {} to {} but could not remove either: {}",
                    source.display(),
                    destination.display(),
                    cleanup_err
                );
            }
            return Err(remove_err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::organize::PlanAction;
    use crate::progress::SilentReporter;
    use tempfile::tempdir;

    fn move_entry(source_dir: &Path, name: &str, target_dir: &Path) -> PlanEntry {
        PlanEntry {
            file: source_dir.join(name),
            file_name: name.to_string(),
            source_dir: source_dir.to_path_buf(),
            target_dir: target_dir.to_path_buf(),
            category: Category::Images,
            action: PlanAction::Move,
        }
    }

    #[test]
    fn test_failed_move_does_not_stop_the_batch() {
        let tmp = tempdir().unwrap();
        let downloads = tmp.path().join("Downloads");
        let pictures = tmp.path().join("Pictures");
        fs::create_dir_all(&downloads).unwrap();
        fs::write(downloads.join("kept.jpg"), "jpg").unwrap();

        let plan = OrganizationPlan {
            source_dir: downloads.clone(),
            files_analyzed: 2,
            entries: vec![
                // vanished between planning and execution
                move_entry(&downloads, "gone.jpg", &pictures),
                move_entry(&downloads, "kept.jpg", &pictures),
            ],
            dry_run: false,
        };
        let report = execute_plan(&plan, &SilentReporter);

        assert_eq!(report.failed, 1);
        assert_eq!(report.moved, 1);
        assert!(matches!(report.outcomes[0].status, MoveStatus::Failed { .. }));
        assert_eq!(report.outcomes[1].status, MoveStatus::Moved);
        assert!(pictures.join("kept.jpg").exists());
        assert!(!downloads.join("kept.jpg").exists());
    }

    #[test]
    fn test_dry_run_plan_touches_nothing() {
        let tmp = tempdir().unwrap();
        let downloads = tmp.path().join("Downloads");
        let pictures = tmp.path().join("Pictures");
        fs::create_dir_all(&downloads).unwrap();
        fs::write(downloads.join("a.jpg"), "jpg").unwrap();

        let plan = OrganizationPlan {
            source_dir: downloads.clone(),
            files_analyzed: 1,
            entries: vec![move_entry(&downloads, "a.jpg", &pictures)],
            dry_run: true,
        };
        let report = execute_plan(&plan, &SilentReporter);

        assert_eq!(report.skipped, 1);
        assert_eq!(report.outcomes[0].status, MoveStatus::Skipped);
        assert!(downloads.join("a.jpg").exists());
        assert!(!pictures.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_move_out_of_read_only_directory_leaves_no_copy() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let locked = tmp.path().join("locked");
        let target = tmp.path().join("target");
        fs::create_dir_all(&locked).unwrap();
        fs::create_dir_all(&target).unwrap();
        fs::write(locked.join("a.jpg"), "jpg").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        if fs::write(locked.join("write-check"), "x").is_ok() {
            // permissions are not enforced for this user
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = move_file(&locked.join("a.jpg"), &target.join("a.jpg"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(result.is_err());
        assert!(locked.join("a.jpg").exists());
        assert!(!target.join("a.jpg").exists());
    }

    #[test]
    fn test_unique_destination_appends_counter() {
        let tmp = tempdir().unwrap();
        let wanted = tmp.path().join("photo.jpg");
        fs::write(&wanted, "a").unwrap();
        fs::write(tmp.path().join("photo_1.jpg"), "b").unwrap();

        assert_eq!(
            unique_destination(&wanted),
            Some(tmp.path().join("photo_2.jpg"))
        );
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let tmp = tempdir().unwrap();
        let wanted = tmp.path().join("README");
        fs::write(&wanted, "a").unwrap();
        assert_eq!(unique_destination(&wanted), Some(tmp.path().join("README_1")));
    }
}
