use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Folders under the home directory searched when no roots are configured.
const DEFAULT_HOME_FOLDERS: [&str; 6] = [
    "Documents",
    "Pictures",
    "Downloads",
    "Desktop",
    "Music",
    "Videos",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub root_paths: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub max_results: usize,
    pub preferences_path: String,
    pub library_root: Option<String>,
    pub organize_source: Option<String>,
    pub search_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_paths: default_root_paths(),
            ignore_patterns: Vec::new(),
            max_results: 20,
            preferences_path: "file_sage_preferences.toml".to_string(),
            library_root: None,
            organize_source: None,
            search_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Configured roots that exist, canonicalized, with nested duplicates removed.
    pub fn roots(&self) -> Vec<PathBuf> {
        canonical_roots(self.root_paths.iter().map(PathBuf::from))
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_secs.map(Duration::from_secs)
    }

    pub fn library_root(&self) -> Option<PathBuf> {
        self.library_root.as_ref().map(PathBuf::from)
    }

    /// Directory `organize` works on when the caller names none.
    pub fn organize_source(&self) -> PathBuf {
        match &self.organize_source {
            Some(path) => PathBuf::from(path),
            None => home_folder("Downloads"),
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("FILE_SAGE")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("root_paths")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

fn home_folder(name: &str) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

fn default_root_paths() -> Vec<String> {
    DEFAULT_HOME_FOLDERS
        .iter()
        .map(|name| home_folder(name).to_string_lossy().into_owned())
        .collect()
}

/// Canonicalize `dirs` and reduce them to non-overlapping directories, so a
/// folder spelled through a symlink or `..` is walked once. Roots that cannot
/// be resolved are dropped.
pub fn canonical_roots(dirs: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let resolved = dirs
        .into_iter()
        .filter_map(|dir| match fs::canonicalize(&dir) {
            Ok(path) => Some(path),
            Err(err) => {
                debug!("Skipping root {}: {}", dir.display(), err);
                None
            }
        })
        .collect();
    non_overlapping_directories(resolved)
}

/// Remove directories that are subdirectories of other directories in the list.
/// Exact repeats collapse to their first occurrence.
pub fn non_overlapping_directories(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for dir in dirs {
        if result.iter().any(|kept| is_within(&dir, kept)) {
            continue;
        }
        result.retain(|kept| !is_within(kept, &dir));
        result.push(dir);
    }

    result
}

fn is_within(path: &Path, ancestor: &Path) -> bool {
    path.starts_with(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(raw: &[&str]) -> Vec<PathBuf> {
        raw.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_non_overlapping_keeps_disjoint_roots() {
        let result = non_overlapping_directories(paths(&[
            "/home/user/Pictures",
            "/home/user/Documents",
            "/media/usb",
        ]));
        assert_eq!(
            result,
            paths(&["/home/user/Pictures", "/home/user/Documents", "/media/usb"])
        );
    }

    #[test]
    fn test_non_overlapping_drops_nested_roots_in_either_order() {
        let result = non_overlapping_directories(paths(&[
            "/home/user/Pictures/2023",
            "/home/user/Music",
            "/home/user/Pictures",
            "/home/user/Pictures/2024",
        ]));
        assert_eq!(result, paths(&["/home/user/Music", "/home/user/Pictures"]));
    }

    #[test]
    fn test_non_overlapping_collapses_repeats() {
        let result = non_overlapping_directories(paths(&["/data", "/data"]));
        assert_eq!(result, paths(&["/data"]));
    }

    #[test]
    fn test_non_overlapping_is_component_based() {
        // "/home/user/Pics" is not inside "/home/user/Pic"
        let result = non_overlapping_directories(paths(&["/home/user/Pic", "/home/user/Pics"]));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_canonical_roots_merges_alternate_spellings() {
        let tmp = tempfile::tempdir().unwrap();
        let pictures = tmp.path().join("Pictures");
        fs::create_dir_all(pictures.join("2024")).unwrap();
        fs::create_dir_all(tmp.path().join("x")).unwrap();

        let result = canonical_roots(vec![
            pictures.clone(),
            tmp.path().join("x/../Pictures"),
            pictures.join("2024"),
            tmp.path().join("missing"),
        ]);
        assert_eq!(result, vec![fs::canonicalize(&pictures).unwrap()]);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_results, 20);
        assert_eq!(config.root_paths.len(), DEFAULT_HOME_FOLDERS.len());
        assert!(config.root_paths[1].ends_with("Pictures"));
        assert!(config.search_timeout().is_none());
        assert!(config.organize_source().ends_with("Downloads"));
    }
}
