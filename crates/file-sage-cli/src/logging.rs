use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/file-sage.log";

/// Where and how much to log, read from `TRACING_LEVEL` and `LOG_FILE_PATH`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub filter: String,
    pub directory: PathBuf,
    pub file_name: String,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_values(
            env::var("TRACING_LEVEL").ok(),
            env::var("LOG_FILE_PATH").ok(),
        )
    }

    fn from_values(filter: Option<String>, log_file: Option<String>) -> Self {
        let log_file = log_file
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let path = Path::new(&log_file);

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file-sage.log".to_string());

        Self {
            filter: filter.unwrap_or_else(|| "info".to_string()),
            directory,
            file_name,
        }
    }
}

/// Install stdout and file logging. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init_logger() -> WorkerGuard {
    let settings = LogSettings::from_env();

    let file_appender = tracing_appender::rolling::never(&settings.directory, &settings.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // terminal output stays short; the file keeps targets for grepping
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .with_line_number(false)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_ansi(false),
        )
        .with(EnvFilter::new(&settings.filter))
        .init();

    debug!(
        "Logging at '{}' to {}",
        settings.filter,
        settings.directory.join(&settings.file_name).display()
    );

    guard
}
