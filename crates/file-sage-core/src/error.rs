use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Could not read preferences: {0}")]
    PreferenceDecode(#[from] toml::de::Error),

    #[error("Could not write preferences: {0}")]
    PreferenceEncode(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}
