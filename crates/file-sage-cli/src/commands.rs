use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "file-sage")]
#[command(about = "Find, analyze and tidy the files in your home folders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search files by name, content, type, date and size hints
    Search {
        /// Free-text query, e.g. "large photos from last week"
        query: String,
        /// Directories to search instead of the configured roots
        #[arg(short, long = "path")]
        paths: Vec<PathBuf>,
        /// Maximum number of results (overrides max_results)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Table)]
        format: ExportFormat,
        /// Write json/csv output to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Give up scanning after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Analyze directories and learn where each category of file lives
    Analyze {
        /// Directories to analyze instead of the configured roots
        paths: Vec<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze a single file or directory without learning from it
    AnalyzePath {
        path: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Propose (or perform) moves based on learned preferences
    Organize {
        /// Directory to organize (defaults to organize_source)
        path: Option<PathBuf>,
        /// Actually move files instead of printing the plan
        #[arg(long)]
        execute: bool,
        /// Skip the confirmation prompt when executing
        #[arg(short, long)]
        yes: bool,
    },
    /// Show learned preferences and suggestions from a fresh analysis
    Insights,
    /// Print configuration values
    PrintConfig,
}
