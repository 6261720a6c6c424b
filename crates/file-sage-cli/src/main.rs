mod commands;
mod logging;
mod progress;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ExportFormat};
use dotenv::dotenv;
use file_sage_core::analysis::{AnalysisReport, PathAnalysis, PreferenceStore, Priority};
use file_sage_core::organize::{MoveStatus, OrganizationPlan};
use file_sage_core::search::SearchHit;
use file_sage_core::{AppConfig, FileSageEngine};
use progress::CliReporter;
use serde::Serialize;
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match file_sage_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Search {
            query,
            paths,
            limit,
            format,
            output,
            timeout_secs,
        }) => {
            let mut config = config;
            if let Some(limit) = limit {
                config.max_results = limit;
            }
            if timeout_secs.is_some() {
                config.search_timeout_secs = timeout_secs;
            }
            run_search(config, &query, &paths, format, output.as_deref())
        }
        Some(Commands::Analyze { paths, json }) => run_analyze(config, &paths, json),
        Some(Commands::AnalyzePath { path, json }) => run_analyze_path(config, &path, json),
        Some(Commands::Organize { path, execute, yes }) => {
            run_organize(config, path.as_deref(), execute, yes)
        }
        Some(Commands::Insights) => run_insights(config),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

/// Engine with the persisted preference table loaded. An unreadable table is
/// reported and replaced by an empty one.
fn open_engine(config: AppConfig) -> FileSageEngine {
    let path = PathBuf::from(&config.preferences_path);
    let preferences = match PreferenceStore::load(&path) {
        Ok(store) => store,
        Err(err) => {
            warn!("Starting with no preferences: {}", err);
            PreferenceStore::new()
        }
    };
    FileSageEngine::new(config).with_preferences(Arc::new(preferences))
}

fn run_search(
    config: AppConfig,
    query: &str,
    paths: &[PathBuf],
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let engine = open_engine(config);
    let reporter = CliReporter::new();
    let outcome = engine.search(query, paths, &reporter);

    if outcome.cancelled {
        warn!("Search was cut short; results are partial");
    }

    match format {
        ExportFormat::Table => {
            println!();
            if outcome.results.is_empty() {
                println!("No files matched '{}'", query.yellow());
            }
            for (rank, hit) in outcome.results.iter().enumerate() {
                print_hit(rank + 1, hit);
            }
            info!(
                "{} results in {}",
                format!("{}", outcome.total_found).green(),
                format!("{:.3}s", outcome.search_time).green(),
            );
        }
        ExportFormat::Json => write_output(output, |writer| {
            serde_json::to_writer_pretty(&mut *writer, &outcome)?;
            writeln!(writer)?;
            Ok(())
        })?,
        ExportFormat::Csv => write_output(output, |writer| write_csv(writer, &outcome.results))?,
    }
    Ok(())
}

fn print_hit(rank: usize, hit: &SearchHit) {
    println!(
        "{:>3}. {} {}",
        rank,
        hit.filename.bold(),
        format!("[{}]", hit.category).cyan()
    );
    println!(
        "     {}  {:.2} MB  modified {}  score {}",
        hit.path.dimmed(),
        hit.size_mb,
        hit.modified,
        format!("{:.2}", hit.relevance_score).green()
    );
}

fn write_output(
    output: Option<&Path>,
    write: impl FnOnce(&mut dyn Write) -> Result<()>,
) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            write(&mut file)?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write(&mut handle)?;
        }
    }
    Ok(())
}

fn write_csv<S: Serialize>(writer: &mut dyn Write, rows: &[S]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn run_analyze(config: AppConfig, paths: &[PathBuf], json: bool) -> Result<()> {
    let engine = open_engine(config);
    let reporter = CliReporter::new();
    let report = engine.analyze(paths, &reporter);

    if !report.cancelled {
        engine
            .save_preferences()
            .context("could not save learned preferences")?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn run_analyze_path(config: AppConfig, path: &Path, json: bool) -> Result<()> {
    let engine = open_engine(config);
    let reporter = CliReporter::new();
    let analysis = engine.analyze_path(path, &reporter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    match analysis {
        PathAnalysis::File(detail) => {
            println!("{}", detail.filename.bold());
            println!("  category:  {}", detail.category.to_string().cyan());
            println!("  size:      {} bytes ({:.2} MB)", detail.size, detail.size_mb);
            println!("  modified:  {}", detail.modified);
            if let Some(created) = &detail.created {
                println!("  created:   {}", created);
            }
            if let (Some(words), Some(lines)) = (detail.word_count, detail.line_count) {
                println!("  words:     {}", words);
                println!("  lines:     {}", lines);
            }
        }
        PathAnalysis::Directory(report) => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!();
    println!(
        "{} files, {} MB",
        format!("{}", report.total_files).green(),
        format!("{:.2}", report.total_size_mb).green()
    );
    for (category, stats) in &report.categories {
        let hour = report
            .activity
            .get(category)
            .map(|a| format!("busiest at {:02}:00", a.most_active_hour))
            .unwrap_or_default();
        println!(
            "  {:<12} {:>7} files {:>10.2} MB  {}",
            category.to_string().cyan(),
            stats.count,
            stats.size_mb(),
            hour.dimmed()
        );
    }
    print_suggestions(report);
    if report.cancelled {
        println!("{}", "Analysis was cut short; totals are partial.".yellow());
    }
}

fn print_suggestions(report: &AnalysisReport) {
    if report.suggestions.is_empty() {
        return;
    }
    println!();
    println!("{}", "Suggestions".bold());
    for suggestion in &report.suggestions {
        let tag = match suggestion.priority {
            Priority::High => "high".red(),
            Priority::Medium => "medium".yellow(),
            Priority::Low => "low".normal(),
        };
        println!("  [{}] {}", tag, suggestion.message);
    }
}

fn run_organize(config: AppConfig, path: Option<&Path>, execute: bool, yes: bool) -> Result<()> {
    let engine = open_engine(config);
    if engine.preferences().is_empty() {
        println!(
            "{}",
            "No preferences learned yet. Run `file-sage analyze` first.".yellow()
        );
        return Ok(());
    }

    let plan = engine.plan_organization(path, !execute)?;
    print_plan(&plan);

    if plan.is_empty() || !execute {
        return Ok(());
    }
    if !yes {
        let prompt = format!("Move {} files now?", plan.entries.len());
        if !prompt_confirm(&prompt, Some(false))? {
            println!("Nothing moved.");
            return Ok(());
        }
    }

    let reporter = CliReporter::new();
    let report = engine.execute(&plan, &reporter);
    for outcome in &report.outcomes {
        if let MoveStatus::Failed { reason } = &outcome.status {
            println!("  {} {}: {}", "✗".red(), outcome.file.display(), reason);
        }
    }
    info!(
        "{} moved, {} renamed, {} failed",
        format!("{}", report.moved).green(),
        format!("{}", report.renamed).yellow(),
        format!("{}", report.failed).red(),
    );
    Ok(())
}

fn print_plan(plan: &OrganizationPlan) {
    println!();
    println!(
        "{} files analyzed in {}, {} moves proposed{}",
        plan.files_analyzed,
        plan.source_dir.display(),
        format!("{}", plan.entries.len()).green(),
        if plan.dry_run { " (dry run)" } else { "" }
    );
    for entry in &plan.entries {
        println!(
            "  {} {} -> {}",
            format!("[{}]", entry.category).cyan(),
            entry.file_name,
            entry.target_dir.display()
        );
    }
}

fn run_insights(config: AppConfig) -> Result<()> {
    let engine = open_engine(config);
    let reporter = CliReporter::new();
    let report = engine.analyze(&[], &reporter);
    if !report.cancelled {
        engine
            .save_preferences()
            .context("could not save learned preferences")?;
    }

    println!();
    println!("{}", "Learned preferences".bold());
    let preferences = engine.preferences().snapshot();
    if preferences.is_empty() {
        println!("  none yet");
    }
    for preference in preferences.values() {
        println!(
            "  {:<12} -> {:<20} {}",
            preference.category.to_string().cyan(),
            preference.preferred_location,
            format!("{:.0}%", preference.confidence * 100.0).green()
        );
    }
    print_suggestions(&report);
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
