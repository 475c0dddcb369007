//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::archive::{compress_folders_in_folder, compress_output_tree, ArchiveSummary};
use crate::cli::progress::{
    format_duration, print_error, print_header, print_info, print_success, print_warning,
    SortProgress,
};
use crate::cli::{Args, Commands};
use crate::connectors::Connector;
use crate::core::config::{get_config_path, init_config, open_config_in_editor, Config};
use crate::core::walker::{ReleaseReport, ReleaseWalker};
use anyhow::{bail, Context, Result};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Run the appropriate command based on CLI arguments
///
/// Subcommand flags override the loaded configuration for this run only.
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        Commands::Sort {
            release,
            output,
            connector,
            presupported_root,
            report,
        } => {
            let mut config = config.clone();
            if let Some(output) = output {
                config.output.directory = output.clone();
            }
            if let Some(connector) = connector {
                config.sorting.connector = *connector;
            }
            if let Some(root) = presupported_root {
                config.sorting.presupported_root = Some(root.clone());
            }

            let result = sort_release(&config, release, shutdown_flag)?;
            if let Some(report_path) = report {
                write_report(&result, report_path)?;
            }
            if result.has_failures() {
                bail!("{} model folder(s) could not be sorted", result.failed.len());
            }
        }
        Commands::Compress { source, dest, tree } => {
            let summary = compress(config, source, dest, *tree)?;
            if summary.has_failures() {
                bail!("{} folder(s) could not be archived", summary.failed.len());
            }
        }
        Commands::Connectors => {
            list_connectors(config);
        }
        Commands::Config { path, reset } => {
            handle_config_command(*path, *reset)?;
        }
        Commands::GenerateConfig { output } => {
            generate_config_file(output.clone())?;
        }
        Commands::ShowConfig => {
            show_config(config);
        }
    }

    Ok(())
}

/// Sort one release into the configured output directory
pub fn sort_release(
    config: &Config,
    release: &Path,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<ReleaseReport> {
    let release_name = release
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| release.display().to_string());

    print_header(&format!("Sorting {}", release_name));
    print_info(&format!("Connector: {}", config.sorting.connector));
    print_info(&format!("Output: {}", config.output.directory.display()));

    let progress = Arc::new(SortProgress::new(&release_name));
    let callback_progress = Arc::clone(&progress);
    let walker = ReleaseWalker::new(config.sorting.profile())
        .with_shutdown_flag(shutdown_flag)
        .with_progress(move |update| {
            callback_progress.update(update.index, update.total, &update.current);
        });

    let result = walker.walk_release(release, &config.output.directory, &config.categories);
    progress.finish();
    let report = result.with_context(|| format!("Failed to sort {}", release.display()))?;

    print_release_summary(&report);
    print_info(&format!(
        "Finished in {}",
        format_duration(progress.elapsed())
    ));
    Ok(report)
}

fn print_release_summary(report: &ReleaseReport) {
    println!();
    for model in &report.processed {
        print_success(&format!(
            "{} -> {} ({})",
            model.raw_name, model.name, model.category
        ));
    }
    for warning in report.warnings() {
        print_warning(&warning.to_string());
    }
    for model in report
        .processed
        .iter()
        .filter(|m| m.supported_extensions.is_empty())
    {
        print_warning(&format!("No pre-supported files found for {}", model.name));
    }
    for failure in &report.failed {
        print_error(&format!("{}: {}", failure.folder.display(), failure.error));
    }
    if !report.ignored.is_empty() {
        print_info(&format!("Ignored {} loose file(s)", report.ignored.len()));
    }
    if report.interrupted {
        print_warning("Interrupted before all model folders were processed");
    }

    println!();
    info!("{}", report);
}

/// Write the JSON report of a sort run
pub fn write_report(report: &ReleaseReport, path: &Path) -> Result<()> {
    let json = report.to_json().context("Failed to serialize report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

/// Archive model folders with the configured external tool
pub fn compress(config: &Config, source: &Path, dest: &Path, tree: bool) -> Result<ArchiveSummary> {
    let compressor = config.archive.compressor();
    print_header(&format!("Archiving {}", source.display()));

    let summary = if tree {
        compress_output_tree(&compressor, source, dest)?
    } else {
        compress_folders_in_folder(&compressor, source, dest)?
    };

    for (name, reason) in &summary.failed {
        print_error(&format!("{}: {}", name, reason));
    }
    print_success(&format!(
        "Archived {} folder(s) into {}",
        summary.processed,
        dest.display()
    ));
    info!("{}", summary);
    Ok(summary)
}

/// Print the known vendor connectors
pub fn list_connectors(config: &Config) {
    print_header("Connectors");
    for connector in Connector::all() {
        let marker = if *connector == config.sorting.connector {
            " (configured)"
        } else {
            ""
        };
        println!("  {}{}", connector, marker);
        println!("      {}", connector.description());
    }
}

/// Handle the config command
pub fn handle_config_command(show_path: bool, reset: bool) -> Result<()> {
    if reset {
        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                fs::remove_file(&config_path)?;
                info!("Removed existing config file");
            }
        }
        let path = init_config()?;
        info!("Created fresh config file at: {}", path.display());
        return Ok(());
    }

    if show_path {
        let path = Config::get_active_config_path();
        println!("{}", path.display());
        if path.exists() {
            info!("Config file exists at: {}", path.display());
        } else {
            info!("Config file would be created at: {}", path.display());
        }
        return Ok(());
    }

    info!("Opening configuration file in default editor...");
    match open_config_in_editor() {
        Ok(path) => {
            info!("Config file: {}", path.display());
            info!("Run 'miniature-sorter show-config' to verify your settings.");
        }
        Err(e) => {
            error!("Failed to open config file: {}", e);
            if let Some(path) = get_config_path() {
                info!("You can manually edit the config at: {}", path.display());
            }
        }
    }

    Ok(())
}

/// Generate a configuration file at the specified or default location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let output_path = match output {
        Some(path) => {
            fs::write(&path, Config::generate_default_config())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path
        }
        None => init_config()?,
    };

    info!("Configuration file: {}", output_path.display());
    info!("List your category folders under [categories] before sorting.");
    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config) {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("");
    info!("[output]");
    info!("  directory = \"{}\"", config.output.directory.display());
    info!("");
    info!("[sorting]");
    info!("  connector = \"{}\"", config.sorting.connector);
    info!(
        "  presupported_root = {:?}",
        config
            .sorting
            .presupported_root
            .as_deref()
            .unwrap_or("(connector default)")
    );
    info!("");
    info!("[categories]");
    if config.categories.is_empty() {
        info!("  (none - everything goes to Characters)");
    }
    for (category, names) in &config.categories {
        info!("  {} = {:?}", category, names);
    }
    info!("");
    info!("[archive]");
    info!("  program = \"{}\"", config.archive.program.display());
    info!("  args = {:?}", config.archive.args);
    info!("  extension = \"{}\"", config.archive.extension);
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
}
