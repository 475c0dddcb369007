//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use crate::connectors::Connector;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sort monthly 3D miniature releases into a category/tier library
#[derive(Parser, Debug)]
#[command(name = "miniature-sorter")]
#[command(version)]
#[command(about = "Sort monthly 3D miniature releases into Presupported/Unsupported category folders", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sort a release folder into the output library
    Sort {
        /// Release folder containing one folder per model
        release: PathBuf,

        /// Output directory for the sorted library (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Vendor layout of the release (overrides config)
        #[arg(long, value_enum)]
        connector: Option<Connector>,

        /// Name of the pre-supported folder inside model folders (overrides config)
        #[arg(long, value_name = "NAME")]
        presupported_root: Option<String>,

        /// Write a JSON report of the run to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Archive every model folder with the configured external archiver
    ///
    /// By default every direct subfolder of SOURCE becomes one archive in
    /// DEST. With --tree, SOURCE is a sorted library and the
    /// <Category>/<Tier> layout is mirrored under DEST.
    Compress {
        /// Folder to archive
        source: PathBuf,

        /// Destination folder for the archives
        dest: PathBuf,

        /// Treat SOURCE as a sorted output tree
        #[arg(long)]
        tree: bool,
    },

    /// List supported vendor connectors
    Connectors,

    /// Open the configuration file in your default editor
    ///
    /// The config file is stored at:
    /// - Windows: %APPDATA%\miniature_sorter\config.toml
    /// - Linux: ~/.config/miniature_sorter/config.toml
    ///
    /// If no config file exists, a default one will be created.
    Config {
        /// Show the config file path without opening it
        #[arg(long)]
        path: bool,

        /// Reset config to defaults (creates a fresh config file)
        #[arg(long)]
        reset: bool,
    },

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show current configuration
    ShowConfig,
}
