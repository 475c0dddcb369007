//! Miniature Sorter Library
//!
//! Reorganizes monthly 3D-printable miniature releases into a browsable
//! library: one folder per category, split into pre-supported and unsupported
//! tiers, with a normalized name and a cover image for every model.
//!
//! # Architecture
//!
//! - [`core`] - Sorting engine, configuration, and error handling
//! - [`connectors`] - Per-vendor layout profiles
//! - [`archive`] - Archiving the sorted tree with an external tool
//! - [`cli`] - Command-line interface (only used by the binary)
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use miniature_sorter::connectors::Connector;
//! use miniature_sorter::core::config::Config;
//! use miniature_sorter::core::walker::ReleaseWalker;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!
//!     let walker = ReleaseWalker::new(Connector::CastNPlay.profile());
//!     let report = walker.walk_release(
//!         Path::new("November 2025"),
//!         &config.output.directory,
//!         &config.categories,
//!     )?;
//!
//!     for failure in &report.failed {
//!         eprintln!("{}: {}", failure.folder.display(), failure.error);
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod connectors;
pub mod core;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
