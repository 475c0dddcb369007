//! Core functionality module
//!
//! This module contains the sorting engine: configuration, error handling,
//! name normalization, cover detection, tier extraction and the release walker.
//!
//! # Submodules
//!
//! - `category` - Category mapping validation and lookup
//! - `config` - Configuration loading, saving, and management
//! - `consistency` - Supported vs. unsupported file count checks
//! - `error` - Error types and result aliases
//! - `extract` - Extension-filtered tree copying
//! - `image` - Cover image detection
//! - `naming` - Folder name normalization
//! - `profile` - Vendor layout rules
//! - `tiers` - Tier layout detection and extraction
//! - `walker` - Per-release and per-model processing

pub mod category;
pub mod config;
pub mod consistency;
pub mod error;
pub mod extract;
pub mod image;
pub mod naming;
pub mod profile;
pub mod tiers;
pub mod walker;
