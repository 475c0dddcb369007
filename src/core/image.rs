//! Cover image detection
//!
//! A model folder carries exactly one cover image among its direct children.
//! Some vendors put preview renders next to the cover; for those a marker
//! prefix (e.g. `_`) tells the real cover apart.

use crate::core::error::{Result, SortError};
use crate::core::profile::normalize_extension;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Finds the single cover image of a model folder
#[derive(Debug, Clone)]
pub struct ImageLocator {
    extensions: Vec<String>,
    marker: Option<String>,
}

impl ImageLocator {
    /// Locator accepting any file with one of the given extensions
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect(),
            marker: None,
        }
    }

    /// Additionally require the cover file name to start with `marker`
    pub fn with_marker(mut self, marker: Option<String>) -> Self {
        self.marker = marker;
        self
    }

    /// Whether a path has a recognized image extension (case-insensitive)
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&normalize_extension(e)))
            .unwrap_or(false)
    }

    /// Return the single cover image directly inside `folder`
    pub fn locate(&self, folder: &Path) -> Result<PathBuf> {
        let entries = fs::read_dir(folder).map_err(|e| SortError::io(folder, e))?;

        let mut images = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| SortError::io(folder, e))?.path();
            if path.is_file() && self.is_image(&path) {
                images.push(path);
            }
        }
        images.sort();
        debug!(
            "Found {} image(s) in {}: {:?}",
            images.len(),
            folder.display(),
            images
        );

        let mut candidates: Vec<PathBuf> = match &self.marker {
            Some(marker) => images
                .into_iter()
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with(marker.as_str()))
                        .unwrap_or(false)
                })
                .collect(),
            None => images,
        };

        match candidates.len() {
            0 => Err(SortError::ImageNotFound {
                folder: folder.to_path_buf(),
            }),
            1 => Ok(candidates.remove(0)),
            _ => Err(SortError::MultipleImagesFound {
                folder: folder.to_path_buf(),
                candidates,
            }),
        }
    }
}
