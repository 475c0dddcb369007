//! File extraction primitives
//!
//! All copies are non-destructive: sources are only read, destinations are
//! overwritten in place, and access/modification times are carried over so a
//! re-run produces an identical tree.

use crate::core::error::{Result, SortError};
use crate::core::profile::normalize_extension;
use filetime::FileTime;
use log::{debug, trace};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Copy a file and restore its access and modification times on the copy
pub fn copy_preserving_times(source: &Path, target: &Path) -> Result<u64> {
    let bytes = fs::copy(source, target).map_err(|e| SortError::io(source, e))?;

    let metadata = fs::metadata(source).map_err(|e| SortError::io(source, e))?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    let atime = FileTime::from_last_access_time(&metadata);
    filetime::set_file_times(target, atime, mtime).map_err(|e| SortError::io(target, e))?;

    trace!("Copied {} -> {}", source.display(), target.display());
    Ok(bytes)
}

/// Create a directory and its parents, tolerating an existing one
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| SortError::io(path, e))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase().ends_with(extension))
        .unwrap_or(false)
}

/// Relative path with every directory segment named in `strip` removed
fn strip_segments(relative: &Path, strip: &HashSet<&str>) -> PathBuf {
    let components: Vec<Component> = relative.components().collect();
    let last = components.len().saturating_sub(1);

    components
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            *i == last
                || !c
                    .as_os_str()
                    .to_str()
                    .map(|name| strip.contains(name))
                    .unwrap_or(false)
        })
        .map(|(_, c)| c.as_os_str())
        .collect()
}

/// Copy every file with `extension` under `source_root` into `dest_root`
///
/// The path relative to `source_root` is kept, minus any directory segment
/// named in `strip`. Returns whether at least one file matched; nothing is
/// created when none did.
pub fn extract_extension<S: AsRef<str>>(
    source_root: &Path,
    extension: &str,
    dest_root: &Path,
    strip: &[S],
) -> Result<bool> {
    let extension = normalize_extension(extension);
    let strip: HashSet<&str> = strip.iter().map(|s| s.as_ref()).collect();

    if !source_root.is_dir() {
        debug!(
            "Nothing to extract, {} is not a directory",
            source_root.display()
        );
        return Ok(false);
    }

    let mut found = false;
    for entry in WalkDir::new(source_root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_extension(entry.path(), &extension) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_root)
            .unwrap_or(entry.path());
        let target = dest_root.join(strip_segments(relative, &strip));

        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        copy_preserving_times(entry.path(), &target)?;
        found = true;
    }

    Ok(found)
}

/// Copy a whole subtree verbatim; returns the number of files copied
pub fn copy_tree(source_root: &Path, dest_root: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(source_root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source_root)
            .unwrap_or(entry.path());
        let target = dest_root.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            copy_preserving_times(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Number of regular files under `root`; zero when it does not exist
pub fn count_files(root: &Path) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        if entry?.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}
