//! Archiving of sorted output
//!
//! Compression is delegated to an external command-line tool behind the
//! [`Compressor`] trait so the backend can be swapped without touching the
//! sorting engine.

use crate::core::error::{Result, SortError};
use crate::core::extract::ensure_dir;
use crate::core::profile::{PRESUPPORTED_DIR, UNSUPPORTED_DIR};
use log::{debug, error, info};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Compresses one folder into one archive file
pub trait Compressor {
    /// Archive `source_folder` into `archive_path`
    fn compress(&self, source_folder: &Path, archive_path: &Path) -> Result<()>;

    /// File extension of produced archives, without the dot
    fn extension(&self) -> &str;
}

/// Compressor backed by an external archiver such as `rar`
///
/// Runs `<program> <args..> <archive> <folder name>` inside the parent of the
/// folder so the archive holds relative paths only.
#[derive(Debug, Clone)]
pub struct ExternalCompressor {
    program: PathBuf,
    args: Vec<String>,
    extension: String,
}

impl ExternalCompressor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, extension: &str) -> Self {
        Self {
            program: program.into(),
            args,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// `rar a <archive> <folder>`
    pub fn rar() -> Self {
        Self::new("rar", vec!["a".to_string()], "rar")
    }
}

impl Default for ExternalCompressor {
    fn default() -> Self {
        Self::rar()
    }
}

impl Compressor for ExternalCompressor {
    fn compress(&self, source_folder: &Path, archive_path: &Path) -> Result<()> {
        if !source_folder.is_dir() {
            return Err(SortError::SourceMissing(source_folder.to_path_buf()));
        }

        // The tool runs inside the folder's parent, so a relative archive path
        // must be resolved against our own working directory first.
        let archive_path = std::path::absolute(archive_path)
            .map_err(|e| SortError::io(archive_path, e))?;
        let archive_path = archive_path.as_path();

        if archive_path.exists() {
            debug!("Removing existing archive {}", archive_path.display());
            fs::remove_file(archive_path).map_err(|e| SortError::io(archive_path, e))?;
        }

        let folder_name = source_folder.file_name().unwrap_or_default();
        let working_dir = source_folder.parent().unwrap_or_else(|| Path::new("."));

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(archive_path)
            .arg(folder_name)
            .current_dir(working_dir)
            .output()
            .map_err(|e| SortError::io(&self.program, e))?;

        if !output.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if diagnostics.is_empty() {
                diagnostics = format!("{} exited with {}", self.program.display(), output.status);
            }
            return Err(SortError::ArchiveTool {
                source_folder: source_folder.to_path_buf(),
                diagnostics,
            });
        }

        info!(
            "Archived {} -> {}",
            source_folder.display(),
            archive_path.display()
        );
        Ok(())
    }

    fn extension(&self) -> &str {
        &self.extension
    }
}

/// Outcome of a batch archiving run
#[derive(Debug, Default, Serialize)]
pub struct ArchiveSummary {
    /// Number of folders archived successfully
    pub processed: usize,
    /// Plain files skipped in the source folder
    pub ignored: Vec<String>,
    /// Folder names that failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl ArchiveSummary {
    pub fn merge(&mut self, other: ArchiveSummary) {
        self.processed += other.processed;
        self.ignored.extend(other.ignored);
        self.failed.extend(other.failed);
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for ArchiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed: {}, Ignored: {:?}, Failed: {}",
            self.processed,
            self.ignored,
            self.failed.len()
        )
    }
}

/// Archive every direct subfolder of `source_root` into `dest_root`
///
/// Archives are named `<folder>.<extension>`. Failures are collected and do
/// not stop the batch.
pub fn compress_folders_in_folder<C: Compressor + ?Sized>(
    compressor: &C,
    source_root: &Path,
    dest_root: &Path,
) -> Result<ArchiveSummary> {
    if !source_root.is_dir() {
        return Err(SortError::SourceMissing(source_root.to_path_buf()));
    }
    ensure_dir(dest_root)?;

    let mut entries = Vec::new();
    for entry in fs::read_dir(source_root).map_err(|e| SortError::io(source_root, e))? {
        entries.push(entry.map_err(|e| SortError::io(source_root, e))?.path());
    }
    entries.sort();

    let mut summary = ArchiveSummary::default();
    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !path.is_dir() {
            debug!("Skipping file {}", path.display());
            summary.ignored.push(name);
            continue;
        }

        let archive = dest_root.join(format!("{}.{}", name, compressor.extension()));
        match compressor.compress(&path, &archive) {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                error!("Failed to archive {}: {}", path.display(), e);
                summary.failed.push((name, e.to_string()));
            }
        }
    }

    info!("Archived {}: {}", source_root.display(), summary);
    Ok(summary)
}

/// Archive every `<Category>/{Presupported,Unsupported}` folder of a sorted
/// output tree into the same layout under `dest_root`
pub fn compress_output_tree<C: Compressor + ?Sized>(
    compressor: &C,
    output_root: &Path,
    dest_root: &Path,
) -> Result<ArchiveSummary> {
    if !output_root.is_dir() {
        return Err(SortError::SourceMissing(output_root.to_path_buf()));
    }

    let mut categories = Vec::new();
    for entry in fs::read_dir(output_root).map_err(|e| SortError::io(output_root, e))? {
        let path = entry.map_err(|e| SortError::io(output_root, e))?.path();
        if path.is_dir() {
            categories.push(path);
        }
    }
    categories.sort();

    let mut summary = ArchiveSummary::default();
    for category in categories {
        let Some(category_name) = category.file_name() else {
            continue;
        };
        for tier in [PRESUPPORTED_DIR, UNSUPPORTED_DIR] {
            let source = category.join(tier);
            if !source.is_dir() {
                continue;
            }
            let dest = dest_root.join(category_name).join(tier);
            summary.merge(compress_folders_in_folder(compressor, &source, &dest)?);
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records calls and fails for folder names starting with `bad`
    #[derive(Default)]
    struct RecordingCompressor {
        calls: RefCell<Vec<(PathBuf, PathBuf)>>,
    }

    impl Compressor for RecordingCompressor {
        fn compress(&self, source_folder: &Path, archive_path: &Path) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((source_folder.to_path_buf(), archive_path.to_path_buf()));
            let name = source_folder.file_name().unwrap().to_string_lossy();
            if name.starts_with("bad") {
                return Err(SortError::ArchiveTool {
                    source_folder: source_folder.to_path_buf(),
                    diagnostics: "boom".to_string(),
                });
            }
            fs::write(archive_path, b"archive").map_err(|e| SortError::io(archive_path, e))
        }

        fn extension(&self) -> &str {
            "rar"
        }
    }

    #[test]
    fn test_batch_skips_files_and_collects_failures() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Presupported");
        fs::create_dir_all(source.join("22. Mimic")).unwrap();
        fs::create_dir_all(source.join("bad model")).unwrap();
        fs::write(source.join("22. Mimic.png"), b"cover").unwrap();
        let dest = temp.path().join("archives");

        let compressor = RecordingCompressor::default();
        let summary = compress_folders_in_folder(&compressor, &source, &dest).unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.ignored, vec!["22. Mimic.png".to_string()]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "bad model");
        assert!(dest.join("22. Mimic.rar").is_file());
        assert_eq!(compressor.calls.borrow().len(), 2);
    }

    #[test]
    fn test_output_tree_layout_is_mirrored() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("result");
        fs::create_dir_all(output.join("Characters/Presupported/1. Knight")).unwrap();
        fs::create_dir_all(output.join("Characters/Unsupported/1. Knight")).unwrap();
        fs::create_dir_all(output.join("Terrain/Presupported/60. Ghosts")).unwrap();
        let dest = temp.path().join("rar_result");

        let summary = compress_output_tree(&RecordingCompressor::default(), &output, &dest).unwrap();

        assert_eq!(summary.processed, 3);
        assert!(dest.join("Characters/Presupported/1. Knight.rar").is_file());
        assert!(dest.join("Characters/Unsupported/1. Knight.rar").is_file());
        assert!(dest.join("Terrain/Presupported/60. Ghosts.rar").is_file());
    }

    #[test]
    fn test_missing_source_folder() {
        let temp = TempDir::new().unwrap();
        let err = ExternalCompressor::rar()
            .compress(&temp.path().join("missing"), &temp.path().join("a.rar"))
            .unwrap_err();
        assert!(matches!(err, SortError::SourceMissing(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_archive_tool_error() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("model");
        fs::create_dir_all(&folder).unwrap();

        let compressor = ExternalCompressor::new("false", Vec::new(), "rar");
        let err = compressor
            .compress(&folder, &temp.path().join("model.rar"))
            .unwrap_err();

        assert!(matches!(err, SortError::ArchiveTool { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_destination_resolves_against_working_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("result/1. Knight")).unwrap();
        let previous_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp.path()).unwrap();

        let compressor = ExternalCompressor::new(
            "sh",
            vec!["-c".to_string(), "touch \"$0\"".to_string()],
            "rar",
        );
        let summary =
            compress_folders_in_folder(&compressor, Path::new("result"), Path::new("rar_result"));
        std::env::set_current_dir(previous_dir).unwrap();

        let summary = summary.unwrap();
        assert_eq!(summary.processed, 1, "{summary}");
        assert!(temp.path().join("rar_result/1. Knight.rar").is_file());
        assert!(!temp.path().join("result/rar_result").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_archive_is_removed_first() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("model");
        fs::create_dir_all(&folder).unwrap();
        let archive = temp.path().join("model.rar");
        fs::write(&archive, b"stale").unwrap();

        ExternalCompressor::new("true", Vec::new(), ".rar")
            .compress(&folder, &archive)
            .unwrap();

        assert!(!archive.exists());
    }
}
