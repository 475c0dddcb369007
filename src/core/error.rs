//! Error types for the miniature sorter
//!
//! Per-model errors (name, image, nesting) abort only the model that raised
//! them; the release walker records them and moves on. Category-mapping errors
//! are raised before any output is written.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for the sorting engine and the archiver
#[derive(Error, Debug)]
pub enum SortError {
    /// No recognized cover image directly inside a model folder
    #[error("Failed to find an image in '{}'", .folder.display())]
    ImageNotFound { folder: PathBuf },

    /// More than one cover candidate directly inside a model folder
    #[error("Found {} images in '{}': {candidates:?}", .candidates.len(), .folder.display())]
    MultipleImagesFound {
        folder: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// The folder name matched no naming rule
    #[error("Cannot derive a model name from '{raw}': {reason}")]
    NameFormat { raw: String, reason: String },

    /// A raw folder name is listed under two categories
    #[error("'{name}' is listed under both '{first}' and '{second}'")]
    DuplicateCategoryMembership {
        name: String,
        first: String,
        second: String,
    },

    /// The external archiving tool exited with a non-zero status
    #[error("Archive tool failed for '{}': {diagnostics}", .source_folder.display())]
    ArchiveTool {
        source_folder: PathBuf,
        diagnostics: String,
    },

    /// A required input directory does not exist
    #[error("Source folder does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Same-name nesting went deeper than the flatten guard allows
    #[error("Folder '{}' is nested into itself more than {depth} times", .folder.display())]
    NestingTooDeep { folder: PathBuf, depth: usize },

    /// I/O error with the path that caused it
    #[error("IO error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SortError>;

impl SortError {
    /// Wrap an I/O error together with the path it concerns
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SortError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<walkdir::Error> for SortError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
        SortError::Io { path, source }
    }
}
