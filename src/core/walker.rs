//! Release walking
//!
//! A release is a folder of model folders. Each model folder is flattened,
//! named, assigned a category and extracted into
//! `<Category>/{Presupported,Unsupported}/<Name>/`. A failing model is recorded
//! and skipped; the rest of the release is still processed.
//!
//! # Example
//!
//! ```rust,no_run
//! use miniature_sorter::core::profile::SortProfile;
//! use miniature_sorter::core::walker::ReleaseWalker;
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! let walker = ReleaseWalker::new(SortProfile::default());
//! let report = walker
//!     .walk_release(Path::new("November 2025"), Path::new("result"), &BTreeMap::new())
//!     .unwrap();
//! println!("{}", report);
//! ```

use crate::core::category::CategoryMap;
use crate::core::consistency::{check_model, ConsistencyWarning};
use crate::core::error::{Result, SortError};
use crate::core::extract::{copy_preserving_times, ensure_dir};
use crate::core::image::ImageLocator;
use crate::core::naming::normalize;
use crate::core::profile::{
    CoverPlacement, SortProfile, MODELS_DIR, PRESUPPORTED_DIR, UNSUPPORTED_DIR,
};
use crate::core::tiers::{TierClassifier, TierLayout};
use log::{debug, error, info, warn};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Maximum number of same-name folder levels unwrapped for one model
pub const MAX_NESTING_DEPTH: usize = 16;

// =============================================================================
// Report
// =============================================================================

/// Result of one successfully sorted model
#[derive(Debug, Clone, Serialize)]
pub struct ModelOutcome {
    /// Folder name as found in the release
    pub raw_name: String,
    /// Canonical `<id>. <title>` name used in the output
    pub name: String,
    pub category: String,
    /// Folder actually processed, after flattening
    pub source: PathBuf,
    pub layout: TierLayout,
    /// Pre-supported extensions that yielded files
    pub supported_extensions: Vec<String>,
    /// Whether any raw mesh was found
    pub unsupported_found: bool,
    /// Separated tier locations this model does not have
    pub missing_locations: Vec<PathBuf>,
    pub warnings: Vec<ConsistencyWarning>,
}

/// A model folder that could not be sorted
#[derive(Debug, Serialize)]
pub struct ModelFailure {
    pub folder: PathBuf,
    #[serde(serialize_with = "serialize_error")]
    pub error: SortError,
}

fn serialize_error<S: Serializer>(
    error: &SortError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// Accounting for a whole release run
#[derive(Debug, Default, Serialize)]
pub struct ReleaseReport {
    pub processed: Vec<ModelOutcome>,
    pub failed: Vec<ModelFailure>,
    /// Loose files directly under the release root
    pub ignored: Vec<PathBuf>,
    /// Set when a shutdown request stopped the walk early
    pub interrupted: bool,
    pub duration_ms: u64,
}

impl ReleaseReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// All consistency warnings across processed models
    pub fn warnings(&self) -> impl Iterator<Item = &ConsistencyWarning> {
        self.processed.iter().flat_map(|m| m.warnings.iter())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ReleaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed: {}, Failed: {}, Ignored: {}, Warnings: {}, Duration: {:.2}s",
            self.processed.len(),
            self.failed.len(),
            self.ignored.len(),
            self.warnings().count(),
            self.duration_ms as f64 / 1000.0
        )
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Progress update emitted before each model folder is processed
#[derive(Debug, Clone)]
pub struct WalkProgress {
    /// Folder name currently being processed
    pub current: String,
    /// 1-based index among the release entries
    pub index: usize,
    pub total: usize,
}

type ProgressCallback = Arc<dyn Fn(WalkProgress) + Send + Sync>;

// =============================================================================
// Walker
// =============================================================================

/// Sorts every model folder of a release according to a profile
pub struct ReleaseWalker {
    profile: SortProfile,
    locator: ImageLocator,
    shutdown_flag: Arc<AtomicBool>,
    progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ReleaseWalker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseWalker")
            .field("profile", &self.profile)
            .field("locator", &self.locator)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ReleaseWalker {
    pub fn new(profile: SortProfile) -> Self {
        let locator = ImageLocator::new(profile.image_extensions.as_slice())
            .with_marker(profile.cover_marker.clone());
        Self {
            profile,
            locator,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            progress_callback: None,
        }
    }

    /// Share a shutdown flag; the walk stops before the next model once set
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = flag;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(WalkProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Sort every model folder of `release_root` into `output_root`
    ///
    /// Category mapping errors are returned before anything is written.
    /// Per-model errors are collected in the report.
    pub fn walk_release(
        &self,
        release_root: &Path,
        output_root: &Path,
        mapping: &BTreeMap<String, Vec<String>>,
    ) -> Result<ReleaseReport> {
        let start_time = Instant::now();

        if !release_root.is_dir() {
            return Err(SortError::SourceMissing(release_root.to_path_buf()));
        }

        let categories = CategoryMap::new(mapping)?;
        categories.prepare_output(output_root)?;

        let children = sorted_children(release_root)?;
        let total = children.len();
        info!(
            "Sorting {} entries of {} with profile '{}'",
            total,
            release_root.display(),
            self.profile.name
        );

        let mut report = ReleaseReport::default();
        for (index, child) in children.into_iter().enumerate() {
            if self.shutdown_flag.load(Ordering::SeqCst) {
                info!("Sorting interrupted, {} entries left", total - index);
                report.interrupted = true;
                break;
            }

            if !child.is_dir() {
                debug!("Skipping file {} as it is not a model folder", child.display());
                report.ignored.push(child);
                continue;
            }

            if let Some(callback) = &self.progress_callback {
                callback(WalkProgress {
                    current: file_name_of(&child),
                    index: index + 1,
                    total,
                });
            }

            match self.process_model(&child, output_root, &categories) {
                Ok(outcome) => {
                    info!("Sorted '{}' into {}", outcome.name, outcome.category);
                    report.processed.push(outcome);
                }
                Err(e) => {
                    error!("Failed to sort {}: {}", child.display(), e);
                    report.failed.push(ModelFailure {
                        folder: child,
                        error: e,
                    });
                }
            }
        }

        report.duration_ms =
            u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!("{}", report);
        Ok(report)
    }

    /// Sort a single model folder; `categories` decides its output category
    pub fn process_model(
        &self,
        folder: &Path,
        output_root: &Path,
        categories: &CategoryMap,
    ) -> Result<ModelOutcome> {
        let raw_name = file_name_of(folder);
        let model_folder = flatten_same_name(folder)?;
        let name = normalize(&raw_name, &self.profile.naming)?.to_string();
        let category = categories.category_of(&raw_name).to_string();
        let category_root = output_root.join(&category);

        let cover = self.locator.locate(&model_folder)?;

        let unsupported_dest = category_root.join(UNSUPPORTED_DIR).join(&name);
        let supported_dest = category_root.join(PRESUPPORTED_DIR).join(&name);
        ensure_dir(&unsupported_dest)?;
        ensure_dir(&supported_dest)?;

        self.copy_cover(
            &cover,
            &name,
            &category_root,
            &[unsupported_dest.as_path(), supported_dest.as_path()],
        )?;

        let classifier = TierClassifier::new(&self.profile);
        let unsupported_found = classifier.extract_unsupported(&model_folder, &unsupported_dest)?;
        if !unsupported_found {
            debug!("No raw meshes found for {}", model_folder.display());
        }

        let supported = classifier.classify_supported(&model_folder, &supported_dest)?;
        let warnings = if supported.is_empty() {
            warn!(
                "Did not find presupported files for {}!",
                model_folder.display()
            );
            Vec::new()
        } else {
            check_model(
                &name,
                &unsupported_dest.join(MODELS_DIR),
                &supported_dest.join(MODELS_DIR),
                &supported.extensions,
                &self.profile.extensions,
            )?
        };

        Ok(ModelOutcome {
            raw_name,
            name,
            category,
            source: model_folder,
            layout: supported.layout,
            supported_extensions: supported.extensions,
            unsupported_found,
            missing_locations: supported.missing_locations,
            warnings,
        })
    }

    fn copy_cover(
        &self,
        cover: &Path,
        name: &str,
        category_root: &Path,
        tier_folders: &[&Path],
    ) -> Result<()> {
        let file_name = match cover.extension() {
            Some(ext) => format!("{}.{}", name, ext.to_string_lossy()),
            None => name.to_string(),
        };

        match self.profile.cover_placement {
            CoverPlacement::CategoryRoot => {
                copy_preserving_times(cover, &category_root.join(&file_name))?;
            }
            CoverPlacement::TierFolders => {
                for folder in tier_folders {
                    copy_preserving_times(cover, &folder.join(&file_name))?;
                }
            }
        }
        Ok(())
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sorted_children(root: &Path) -> Result<Vec<PathBuf>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| SortError::io(root, e))? {
        children.push(entry.map_err(|e| SortError::io(root, e))?.path());
    }
    children.sort();
    Ok(children)
}

/// Descend while the only subfolder of `folder` has the folder's own name
///
/// Fails once more than [`MAX_NESTING_DEPTH`] levels were unwrapped, which
/// only happens with self-referencing links.
pub fn flatten_same_name(folder: &Path) -> Result<PathBuf> {
    let name = folder.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    let mut current = folder.to_path_buf();
    let mut depth = 0;

    loop {
        let subfolders: Vec<PathBuf> = sorted_children(&current)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect();

        if subfolders.len() != 1 || subfolders[0].file_name() != Some(name.as_os_str()) {
            return Ok(current);
        }
        if depth == MAX_NESTING_DEPTH {
            return Err(SortError::NestingTooDeep {
                folder: folder.to_path_buf(),
                depth,
            });
        }

        debug!("Going deeper to {}", subfolders[0].display());
        current = subfolders[0].clone();
        depth += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category::DEFAULT_CATEGORY;
    use crate::core::extract::count_files;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn no_categories() -> BTreeMap<String, Vec<String>> {
        BTreeMap::new()
    }

    fn build_mimic(release: &Path) {
        let model = release.join("22. Mimic");
        touch(&model.join("Mimic_CastnPlay.png"), b"cover");
        touch(&model.join("Pre-Supported/Mimic_Supported.stl"), b"s");
        touch(&model.join("Pre-Supported/Mimic_Supported.chitubox"), b"c");
        touch(&model.join("Unsupported/Mimic.stl"), b"u");
    }

    fn build_ghosts(release: &Path) {
        let model = release.join("60_Ghosts");
        touch(&model.join("Ghosts.jpg"), b"cover");
        for part in ["A", "B"] {
            touch(&model.join(format!("Pre-Supported/STL/{part}_Supported.stl")), b"s");
            touch(&model.join(format!("Pre-Supported/LYS/{part}_Supported.lys")), b"l");
            touch(&model.join(format!("Unsupported/{part}.stl")), b"u");
        }
    }

    #[test]
    fn test_mixed_release_end_to_end() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        build_mimic(&release);

        let report = ReleaseWalker::new(SortProfile::default())
            .walk_release(&release, &output, &no_categories())
            .unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.processed.len(), 1);
        let root = output.join(DEFAULT_CATEGORY);
        assert!(root
            .join("Presupported/22. Mimic/Models/STL/Mimic_Supported.stl")
            .is_file());
        assert!(root
            .join("Presupported/22. Mimic/Models/CHITU/Mimic_Supported.chitubox")
            .is_file());
        assert!(root.join("Unsupported/22. Mimic/Models/STL/Mimic.stl").is_file());
        assert!(root.join("Presupported/22. Mimic/22. Mimic.png").is_file());
        assert!(root.join("Unsupported/22. Mimic/22. Mimic.png").is_file());
    }

    #[test]
    fn test_separated_release_with_category() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        build_ghosts(&release);
        let mut mapping = BTreeMap::new();
        mapping.insert("Terrain".to_string(), vec!["60_Ghosts".to_string()]);

        let report = ReleaseWalker::new(SortProfile::default())
            .walk_release(&release, &output, &mapping)
            .unwrap();

        let outcome = &report.processed[0];
        assert_eq!(outcome.name, "60. Ghosts");
        assert_eq!(outcome.category, "Terrain");
        assert_eq!(outcome.layout, TierLayout::Separated);
        assert!(outcome.warnings.is_empty());

        let models = output.join("Terrain/Presupported/60. Ghosts/Models");
        assert_eq!(count_files(&models.join("STL")).unwrap(), 2);
        assert_eq!(count_files(&models.join("LYS")).unwrap(), 2);
        assert!(!models.join("CHITU").exists());
        assert!(output.join(DEFAULT_CATEGORY).join(PRESUPPORTED_DIR).is_dir());
    }

    #[test]
    fn test_consistency_mismatch_is_a_warning() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        let model = release.join("9_Troll");
        touch(&model.join("troll.png"), b"cover");
        for part in ["a", "b", "c"] {
            touch(&model.join(format!("Unsupported/{part}.stl")), b"u");
        }
        touch(&model.join("Pre-Supported/a.stl"), b"s");
        touch(&model.join("Pre-Supported/b.stl"), b"s");

        let report = ReleaseWalker::new(SortProfile::default())
            .walk_release(&release, &output, &no_categories())
            .unwrap();

        assert!(!report.has_failures());
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].unsupported_count, 3);
        assert_eq!(warnings[0].supported_count, 2);
    }

    #[test]
    fn test_failures_are_accumulated() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        build_mimic(&release);
        touch(&release.join("7_NoCover/Pre-Supported/a.stl"), b"s");
        touch(&release.join("Bad_Name_Here/cover.png"), b"c");
        touch(&release.join("notes.txt"), b"loose");

        let report = ReleaseWalker::new(SortProfile::default())
            .walk_release(&release, &output, &no_categories())
            .unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.ignored, vec![release.join("notes.txt")]);
        assert!(report
            .failed
            .iter()
            .any(|f| matches!(f.error, SortError::ImageNotFound { .. })));
        assert!(report
            .failed
            .iter()
            .any(|f| matches!(f.error, SortError::NameFormat { .. })));
    }

    #[test]
    fn test_invalid_mapping_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        build_mimic(&release);
        let mut mapping = BTreeMap::new();
        mapping.insert("Monsters".to_string(), vec!["22. Mimic".to_string()]);
        mapping.insert("Props".to_string(), vec!["22. Mimic".to_string()]);

        let err = ReleaseWalker::new(SortProfile::default())
            .walk_release(&release, &output, &mapping)
            .unwrap_err();

        assert!(matches!(err, SortError::DuplicateCategoryMembership { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_nested_model_folder_is_flattened() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        let inner = release.join("5_Nest/5_Nest/5_Nest");
        touch(&inner.join("nest.png"), b"cover");
        touch(&inner.join("Pre-Supported/nest.stl"), b"s");
        touch(&inner.join("Unsupported/nest.stl"), b"u");

        assert_eq!(flatten_same_name(&release.join("5_Nest")).unwrap(), inner);

        let report = ReleaseWalker::new(SortProfile::default())
            .walk_release(&release, &output, &no_categories())
            .unwrap();
        assert_eq!(report.processed[0].name, "5. Nest");
        assert!(output
            .join(DEFAULT_CATEGORY)
            .join("Presupported/5. Nest/Models/STL/nest.stl")
            .is_file());
    }

    #[test]
    fn test_flatten_stops_at_different_name() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("5_Nest");
        fs::create_dir_all(folder.join("Other")).unwrap();
        assert_eq!(flatten_same_name(&folder).unwrap(), folder);
    }

    #[cfg(unix)]
    #[test]
    fn test_self_referencing_link_hits_depth_guard() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("loop");
        fs::create_dir_all(&folder).unwrap();
        std::os::unix::fs::symlink(&folder, folder.join("loop")).unwrap();

        let err = flatten_same_name(&folder).unwrap_err();
        assert!(matches!(err, SortError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_cover_in_category_root() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        build_mimic(&release);
        let profile = SortProfile {
            cover_placement: CoverPlacement::CategoryRoot,
            ..SortProfile::default()
        };

        ReleaseWalker::new(profile)
            .walk_release(&release, &output, &no_categories())
            .unwrap();

        let root = output.join(DEFAULT_CATEGORY);
        assert_eq!(fs::read(root.join("22. Mimic.png")).unwrap(), b"cover");
        assert!(!root.join("Presupported/22. Mimic/22. Mimic.png").exists());
    }

    #[test]
    fn test_rerun_keeps_unrelated_content() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        build_ghosts(&release);
        let unrelated = output.join("Keep/me.txt");
        touch(&unrelated, b"keep");

        let walker = ReleaseWalker::new(SortProfile::default());
        walker.walk_release(&release, &output, &no_categories()).unwrap();
        let report = walker.walk_release(&release, &output, &no_categories()).unwrap();

        assert!(!report.has_failures());
        assert!(unrelated.is_file());
        assert_eq!(
            count_files(&output.join(DEFAULT_CATEGORY).join("Presupported/60. Ghosts")).unwrap(),
            5
        );
    }

    #[test]
    fn test_shutdown_flag_stops_walk() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let output = temp.path().join("result");
        build_mimic(&release);
        let flag = Arc::new(AtomicBool::new(true));

        let report = ReleaseWalker::new(SortProfile::default())
            .with_shutdown_flag(flag)
            .walk_release(&release, &output, &no_categories())
            .unwrap();

        assert!(report.interrupted);
        assert!(report.processed.is_empty());
    }

    #[test]
    fn test_missing_release_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = ReleaseWalker::new(SortProfile::default())
            .walk_release(&temp.path().join("nope"), temp.path(), &no_categories())
            .unwrap_err();
        assert!(matches!(err, SortError::SourceMissing(_)));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        build_mimic(&release);
        touch(&release.join("x_y_z/cover.png"), b"c");

        let report = ReleaseWalker::new(SortProfile::default())
            .walk_release(&release, &temp.path().join("out"), &no_categories())
            .unwrap();
        let json = report.to_json().unwrap();

        assert!(json.contains("\"name\": \"22. Mimic\""));
        assert!(json.contains("Cannot derive a model name"));
    }

    #[test]
    fn test_progress_callback_reports_each_model_folder() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        build_mimic(&release);
        touch(&release.join("60_Ghosts/ghosts.png"), b"cover");
        touch(&release.join("readme.txt"), b"notes");

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let walker = ReleaseWalker::new(SortProfile::default()).with_progress(move |update| {
            sink.lock()
                .unwrap()
                .push((update.index, update.total, update.current));
        });

        walker
            .walk_release(&release, &temp.path().join("out"), &no_categories())
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (1, 3, "22. Mimic".to_string()),
                (2, 3, "60_Ghosts".to_string()),
            ]
        );
    }
}
