//! Support-tier classification
//!
//! Pre-supported meshes come either already split per type by the vendor
//! (`Pre-Supported/STL`, `Pre-Supported/LYS`, ...) or mixed in one folder.
//! Separated folders are copied verbatim; a mixed folder is sorted by
//! extension. Raw meshes live in the remaining subfolders of the model.

use crate::core::error::{Result, SortError};
use crate::core::extract::{copy_preserving_times, copy_tree, ensure_dir, extract_extension};
use crate::core::profile::{normalize_extension, SortProfile, MODELS_DIR};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Layout detected for the pre-supported tier of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TierLayout {
    /// Vendor already split meshes into per-type folders
    Separated,
    /// All meshes share one folder and were sorted by extension
    Mixed,
}

/// Result of extracting the pre-supported tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedOutcome {
    pub layout: TierLayout,
    /// Extensions that produced at least one file, in profile order
    pub extensions: Vec<String>,
    /// Configured separated locations absent from this model
    pub missing_locations: Vec<PathBuf>,
}

impl SupportedOutcome {
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Extracts both support tiers of a model folder according to a profile
pub struct TierClassifier<'a> {
    profile: &'a SortProfile,
}

impl<'a> TierClassifier<'a> {
    pub fn new(profile: &'a SortProfile) -> Self {
        Self { profile }
    }

    /// Extract pre-supported meshes of `model_folder` into `dest_root/Models`
    pub fn classify_supported(
        &self,
        model_folder: &Path,
        dest_root: &Path,
    ) -> Result<SupportedOutcome> {
        let models_dir = dest_root.join(MODELS_DIR);
        ensure_dir(&models_dir)?;

        let any_separated = self
            .profile
            .separated_locations
            .iter()
            .any(|loc| model_folder.join(&loc.relative_path).is_dir());

        if any_separated {
            self.extract_separated(model_folder, &models_dir)
        } else {
            self.extract_mixed(model_folder, &models_dir)
        }
    }

    fn extract_separated(&self, model_folder: &Path, models_dir: &Path) -> Result<SupportedOutcome> {
        let mut outcome = SupportedOutcome {
            layout: TierLayout::Separated,
            extensions: Vec::new(),
            missing_locations: Vec::new(),
        };

        for location in &self.profile.separated_locations {
            let source = model_folder.join(&location.relative_path);
            if !source.is_dir() {
                info!(
                    "No {} in {}, skipping this tier",
                    location.relative_path.display(),
                    model_folder.display()
                );
                outcome.missing_locations.push(location.relative_path.clone());
                continue;
            }

            let folder = self.type_folder(location.extension.as_str(), &location.relative_path);
            let copied = copy_tree(&source, &models_dir.join(&folder))?;
            debug!("Copied {} file(s) from {}", copied, source.display());

            if copied > 0 && !outcome.extensions.contains(&location.extension) {
                outcome.extensions.push(location.extension.clone());
            }
        }

        Ok(outcome)
    }

    fn extract_mixed(&self, model_folder: &Path, models_dir: &Path) -> Result<SupportedOutcome> {
        let root = model_folder.join(&self.profile.presupported_root);
        let strip = self.profile.extensions.folder_names();
        let mut extensions = Vec::new();

        for (extension, folder) in self.profile.extensions.iter() {
            if extract_extension(&root, extension, &models_dir.join(folder), &strip)? {
                extensions.push(extension.to_string());
            }
        }

        Ok(SupportedOutcome {
            layout: TierLayout::Mixed,
            extensions,
            missing_locations: Vec::new(),
        })
    }

    fn type_folder(&self, extension: &str, relative_path: &Path) -> String {
        match self.profile.extensions.folder_for(extension) {
            Some(folder) => folder.to_string(),
            None => relative_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| extension.trim_start_matches('.').to_uppercase()),
        }
    }

    /// Top-level folder names that belong to the pre-supported tier
    fn presupported_roots(&self) -> HashSet<String> {
        let mut roots = HashSet::new();
        roots.insert(self.profile.presupported_root.clone());
        for location in &self.profile.separated_locations {
            if let Some(first) = location.relative_path.components().next() {
                roots.insert(first.as_os_str().to_string_lossy().into_owned());
            }
        }
        roots
    }

    /// Extract raw meshes of `model_folder` into `dest_root/Models/<raw folder>`
    ///
    /// Returns whether any raw mesh was found.
    pub fn extract_unsupported(&self, model_folder: &Path, dest_root: &Path) -> Result<bool> {
        let target = dest_root.join(MODELS_DIR).join(self.profile.raw_folder());
        ensure_dir(&dest_root.join(MODELS_DIR))?;

        let skip = self.presupported_roots();
        let strip = self.profile.extensions.folder_names();
        let raw_extension = normalize_extension(&self.profile.raw_extension);

        let mut children = Vec::new();
        for entry in fs::read_dir(model_folder).map_err(|e| SortError::io(model_folder, e))? {
            children.push(entry.map_err(|e| SortError::io(model_folder, e))?.path());
        }
        children.sort();

        let mut found = false;
        for child in children {
            let name = child
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if child.is_file() {
                if self.profile.include_loose_meshes
                    && name.to_lowercase().ends_with(&raw_extension)
                {
                    ensure_dir(&target)?;
                    copy_preserving_times(&child, &target.join(&name))?;
                    found = true;
                }
                continue;
            }

            if skip.contains(&name) {
                debug!("Skipping pre-supported folder {}", child.display());
                continue;
            }

            found |= extract_extension(&child, &raw_extension, &target, &strip)?;
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::count_files;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<_> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(root).unwrap().to_path_buf(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_mixed_layout_is_sorted_by_extension() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("22. Mimic");
        touch(&model.join("Pre-Supported").join("Mimic_Supported.stl"), b"s");
        touch(&model.join("Pre-Supported").join("Mimic_Supported.chitubox"), b"c");
        let dest = temp.path().join("out");

        let profile = SortProfile::default();
        let outcome = TierClassifier::new(&profile)
            .classify_supported(&model, &dest)
            .unwrap();

        assert_eq!(outcome.layout, TierLayout::Mixed);
        assert_eq!(outcome.extensions, vec![".stl", ".chitubox"]);
        assert!(dest.join("Models/STL/Mimic_Supported.stl").is_file());
        assert!(dest.join("Models/CHITU/Mimic_Supported.chitubox").is_file());
        assert!(!dest.join("Models/LYS").exists());
    }

    #[test]
    fn test_separated_layout_is_copied_verbatim() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("60_Ghosts");
        for name in ["A", "B"] {
            touch(&model.join(format!("Pre-Supported/STL/{name}_Supported.stl")), b"s");
            touch(&model.join(format!("Pre-Supported/LYS/{name}_Supported.lys")), b"l");
        }
        let dest = temp.path().join("out");

        let profile = SortProfile::default();
        let outcome = TierClassifier::new(&profile)
            .classify_supported(&model, &dest)
            .unwrap();

        assert_eq!(outcome.layout, TierLayout::Separated);
        assert_eq!(outcome.extensions, vec![".stl", ".lys"]);
        assert_eq!(
            outcome.missing_locations,
            vec![PathBuf::from("Pre-Supported").join("CHITUBOX")]
        );
        assert_eq!(count_files(&dest.join("Models/STL")).unwrap(), 2);
        assert_eq!(count_files(&dest.join("Models/LYS")).unwrap(), 2);
        assert!(!dest.join("Models/CHITU").exists());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("60_Ghosts");
        touch(&model.join("Pre-Supported/STL/A.stl"), b"a");
        touch(&model.join("Pre-Supported/STL/Pose/B.stl"), b"b");
        let dest = temp.path().join("out");

        let profile = SortProfile::default();
        let classifier = TierClassifier::new(&profile);
        classifier.classify_supported(&model, &dest).unwrap();
        let first = snapshot(&dest);
        classifier.classify_supported(&model, &dest).unwrap();

        assert_eq!(first, snapshot(&dest));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_unsupported_skips_presupported_and_strips_type_folders() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("60_Ghosts");
        touch(&model.join("Unsupported/STL/A.stl"), b"a");
        touch(&model.join("Alt Pose/B.stl"), b"b");
        touch(&model.join("Pre-Supported/A_Supported.stl"), b"s");
        touch(&model.join("loose.stl"), b"l");
        let dest = temp.path().join("out");

        let profile = SortProfile::default();
        let found = TierClassifier::new(&profile)
            .extract_unsupported(&model, &dest)
            .unwrap();

        assert!(found);
        assert!(dest.join("Models/STL/A.stl").is_file());
        assert!(dest.join("Models/STL/B.stl").is_file());
        assert!(!dest.join("Models/STL/STL").exists());
        assert!(!dest.join("Models/STL/loose.stl").exists());
        assert_eq!(count_files(&dest).unwrap(), 2);
    }

    #[test]
    fn test_unsupported_loose_meshes_when_enabled() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("Elf Rogue");
        touch(&model.join("2512_ch_elf_rogue.stl"), b"a");
        touch(&model.join("STL/2512_ch_elf_rogue_b.stl"), b"b");
        let dest = temp.path().join("out");

        let profile = SortProfile {
            include_loose_meshes: true,
            ..SortProfile::default()
        };
        TierClassifier::new(&profile)
            .extract_unsupported(&model, &dest)
            .unwrap();

        assert!(dest.join("Models/STL/2512_ch_elf_rogue.stl").is_file());
        assert!(dest.join("Models/STL/2512_ch_elf_rogue_b.stl").is_file());
    }

    #[test]
    fn test_no_presupported_tier() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("5_Bare");
        touch(&model.join("STL/a.stl"), b"a");
        let dest = temp.path().join("out");

        let profile = SortProfile::default();
        let outcome = TierClassifier::new(&profile)
            .classify_supported(&model, &dest)
            .unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome.layout, TierLayout::Mixed);
    }
}
