//! Supported vs. unsupported file count reconciliation
//!
//! Every supported variant of a model should carry as many meshes as the raw
//! tier. A mismatch usually means the vendor forgot a part in one variant; it
//! is reported for review and never stops the run.

use crate::core::error::Result;
use crate::core::extract::count_files;
use crate::core::profile::ExtensionMap;
use log::warn;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A file count mismatch between the raw tier and one supported variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyWarning {
    pub model: String,
    pub extension: String,
    pub folder: String,
    pub unsupported_count: usize,
    pub supported_count: usize,
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found inconsistency in '{}': {} in non-supported vs {} in {}",
            self.model, self.unsupported_count, self.supported_count, self.folder
        )
    }
}

/// Compare the raw tier of a model against each supported extension that was
/// found
///
/// `unsupported_models` and `supported_models` are the `Models` folders of the
/// two tiers for the same model.
pub fn check_model<S: AsRef<str>>(
    model: &str,
    unsupported_models: &Path,
    supported_models: &Path,
    found_extensions: &[S],
    extensions: &ExtensionMap,
) -> Result<Vec<ConsistencyWarning>> {
    let unsupported_count = count_files(unsupported_models)?;
    let mut warnings = Vec::new();

    for extension in found_extensions {
        let extension = extension.as_ref();
        let Some(folder) = extensions.folder_for(extension) else {
            continue;
        };

        let supported_count = count_files(&supported_models.join(folder))?;
        if supported_count != unsupported_count {
            let warning = ConsistencyWarning {
                model: model.to_string(),
                extension: extension.to_string(),
                folder: folder.to_string(),
                unsupported_count,
                supported_count,
            };
            warn!("{}", warning);
            warnings.push(warning);
        }
    }

    Ok(warnings)
}
