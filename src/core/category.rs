//! Category mapping
//!
//! Callers group raw model folder names by category. The mapping is validated
//! and inverted once per run; anything not listed lands in the default
//! category.

use crate::core::error::{Result, SortError};
use crate::core::extract::ensure_dir;
use crate::core::profile::{PRESUPPORTED_DIR, UNSUPPORTED_DIR};
use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Implicit bucket for every model that is not listed under a category
pub const DEFAULT_CATEGORY: &str = "Characters";

/// Validated, inverted category mapping
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    categories: Vec<String>,
    by_name: HashMap<String, String>,
}

impl CategoryMap {
    /// Validate `mapping` (category -> raw folder names) and invert it
    ///
    /// The default category is dropped with a warning if listed explicitly.
    /// A folder name listed twice is a fatal configuration error.
    pub fn new(mapping: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut categories = Vec::new();
        let mut by_name: HashMap<String, String> = HashMap::new();

        for (category, names) in mapping {
            if category == DEFAULT_CATEGORY {
                warn!(
                    "Removing '{}' as redundant, dropped values: {:?}",
                    DEFAULT_CATEGORY, names
                );
                continue;
            }

            for name in names {
                if let Some(existing) = by_name.get(name) {
                    return Err(SortError::DuplicateCategoryMembership {
                        name: name.clone(),
                        first: existing.clone(),
                        second: category.clone(),
                    });
                }
                by_name.insert(name.clone(), category.clone());
            }
            categories.push(category.clone());
        }

        Ok(Self {
            categories,
            by_name,
        })
    }

    /// Category of a raw folder name, falling back to the default bucket
    pub fn category_of(&self, raw_name: &str) -> &str {
        self.by_name
            .get(raw_name)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// Declared categories followed by the default one
    pub fn all_categories(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(DEFAULT_CATEGORY))
    }

    /// Create `<Category>/{Presupported,Unsupported}` for every category
    pub fn prepare_output(&self, output_root: &Path) -> Result<()> {
        for category in self.all_categories() {
            ensure_dir(&output_root.join(category).join(UNSUPPORTED_DIR))?;
            ensure_dir(&output_root.join(category).join(PRESUPPORTED_DIR))?;
        }
        Ok(())
    }
}
