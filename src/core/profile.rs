//! Sorting profile
//!
//! A `SortProfile` holds every vendor-specific rule the engine needs: how to
//! read a model name, which files count as the cover, which mesh extensions are
//! sorted into which folder, and how the pre-supported tier is laid out.
//! Connectors are thin constructors of a profile.

use std::path::PathBuf;

/// Name of the output folder holding pre-supported meshes
pub const PRESUPPORTED_DIR: &str = "Presupported";

/// Name of the output folder holding raw meshes
pub const UNSUPPORTED_DIR: &str = "Unsupported";

/// Folder inside each output model folder that holds mesh files
pub const MODELS_DIR: &str = "Models";

/// Image extensions recognized as a cover (lowercase, with leading dot)
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff"];

/// Normalize an extension to lowercase with a leading dot
pub fn normalize_extension(extension: &str) -> String {
    let lower = extension.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Mapping from mesh extension to its canonical output folder
///
/// Order is preserved so extraction and reporting are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMap {
    entries: Vec<(String, String)>,
}

impl ExtensionMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an extension and its folder; the extension is normalized
    pub fn with(mut self, extension: &str, folder: &str) -> Self {
        let extension = normalize_extension(extension);
        self.entries.retain(|(ext, _)| *ext != extension);
        self.entries.push((extension, folder.to_string()));
        self
    }

    /// Output folder for an extension, if it is recognized
    pub fn folder_for(&self, extension: &str) -> Option<&str> {
        let extension = normalize_extension(extension);
        self.entries
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, folder)| folder.as_str())
    }

    /// Iterate `(extension, folder)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(ext, folder)| (ext.as_str(), folder.as_str()))
    }

    /// All canonical folder names; used to strip stray per-type folders
    pub fn folder_names(&self) -> Vec<String> {
        self.entries.iter().map(|(_, f)| f.clone()).collect()
    }
}

impl Default for ExtensionMap {
    /// STL, Lychee and Chitubox meshes
    fn default() -> Self {
        Self::new()
            .with(".stl", "STL")
            .with(".lys", "LYS")
            .with(".chitubox", "CHITU")
    }
}

/// Delimiter rule splitting a raw folder name into identifier and title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Exactly one `_`, e.g. `60_Ghosts`
    Underscore,
    /// Exactly one `. `, e.g. `22. Mimic`
    DotSpace,
}

impl Delimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Underscore => "_",
            Delimiter::DotSpace => ". ",
        }
    }
}

/// How a canonical model name is derived from a folder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingRule {
    /// `<int><delim><title>` rendered as `<int>. <title>`; first matching
    /// delimiter wins
    Numbered { delimiters: Vec<Delimiter> },
    /// Title-cased raw name; names starting with `marker` (case-insensitive)
    /// use their parenthesized content instead
    Parenthesized { marker: String },
}

impl Default for NamingRule {
    fn default() -> Self {
        NamingRule::Numbered {
            delimiters: vec![Delimiter::Underscore, Delimiter::DotSpace],
        }
    }
}

/// Where the cover image of a model is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverPlacement {
    /// `<Category>/<CanonicalName>.<ext>`
    CategoryRoot,
    /// `<Category>/{Presupported,Unsupported}/<CanonicalName>/<CanonicalName>.<ext>`
    #[default]
    TierFolders,
}

/// A vendor-created per-type folder inside a model folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatedLocation {
    /// Path relative to the model folder, e.g. `Pre-Supported/STL`
    pub relative_path: PathBuf,
    /// Mesh extension stored there, e.g. `.stl`
    pub extension: String,
}

impl SeparatedLocation {
    pub fn new(relative_path: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            relative_path: relative_path.into(),
            extension: normalize_extension(extension),
        }
    }
}

/// Complete set of rules for one vendor layout
#[derive(Debug, Clone)]
pub struct SortProfile {
    /// Human readable profile name (used in logs)
    pub name: String,
    /// Name derivation rule
    pub naming: NamingRule,
    /// Recognized cover extensions (lowercase, leading dot)
    pub image_extensions: Vec<String>,
    /// Required file-name prefix of the cover, if any
    pub cover_marker: Option<String>,
    /// Mesh extension -> output folder
    pub extensions: ExtensionMap,
    /// Extension of raw (unsupported) meshes
    pub raw_extension: String,
    /// Folder name of the pre-supported tier inside a model folder
    pub presupported_root: String,
    /// Per-type locations checked before falling back to a mixed layout
    pub separated_locations: Vec<SeparatedLocation>,
    /// Whether raw meshes lying directly in the model folder are extracted
    pub include_loose_meshes: bool,
    /// Where the cover is copied to
    pub cover_placement: CoverPlacement,
}

impl Default for SortProfile {
    fn default() -> Self {
        let presupported_root = "Pre-Supported".to_string();
        Self {
            name: "default".to_string(),
            naming: NamingRule::default(),
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            cover_marker: None,
            extensions: ExtensionMap::default(),
            raw_extension: ".stl".to_string(),
            separated_locations: default_separated_locations(&presupported_root),
            presupported_root,
            include_loose_meshes: false,
            cover_placement: CoverPlacement::default(),
        }
    }
}

/// `<root>/STL`, `<root>/LYS` and `<root>/CHITUBOX`
fn default_separated_locations(presupported_root: &str) -> Vec<SeparatedLocation> {
    let root = PathBuf::from(presupported_root);
    vec![
        SeparatedLocation::new(root.join("STL"), ".stl"),
        SeparatedLocation::new(root.join("LYS"), ".lys"),
        SeparatedLocation::new(root.join("CHITUBOX"), ".chitubox"),
    ]
}

impl SortProfile {
    /// Replace the pre-supported root, re-rooting the separated locations
    /// that lived under the previous one
    pub fn with_presupported_root(mut self, root: &str) -> Self {
        let old_root = PathBuf::from(&self.presupported_root);
        let new_root = PathBuf::from(root);
        for location in &mut self.separated_locations {
            if let Ok(rest) = location.relative_path.strip_prefix(&old_root) {
                location.relative_path = new_root.join(rest);
            }
        }
        self.presupported_root = root.to_string();
        self
    }

    /// Output folder of the raw mesh extension
    pub fn raw_folder(&self) -> &str {
        self.extensions
            .folder_for(&self.raw_extension)
            .unwrap_or("STL")
    }
}
