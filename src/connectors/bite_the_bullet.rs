//! Bite the Bullet releases
//!
//! Folders carry plain titles (`Elf Rogue`); exotic packs put the real name in
//! parentheses. The cover is the only image whose name starts with `_`, raw
//! meshes may lie directly in the model folder, and the cover is copied next
//! to the meshes of each tier.

use crate::core::profile::{CoverPlacement, NamingRule, SortProfile};

/// Prefix marking folders whose name is in parentheses
pub const EXOTIC_MARKER: &str = "exotic";

/// Prefix of the main cover image
pub const COVER_MARKER: &str = "_";

pub fn profile() -> SortProfile {
    SortProfile {
        name: "bite-the-bullet".to_string(),
        naming: NamingRule::Parenthesized {
            marker: EXOTIC_MARKER.to_string(),
        },
        cover_marker: Some(COVER_MARKER.to_string()),
        include_loose_meshes: true,
        cover_placement: CoverPlacement::TierFolders,
        ..SortProfile::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::walker::ReleaseWalker;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_unsupported_processing() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let model = release.join("Elf Rogue");
        touch(&model.join("_2512_ch_elf_rogue.jpg"));
        touch(&model.join("2512_ch_elf_rogue_render.jpg"));
        touch(&model.join("2512_ch_elf_rogue.stl"));
        touch(&model.join("STL/2512_ch_elf_rogue_b.stl"));
        let output = temp.path().join("result");

        let report = ReleaseWalker::new(profile())
            .walk_release(&release, &output, &BTreeMap::new())
            .unwrap();

        assert!(!report.has_failures());
        let unsupported = output.join("Characters/Unsupported/Elf Rogue");
        assert!(unsupported.join("Models/STL/2512_ch_elf_rogue.stl").is_file());
        assert!(unsupported.join("Models/STL/2512_ch_elf_rogue_b.stl").is_file());
        assert!(unsupported.join("Elf Rogue.jpg").is_file());
    }

    #[test]
    fn test_exotic_name_uses_parentheses() {
        let temp = TempDir::new().unwrap();
        let release = temp.path().join("release");
        let model = release.join("Exotic Pack (ember drake)");
        touch(&model.join("_cover.png"));
        touch(&model.join("drake.stl"));
        let output = temp.path().join("result");

        let report = ReleaseWalker::new(profile())
            .walk_release(&release, &output, &BTreeMap::new())
            .unwrap();

        assert_eq!(report.processed[0].name, "Ember Drake");
        assert!(output
            .join("Characters/Unsupported/Ember Drake/Models/STL/drake.stl")
            .is_file());
    }
}
