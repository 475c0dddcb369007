//! Cast n Play releases
//!
//! Folders are named `1015_Zombified Dwarf` (older releases use
//! `22. Mimic`). Pre-supported meshes sit in `Pre-Supported/`, either mixed or
//! split into `STL`/`LYS`/`CHITUBOX`. The cover goes to the category root.

use crate::core::profile::{CoverPlacement, SortProfile};

pub fn profile() -> SortProfile {
    SortProfile {
        name: "cast-n-play".to_string(),
        cover_placement: CoverPlacement::CategoryRoot,
        ..SortProfile::default()
    }
}
