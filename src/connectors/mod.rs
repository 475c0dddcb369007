//! Vendor connectors
//!
//! Each connector is a named [`SortProfile`] describing one vendor's release
//! layout. The sorting engine itself is shared.

pub mod bite_the_bullet;
pub mod cast_n_play;

use crate::core::profile::SortProfile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known content vendors
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Connector {
    #[default]
    CastNPlay,
    BiteTheBullet,
}

impl Connector {
    pub fn all() -> &'static [Connector] {
        &[Connector::CastNPlay, Connector::BiteTheBullet]
    }

    /// Sorting rules for this vendor
    pub fn profile(&self) -> SortProfile {
        match self {
            Connector::CastNPlay => cast_n_play::profile(),
            Connector::BiteTheBullet => bite_the_bullet::profile(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Connector::CastNPlay => "cast-n-play",
            Connector::BiteTheBullet => "bite-the-bullet",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Connector::CastNPlay => {
                "Numbered folders (`60_Ghosts`, `22. Mimic`), any single cover image, cover in category root"
            }
            Connector::BiteTheBullet => {
                "Title-cased folders, exotic names in parentheses, cover prefixed with `_`"
            }
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
