//! The fixed set of placeable virtual objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// A placeable virtual object. The set is fixed at build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectSlot {
    /// Viking figure; the default tap target
    #[default]
    Viking,
    /// Cannon
    Cannon,
    /// Shooting target
    Target,
}

impl ObjectSlot {
    /// Every slot, in draw order
    pub const ALL: [ObjectSlot; 3] = [ObjectSlot::Viking, ObjectSlot::Cannon, ObjectSlot::Target];

    /// Lowercase name used in config files and logs
    pub fn name(&self) -> &'static str {
        match self {
            ObjectSlot::Viking => "viking",
            ObjectSlot::Cannon => "cannon",
            ObjectSlot::Target => "target",
        }
    }
}

impl fmt::Display for ObjectSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
