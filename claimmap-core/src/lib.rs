//! ClaimMap Core - Entity Types
//!
//! Pure data structures shared by every other crate: claims as reported by the
//! claim store, the keys and polygons handed to the marker service, the error
//! taxonomy and configuration. Nothing in here talks to an external service.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod error;
pub mod geometry;
pub mod health;
pub mod info_window;
pub mod style;

pub use config::{
    ClaimMapConfig, InfoWindowConfig, MarkerSetSpec, Palette, PluginNames, StartupPolicy, StyleConfig,
    DEFAULT_AVATAR_URL_TEMPLATE, DEFAULT_IMPORT_DELAY_TICKS,
};
pub use error::{ConfigError, HostError, MarkerError, SyncError, SyncResult};
pub use geometry::AreaPolygon;
pub use health::{HealthStatus, SyncPhase, SyncStatus};
pub use info_window::InfoWindow;
pub use style::{FillStyle, LineStyle, MarkerStyle, Rgb};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Stable claim identifier assigned by the claim store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(pub i64);

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ClaimId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Key of the marker that renders a claim.
///
/// Derived deterministically from the claim id so that re-running setup
/// against a marker service that still holds the marker addresses the same
/// object instead of creating a second one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerKey(String);

impl MarkerKey {
    pub const PREFIX: &'static str = "Claim_";

    pub fn for_claim(id: ClaimId) -> Self {
        Self(format!("{}{}", Self::PREFIX, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MarkerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// CLAIM TYPES
// ============================================================================

/// Integer block coordinates. Claim corners are inclusive block positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// A corner of a claim resolved against a loaded world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldCorner {
    pub world: String,
    pub pos: BlockPos,
}

impl WorldCorner {
    pub fn new(world: impl Into<String>, pos: BlockPos) -> Self {
        Self {
            world: world.into(),
            pos,
        }
    }
}

/// Snapshot of a claim as delivered by the claim store.
///
/// Read-only to this system. A corner is `None` when the claim store could not
/// resolve it, which happens for claims in worlds that are not loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub lesser_corner: Option<WorldCorner>,
    pub greater_corner: Option<WorldCorner>,
    /// Display name of the owner. Admin claims carry the store's label instead.
    pub owner_name: String,
    pub is_admin: bool,
}

impl Claim {
    /// Both corners, if the claim store could resolve them.
    pub fn corners(&self) -> Option<(&WorldCorner, &WorldCorner)> {
        match (&self.lesser_corner, &self.greater_corner) {
            (Some(lesser), Some(greater)) => Some((lesser, greater)),
            _ => None,
        }
    }

    pub fn marker_key(&self) -> MarkerKey {
        MarkerKey::for_claim(self.id)
    }
}

// ============================================================================
// TESTS
// ============================================================================
