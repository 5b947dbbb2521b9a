//! Claim geometry
//!
//! The claim store reports inclusive block coordinates while the map expects a
//! continuous outline, so the greater corner is pushed out by one block on both
//! axes. Vertices are always emitted in the same winding order.

use crate::{BlockPos, Claim};
use serde::{Deserialize, Serialize};

/// Quadrilateral outline of a claim in the marker service's coordinate layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaPolygon {
    pub world: String,
    pub xs: [f64; 4],
    pub zs: [f64; 4],
}

impl AreaPolygon {
    /// Outline of a claim, or `None` when a corner could not be resolved.
    ///
    /// The world is taken from the lesser corner.
    pub fn for_claim(claim: &Claim) -> Option<Self> {
        let (lesser, greater) = claim.corners()?;
        Some(Self::from_corners(&lesser.world, lesser.pos, greater.pos))
    }

    pub fn from_corners(world: &str, lesser: BlockPos, greater: BlockPos) -> Self {
        let x0 = f64::from(lesser.x);
        let z0 = f64::from(lesser.z);
        let x1 = f64::from(greater.x) + 1.0;
        let z1 = f64::from(greater.z) + 1.0;

        Self {
            world: world.to_string(),
            xs: [x0, x0, x1, x1],
            zs: [z0, z1, z1, z0],
        }
    }

    /// Vertices as `(x, z)` pairs in winding order.
    pub fn vertices(&self) -> [(f64, f64); 4] {
        [
            (self.xs[0], self.zs[0]),
            (self.xs[1], self.zs[1]),
            (self.xs[2], self.zs[2]),
            (self.xs[3], self.zs[3]),
        ]
    }

    /// Covered area in blocks.
    pub fn area(&self) -> f64 {
        (self.xs[2] - self.xs[0]).abs() * (self.zs[1] - self.zs[0]).abs()
    }
}
