//! Claim registry
//!
//! Index from claim id to the marker currently rendering it. An entry exists
//! exactly when the marker exists in the marker set, so every `remove` must be
//! paired with a marker deletion by the caller.

use claimmap_core::ClaimId;
use std::collections::HashMap;

/// Owned claim id → marker handle mapping.
pub trait ClaimRegistry<M> {
    fn contains(&self, id: ClaimId) -> bool;

    fn get(&self, id: ClaimId) -> Option<&M>;

    /// Insert an entry, returning the handle it replaced.
    ///
    /// Callers check `contains` first; replacing an entry orphans a marker.
    fn put(&mut self, id: ClaimId, marker: M) -> Option<M>;

    fn remove(&mut self, id: ClaimId) -> Option<M>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered ids, in ascending order.
    fn ids(&self) -> Vec<ClaimId>;
}

/// `HashMap` backed registry.
#[derive(Debug, Clone)]
pub struct InMemoryClaimRegistry<M> {
    entries: HashMap<ClaimId, M>,
}

impl<M> InMemoryClaimRegistry<M> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<M> Default for InMemoryClaimRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ClaimRegistry<M> for InMemoryClaimRegistry<M> {
    fn contains(&self, id: ClaimId) -> bool {
        self.entries.contains_key(&id)
    }

    fn get(&self, id: ClaimId) -> Option<&M> {
        self.entries.get(&id)
    }

    fn put(&mut self, id: ClaimId, marker: M) -> Option<M> {
        self.entries.insert(id, marker)
    }

    fn remove(&mut self, id: ClaimId) -> Option<M> {
        self.entries.remove(&id)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn ids(&self) -> Vec<ClaimId> {
        let mut ids: Vec<ClaimId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }
}
