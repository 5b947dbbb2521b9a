//! Claim store seam
//!
//! The claim store owns every claim. This system only performs full reads at
//! startup and otherwise reacts to the lifecycle events the store emits.

use claimmap_core::{Claim, ClaimId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read access to the external claim store.
pub trait ClaimStore {
    /// Every claim the store currently knows about.
    fn list_claims(&self) -> Vec<Claim>;
}

// ============================================================================
// LIFECYCLE EVENTS
// ============================================================================

/// Lifecycle notification carrying a full claim snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "claim", rename_all = "snake_case")]
pub enum ClaimEvent {
    Created(Claim),
    /// Resized or otherwise changed.
    Modified(Claim),
    Deleted(Claim),
}

impl ClaimEvent {
    pub fn claim(&self) -> &Claim {
        match self {
            ClaimEvent::Created(claim) | ClaimEvent::Modified(claim) | ClaimEvent::Deleted(claim) => {
                claim
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClaimEvent::Created(_) => "created",
            ClaimEvent::Modified(_) => "modified",
            ClaimEvent::Deleted(_) => "deleted",
        }
    }
}

/// Receiver of claim lifecycle events.
pub trait ClaimListener {
    type Error;

    fn on_claim_created(&mut self, claim: &Claim) -> Result<(), Self::Error>;

    fn on_claim_modified(&mut self, claim: &Claim) -> Result<(), Self::Error>;

    fn on_claim_deleted(&mut self, claim: &Claim) -> Result<(), Self::Error>;

    /// Dispatch a single event to the matching handler.
    fn handle(&mut self, event: &ClaimEvent) -> Result<(), Self::Error> {
        match event {
            ClaimEvent::Created(claim) => self.on_claim_created(claim),
            ClaimEvent::Modified(claim) => self.on_claim_modified(claim),
            ClaimEvent::Deleted(claim) => self.on_claim_deleted(claim),
        }
    }
}

// ============================================================================
// IN-MEMORY CLAIM STORE
// ============================================================================

/// Claim store kept in process.
///
/// Mutations return the event a real store would emit, so callers can feed
/// it to the reconciler themselves.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClaimStore {
    claims: BTreeMap<ClaimId, Claim>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claims(claims: impl IntoIterator<Item = Claim>) -> Self {
        Self {
            claims: claims.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn get(&self, id: ClaimId) -> Option<&Claim> {
        self.claims.get(&id)
    }

    /// Insert a new claim, or replace an existing one as a modification.
    pub fn upsert(&mut self, claim: Claim) -> ClaimEvent {
        match self.claims.insert(claim.id, claim.clone()) {
            None => ClaimEvent::Created(claim),
            Some(_) => ClaimEvent::Modified(claim),
        }
    }

    pub fn delete(&mut self, id: ClaimId) -> Option<ClaimEvent> {
        self.claims.remove(&id).map(ClaimEvent::Deleted)
    }
}

impl ClaimStore for InMemoryClaimStore {
    fn list_claims(&self) -> Vec<Claim> {
        self.claims.values().cloned().collect()
    }
}
