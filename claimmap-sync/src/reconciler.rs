//! Reconciler
//!
//! Keeps the marker set in step with the claim store. Every claim id is either
//! unrendered (no registry entry) or rendered (an entry pointing at a live
//! marker); the handlers below are the only transitions between the two.

use crate::projector::Projector;
use crate::registry::{ClaimRegistry, InMemoryClaimRegistry};
use crate::store::{ClaimListener, ClaimStore};
use claimmap_core::{Claim, MarkerError, MarkerSetSpec, SyncError, SyncResult};
use claimmap_markers::MarkerApi;
use serde::{Deserialize, Serialize};

/// Outcome of a bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportReport {
    /// Claims now backed by a marker.
    pub rendered: usize,
    /// Claims with an unresolved corner.
    pub skipped: usize,
}

/// Outcome of a shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeardownReport {
    pub markers_deleted: usize,
    /// Markers the service refused to delete. They go away with the set.
    pub failures: usize,
}

pub struct Reconciler<A: MarkerApi, R = InMemoryClaimRegistry<<A as MarkerApi>::Marker>> {
    api: A,
    set: A::MarkerSet,
    set_key: String,
    registry: R,
    projector: Projector,
}

impl<A, R> Reconciler<A, R>
where
    A: MarkerApi,
    R: ClaimRegistry<A::Marker>,
{
    /// Find or create the owned marker set and apply its presentation.
    ///
    /// An existing set with the same key is reused and relabeled, so running
    /// setup repeatedly never produces a second set.
    pub fn setup(
        api: A,
        set_config: &MarkerSetSpec,
        projector: Projector,
        registry: R,
    ) -> SyncResult<Self> {
        let setup_failed = |e: MarkerError| SyncError::MarkerSetSetup {
            key: set_config.key.clone(),
            reason: e.to_string(),
        };

        let set = match api.marker_set_get(&set_config.key).map_err(setup_failed)? {
            Some(existing) => {
                api.marker_set_set_label(&existing, &set_config.label)
                    .map_err(setup_failed)?;
                existing
            }
            None => api
                .marker_set_create(&set_config.key, &set_config.label, false)
                .map_err(setup_failed)?,
        };
        api.marker_set_set_layer_priority(&set, set_config.layer_priority)
            .map_err(setup_failed)?;
        api.marker_set_set_hide_by_default(&set, set_config.hide_by_default)
            .map_err(setup_failed)?;

        tracing::debug!(
            marker_set = %set_config.key,
            label = %set_config.label,
            layer_priority = set_config.layer_priority,
            "Marker set ready"
        );

        Ok(Self {
            api,
            set,
            set_key: set_config.key.clone(),
            registry,
            projector,
        })
    }

    /// Render every claim the store currently holds.
    ///
    /// Claims that already have a marker (because a create event overtook the
    /// import, or a previous run left it in the set) are updated in place.
    /// The first failing claim aborts the import; claims rendered before it
    /// stay registered.
    pub fn bulk_import<S: ClaimStore + ?Sized>(&mut self, store: &S) -> SyncResult<ImportReport> {
        let mut report = ImportReport::default();
        for claim in store.list_claims() {
            if self.render(&claim)? {
                report.rendered += 1;
            } else {
                report.skipped += 1;
            }
        }

        tracing::info!(
            marker_set = %self.set_key,
            rendered = report.rendered,
            skipped = report.skipped,
            "Imported existing claims"
        );
        Ok(report)
    }

    /// Project the claim; the projector registers the marker on first sight.
    ///
    /// Returns whether the claim is rendered afterwards.
    fn render(&mut self, claim: &Claim) -> SyncResult<bool> {
        let marker = self
            .projector
            .project(&self.api, &self.set, &mut self.registry, claim)?;
        Ok(marker.is_some())
    }

    /// Delete every marker, then the marker set itself.
    ///
    /// A marker the service fails to delete is counted and logged; the set
    /// deletion still runs. Failing to delete the set is an error.
    pub fn shutdown(mut self) -> SyncResult<TeardownReport> {
        let mut report = TeardownReport::default();
        for id in self.registry.ids() {
            let Some(marker) = self.registry.remove(id) else {
                continue;
            };
            match self.api.area_marker_delete(&marker) {
                Ok(()) => report.markers_deleted += 1,
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(claim_id = %id, error = %e, "Failed to delete claim marker");
                }
            }
        }
        self.registry.clear();

        self.api.marker_set_delete(&self.set)?;
        tracing::info!(
            marker_set = %self.set_key,
            markers_deleted = report.markers_deleted,
            failures = report.failures,
            "Removed claim markers"
        );
        Ok(report)
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn rendered_claims(&self) -> usize {
        self.registry.len()
    }
}

impl<A, R> ClaimListener for Reconciler<A, R>
where
    A: MarkerApi,
    R: ClaimRegistry<A::Marker>,
{
    type Error = SyncError;

    fn on_claim_created(&mut self, claim: &Claim) -> SyncResult<()> {
        tracing::debug!(claim_id = %claim.id, owner = %claim.owner_name, "Claim created");
        self.render(claim).map(|_| ())
    }

    fn on_claim_modified(&mut self, claim: &Claim) -> SyncResult<()> {
        tracing::debug!(claim_id = %claim.id, owner = %claim.owner_name, "Claim modified");
        self.render(claim).map(|_| ())
    }

    fn on_claim_deleted(&mut self, claim: &Claim) -> SyncResult<()> {
        if !self.registry.contains(claim.id) {
            tracing::debug!(claim_id = %claim.id, "Deleted claim was not rendered");
            return Ok(());
        }

        let marker = self
            .registry
            .remove(claim.id)
            .ok_or(SyncError::RegistryInconsistent { claim_id: claim.id })?;
        self.api.area_marker_delete(&marker)?;
        tracing::debug!(claim_id = %claim.id, "Claim deleted");
        Ok(())
    }
}
