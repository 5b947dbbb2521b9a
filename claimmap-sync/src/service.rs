//! Host adapter
//!
//! Wraps the reconciler in the lifecycle a plugin host drives: enable once the
//! collaborators are present, accept lifecycle events right away, run the bulk
//! import when the startup gate opens, and tear everything down on disable.

use crate::projector::Projector;
use crate::reconciler::{ImportReport, Reconciler, TeardownReport};
use crate::registry::{ClaimRegistry, InMemoryClaimRegistry};
use crate::store::{ClaimListener, ClaimStore};
use claimmap_core::{
    Claim, ClaimMapConfig, HostError, StartupPolicy, SyncError, SyncPhase, SyncResult, SyncStatus,
};
use claimmap_markers::MarkerApi;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// PLUGIN HOST
// ============================================================================

/// Presence of a sibling plugin on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    Missing,
    Disabled,
    Enabled,
}

/// Discovery of sibling plugins by name.
pub trait PluginHost {
    fn plugin_status(&self, name: &str) -> PluginStatus;
}

/// Host with a fixed set of plugins. Unknown names are missing.
#[derive(Debug, Clone, Default)]
pub struct StaticPluginHost {
    plugins: HashMap<String, PluginStatus>,
}

impl StaticPluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host on which every named plugin is enabled.
    pub fn enabled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(Self::new(), |host, name| host.with_plugin(name, PluginStatus::Enabled))
    }

    pub fn with_plugin(mut self, name: impl Into<String>, status: PluginStatus) -> Self {
        self.plugins.insert(name.into(), status);
        self
    }
}

impl PluginHost for StaticPluginHost {
    fn plugin_status(&self, name: &str) -> PluginStatus {
        self.plugins
            .get(name)
            .copied()
            .unwrap_or(PluginStatus::Missing)
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Claim synchronization as seen by the host.
pub struct ClaimMapService<A: MarkerApi, R = InMemoryClaimRegistry<<A as MarkerApi>::Marker>> {
    reconciler: Option<Reconciler<A, R>>,
    phase: SyncPhase,
    startup: StartupPolicy,
    ticks_elapsed: u32,
    marker_set_key: String,
    last_import: Option<ImportReport>,
}

impl<A: MarkerApi> ClaimMapService<A> {
    /// Enable with an in-memory registry.
    pub fn enable<H: PluginHost + ?Sized>(host: &H, api: A, config: ClaimMapConfig) -> SyncResult<Self> {
        Self::enable_with_registry(host, api, config, InMemoryClaimRegistry::new())
    }
}

impl<A, R> ClaimMapService<A, R>
where
    A: MarkerApi,
    R: ClaimRegistry<A::Marker>,
{
    /// Check collaborators, set up the marker set and start accepting events.
    ///
    /// Every failure here is fatal: it is logged once and returned, and the
    /// host is expected to disable the plugin.
    pub fn enable_with_registry<H: PluginHost + ?Sized>(
        host: &H,
        api: A,
        config: ClaimMapConfig,
        registry: R,
    ) -> SyncResult<Self> {
        match Self::try_enable(host, api, config, registry) {
            Ok(service) => {
                tracing::info!(
                    marker_set = %service.marker_set_key,
                    startup = ?service.startup,
                    "Successfully enabled"
                );
                Ok(service)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to enable claim synchronization");
                Err(e)
            }
        }
    }

    fn try_enable<H: PluginHost + ?Sized>(
        host: &H,
        api: A,
        config: ClaimMapConfig,
        registry: R,
    ) -> SyncResult<Self> {
        config.validate()?;
        check_collaborators(host, &config)?;

        let projector = Projector::new(config.style, config.info_window);
        let reconciler = Reconciler::setup(api, &config.marker_set, projector, registry)?;

        Ok(Self {
            reconciler: Some(reconciler),
            phase: SyncPhase::AwaitingImport,
            startup: config.startup,
            ticks_elapsed: 0,
            marker_set_key: config.marker_set.key,
            last_import: None,
        })
    }

    /// The claim store finished loading. Runs the bulk import if it has not
    /// run yet, under either startup policy.
    pub fn claim_store_ready<S: ClaimStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> SyncResult<Option<ImportReport>> {
        match self.phase {
            SyncPhase::AwaitingImport => self.import(store).map(Some),
            SyncPhase::Live => {
                tracing::warn!("Claim store reported ready after the import already ran");
                Ok(None)
            }
            SyncPhase::ShutDown => Err(SyncError::NotRunning { phase: self.phase }),
        }
    }

    /// Advance the startup timer by one host tick.
    ///
    /// Under `AfterTicks { ticks }` the import runs on the `ticks`-th call
    /// (the first call when `ticks` is zero). Other policies and phases ignore
    /// ticks.
    pub fn tick<S: ClaimStore + ?Sized>(&mut self, store: &S) -> SyncResult<Option<ImportReport>> {
        let StartupPolicy::AfterTicks { ticks } = self.startup else {
            return Ok(None);
        };
        if self.phase != SyncPhase::AwaitingImport {
            return Ok(None);
        }

        self.ticks_elapsed = self.ticks_elapsed.saturating_add(1);
        if self.ticks_elapsed < ticks.max(1) {
            return Ok(None);
        }
        self.import(store).map(Some)
    }

    /// Run the bulk import. On failure the phase stays `AwaitingImport`, so
    /// the next tick or ready signal retries.
    fn import<S: ClaimStore + ?Sized>(&mut self, store: &S) -> SyncResult<ImportReport> {
        let reconciler = self.running_mut()?;
        let report = reconciler.bulk_import(store).inspect_err(|e| {
            tracing::warn!(error = %e, "Bulk import failed, retrying on the next trigger");
        })?;
        self.last_import = Some(report);
        self.phase = SyncPhase::Live;
        Ok(report)
    }

    /// Remove all markers and the marker set. Later calls do nothing.
    pub fn disable(&mut self) -> SyncResult<TeardownReport> {
        self.phase = SyncPhase::ShutDown;
        match self.reconciler.take() {
            Some(reconciler) => reconciler.shutdown(),
            None => Ok(TeardownReport::default()),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn last_import(&self) -> Option<ImportReport> {
        self.last_import
    }

    /// Running reconciler, absent after `disable`.
    pub fn reconciler(&self) -> Option<&Reconciler<A, R>> {
        self.reconciler.as_ref()
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            phase: self.phase,
            marker_set: self.marker_set_key.clone(),
            rendered_claims: self
                .reconciler
                .as_ref()
                .map_or(0, Reconciler::rendered_claims),
            skipped_claims: self.last_import.map_or(0, |report| report.skipped),
        }
    }

    fn running_mut(&mut self) -> SyncResult<&mut Reconciler<A, R>> {
        let phase = self.phase;
        match self.reconciler.as_mut() {
            Some(reconciler) if phase.accepts_events() => Ok(reconciler),
            _ => Err(SyncError::NotRunning { phase }),
        }
    }
}

impl<A, R> ClaimListener for ClaimMapService<A, R>
where
    A: MarkerApi,
    R: ClaimRegistry<A::Marker>,
{
    type Error = SyncError;

    fn on_claim_created(&mut self, claim: &Claim) -> SyncResult<()> {
        self.running_mut()?.on_claim_created(claim)
    }

    fn on_claim_modified(&mut self, claim: &Claim) -> SyncResult<()> {
        self.running_mut()?.on_claim_modified(claim)
    }

    fn on_claim_deleted(&mut self, claim: &Claim) -> SyncResult<()> {
        self.running_mut()?.on_claim_deleted(claim)
    }
}

/// Both collaborators must be installed, then both must be enabled.
fn check_collaborators<H: PluginHost + ?Sized>(host: &H, config: &ClaimMapConfig) -> SyncResult<()> {
    let names = [&config.plugins.marker_service, &config.plugins.claim_store];

    for name in names {
        if host.plugin_status(name) == PluginStatus::Missing {
            return Err(HostError::CollaboratorMissing { name: name.clone() }.into());
        }
    }
    for name in names {
        if host.plugin_status(name) == PluginStatus::Disabled {
            return Err(HostError::CollaboratorDisabled { name: name.clone() }.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryClaimStore;
    use claimmap_core::{BlockPos, ClaimId, WorldCorner};
    use claimmap_markers::InMemoryMarkerApi;

    fn host() -> StaticPluginHost {
        StaticPluginHost::enabled(["dynmap", "GriefPrevention"])
    }

    fn claim(id: i64) -> Claim {
        Claim {
            id: ClaimId(id),
            lesser_corner: Some(WorldCorner::new("world", BlockPos::new(0, 0, 0))),
            greater_corner: Some(WorldCorner::new("world", BlockPos::new(9, 0, 9))),
            owner_name: "Alex".to_string(),
            is_admin: false,
        }
    }

    fn config_with(startup: StartupPolicy) -> ClaimMapConfig {
        ClaimMapConfig {
            startup,
            ..ClaimMapConfig::default()
        }
    }

    #[test]
    fn test_static_host_defaults_to_missing() {
        let host = StaticPluginHost::new().with_plugin("dynmap", PluginStatus::Disabled);
        assert_eq!(host.plugin_status("dynmap"), PluginStatus::Disabled);
        assert_eq!(host.plugin_status("GriefPrevention"), PluginStatus::Missing);
    }

    #[test]
    fn test_missing_reported_before_disabled() {
        let host = StaticPluginHost::new().with_plugin("dynmap", PluginStatus::Disabled);
        let err = check_collaborators(&host, &ClaimMapConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SyncError::Host(HostError::CollaboratorMissing {
                name: "GriefPrevention".to_string()
            })
        );
    }

    #[test]
    fn test_enable_starts_awaiting_import() {
        let service = ClaimMapService::enable(&host(), InMemoryMarkerApi::new(), ClaimMapConfig::default())
            .unwrap();
        assert_eq!(service.phase(), SyncPhase::AwaitingImport);
        assert!(service.last_import().is_none());
    }

    #[test]
    fn test_enable_rejects_invalid_config() {
        let mut config = ClaimMapConfig::default();
        config.style.fill_opacity = 2.0;
        let err = ClaimMapService::enable(&host(), InMemoryMarkerApi::new(), config)
            .err()
            .unwrap();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn test_tick_import_fires_on_nth_tick() {
        let store = InMemoryClaimStore::with_claims([claim(1)]);
        let mut service = ClaimMapService::enable(
            &host(),
            InMemoryMarkerApi::new(),
            config_with(StartupPolicy::AfterTicks { ticks: 3 }),
        )
        .unwrap();

        assert_eq!(service.tick(&store).unwrap(), None);
        assert_eq!(service.tick(&store).unwrap(), None);
        let report = service.tick(&store).unwrap().unwrap();
        assert_eq!(report.rendered, 1);
        assert_eq!(service.phase(), SyncPhase::Live);
        assert_eq!(service.tick(&store).unwrap(), None);
    }

    #[test]
    fn test_zero_ticks_imports_on_first_tick() {
        let store = InMemoryClaimStore::with_claims([claim(1)]);
        let mut service = ClaimMapService::enable(
            &host(),
            InMemoryMarkerApi::new(),
            config_with(StartupPolicy::AfterTicks { ticks: 0 }),
        )
        .unwrap();
        assert!(service.tick(&store).unwrap().is_some());
    }

    #[test]
    fn test_on_ready_ignores_ticks() {
        let store = InMemoryClaimStore::with_claims([claim(1)]);
        let mut service = ClaimMapService::enable(
            &host(),
            InMemoryMarkerApi::new(),
            config_with(StartupPolicy::OnReady),
        )
        .unwrap();

        for _ in 0..100 {
            assert_eq!(service.tick(&store).unwrap(), None);
        }
        assert!(service.claim_store_ready(&store).unwrap().is_some());
        assert!(service.claim_store_ready(&store).unwrap().is_none());
    }

    #[test]
    fn test_disable_is_idempotent() {
        let mut service = ClaimMapService::enable(&host(), InMemoryMarkerApi::new(), ClaimMapConfig::default())
            .unwrap();
        service.on_claim_created(&claim(1)).unwrap();

        assert_eq!(service.disable().unwrap().markers_deleted, 1);
        assert_eq!(service.disable().unwrap(), TeardownReport::default());
        assert_eq!(service.phase(), SyncPhase::ShutDown);
        assert!(service.reconciler().is_none());
    }

    #[test]
    fn test_status_reports_counts() {
        let mut unloaded = claim(2);
        unloaded.lesser_corner = None;
        let store = InMemoryClaimStore::with_claims([claim(1), unloaded]);
        let mut service = ClaimMapService::enable(
            &host(),
            InMemoryMarkerApi::new(),
            config_with(StartupPolicy::OnReady),
        )
        .unwrap();
        service.claim_store_ready(&store).unwrap();

        let status = service.status();
        assert_eq!(status.phase, SyncPhase::Live);
        assert_eq!(status.marker_set, "griefprevention.markerset");
        assert_eq!(status.rendered_claims, 1);
        assert_eq!(status.skipped_claims, 1);
    }
}
