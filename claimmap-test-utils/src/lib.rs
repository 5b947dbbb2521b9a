//! ClaimMap Test Utilities
//!
//! Shared test infrastructure for the ClaimMap workspace:
//! - Proptest generators for claims
//! - Fixtures for common claim shapes and hosts
//! - Assertions over `SyncResult`
//! - Log capture for tests

pub use claimmap_markers::{InMemoryMarkerApi, MarkerCall};
pub use claimmap_sync::{InMemoryClaimStore, PluginStatus, StaticPluginHost};

pub use claimmap_core::{
    BlockPos, Claim, ClaimId, ClaimMapConfig, HostError, MarkerKey, StartupPolicy, SyncError,
    SyncResult, WorldCorner,
};

/// Install a fmt subscriber writing through the test harness.
///
/// Filter with `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for claims.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_claim_id() -> impl Strategy<Value = ClaimId> {
        any::<i64>().prop_map(ClaimId)
    }

    /// Player names, plus a few that need escaping in markup.
    pub fn arb_owner_name() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => "[A-Za-z0-9_]{3,16}",
            1 => Just("administrator".to_string()),
            1 => "[ <>&'\"a-z]{1,12}",
        ]
    }

    pub fn arb_world() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("world".to_string()),
            Just("world_nether".to_string()),
            "[a-z_]{1,12}",
        ]
    }

    /// Resolved corners with `lesser <= greater` on both axes.
    pub fn arb_corners() -> impl Strategy<Value = (BlockPos, BlockPos)> {
        (
            -30_000_000i32..30_000_000,
            -30_000_000i32..30_000_000,
            0i32..512,
            0i32..512,
        )
            .prop_map(|(x, z, width, depth)| {
                (BlockPos::new(x, 0, z), BlockPos::new(x + width, 255, z + depth))
            })
    }

    pub fn arb_claim() -> impl Strategy<Value = Claim> {
        (arb_claim_id(), arb_world(), arb_corners(), arb_owner_name(), any::<bool>()).prop_map(
            |(id, world, (lesser, greater), owner_name, is_admin)| Claim {
                id,
                lesser_corner: Some(WorldCorner::new(world.clone(), lesser)),
                greater_corner: Some(WorldCorner::new(world, greater)),
                owner_name,
                is_admin,
            },
        )
    }

    /// Claims with distinct ids drawn from a small range, some unresolved.
    pub fn arb_claim_set(max: usize) -> impl Strategy<Value = Vec<Claim>> {
        proptest::collection::btree_map(0i64..1_000, (arb_claim(), any::<bool>()), 0..max).prop_map(
            |entries| {
                entries
                    .into_iter()
                    .map(|(id, (mut claim, unloaded))| {
                        claim.id = ClaimId(id);
                        if unloaded {
                            claim.greater_corner = None;
                        }
                        claim
                    })
                    .collect()
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built claims and hosts for common scenarios.

    use super::*;

    /// Regular claim spanning `(x, z)` to `(x + size - 1, z + size - 1)` in "world".
    pub fn make_claim(id: i64, owner: &str, x: i32, z: i32, size: i32) -> Claim {
        Claim {
            id: ClaimId(id),
            lesser_corner: Some(WorldCorner::new("world", BlockPos::new(x, 0, z))),
            greater_corner: Some(WorldCorner::new(
                "world",
                BlockPos::new(x + size - 1, 255, z + size - 1),
            )),
            owner_name: owner.to_string(),
            is_admin: false,
        }
    }

    pub fn make_admin_claim(id: i64, x: i32, z: i32, size: i32) -> Claim {
        Claim {
            is_admin: true,
            ..make_claim(id, "administrator", x, z, size)
        }
    }

    /// Claim in a world that is not loaded: neither corner resolves.
    pub fn make_unloaded_claim(id: i64, owner: &str) -> Claim {
        Claim {
            lesser_corner: None,
            greater_corner: None,
            ..make_claim(id, owner, 0, 0, 1)
        }
    }

    /// Host with both collaborators installed and enabled under default names.
    pub fn ready_host() -> StaticPluginHost {
        let plugins = ClaimMapConfig::default().plugins;
        StaticPluginHost::enabled([plugins.marker_service, plugins.claim_store])
    }

    /// Default config with bulk import gated on the ready signal.
    pub fn on_ready_config() -> ClaimMapConfig {
        ClaimMapConfig {
            startup: StartupPolicy::OnReady,
            ..ClaimMapConfig::default()
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over ClaimMap results and marker state.

    use super::*;

    #[track_caller]
    pub fn assert_not_running<T: std::fmt::Debug>(result: &SyncResult<T>) {
        match result {
            Err(SyncError::NotRunning { .. }) => {}
            other => panic!("Expected NotRunning error, got: {:?}", other),
        }
    }

    /// Assert a fatal setup error naming a missing collaborator.
    #[track_caller]
    pub fn assert_collaborator_missing<T: std::fmt::Debug>(result: &SyncResult<T>, name: &str) {
        match result {
            Err(SyncError::Host(HostError::CollaboratorMissing { name: n })) => {
                assert_eq!(n, name, "Wrong collaborator reported missing");
            }
            other => panic!("Expected CollaboratorMissing({}), got: {:?}", name, other),
        }
    }

    #[track_caller]
    pub fn assert_collaborator_disabled<T: std::fmt::Debug>(result: &SyncResult<T>, name: &str) {
        match result {
            Err(SyncError::Host(HostError::CollaboratorDisabled { name: n })) => {
                assert_eq!(n, name, "Wrong collaborator reported disabled");
            }
            other => panic!("Expected CollaboratorDisabled({}), got: {:?}", name, other),
        }
    }

    /// Number of `MarkerCreated` calls recorded for `key`.
    pub fn creations_of(api: &InMemoryMarkerApi, key: &MarkerKey) -> usize {
        api.count_calls(|call| matches!(call, MarkerCall::MarkerCreated { key: k } if k == key))
    }
}
