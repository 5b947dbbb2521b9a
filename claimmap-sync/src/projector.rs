//! Claim projection
//!
//! Turns one claim into one area marker. A claim without a registry entry
//! either adopts the marker its key already names in the set or gets a new
//! one; a registered claim has its marker moved and relabeled in place. Style
//! and popup are applied afterwards in both cases.
//!
//! The registry entry is installed as soon as the marker exists, before any
//! further call, so an entry exists exactly when the marker does even if a
//! later call fails.

use crate::registry::ClaimRegistry;
use claimmap_core::{
    AreaPolygon, Claim, InfoWindow, InfoWindowConfig, MarkerStyle, StyleConfig, SyncResult,
};
use claimmap_markers::MarkerApi;

/// Stateless renderer of claims into area markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projector {
    style: StyleConfig,
    info_window: InfoWindowConfig,
}

impl Projector {
    pub fn new(style: StyleConfig, info_window: InfoWindowConfig) -> Self {
        Self { style, info_window }
    }

    /// Render `claim` into `set` and make sure `registry` points at its marker.
    ///
    /// Returns `Ok(None)` without touching the service or the registry when
    /// either corner is unresolved.
    pub fn project<A, R>(
        &self,
        api: &A,
        set: &A::MarkerSet,
        registry: &mut R,
        claim: &Claim,
    ) -> SyncResult<Option<A::Marker>>
    where
        A: MarkerApi,
        R: ClaimRegistry<A::Marker>,
    {
        let Some(polygon) = AreaPolygon::for_claim(claim) else {
            tracing::trace!(claim_id = %claim.id, "Claim has an unresolved corner, not rendering");
            return Ok(None);
        };

        let marker = match registry.get(claim.id).cloned() {
            Some(existing) => {
                Self::reshape(api, &existing, &polygon, claim)?;
                existing
            }
            None => {
                let key = claim.marker_key();
                match api.area_marker_get(set, &key)? {
                    Some(adopted) => {
                        tracing::debug!(claim_id = %claim.id, marker = %key, "Adopting existing marker");
                        registry.put(claim.id, adopted.clone());
                        Self::reshape(api, &adopted, &polygon, claim)?;
                        adopted
                    }
                    None => {
                        let created =
                            api.area_marker_create(set, &key, &claim.owner_name, &polygon)?;
                        registry.put(claim.id, created.clone());
                        created
                    }
                }
            }
        };

        let style = MarkerStyle::for_claim(claim.is_admin, &self.style);
        api.area_marker_set_line_style(&marker, &style.line)?;
        api.area_marker_set_fill_style(&marker, &style.fill)?;

        let html = InfoWindow::render(&claim.owner_name, claim.is_admin, &self.info_window);
        api.area_marker_set_description(&marker, &html)?;

        Ok(Some(marker))
    }

    fn reshape<A: MarkerApi>(
        api: &A,
        marker: &A::Marker,
        polygon: &AreaPolygon,
        claim: &Claim,
    ) -> SyncResult<()> {
        api.area_marker_set_corners(marker, &polygon.xs, &polygon.zs)?;
        api.area_marker_set_label(marker, &claim.owner_name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryClaimRegistry;
    use claimmap_core::{BlockPos, ClaimId, MarkerError, MarkerKey, Rgb, SyncError, WorldCorner};
    use claimmap_markers::{InMemoryMarkerApi, MarkerCall, MarkerOp};

    const SET: &str = "griefprevention.markerset";

    fn claim(id: i64, owner: &str, is_admin: bool) -> Claim {
        Claim {
            id: ClaimId(id),
            lesser_corner: Some(WorldCorner::new("world", BlockPos::new(0, 64, 0))),
            greater_corner: Some(WorldCorner::new("world", BlockPos::new(10, 64, 10))),
            owner_name: owner.to_string(),
            is_admin,
        }
    }

    fn setup() -> (InMemoryMarkerApi, claimmap_markers::MarkerSetHandle) {
        let api = InMemoryMarkerApi::new();
        let set = api.marker_set_create(SET, "Claims", false).unwrap();
        api.clear_calls();
        (api, set)
    }

    #[test]
    fn test_first_projection_creates_and_registers_marker() {
        let (api, set) = setup();
        let mut registry = InMemoryClaimRegistry::new();
        let projector = Projector::default();

        let marker = projector
            .project(&api, &set, &mut registry, &claim(7, "Alex", false))
            .unwrap()
            .unwrap();
        assert_eq!(marker.key().as_str(), "Claim_7");
        assert_eq!(registry.get(ClaimId(7)), Some(&marker));

        let record = api.marker(SET, &MarkerKey::for_claim(ClaimId(7))).unwrap();
        assert_eq!(record.label, "Alex");
        assert_eq!(record.xs, [0.0, 0.0, 11.0, 11.0]);
        assert_eq!(record.zs, [0.0, 11.0, 11.0, 0.0]);
        assert_eq!(record.line.unwrap().color, Rgb::TEAL);
        assert!(record.description.unwrap().contains("Alex's claim"));
    }

    #[test]
    fn test_registered_claim_is_updated_in_place() {
        let (api, set) = setup();
        let mut registry = InMemoryClaimRegistry::new();
        let projector = Projector::default();

        projector
            .project(&api, &set, &mut registry, &claim(7, "Alex", false))
            .unwrap();

        let mut resized = claim(7, "Sam", true);
        resized.greater_corner = Some(WorldCorner::new("world", BlockPos::new(20, 64, 5)));
        projector
            .project(&api, &set, &mut registry, &resized)
            .unwrap()
            .unwrap();

        assert_eq!(api.count_calls(|c| matches!(c, MarkerCall::MarkerCreated { .. })), 1);
        assert_eq!(registry.len(), 1);
        let record = api.marker(SET, &MarkerKey::for_claim(ClaimId(7))).unwrap();
        assert_eq!(record.label, "Sam");
        assert_eq!(record.xs, [0.0, 0.0, 21.0, 21.0]);
        assert_eq!(record.zs, [0.0, 6.0, 6.0, 0.0]);
        assert_eq!(record.fill.unwrap().color, Rgb::RED);
    }

    #[test]
    fn test_marker_left_in_set_is_adopted() {
        let (api, set) = setup();
        let key = MarkerKey::for_claim(ClaimId(3));
        let stale = AreaPolygon::from_corners("world", BlockPos::new(50, 0, 50), BlockPos::new(51, 0, 51));
        let existing = api.area_marker_create(&set, &key, "Old owner", &stale).unwrap();
        let mut registry = InMemoryClaimRegistry::new();

        let marker = Projector::default()
            .project(&api, &set, &mut registry, &claim(3, "Alex", false))
            .unwrap()
            .unwrap();

        assert_eq!(marker, existing);
        assert_eq!(registry.get(ClaimId(3)), Some(&existing));
        assert_eq!(api.count_calls(|c| matches!(c, MarkerCall::MarkerCreated { .. })), 1);
        let record = api.marker(SET, &key).unwrap();
        assert_eq!(record.label, "Alex");
        assert_eq!(record.xs, [0.0, 0.0, 11.0, 11.0]);
    }

    #[test]
    fn test_styling_failure_keeps_entry_for_created_marker() {
        let (api, set) = setup();
        let mut registry = InMemoryClaimRegistry::new();
        api.fail_next(MarkerOp::SetLineStyle, "transient");

        let err = Projector::default()
            .project(&api, &set, &mut registry, &claim(7, "Alex", false))
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::Marker(MarkerError::Service {
                reason: "transient".to_string()
            })
        );
        assert!(registry.contains(ClaimId(7)));
        assert_eq!(api.marker_count(SET), 1);
    }

    #[test]
    fn test_unresolved_corner_skips_without_calls() {
        let (api, set) = setup();
        let mut registry = InMemoryClaimRegistry::new();
        let mut unloaded = claim(3, "Alex", false);
        unloaded.greater_corner = None;

        let result = Projector::default()
            .project(&api, &set, &mut registry, &unloaded)
            .unwrap();
        assert!(result.is_none());
        assert!(registry.is_empty());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_admin_popup_has_no_avatar() {
        let (api, set) = setup();
        let mut registry = InMemoryClaimRegistry::new();
        Projector::default()
            .project(&api, &set, &mut registry, &claim(1, "administrator", true))
            .unwrap();

        let record = api.marker(SET, &MarkerKey::for_claim(ClaimId(1))).unwrap();
        assert!(!record.description.unwrap().contains("<img"));
    }
}
