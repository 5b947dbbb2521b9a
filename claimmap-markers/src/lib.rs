//! ClaimMap Markers - Marker Service Trait and In-Memory Implementation
//!
//! Defines the surface of the map rendering service this system drives. The
//! service owns marker sets and area markers; callers only ever hold the
//! opaque handles it returns.

pub mod in_memory;

pub use in_memory::{
    AreaMarkerRecord, InMemoryMarkerApi, MarkerCall, MarkerHandle, MarkerOp, MarkerSetHandle,
    MarkerSetRecord,
};

use claimmap_core::{AreaPolygon, FillStyle, LineStyle, MarkerError, MarkerKey};
use std::fmt::Debug;

/// Result type alias for marker service calls.
pub type MarkerResult<T> = Result<T, MarkerError>;

// ============================================================================
// MARKER SERVICE TRAIT
// ============================================================================

/// Imperative marker API of the map rendering service.
///
/// Handles are owned by the service. Implementations must treat operations on
/// a deleted marker or set as `MarkerNotFound` / `SetNotFound`.
pub trait MarkerApi: Send + Sync {
    /// Handle to a marker set.
    type MarkerSet: Clone + Debug + Send + Sync;
    /// Handle to an area marker.
    type Marker: Clone + Debug + Send + Sync;

    // === Marker Set Operations ===

    /// Look up an existing marker set by key.
    fn marker_set_get(&self, key: &str) -> MarkerResult<Option<Self::MarkerSet>>;

    /// Create a new marker set. Fails if the key is taken.
    fn marker_set_create(
        &self,
        key: &str,
        label: &str,
        persistent: bool,
    ) -> MarkerResult<Self::MarkerSet>;

    fn marker_set_set_label(&self, set: &Self::MarkerSet, label: &str) -> MarkerResult<()>;

    /// Ordering among marker sets in the layer control.
    fn marker_set_set_layer_priority(&self, set: &Self::MarkerSet, priority: i32)
        -> MarkerResult<()>;

    fn marker_set_set_hide_by_default(&self, set: &Self::MarkerSet, hide: bool) -> MarkerResult<()>;

    /// Delete the set together with any markers it still holds.
    fn marker_set_delete(&self, set: &Self::MarkerSet) -> MarkerResult<()>;

    // === Area Marker Operations ===

    /// Look up a marker in `set` by key.
    fn area_marker_get(
        &self,
        set: &Self::MarkerSet,
        key: &MarkerKey,
    ) -> MarkerResult<Option<Self::Marker>>;

    /// Create an area marker in `set`. Fails if `key` is taken in that set.
    fn area_marker_create(
        &self,
        set: &Self::MarkerSet,
        key: &MarkerKey,
        label: &str,
        polygon: &AreaPolygon,
    ) -> MarkerResult<Self::Marker>;

    /// Replace the corners of a marker, keeping its world.
    fn area_marker_set_corners(
        &self,
        marker: &Self::Marker,
        xs: &[f64; 4],
        zs: &[f64; 4],
    ) -> MarkerResult<()>;

    fn area_marker_set_label(&self, marker: &Self::Marker, label: &str) -> MarkerResult<()>;

    /// Markup shown in the marker's popup.
    fn area_marker_set_description(&self, marker: &Self::Marker, html: &str) -> MarkerResult<()>;

    fn area_marker_set_line_style(&self, marker: &Self::Marker, style: &LineStyle)
        -> MarkerResult<()>;

    fn area_marker_set_fill_style(&self, marker: &Self::Marker, style: &FillStyle)
        -> MarkerResult<()>;

    fn area_marker_delete(&self, marker: &Self::Marker) -> MarkerResult<()>;
}
