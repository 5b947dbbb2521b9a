//! In-memory marker service
//!
//! Keeps marker sets and markers in process and records every mutating call,
//! so tests can assert both the resulting map state and the exact sequence of
//! operations that produced it. Clones share state.
//!
//! Any mutating operation can be armed to fail, once, a fixed number of times
//! or until cleared. Failed calls leave the state untouched and are not
//! recorded.

use crate::{MarkerApi, MarkerResult};
use claimmap_core::{AreaPolygon, FillStyle, LineStyle, MarkerError, MarkerKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// ============================================================================
// HANDLES AND RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerSetHandle {
    key: String,
}

impl MarkerSetHandle {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerHandle {
    set: String,
    key: MarkerKey,
}

impl MarkerHandle {
    pub fn key(&self) -> &MarkerKey {
        &self.key
    }
}

/// Stored state of an area marker.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaMarkerRecord {
    pub key: MarkerKey,
    pub label: String,
    pub world: String,
    pub xs: [f64; 4],
    pub zs: [f64; 4],
    pub description: Option<String>,
    pub line: Option<LineStyle>,
    pub fill: Option<FillStyle>,
}

/// Stored state of a marker set.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSetRecord {
    pub key: String,
    pub label: String,
    pub persistent: bool,
    pub layer_priority: i32,
    pub hide_by_default: bool,
    pub markers: BTreeMap<String, AreaMarkerRecord>,
}

/// One successful mutating call.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerCall {
    SetCreated { key: String },
    SetLabelChanged { key: String, label: String },
    SetLayerPriorityChanged { key: String, priority: i32 },
    SetHideByDefaultChanged { key: String, hide: bool },
    SetDeleted { key: String },
    MarkerCreated { key: MarkerKey },
    CornersChanged { key: MarkerKey },
    LabelChanged { key: MarkerKey, label: String },
    DescriptionChanged { key: MarkerKey },
    LineStyleChanged { key: MarkerKey },
    FillStyleChanged { key: MarkerKey },
    MarkerDeleted { key: MarkerKey },
}

/// Mutating operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerOp {
    CreateSet,
    SetLabel,
    SetLayerPriority,
    SetHideByDefault,
    DeleteSet,
    CreateMarker,
    SetCorners,
    SetMarkerLabel,
    SetDescription,
    SetLineStyle,
    SetFillStyle,
    DeleteMarker,
}

#[derive(Debug)]
struct InjectedFailure {
    reason: String,
    /// `None` fails every call.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    sets: BTreeMap<String, MarkerSetRecord>,
    calls: Vec<MarkerCall>,
    failures: HashMap<MarkerOp, InjectedFailure>,
}

impl State {
    /// Consume an injected failure for `op`, if one is armed.
    fn injected_failure(&mut self, op: MarkerOp) -> Option<String> {
        let failure = self.failures.get_mut(&op)?;
        let reason = failure.reason.clone();
        if let Some(remaining) = failure.remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.failures.remove(&op);
            }
        }
        Some(reason)
    }

    fn check(&mut self, op: MarkerOp) -> MarkerResult<()> {
        match self.injected_failure(op) {
            Some(reason) => Err(MarkerError::Service { reason }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// IN-MEMORY MARKER API
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryMarkerApi {
    state: Arc<RwLock<State>>,
}

impl InMemoryMarkerApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with `reason`.
    pub fn fail_next(&self, op: MarkerOp, reason: impl Into<String>) {
        self.fail_times(op, 1, reason);
    }

    /// Make the next `times` calls of `op` fail with `reason`.
    pub fn fail_times(&self, op: MarkerOp, times: usize, reason: impl Into<String>) {
        if times == 0 {
            return;
        }
        let failure = InjectedFailure {
            reason: reason.into(),
            remaining: Some(times),
        };
        self.inspect_mut().failures.insert(op, failure);
    }

    /// Make every following call of `op` fail with `reason`.
    pub fn fail_always(&self, op: MarkerOp, reason: impl Into<String>) {
        let failure = InjectedFailure {
            reason: reason.into(),
            remaining: None,
        };
        self.inspect_mut().failures.insert(op, failure);
    }

    pub fn clear_failures(&self) {
        self.inspect_mut().failures.clear();
    }

    pub fn marker_set(&self, key: &str) -> Option<MarkerSetRecord> {
        self.inspect().sets.get(key).cloned()
    }

    pub fn marker_set_count(&self) -> usize {
        self.inspect().sets.len()
    }

    pub fn marker(&self, set: &str, key: &MarkerKey) -> Option<AreaMarkerRecord> {
        self.inspect()
            .sets
            .get(set)
            .and_then(|s| s.markers.get(key.as_str()))
            .cloned()
    }

    /// Markers in `set`, zero if the set does not exist.
    pub fn marker_count(&self, set: &str) -> usize {
        self.inspect()
            .sets
            .get(set)
            .map(|s| s.markers.len())
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<MarkerCall> {
        self.inspect().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inspect_mut().calls.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls<F>(&self, predicate: F) -> usize
    where
        F: Fn(&MarkerCall) -> bool,
    {
        self.inspect().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn created_markers(&self) -> Vec<MarkerKey> {
        self.inspect()
            .calls
            .iter()
            .filter_map(|c| match c {
                MarkerCall::MarkerCreated { key } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_markers(&self) -> Vec<MarkerKey> {
        self.inspect()
            .calls
            .iter()
            .filter_map(|c| match c {
                MarkerCall::MarkerDeleted { key } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    // Inspection helpers recover from a poisoned lock.
    fn inspect(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn inspect_mut(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> MarkerResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| MarkerError::LockPoisoned)
    }

    fn read(&self) -> MarkerResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| MarkerError::LockPoisoned)
    }

    fn with_set<F>(
        &self,
        op: MarkerOp,
        set: &MarkerSetHandle,
        call: MarkerCall,
        apply: F,
    ) -> MarkerResult<()>
    where
        F: FnOnce(&mut MarkerSetRecord),
    {
        let mut state = self.write()?;
        state.check(op)?;
        let record = state
            .sets
            .get_mut(&set.key)
            .ok_or_else(|| MarkerError::SetNotFound {
                key: set.key.clone(),
            })?;
        apply(record);
        state.calls.push(call);
        Ok(())
    }

    fn with_marker<F>(
        &self,
        op: MarkerOp,
        marker: &MarkerHandle,
        call: MarkerCall,
        apply: F,
    ) -> MarkerResult<()>
    where
        F: FnOnce(&mut AreaMarkerRecord),
    {
        let mut state = self.write()?;
        state.check(op)?;
        let record = state
            .sets
            .get_mut(&marker.set)
            .and_then(|s| s.markers.get_mut(marker.key.as_str()))
            .ok_or_else(|| MarkerError::MarkerNotFound {
                key: marker.key.to_string(),
            })?;
        apply(record);
        state.calls.push(call);
        Ok(())
    }
}

impl MarkerApi for InMemoryMarkerApi {
    type MarkerSet = MarkerSetHandle;
    type Marker = MarkerHandle;

    // === Marker Set Operations ===

    fn marker_set_get(&self, key: &str) -> MarkerResult<Option<MarkerSetHandle>> {
        let state = self.read()?;
        Ok(state.sets.get(key).map(|s| MarkerSetHandle { key: s.key.clone() }))
    }

    fn marker_set_create(
        &self,
        key: &str,
        label: &str,
        persistent: bool,
    ) -> MarkerResult<MarkerSetHandle> {
        let mut state = self.write()?;
        if let Some(reason) = state.injected_failure(MarkerOp::CreateSet) {
            return Err(MarkerError::CreateFailed {
                kind: "marker set",
                key: key.to_string(),
                reason,
            });
        }
        if state.sets.contains_key(key) {
            return Err(MarkerError::DuplicateSet {
                key: key.to_string(),
            });
        }
        state.sets.insert(
            key.to_string(),
            MarkerSetRecord {
                key: key.to_string(),
                label: label.to_string(),
                persistent,
                layer_priority: 0,
                hide_by_default: false,
                markers: BTreeMap::new(),
            },
        );
        state.calls.push(MarkerCall::SetCreated {
            key: key.to_string(),
        });
        Ok(MarkerSetHandle {
            key: key.to_string(),
        })
    }

    fn marker_set_set_label(&self, set: &MarkerSetHandle, label: &str) -> MarkerResult<()> {
        let call = MarkerCall::SetLabelChanged {
            key: set.key.clone(),
            label: label.to_string(),
        };
        self.with_set(MarkerOp::SetLabel, set, call, |s| s.label = label.to_string())
    }

    fn marker_set_set_layer_priority(
        &self,
        set: &MarkerSetHandle,
        priority: i32,
    ) -> MarkerResult<()> {
        let call = MarkerCall::SetLayerPriorityChanged {
            key: set.key.clone(),
            priority,
        };
        self.with_set(MarkerOp::SetLayerPriority, set, call, |s| s.layer_priority = priority)
    }

    fn marker_set_set_hide_by_default(&self, set: &MarkerSetHandle, hide: bool) -> MarkerResult<()> {
        let call = MarkerCall::SetHideByDefaultChanged {
            key: set.key.clone(),
            hide,
        };
        self.with_set(MarkerOp::SetHideByDefault, set, call, |s| s.hide_by_default = hide)
    }

    fn marker_set_delete(&self, set: &MarkerSetHandle) -> MarkerResult<()> {
        let mut state = self.write()?;
        state.check(MarkerOp::DeleteSet)?;
        if state.sets.remove(&set.key).is_none() {
            return Err(MarkerError::SetNotFound {
                key: set.key.clone(),
            });
        }
        state.calls.push(MarkerCall::SetDeleted {
            key: set.key.clone(),
        });
        Ok(())
    }

    // === Area Marker Operations ===

    fn area_marker_get(
        &self,
        set: &MarkerSetHandle,
        key: &MarkerKey,
    ) -> MarkerResult<Option<MarkerHandle>> {
        let state = self.read()?;
        let record = state
            .sets
            .get(&set.key)
            .ok_or_else(|| MarkerError::SetNotFound {
                key: set.key.clone(),
            })?;
        Ok(record.markers.get(key.as_str()).map(|m| MarkerHandle {
            set: set.key.clone(),
            key: m.key.clone(),
        }))
    }

    fn area_marker_create(
        &self,
        set: &MarkerSetHandle,
        key: &MarkerKey,
        label: &str,
        polygon: &AreaPolygon,
    ) -> MarkerResult<MarkerHandle> {
        let mut state = self.write()?;
        if let Some(reason) = state.injected_failure(MarkerOp::CreateMarker) {
            return Err(MarkerError::CreateFailed {
                kind: "area marker",
                key: key.to_string(),
                reason,
            });
        }
        let record = state
            .sets
            .get_mut(&set.key)
            .ok_or_else(|| MarkerError::SetNotFound {
                key: set.key.clone(),
            })?;
        if record.markers.contains_key(key.as_str()) {
            return Err(MarkerError::DuplicateMarker {
                set: set.key.clone(),
                key: key.to_string(),
            });
        }
        record.markers.insert(
            key.to_string(),
            AreaMarkerRecord {
                key: key.clone(),
                label: label.to_string(),
                world: polygon.world.clone(),
                xs: polygon.xs,
                zs: polygon.zs,
                description: None,
                line: None,
                fill: None,
            },
        );
        state.calls.push(MarkerCall::MarkerCreated { key: key.clone() });
        Ok(MarkerHandle {
            set: set.key.clone(),
            key: key.clone(),
        })
    }

    fn area_marker_set_corners(
        &self,
        marker: &MarkerHandle,
        xs: &[f64; 4],
        zs: &[f64; 4],
    ) -> MarkerResult<()> {
        let call = MarkerCall::CornersChanged {
            key: marker.key.clone(),
        };
        self.with_marker(MarkerOp::SetCorners, marker, call, |m| {
            m.xs = *xs;
            m.zs = *zs;
        })
    }

    fn area_marker_set_label(&self, marker: &MarkerHandle, label: &str) -> MarkerResult<()> {
        let call = MarkerCall::LabelChanged {
            key: marker.key.clone(),
            label: label.to_string(),
        };
        self.with_marker(MarkerOp::SetMarkerLabel, marker, call, |m| m.label = label.to_string())
    }

    fn area_marker_set_description(&self, marker: &MarkerHandle, html: &str) -> MarkerResult<()> {
        let call = MarkerCall::DescriptionChanged {
            key: marker.key.clone(),
        };
        self.with_marker(MarkerOp::SetDescription, marker, call, |m| m.description = Some(html.to_string()))
    }

    fn area_marker_set_line_style(
        &self,
        marker: &MarkerHandle,
        style: &LineStyle,
    ) -> MarkerResult<()> {
        let call = MarkerCall::LineStyleChanged {
            key: marker.key.clone(),
        };
        self.with_marker(MarkerOp::SetLineStyle, marker, call, |m| m.line = Some(*style))
    }

    fn area_marker_set_fill_style(
        &self,
        marker: &MarkerHandle,
        style: &FillStyle,
    ) -> MarkerResult<()> {
        let call = MarkerCall::FillStyleChanged {
            key: marker.key.clone(),
        };
        self.with_marker(MarkerOp::SetFillStyle, marker, call, |m| m.fill = Some(*style))
    }

    fn area_marker_delete(&self, marker: &MarkerHandle) -> MarkerResult<()> {
        let mut state = self.write()?;
        state.check(MarkerOp::DeleteMarker)?;
        let removed = state
            .sets
            .get_mut(&marker.set)
            .and_then(|s| s.markers.remove(marker.key.as_str()));
        if removed.is_none() {
            return Err(MarkerError::MarkerNotFound {
                key: marker.key.to_string(),
            });
        }
        state.calls.push(MarkerCall::MarkerDeleted {
            key: marker.key.clone(),
        });
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
