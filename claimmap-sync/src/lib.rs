//! ClaimMap Sync - Claim to Marker Reconciliation
//!
//! Mirrors the claims of a claim store as area markers on a map rendering
//! service. The pieces, bottom-up:
//!
//! - [`registry`]: claim id → marker handle index
//! - [`projector`]: renders one claim into one marker
//! - [`reconciler`]: bulk import, lifecycle events and teardown
//! - [`service`]: collaborator checks and the startup gate a host drives
//!
//! Everything runs on the host's single event thread. Lifecycle events are
//! accepted as soon as the service is enabled, before the bulk import, and a
//! claim seen by both is rendered exactly once.

pub mod projector;
pub mod reconciler;
pub mod registry;
pub mod service;
pub mod store;

pub use projector::Projector;
pub use reconciler::{ImportReport, Reconciler, TeardownReport};
pub use registry::{ClaimRegistry, InMemoryClaimRegistry};
pub use service::{ClaimMapService, PluginHost, PluginStatus, StaticPluginHost};
pub use store::{ClaimEvent, ClaimListener, ClaimStore, InMemoryClaimStore};
