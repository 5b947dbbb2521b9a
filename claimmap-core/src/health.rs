//! Status reporting
//!
//! Snapshot of the synchronization lifecycle that a host can log or expose on
//! its own status endpoint.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of claim synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Events are reconciled, the bulk import has not run yet.
    AwaitingImport,
    /// Bulk import finished.
    Live,
    /// All markers and the marker set were removed.
    ShutDown,
}

impl SyncPhase {
    pub fn accepts_events(&self) -> bool {
        matches!(self, SyncPhase::AwaitingImport | SyncPhase::Live)
    }
}

/// Health status derived from the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Running but the map only shows claims created since activation.
    Degraded,
    Unhealthy,
}

/// Point-in-time status of the synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    pub marker_set: String,
    pub rendered_claims: usize,
    /// Claims skipped by the bulk import because a corner was unresolved.
    pub skipped_claims: usize,
}

impl SyncStatus {
    pub fn health(&self) -> HealthStatus {
        match self.phase {
            SyncPhase::Live => HealthStatus::Healthy,
            SyncPhase::AwaitingImport => HealthStatus::Degraded,
            SyncPhase::ShutDown => HealthStatus::Unhealthy,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.health(),
            "phase": self.phase,
            "marker_set": self.marker_set,
            "rendered_claims": self.rendered_claims,
            "skipped_claims": self.skipped_claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(phase: SyncPhase) -> SyncStatus {
        SyncStatus {
            phase,
            marker_set: "griefprevention.markerset".to_string(),
            rendered_claims: 3,
            skipped_claims: 1,
        }
    }

    #[test]
    fn test_health_follows_phase() {
        assert_eq!(status(SyncPhase::Live).health(), HealthStatus::Healthy);
        assert_eq!(status(SyncPhase::AwaitingImport).health(), HealthStatus::Degraded);
        assert_eq!(status(SyncPhase::ShutDown).health(), HealthStatus::Unhealthy);
    }

    #[test]
    fn test_phase_accepts_events() {
        assert!(SyncPhase::AwaitingImport.accepts_events());
        assert!(SyncPhase::Live.accepts_events());
        assert!(!SyncPhase::ShutDown.accepts_events());
    }

    #[test]
    fn test_json_shape() {
        let json = status(SyncPhase::AwaitingImport).to_json();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["phase"], "awaiting_import");
        assert_eq!(json["rendered_claims"], 3);
    }
}
