//! Platform facade — the engine's view of hosts and workload units.
//!
//! The orchestration platform owns watch and bind; the engine consumes
//! them through this capability so tests and offline tooling can supply
//! synthetic implementations. Hosts and units here are read-only views
//! into the platform's object store; the engine owns none of them.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use carbongrid_core::Resources;

/// Host label consulted first for the region tag.
pub const REGION_LABEL: &str = "carbon-region";

/// Fallback labels, in order.
pub const REGION_LABEL_FALLBACKS: [&str; 2] = ["region", "topology.kubernetes.io/zone"];

/// Taint effects a host can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaintEffect {
    /// Refuse new placements outright.
    NoSchedule,
    /// Discourage new placements; carried as data, not enforced here.
    PreferNoSchedule,
    /// Evict running units; not acted on by this engine.
    NoExecute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    pub value: Option<String>,
    pub effect: TaintEffect,
}

/// An execution candidate as reported by the platform.
#[derive(Debug, Clone)]
pub struct Host {
    pub name: String,
    pub ready: bool,
    pub taints: Vec<Taint>,
    /// Allocatable capacity per resource dimension.
    pub capacity: Resources,
    pub labels: HashMap<String, String>,
}

impl Host {
    /// Region tag from labels: `carbon-region`, then `region`, then the
    /// platform zone label. First non-empty wins.
    pub fn region_tag(&self) -> Option<&str> {
        std::iter::once(REGION_LABEL)
            .chain(REGION_LABEL_FALLBACKS)
            .find_map(|label| {
                self.labels
                    .get(label)
                    .map(String::as_str)
                    .filter(|value| !value.is_empty())
            })
    }

    pub fn has_no_schedule_taint(&self) -> bool {
        self.taints
            .iter()
            .any(|taint| taint.effect == TaintEffect::NoSchedule)
    }
}

/// A container's declared resource requests.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub requests: Resources,
}

/// A unit of placement.
#[derive(Debug, Clone)]
pub struct WorkloadUnit {
    pub name: String,
    pub namespace: String,
    /// Name of the scheduler the unit asks for. Units naming another
    /// engine are ignored entirely.
    pub scheduler_name: String,
    /// Declared region affinity, carried from the platform object.
    pub region_affinity: Option<String>,
    pub containers: Vec<ContainerSpec>,
    /// The platform has marked the unit for deletion; its requests no
    /// longer count against its host.
    pub terminating: bool,
    /// Host the unit is currently bound to, if any.
    pub bound_host: Option<String>,
}

impl WorkloadUnit {
    /// Namespace-qualified identity.
    pub fn id(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Aggregate request: sum of per-container declared requests.
    pub fn total_requests(&self) -> Resources {
        self.containers
            .iter()
            .fold(Resources::ZERO, |acc, container| acc.plus(&container.requests))
    }
}

#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform rejected a bind (stale object, already bound, host
    /// became not-ready). Non-fatal: the platform will re-notify.
    #[error("bind rejected for {unit}: {reason}")]
    BindConflict { unit: String, reason: String },

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// The engine's only window onto the platform.
#[async_trait]
pub trait PlatformFacade: Send + Sync {
    /// Stream of units without an assigned host. Implementations must
    /// deliver a full enumeration of currently-unbound units before any
    /// live notification.
    async fn watch_unplaced(&self) -> Result<mpsc::Receiver<WorkloadUnit>, PlatformError>;

    /// Every host known to the platform, in the platform's iteration
    /// order.
    async fn list_hosts(&self) -> Result<Vec<Host>, PlatformError>;

    /// Units currently bound to the named host.
    async fn list_units_on(&self, host: &str) -> Result<Vec<WorkloadUnit>, PlatformError>;

    /// Commit a placement of `unit` onto `host`.
    async fn bind(&self, unit: &WorkloadUnit, host: &str) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_labels(labels: &[(&str, &str)]) -> Host {
        Host {
            name: "h1".to_string(),
            ready: true,
            taints: Vec::new(),
            capacity: Resources::new(4000, 8 << 30),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn region_tag_prefers_carbon_region() {
        let host = host_with_labels(&[
            ("carbon-region", "FR-FR"),
            ("region", "DE-DE"),
            ("topology.kubernetes.io/zone", "NO-NO1"),
        ]);
        assert_eq!(host.region_tag(), Some("FR-FR"));
    }

    #[test]
    fn region_tag_falls_back_in_order() {
        let host = host_with_labels(&[
            ("region", "DE-DE"),
            ("topology.kubernetes.io/zone", "NO-NO1"),
        ]);
        assert_eq!(host.region_tag(), Some("DE-DE"));

        let host = host_with_labels(&[("topology.kubernetes.io/zone", "NO-NO1")]);
        assert_eq!(host.region_tag(), Some("NO-NO1"));
    }

    #[test]
    fn empty_label_values_are_skipped() {
        let host = host_with_labels(&[("carbon-region", ""), ("region", "DE-DE")]);
        assert_eq!(host.region_tag(), Some("DE-DE"));

        let host = host_with_labels(&[("unrelated", "x")]);
        assert_eq!(host.region_tag(), None);
    }

    #[test]
    fn aggregate_request_sums_containers() {
        let unit = WorkloadUnit {
            name: "web".to_string(),
            namespace: "default".to_string(),
            scheduler_name: "carbon-scheduler".to_string(),
            region_affinity: None,
            containers: vec![
                ContainerSpec {
                    name: "app".to_string(),
                    requests: Resources::new(100, 64 << 20),
                },
                ContainerSpec {
                    name: "sidecar".to_string(),
                    requests: Resources::new(50, 32 << 20),
                },
            ],
            terminating: false,
            bound_host: None,
        };

        assert_eq!(unit.total_requests(), Resources::new(150, 96 << 20));
        assert_eq!(unit.id(), "default/web");
    }
}
