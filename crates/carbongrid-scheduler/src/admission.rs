//! Admission filter — readiness, taint, and resource-fit checks.
//!
//! A host is admissible for a unit iff it is ready, carries no
//! refuse-placement taint, and has room for the unit's aggregate
//! request in every resource dimension. Allocations are recomputed
//! from the platform on every decision; the engine keeps no ledger.

use tracing::debug;

use carbongrid_core::Resources;

use crate::platform::{Host, PlatformError, PlatformFacade, WorkloadUnit};

/// Why a host was rejected for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotReady,
    Tainted,
    InsufficientResources,
}

/// Sum of the declared requests of every live unit bound to `host`,
/// excluding units in a terminating state.
pub async fn allocated_on(
    platform: &dyn PlatformFacade,
    host: &str,
) -> Result<Resources, PlatformError> {
    let units = platform.list_units_on(host).await?;
    Ok(units
        .iter()
        .filter(|unit| !unit.terminating)
        .fold(Resources::ZERO, |acc, unit| acc.plus(&unit.total_requests())))
}

/// Check a single host against a request. `None` means admissible.
///
/// A unit with an empty request vector fits any ready, untainted host.
pub fn check_host(host: &Host, request: &Resources, allocated: &Resources) -> Option<Rejection> {
    if !host.ready {
        return Some(Rejection::NotReady);
    }
    if host.has_no_schedule_taint() {
        return Some(Rejection::Tainted);
    }
    if request.is_zero() {
        return None;
    }

    let free = host.capacity.minus(allocated);
    if !request.fits_within(&free) {
        return Some(Rejection::InsufficientResources);
    }
    None
}

/// Filter the host set down to those admissible for `unit`, preserving
/// the platform's iteration order.
pub async fn admissible_hosts(
    platform: &dyn PlatformFacade,
    hosts: Vec<Host>,
    unit: &WorkloadUnit,
) -> Result<Vec<Host>, PlatformError> {
    let request = unit.total_requests();
    let mut admissible = Vec::new();

    for host in hosts {
        let allocated = allocated_on(platform, &host.name).await?;
        match check_host(&host, &request, &allocated) {
            None => {
                debug!(host = %host.name, "host admissible");
                admissible.push(host);
            }
            Some(reason) => {
                debug!(host = %host.name, ?reason, "host rejected");
            }
        }
    }

    Ok(admissible)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::platform::{Taint, TaintEffect};

    fn ready_host(name: &str, capacity: Resources) -> Host {
        Host {
            name: name.to_string(),
            ready: true,
            taints: Vec::new(),
            capacity,
            labels: HashMap::new(),
        }
    }

    #[test]
    fn not_ready_host_is_rejected() {
        let mut host = ready_host("h1", Resources::new(4000, 8 << 30));
        host.ready = false;

        let rejection = check_host(&host, &Resources::new(100, 64 << 20), &Resources::ZERO);
        assert_eq!(rejection, Some(Rejection::NotReady));
    }

    #[test]
    fn no_schedule_taint_refuses_placement() {
        let mut host = ready_host("h1", Resources::new(4000, 8 << 30));
        host.taints.push(Taint {
            key: "maintenance".to_string(),
            value: None,
            effect: TaintEffect::NoSchedule,
        });

        let rejection = check_host(&host, &Resources::new(100, 64 << 20), &Resources::ZERO);
        assert_eq!(rejection, Some(Rejection::Tainted));
    }

    #[test]
    fn prefer_no_schedule_taint_does_not_refuse() {
        let mut host = ready_host("h1", Resources::new(4000, 8 << 30));
        host.taints.push(Taint {
            key: "aging".to_string(),
            value: None,
            effect: TaintEffect::PreferNoSchedule,
        });

        let rejection = check_host(&host, &Resources::new(100, 64 << 20), &Resources::ZERO);
        assert_eq!(rejection, None);
    }

    #[test]
    fn allocation_counts_against_capacity() {
        let host = ready_host("h1", Resources::new(1000, 1 << 30));

        // 300m already allocated; 700m free; request 700m fits exactly.
        let allocated = Resources::new(300, 0);
        assert_eq!(
            check_host(&host, &Resources::new(700, 0), &allocated),
            None
        );
        assert_eq!(
            check_host(&host, &Resources::new(701, 0), &allocated),
            Some(Rejection::InsufficientResources)
        );
    }

    #[test]
    fn empty_request_fits_full_host() {
        let host = ready_host("h1", Resources::new(1000, 1 << 30));
        let allocated = Resources::new(1000, 1 << 30); // fully allocated

        assert_eq!(check_host(&host, &Resources::ZERO, &allocated), None);
    }

    #[test]
    fn empty_request_still_respects_readiness_and_taints() {
        let mut host = ready_host("h1", Resources::new(1000, 1 << 30));
        host.ready = false;
        assert_eq!(
            check_host(&host, &Resources::ZERO, &Resources::ZERO),
            Some(Rejection::NotReady)
        );

        let mut host = ready_host("h2", Resources::new(1000, 1 << 30));
        host.taints.push(Taint {
            key: "k".to_string(),
            value: None,
            effect: TaintEffect::NoSchedule,
        });
        assert_eq!(
            check_host(&host, &Resources::ZERO, &Resources::ZERO),
            Some(Rejection::Tainted)
        );
    }

    #[test]
    fn oversized_request_never_fits() {
        let host = ready_host("h1", Resources::new(4000, 8 << 30));
        let request = Resources::new(64_000, 1 << 40);

        assert_eq!(
            check_host(&host, &request, &Resources::ZERO),
            Some(Rejection::InsufficientResources)
        );
    }
}
