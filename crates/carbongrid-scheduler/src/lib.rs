//! carbongrid-scheduler — the carbon-aware placement engine (CAPE).
//!
//! Observes unplaced workload units through a [`PlatformFacade`] and,
//! for each unit owned by this engine, either binds it to a host or
//! leaves it unplaced for the platform's next observation. The engine:
//!
//! - Filters candidate hosts by readiness, taints, and resource fit
//! - Scores survivors by the current carbon intensity of their region
//! - Falls back to first-admissible when carbon data is unavailable
//! - Commits placements through the platform's bind primitive
//!
//! # Architecture
//!
//! ```text
//! Engine
//!   ├── PlatformFacade (watch unplaced, list hosts/units, bind)
//!   ├── SnapshotSource (re-read per decision, from carbongrid-core)
//!   ├── admission (ready → untainted → resource fit)
//!   └── scoring (region label chain → snapshot intensity → sentinel)
//! ```
//!
//! The engine holds no long-lived state of its own: allocations are
//! recomputed from the platform per decision, and retry is driven by
//! the platform re-surfacing unbound units.

pub mod admission;
pub mod engine;
pub mod error;
pub mod platform;
pub mod scoring;

pub use admission::{admissible_hosts, check_host, Rejection};
pub use engine::{Engine, EngineConfig, Outcome};
pub use error::EngineError;
pub use platform::{
    ContainerSpec, Host, PlatformError, PlatformFacade, Taint, TaintEffect, WorkloadUnit,
};
pub use scoring::{score_hosts, select_lowest, HostScore, SENTINEL_SCORE};
