//! carbongrid-cache — the carbon intensity cache poller (CIC).
//!
//! A single long-lived loop polls the Electricity Maps API for every
//! configured zone, assembles a ranked snapshot from the zones that
//! succeeded, and replaces the persisted snapshot file atomically.
//! Placement decisions read that file through `carbongrid-core`; a
//! partial snapshot is preferable to none, and a failed cycle leaves
//! the previous snapshot intact.

pub mod client;
pub mod config;
pub mod poller;

pub use client::{EmissionsClient, FetchError, ZoneReading, DEFAULT_BASE_URL};
pub use config::{CacheConfig, ConfigError};
pub use poller::{poll_once, PollError, Poller};
