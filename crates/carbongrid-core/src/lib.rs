//! carbongrid-core — shared domain model and snapshot persistence.
//!
//! The snapshot file is the only coupling between the intensity cache
//! poller and the placement engine: the poller replaces it atomically
//! after each successful cycle, and the engine re-reads it on every
//! scheduling decision. This crate owns that contract:
//!
//! - The region/snapshot types and their derived ordering invariants
//! - The normalising loader (tolerates the historical nested layout)
//! - The atomic write-temp-then-rename writer
//! - The `SnapshotSource` capability consumers depend on

pub mod error;
pub mod snapshot;
pub mod types;

pub use error::SnapshotError;
pub use snapshot::{
    load_snapshot, read_snapshot, store_snapshot, FileSnapshotSource, SnapshotSource,
};
pub use types::{Region, RegionTag, Resources, Snapshot};
